//! Grammar: the legal shapes of raw definitions.
//!
//! An [`Entity`] declares, for one kind of definition, every field a raw
//! definition of that kind may carry: scalar properties, links to other
//! definitions (by name) and nested child definitions. A [`Grammar`] is the
//! set of entities plus the provided root definitions that seed every
//! repository.
//!
//! Nothing here validates anything; see [`crate::raw::validator`].

pub mod model;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::raw::RawDefinition;

/// Scalar type of a property field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    String,
    Boolean,
    Integer,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "String"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Integer => write!(f, "Integer"),
        }
    }
}

/// What a field holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// A literal value of the given type.
    Property(PropertyType),
    /// Name(s) of other definitions of the target entity.
    Link { target: String },
    /// Nested definition(s) of the target entity, owned by the parent.
    Child { target: String },
}

impl FieldKind {
    /// Short label used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Property(_) => "property",
            Self::Link { .. } => "link",
            Self::Child { .. } => "child",
        }
    }
}

/// How many values a field takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// Exactly one value, required.
    One,
    /// Zero or one value.
    Optional,
    /// Any number of values.
    Many,
}

impl Cardinality {
    pub fn is_required(self) -> bool {
        matches!(self, Self::One)
    }

    pub fn is_multiple(self) -> bool {
        matches!(self, Self::Many)
    }
}

/// One legal field of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityField {
    pub name: String,
    pub kind: FieldKind,
    pub cardinality: Cardinality,
}

/// The declared shape of one kind of definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    name: String,
    fields: IndexMap<String, EntityField>,
    /// Externally supplied; skipped by validation and sketch construction.
    provided: bool,
}

impl Entity {
    /// Start declaring an entity.
    pub fn builder(name: impl Into<String>) -> EntityBuilder {
        EntityBuilder {
            name: name.into(),
            fields: IndexMap::new(),
            provided: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_provided(&self) -> bool {
        self.provided
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &EntityField> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&EntityField> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Names of the fields that must be populated.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .values()
            .filter(|f| f.cardinality.is_required())
            .map(|f| f.name.as_str())
    }

    /// Find the child field whose target is the given entity.
    pub fn child_field_for(&self, entity: &str) -> Option<&EntityField> {
        self.fields
            .values()
            .find(|f| matches!(&f.kind, FieldKind::Child { target } if target == entity))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Staged builder for [`Entity`].
#[derive(Debug)]
pub struct EntityBuilder {
    name: String,
    fields: IndexMap<String, EntityField>,
    provided: bool,
}

impl EntityBuilder {
    pub fn provided(mut self) -> Self {
        self.provided = true;
        self
    }

    pub fn property(self, name: &str, ty: PropertyType, cardinality: Cardinality) -> Self {
        self.field(name, FieldKind::Property(ty), cardinality)
    }

    pub fn link(self, name: &str, target: &str, cardinality: Cardinality) -> Self {
        self.field(
            name,
            FieldKind::Link {
                target: target.to_string(),
            },
            cardinality,
        )
    }

    pub fn child(self, name: &str, target: &str, cardinality: Cardinality) -> Self {
        self.field(
            name,
            FieldKind::Child {
                target: target.to_string(),
            },
            cardinality,
        )
    }

    fn field(mut self, name: &str, kind: FieldKind, cardinality: Cardinality) -> Self {
        self.fields.insert(
            name.to_string(),
            EntityField {
                name: name.to_string(),
                kind,
                cardinality,
            },
        );
        self
    }

    pub fn build(self) -> Arc<Entity> {
        Arc::new(Entity {
            name: self.name,
            fields: self.fields,
            provided: self.provided,
        })
    }
}

/// A set of entities plus the provided definitions every repository starts with.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    entities: IndexMap<String, Arc<Entity>>,
    roots: Vec<RawDefinition>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity. A later entity with the same name replaces the earlier one.
    pub fn with_entity(mut self, entity: Arc<Entity>) -> Self {
        self.entities.insert(entity.name().to_string(), entity);
        self
    }

    /// Register a provided root definition.
    pub fn with_root(mut self, raw: RawDefinition) -> Self {
        self.roots.push(raw);
        self
    }

    pub fn entities(&self) -> impl Iterator<Item = &Arc<Entity>> {
        self.entities.values()
    }

    pub fn entity(&self, name: &str) -> Option<&Arc<Entity>> {
        self.entities.get(name)
    }

    /// The provided seed definitions (primitive data types and markers).
    pub fn root_definitions(&self) -> &[RawDefinition] {
        &self.roots
    }
}
