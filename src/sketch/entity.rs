//! Entity definitions (`DtSketch`) and their fields.
//!
//! An entity definition is assembled through a [`DtSketchBuilder`] in two
//! stages. The factory fills the builder from the raw definition and checks
//! it with [`DtSketchBuilder::build`]; the builder then stays open on the
//! workbench so that associations and fragments solved later in the same
//! pass can append foreign keys. The sketch is frozen once every raw has been
//! offered that chance.
//!
//! Invariants enforced at build time:
//! - a persistent stereotype has exactly one identifier field, any other has none;
//! - the `Fragment` stereotype is used iff a fragment origin is set;
//! - computed fields are never persistent;
//! - field names are unique, and sort/display/handle fields exist;
//! - the data space matches `^[a-z][a-zA-Z0-9]{3,60}$`.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{SketchError, SketchResult};

/// Data space used when a definition names none.
pub const DEFAULT_DATA_SPACE: &str = "main";

static DATA_SPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-zA-Z0-9]{3,60}$").unwrap());

/// Classification of an entity definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stereotype {
    ValueObject,
    Entity,
    KeyConcept,
    MasterData,
    StaticMasterData,
    Fragment,
}

impl Stereotype {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ValueObject" => Some(Self::ValueObject),
            "Entity" => Some(Self::Entity),
            "KeyConcept" => Some(Self::KeyConcept),
            "MasterData" => Some(Self::MasterData),
            "StaticMasterData" => Some(Self::StaticMasterData),
            "Fragment" => Some(Self::Fragment),
            _ => None,
        }
    }

    /// Persistent stereotypes are stored and identified by one id field.
    pub fn is_persistent(self) -> bool {
        matches!(
            self,
            Self::Entity | Self::KeyConcept | Self::MasterData | Self::StaticMasterData
        )
    }
}

impl fmt::Display for Stereotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ValueObject => "ValueObject",
            Self::Entity => "Entity",
            Self::KeyConcept => "KeyConcept",
            Self::MasterData => "MasterData",
            Self::StaticMasterData => "StaticMasterData",
            Self::Fragment => "Fragment",
        };
        f.write_str(name)
    }
}

/// How many values a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldCardinality {
    One,
    Optional,
    Many,
}

impl FieldCardinality {
    /// Parse the model notation: `1`, `?` or `*`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1" => Some(Self::One),
            "?" => Some(Self::Optional),
            "*" => Some(Self::Many),
            _ => None,
        }
    }

    pub fn is_required(self) -> bool {
        matches!(self, Self::One)
    }
}

impl fmt::Display for FieldCardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "1"),
            Self::Optional => write!(f, "?"),
            Self::Many => write!(f, "*"),
        }
    }
}

/// Role of a field within its entity definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum DtFieldKind {
    Id,
    Data,
    ForeignKey { target: String },
    Computed { expression: String },
}

impl DtFieldKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::Data => "Data",
            Self::ForeignKey { .. } => "ForeignKey",
            Self::Computed { .. } => "Computed",
        }
    }
}

/// A field of a built entity definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DtField {
    name: String,
    label: String,
    kind: DtFieldKind,
    cardinality: FieldCardinality,
    persistent: bool,
    /// Name of the field's domain.
    domain: String,
}

impl DtField {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &DtFieldKind {
        &self.kind
    }

    pub fn cardinality(&self) -> FieldCardinality {
        self.cardinality
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_id(&self) -> bool {
        matches!(self.kind, DtFieldKind::Id)
    }

    /// Target entity definition of a foreign key.
    pub fn fk_target(&self) -> Option<&str> {
        match &self.kind {
            DtFieldKind::ForeignKey { target } => Some(target),
            _ => None,
        }
    }

    pub fn expression(&self) -> Option<&str> {
        match &self.kind {
            DtFieldKind::Computed { expression } => Some(expression),
            _ => None,
        }
    }
}

/// A resolved entity definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DtSketch {
    name: String,
    package: Option<String>,
    stereotype: Stereotype,
    data_space: String,
    fields: Vec<DtField>,
    sort_field: Option<String>,
    display_field: Option<String>,
    handle_field: Option<String>,
    fragment_of: Option<String>,
}

impl DtSketch {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn stereotype(&self) -> Stereotype {
        self.stereotype
    }

    pub fn is_persistent(&self) -> bool {
        self.stereotype.is_persistent()
    }

    pub fn data_space(&self) -> &str {
        &self.data_space
    }

    /// Fields in order: identifier, data and foreign keys, computed.
    pub fn fields(&self) -> &[DtField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&DtField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn id_field(&self) -> Option<&DtField> {
        self.fields.iter().find(|f| f.is_id())
    }

    pub fn sort_field(&self) -> Option<&DtField> {
        self.sort_field.as_deref().and_then(|n| self.field(n))
    }

    pub fn display_field(&self) -> Option<&DtField> {
        self.display_field.as_deref().and_then(|n| self.field(n))
    }

    pub fn handle_field(&self) -> Option<&DtField> {
        self.handle_field.as_deref().and_then(|n| self.field(n))
    }

    pub fn fragment_of(&self) -> Option<&str> {
        self.fragment_of.as_deref()
    }
}

#[derive(Debug, Clone)]
struct PendingField {
    name: String,
    label: String,
    kind: DtFieldKind,
    cardinality: FieldCardinality,
    /// `None` follows the definition's persistence.
    persistent: Option<bool>,
    domain: String,
}

/// Builder for [`DtSketch`]; stays mutable across the whole factory pass.
#[derive(Debug, Clone)]
pub struct DtSketchBuilder {
    name: String,
    package: Option<String>,
    stereotype: Option<Stereotype>,
    data_space: Option<String>,
    ids: Vec<PendingField>,
    data: Vec<PendingField>,
    computed: Vec<PendingField>,
    sort_field: Option<String>,
    display_field: Option<String>,
    handle_field: Option<String>,
    fragment_of: Option<String>,
}

impl DtSketchBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: None,
            stereotype: None,
            data_space: None,
            ids: Vec::new(),
            data: Vec::new(),
            computed: Vec::new(),
            sort_field: None,
            display_field: None,
            handle_field: None,
            fragment_of: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.ids
            .iter()
            .chain(&self.data)
            .chain(&self.computed)
            .any(|f| f.name == name)
    }

    pub fn with_package(&mut self, package: Option<String>) -> &mut Self {
        self.package = package;
        self
    }

    pub fn with_stereotype(&mut self, stereotype: Stereotype) -> &mut Self {
        self.stereotype = Some(stereotype);
        self
    }

    pub fn with_data_space(&mut self, data_space: impl Into<String>) -> &mut Self {
        self.data_space = Some(data_space.into());
        self
    }

    pub fn with_sort_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.sort_field = Some(field.into());
        self
    }

    pub fn with_display_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.display_field = Some(field.into());
        self
    }

    pub fn with_handle_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.handle_field = Some(field.into());
        self
    }

    pub fn with_fragment_of(&mut self, origin: impl Into<String>) -> &mut Self {
        self.fragment_of = Some(origin.into());
        self
    }

    pub fn add_id_field(&mut self, name: &str, label: &str, domain: &str) -> &mut Self {
        self.ids.push(PendingField {
            name: name.to_string(),
            label: label.to_string(),
            kind: DtFieldKind::Id,
            cardinality: FieldCardinality::One,
            persistent: Some(true),
            domain: domain.to_string(),
        });
        self
    }

    pub fn add_data_field(
        &mut self,
        name: &str,
        label: &str,
        domain: &str,
        cardinality: FieldCardinality,
        persistent: Option<bool>,
    ) -> &mut Self {
        self.data.push(PendingField {
            name: name.to_string(),
            label: label.to_string(),
            kind: DtFieldKind::Data,
            cardinality,
            persistent,
            domain: domain.to_string(),
        });
        self
    }

    pub fn add_computed_field(
        &mut self,
        name: &str,
        label: &str,
        domain: &str,
        cardinality: FieldCardinality,
        expression: &str,
    ) -> &mut Self {
        self.computed.push(PendingField {
            name: name.to_string(),
            label: label.to_string(),
            kind: DtFieldKind::Computed {
                expression: expression.to_string(),
            },
            cardinality,
            persistent: Some(false),
            domain: domain.to_string(),
        });
        self
    }

    /// Append a foreign key towards `target`, after the data fields added so far.
    pub fn add_foreign_key(
        &mut self,
        name: &str,
        label: &str,
        domain: &str,
        cardinality: FieldCardinality,
        target: &str,
    ) -> &mut Self {
        self.data.push(PendingField {
            name: name.to_string(),
            label: label.to_string(),
            kind: DtFieldKind::ForeignKey {
                target: target.to_string(),
            },
            cardinality,
            persistent: None,
            domain: domain.to_string(),
        });
        self
    }

    /// Check every invariant and produce the sketch. The builder is left
    /// untouched so it can be built again after later contributions.
    pub fn build(&self) -> SketchResult<DtSketch> {
        let stereotype = self.stereotype.unwrap_or(if self.fragment_of.is_some() {
            Stereotype::Fragment
        } else if self.ids.is_empty() {
            Stereotype::ValueObject
        } else {
            Stereotype::Entity
        });

        if self.ids.len() > 1 {
            return Err(self.violation(format!(
                "exactly one identifier field allowed, found {}",
                self.ids.len()
            )));
        }
        let persistent = stereotype.is_persistent();
        if persistent && self.ids.is_empty() {
            return Err(self.violation(format!(
                "stereotype {stereotype} requires exactly one identifier field"
            )));
        }
        if !persistent && !self.ids.is_empty() {
            return Err(self.violation(format!(
                "stereotype {stereotype} cannot have an identifier field"
            )));
        }
        if (stereotype == Stereotype::Fragment) != self.fragment_of.is_some() {
            return Err(self.violation(
                "stereotype Fragment is reserved to definitions with a fragment origin",
            ));
        }

        let data_space = self
            .data_space
            .clone()
            .unwrap_or_else(|| DEFAULT_DATA_SPACE.to_string());
        if !DATA_SPACE_PATTERN.is_match(&data_space) {
            return Err(self.violation(format!(
                "data space \"{data_space}\" must match {}",
                DATA_SPACE_PATTERN.as_str()
            )));
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.ids.len() + self.data.len() + self.computed.len());
        for pending in self.ids.iter().chain(&self.data).chain(&self.computed) {
            if !seen.insert(pending.name.as_str()) {
                return Err(self.violation(format!("duplicate field \"{}\"", pending.name)));
            }
            let field_persistent = pending.persistent.unwrap_or(persistent);
            if field_persistent && matches!(pending.kind, DtFieldKind::Computed { .. }) {
                return Err(self.violation(format!(
                    "computed field \"{}\" cannot be persistent",
                    pending.name
                )));
            }
            fields.push(DtField {
                name: pending.name.clone(),
                label: pending.label.clone(),
                kind: pending.kind.clone(),
                cardinality: pending.cardinality,
                persistent: field_persistent,
                domain: pending.domain.clone(),
            });
        }

        for selected in [&self.sort_field, &self.display_field, &self.handle_field]
            .into_iter()
            .flatten()
        {
            if !seen.contains(selected.as_str()) {
                return Err(SketchError::FieldNotFound {
                    key: self.name.clone(),
                    field: selected.clone(),
                });
            }
        }

        tracing::trace!(
            name = %self.name,
            %stereotype,
            fields = fields.len(),
            kinds = ?fields.iter().map(|f| f.kind.label()).collect::<Vec<_>>(),
            "entity definition built"
        );

        Ok(DtSketch {
            name: self.name.clone(),
            package: self.package.clone(),
            stereotype,
            data_space,
            fields,
            sort_field: self.sort_field.clone(),
            display_field: self.display_field.clone(),
            handle_field: self.handle_field.clone(),
            fragment_of: self.fragment_of.clone(),
        })
    }

    fn violation(&self, rule: impl Into<String>) -> SketchError {
        SketchError::invariant(self.name.clone(), rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> DtSketchBuilder {
        let mut b = DtSketchBuilder::new("Person");
        b.add_id_field("id", "Id", "DoId").add_data_field(
            "name",
            "Name",
            "DoLabel",
            FieldCardinality::One,
            None,
        );
        b
    }

    #[test]
    fn stereotype_defaults_to_entity_with_id() {
        let dt = person().build().unwrap();
        assert_eq!(dt.stereotype(), Stereotype::Entity);
        assert_eq!(dt.id_field().unwrap().name(), "id");
        assert!(dt.field("name").unwrap().is_persistent());
        assert_eq!(dt.data_space(), DEFAULT_DATA_SPACE);
    }

    #[test]
    fn stereotype_defaults_to_value_object_without_id() {
        let mut b = DtSketchBuilder::new("Address");
        b.add_data_field("street", "Street", "DoLabel", FieldCardinality::Optional, None);
        let dt = b.build().unwrap();
        assert_eq!(dt.stereotype(), Stereotype::ValueObject);
        assert!(!dt.field("street").unwrap().is_persistent());
    }

    #[test]
    fn entity_without_id_fails() {
        let mut b = DtSketchBuilder::new("Person");
        b.with_stereotype(Stereotype::Entity);
        let err = b.build().unwrap_err();
        assert!(err.to_string().contains("requires exactly one identifier field"));
    }

    #[test]
    fn value_object_with_id_fails() {
        let mut b = person();
        b.with_stereotype(Stereotype::ValueObject);
        let err = b.build().unwrap_err();
        assert!(err.to_string().contains("cannot have an identifier field"));
    }

    #[test]
    fn two_ids_fail() {
        let mut b = person();
        b.add_id_field("id2", "Id2", "DoId");
        let err = b.build().unwrap_err();
        assert!(err.to_string().contains("exactly one identifier field"));
    }

    #[test]
    fn computed_field_cannot_be_persistent() {
        let mut b = DtSketchBuilder::new("Stats");
        b.add_computed_field("total", "Total", "DoAmount", FieldCardinality::Optional, "a + b");
        assert!(b.build().is_ok());

        let mut b = person();
        b.computed.push(PendingField {
            name: "total".into(),
            label: "Total".into(),
            kind: DtFieldKind::Computed {
                expression: "a + b".into(),
            },
            cardinality: FieldCardinality::Optional,
            persistent: Some(true),
            domain: "DoAmount".into(),
        });
        let err = b.build().unwrap_err();
        assert!(err.to_string().contains("cannot be persistent"));
    }

    #[test]
    fn fields_are_ordered_id_data_computed() {
        let mut b = DtSketchBuilder::new("Person");
        b.add_computed_field("full", "Full", "DoLabel", FieldCardinality::Optional, "x")
            .add_data_field("name", "Name", "DoLabel", FieldCardinality::One, None)
            .add_id_field("id", "Id", "DoId")
            .add_foreign_key("carId", "Car", "DoId", FieldCardinality::One, "Car");
        let dt = b.build().unwrap();
        let names: Vec<_> = dt.fields().iter().map(DtField::name).collect();
        assert_eq!(names, vec!["id", "name", "carId", "full"]);
        assert_eq!(dt.field("carId").unwrap().fk_target(), Some("Car"));
        assert_eq!(dt.field("full").unwrap().expression(), Some("x"));
    }

    #[test]
    fn display_field_must_exist() {
        let mut b = person();
        b.with_display_field("nickname");
        let err = b.build().unwrap_err();
        assert!(matches!(err, SketchError::FieldNotFound { ref field, .. } if field == "nickname"));

        let mut b = person();
        b.with_display_field("name").with_sort_field("name");
        let dt = b.build().unwrap();
        assert_eq!(dt.display_field().unwrap().name(), "name");
    }

    #[test]
    fn sort_field_must_exist() {
        let mut b = person();
        b.with_sort_field("rank");
        let err = b.build().unwrap_err();
        assert!(matches!(err, SketchError::FieldNotFound { ref key, ref field } if key == "Person" && field == "rank"));
    }

    #[test]
    fn handle_field_must_exist() {
        let mut b = person();
        b.with_handle_field("slug");
        let err = b.build().unwrap_err();
        assert!(matches!(err, SketchError::FieldNotFound { ref field, .. } if field == "slug"));

        let mut b = person();
        b.with_handle_field("id");
        assert_eq!(b.build().unwrap().handle_field().unwrap().name(), "id");
    }

    #[test]
    fn duplicate_field_names_fail() {
        let mut b = person();
        b.add_data_field("name", "Again", "DoLabel", FieldCardinality::One, None);
        assert!(b.build().unwrap_err().to_string().contains("duplicate field"));
    }

    #[test]
    fn data_space_pattern_is_enforced() {
        let mut b = person();
        b.with_data_space("Bad-Space");
        assert!(b.build().unwrap_err().to_string().contains("data space"));

        let mut b = person();
        b.with_data_space("archive");
        assert_eq!(b.build().unwrap().data_space(), "archive");
    }

    #[test]
    fn fragment_stereotype_needs_origin() {
        let mut b = DtSketchBuilder::new("PersonLight");
        b.with_stereotype(Stereotype::Fragment);
        assert!(b.build().is_err());

        let mut b = DtSketchBuilder::new("PersonLight");
        b.with_fragment_of("Person");
        assert_eq!(b.build().unwrap().stereotype(), Stereotype::Fragment);
    }

    #[test]
    fn builder_can_be_built_again_after_foreign_key() {
        let mut b = person();
        let first = b.build().unwrap();
        b.add_foreign_key("carId", "Car", "DoId", FieldCardinality::Optional, "Car");
        let second = b.build().unwrap();
        assert_eq!(first.fields().len() + 1, second.fields().len());
        assert!(second.field("carId").unwrap().is_persistent());
    }

    #[test]
    fn cardinality_notation() {
        assert_eq!(FieldCardinality::parse("1"), Some(FieldCardinality::One));
        assert_eq!(FieldCardinality::parse("?"), Some(FieldCardinality::Optional));
        assert_eq!(FieldCardinality::parse("*"), Some(FieldCardinality::Many));
        assert_eq!(FieldCardinality::parse("0..1"), None);
    }
}
