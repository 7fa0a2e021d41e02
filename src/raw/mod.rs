//! Raw definitions: unresolved, keyed drafts of model definitions.
//!
//! A [`RawDefinition`] holds property values, links to other definitions by
//! [`RawKey`] (never dereferenced here) and nested child definitions it owns.
//! Raw definitions are immutable once built; merging a partial produces a new
//! value.

pub mod repository;
pub mod resolver;
pub mod validator;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::grammar::{Entity, PropertyType};

/// Name of a raw definition, or of a reference target not seen yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawKey(String);

impl RawKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RawKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for RawKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A literal property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Boolean(bool),
    Integer(i64),
}

impl PropertyValue {
    /// The grammar type this value satisfies.
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::String(_) => PropertyType::String,
            Self::Boolean(_) => PropertyType::Boolean,
            Self::Integer(_) => PropertyType::Integer,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
        }
    }
}

/// An unresolved, immutable draft of a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDefinition {
    entity: Arc<Entity>,
    package: Option<String>,
    key: RawKey,
    properties: IndexMap<String, PropertyValue>,
    links: IndexMap<String, Vec<RawKey>>,
    children: IndexMap<String, Vec<RawDefinition>>,
}

impl RawDefinition {
    /// Start a definition of `entity` named `key`.
    pub fn builder(key: impl Into<RawKey>, entity: &Arc<Entity>) -> RawDefinitionBuilder {
        RawDefinitionBuilder {
            entity: Arc::clone(entity),
            package: None,
            key: key.into(),
            properties: IndexMap::new(),
            links: IndexMap::new(),
            children: IndexMap::new(),
        }
    }

    pub fn entity(&self) -> &Arc<Entity> {
        &self.entity
    }

    pub fn key(&self) -> &RawKey {
        &self.key
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn properties(&self) -> &IndexMap<String, PropertyValue> {
        &self.properties
    }

    pub fn links(&self) -> &IndexMap<String, Vec<RawKey>> {
        &self.links
    }

    pub fn children(&self) -> &IndexMap<String, Vec<RawDefinition>> {
        &self.children
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// String property, if present and a string.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(PropertyValue::as_str)
    }

    /// Boolean property, if present and a boolean.
    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.property(name).and_then(PropertyValue::as_bool)
    }

    /// First key of a link field.
    pub fn link(&self, name: &str) -> Option<&RawKey> {
        self.links.get(name).and_then(|keys| keys.first())
    }

    /// All keys of a link field (empty if unset).
    pub fn link_all(&self, name: &str) -> &[RawKey] {
        self.links.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All children of a child field (empty if unset).
    pub fn children_of(&self, name: &str) -> &[RawDefinition] {
        self.children.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a field of any kind carries at least one value.
    pub fn is_populated(&self, name: &str) -> bool {
        self.properties.contains_key(name)
            || self.links.get(name).is_some_and(|v| !v.is_empty())
            || self.children.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Every link of this definition and its nested children, recursively,
    /// as `(owner key, field, target)`.
    pub fn all_links(&self) -> Vec<(&RawKey, &str, &RawKey)> {
        let mut out = Vec::new();
        self.collect_links(&mut out);
        out
    }

    fn collect_links<'a>(&'a self, out: &mut Vec<(&'a RawKey, &'a str, &'a RawKey)>) {
        for (field, keys) in &self.links {
            for key in keys {
                out.push((&self.key, field.as_str(), key));
            }
        }
        for child in self.children.values().flatten() {
            child.collect_links(out);
        }
    }

    /// Merge a partial into this definition, producing a new definition.
    ///
    /// Properties: the partial's value wins. Links and children: the
    /// partial's values are appended after this definition's.
    pub fn merge(&self, partial: &RawDefinition) -> RawDefinition {
        let mut merged = self.clone();
        for (name, value) in &partial.properties {
            merged.properties.insert(name.clone(), value.clone());
        }
        for (name, keys) in &partial.links {
            merged
                .links
                .entry(name.clone())
                .or_default()
                .extend(keys.iter().cloned());
        }
        for (name, children) in &partial.children {
            merged
                .children
                .entry(name.clone())
                .or_default()
                .extend(children.iter().cloned());
        }
        merged
    }
}

/// Staged builder for [`RawDefinition`].
///
/// The builder accepts any field name; shape checks happen in the validator
/// so that loaders can report every problem against the grammar in one place.
#[derive(Debug, Clone)]
pub struct RawDefinitionBuilder {
    entity: Arc<Entity>,
    package: Option<String>,
    key: RawKey,
    properties: IndexMap<String, PropertyValue>,
    links: IndexMap<String, Vec<RawKey>>,
    children: IndexMap<String, Vec<RawDefinition>>,
}

impl RawDefinitionBuilder {
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_package_opt(mut self, package: Option<&str>) -> Self {
        self.package = package.map(str::to_string);
        self
    }

    pub fn add_property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn add_link(mut self, name: &str, key: impl Into<RawKey>) -> Self {
        self.links
            .entry(name.to_string())
            .or_default()
            .push(key.into());
        self
    }

    pub fn add_all_links(mut self, name: &str, keys: impl IntoIterator<Item = RawKey>) -> Self {
        self.links.entry(name.to_string()).or_default().extend(keys);
        self
    }

    pub fn add_child(mut self, name: &str, child: RawDefinition) -> Self {
        self.children
            .entry(name.to_string())
            .or_default()
            .push(child);
        self
    }

    pub fn build(self) -> RawDefinition {
        RawDefinition {
            entity: self.entity,
            package: self.package,
            key: self.key,
            properties: self.properties,
            links: self.links,
            children: self.children,
        }
    }
}
