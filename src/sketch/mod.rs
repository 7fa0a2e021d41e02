//! Sketches: the resolved, typed, immutable model objects.
//!
//! A sketch is produced exactly once per resolved raw definition and keyed
//! by the same name. Sketches refer to each other by name only; lookups go
//! through an explicitly passed [`crate::notebook::Notebook`].

pub mod association;
pub mod domain;
pub mod entity;
pub mod smart;

use std::fmt;

use serde::Serialize;

pub use association::{
    AssociationNode, AssociationSketch, Multiplicity, NnAssociation, Side, SimpleAssociation,
};
pub use domain::{DataType, DomainScope, DomainSketch};
pub use entity::{DtField, DtFieldKind, DtSketch, DtSketchBuilder, FieldCardinality, Stereotype};
pub use smart::{ConstraintSketch, FormatterSketch};

/// Kind of a sketch, used for typed notebook lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SketchKind {
    Constraint,
    Formatter,
    Domain,
    EntityDefinition,
    Association,
}

impl SketchKind {
    pub const ALL: [SketchKind; 5] = [
        Self::Constraint,
        Self::Formatter,
        Self::Domain,
        Self::EntityDefinition,
        Self::Association,
    ];

    /// Parse a kind from its lowercase CLI spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "constraint" => Some(Self::Constraint),
            "formatter" => Some(Self::Formatter),
            "domain" => Some(Self::Domain),
            "entity" | "entitydefinition" | "dt" => Some(Self::EntityDefinition),
            "association" => Some(Self::Association),
            _ => None,
        }
    }
}

impl fmt::Display for SketchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constraint => write!(f, "Constraint"),
            Self::Formatter => write!(f, "Formatter"),
            Self::Domain => write!(f, "Domain"),
            Self::EntityDefinition => write!(f, "EntityDefinition"),
            Self::Association => write!(f, "Association"),
        }
    }
}

/// A resolved model object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Sketch {
    Constraint(ConstraintSketch),
    Formatter(FormatterSketch),
    Domain(DomainSketch),
    EntityDefinition(DtSketch),
    Association(AssociationSketch),
}

impl Sketch {
    pub fn name(&self) -> &str {
        match self {
            Self::Constraint(s) => &s.name,
            Self::Formatter(s) => &s.name,
            Self::Domain(s) => &s.name,
            Self::EntityDefinition(s) => s.name(),
            Self::Association(s) => s.name(),
        }
    }

    pub fn kind(&self) -> SketchKind {
        match self {
            Self::Constraint(_) => SketchKind::Constraint,
            Self::Formatter(_) => SketchKind::Formatter,
            Self::Domain(_) => SketchKind::Domain,
            Self::EntityDefinition(_) => SketchKind::EntityDefinition,
            Self::Association(_) => SketchKind::Association,
        }
    }

    pub fn as_constraint(&self) -> Option<&ConstraintSketch> {
        match self {
            Self::Constraint(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_formatter(&self) -> Option<&FormatterSketch> {
        match self {
            Self::Formatter(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_domain(&self) -> Option<&DomainSketch> {
        match self {
            Self::Domain(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_entity_definition(&self) -> Option<&DtSketch> {
        match self {
            Self::EntityDefinition(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_association(&self) -> Option<&AssociationSketch> {
        match self {
            Self::Association(s) => Some(s),
            _ => None,
        }
    }
}

/// What a factory hands to the workbench for one raw definition.
///
/// Entity definitions stay as builders until the whole pass is done so that
/// later associations and fragments can still contribute foreign keys.
#[derive(Debug, Clone)]
pub enum Draft {
    Sketch(Sketch),
    EntityDefinition(DtSketchBuilder),
}

impl Draft {
    pub fn name(&self) -> &str {
        match self {
            Self::Sketch(s) => s.name(),
            Self::EntityDefinition(b) => b.name(),
        }
    }
}

impl From<Sketch> for Draft {
    fn from(sketch: Sketch) -> Self {
        Self::Sketch(sketch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parse_accepts_aliases() {
        assert_eq!(SketchKind::parse("Domain"), Some(SketchKind::Domain));
        assert_eq!(SketchKind::parse("dt"), Some(SketchKind::EntityDefinition));
        assert_eq!(SketchKind::parse("nope"), None);
    }

    #[test]
    fn sketch_reports_name_and_kind() {
        let sketch = Sketch::Formatter(FormatterSketch {
            name: "FmtDefault".into(),
            package: None,
            class_name: "fmt.Default".into(),
            args: None,
        });
        assert_eq!(sketch.name(), "FmtDefault");
        assert_eq!(sketch.kind(), SketchKind::Formatter);
        assert!(sketch.as_formatter().is_some());
        assert!(sketch.as_domain().is_none());
    }
}
