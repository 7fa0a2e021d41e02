//! Association sketches between two entity definitions.

use std::fmt;

use serde::Serialize;

/// Multiplicity of one association end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Multiplicity {
    /// `0..1`
    ZeroOrOne,
    /// `1..1`
    One,
    /// `0..*`
    ZeroOrMany,
    /// `1..*`
    OneOrMany,
}

impl Multiplicity {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "0..1" => Some(Self::ZeroOrOne),
            "1..1" => Some(Self::One),
            "0..*" => Some(Self::ZeroOrMany),
            "1..*" => Some(Self::OneOrMany),
            _ => None,
        }
    }

    pub fn is_many(self) -> bool {
        matches!(self, Self::ZeroOrMany | Self::OneOrMany)
    }

    /// Whether at least one value is required.
    pub fn is_not_null(self) -> bool {
        matches!(self, Self::One | Self::OneOrMany)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroOrOne => write!(f, "0..1"),
            Self::One => write!(f, "1..1"),
            Self::ZeroOrMany => write!(f, "0..*"),
            Self::OneOrMany => write!(f, "1..*"),
        }
    }
}

/// One end of an association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociationNode {
    /// Name of the entity definition at this end.
    pub entity_definition: String,
    pub navigable: bool,
    pub role: String,
    pub label: String,
    pub multiplicity: Multiplicity,
}

/// Which end of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// A one-to-many association realised by a foreign key on the foreign end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleAssociation {
    pub name: String,
    pub package: Option<String>,
    pub node_a: AssociationNode,
    pub node_b: AssociationNode,
    /// The single-valued end whose identifier is referenced.
    pub primary: Side,
    /// Name of the foreign key field added to the foreign end.
    pub fk_field_name: String,
}

impl SimpleAssociation {
    pub fn node(&self, side: Side) -> &AssociationNode {
        match side {
            Side::A => &self.node_a,
            Side::B => &self.node_b,
        }
    }

    pub fn primary_node(&self) -> &AssociationNode {
        self.node(self.primary)
    }

    pub fn foreign_node(&self) -> &AssociationNode {
        self.node(self.primary.other())
    }
}

/// A many-to-many association realised by a join table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NnAssociation {
    pub name: String,
    pub package: Option<String>,
    pub node_a: AssociationNode,
    pub node_b: AssociationNode,
    pub table_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "association")]
pub enum AssociationSketch {
    Simple(SimpleAssociation),
    ManyToMany(NnAssociation),
}

impl AssociationSketch {
    pub fn name(&self) -> &str {
        match self {
            Self::Simple(a) => &a.name,
            Self::ManyToMany(a) => &a.name,
        }
    }

    pub fn node_a(&self) -> &AssociationNode {
        match self {
            Self::Simple(a) => &a.node_a,
            Self::ManyToMany(a) => &a.node_a,
        }
    }

    pub fn node_b(&self) -> &AssociationNode {
        match self {
            Self::Simple(a) => &a.node_b,
            Self::ManyToMany(a) => &a.node_b,
        }
    }

    pub fn as_simple(&self) -> Option<&SimpleAssociation> {
        match self {
            Self::Simple(a) => Some(a),
            Self::ManyToMany(_) => None,
        }
    }

    pub fn as_many_to_many(&self) -> Option<&NnAssociation> {
        match self {
            Self::ManyToMany(a) => Some(a),
            Self::Simple(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplicity_notation() {
        for s in ["0..1", "1..1", "0..*", "1..*"] {
            assert_eq!(Multiplicity::parse(s).unwrap().to_string(), s);
        }
        assert!(Multiplicity::parse("*").is_none());
    }

    #[test]
    fn multiplicity_predicates() {
        assert!(Multiplicity::OneOrMany.is_many());
        assert!(Multiplicity::OneOrMany.is_not_null());
        assert!(!Multiplicity::ZeroOrOne.is_many());
        assert!(!Multiplicity::ZeroOrOne.is_not_null());
    }

    #[test]
    fn side_other() {
        assert_eq!(Side::A.other(), Side::B);
        assert_eq!(Side::B.other(), Side::A);
    }
}
