//! Domain sketches: the value space of a field.
//!
//! A domain's [`DomainScope`] is one of three mutually exclusive forms. Only
//! primitive domains carry a formatter and constraints; references to them,
//! and to the entity definition of a DataObject domain, are names resolved
//! lazily against a notebook.

use std::fmt;

use serde::Serialize;

use crate::error::{ModelResult, NotebookError};
use crate::notebook::Notebook;
use crate::sketch::{ConstraintSketch, DtSketch, FormatterSketch};

/// Primitive data types a domain can wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    String,
    Integer,
    Long,
    Double,
    BigDecimal,
    Boolean,
    LocalDate,
    Instant,
    DataStream,
}

impl DataType {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "String" => Some(Self::String),
            "Integer" => Some(Self::Integer),
            "Long" => Some(Self::Long),
            "Double" => Some(Self::Double),
            "BigDecimal" => Some(Self::BigDecimal),
            "Boolean" => Some(Self::Boolean),
            "LocalDate" => Some(Self::LocalDate),
            "Instant" => Some(Self::Instant),
            "DataStream" => Some(Self::DataStream),
            _ => None,
        }
    }

    /// Whether values of this type are numbers.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Long | Self::Double | Self::BigDecimal
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::Double => "Double",
            Self::BigDecimal => "BigDecimal",
            Self::Boolean => "Boolean",
            Self::LocalDate => "LocalDate",
            Self::Instant => "Instant",
            Self::DataStream => "DataStream",
        };
        f.write_str(name)
    }
}

/// What a domain's values are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope")]
pub enum DomainScope {
    Primitive {
        data_type: DataType,
        formatter: Option<String>,
        constraints: Vec<String>,
    },
    ValueObject {
        class_name: String,
    },
    DataObject {
        entity_definition: String,
    },
}

/// A resolved domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainSketch {
    pub name: String,
    pub package: Option<String>,
    pub scope: DomainScope,
    pub store_type: Option<String>,
    pub multiple: bool,
}

impl DomainSketch {
    pub fn is_primitive(&self) -> bool {
        matches!(self.scope, DomainScope::Primitive { .. })
    }

    /// The wrapped primitive type, for primitive domains.
    pub fn data_type(&self) -> Option<DataType> {
        match &self.scope {
            DomainScope::Primitive { data_type, .. } => Some(*data_type),
            _ => None,
        }
    }

    pub fn value_object_class_name(&self) -> Option<&str> {
        match &self.scope {
            DomainScope::ValueObject { class_name } => Some(class_name),
            _ => None,
        }
    }

    /// Name of the entity definition of a DataObject domain.
    pub fn entity_definition_name(&self) -> Option<&str> {
        match &self.scope {
            DomainScope::DataObject { entity_definition } => Some(entity_definition),
            _ => None,
        }
    }

    pub fn formatter_name(&self) -> Option<&str> {
        match &self.scope {
            DomainScope::Primitive { formatter, .. } => formatter.as_deref(),
            _ => None,
        }
    }

    /// Resolve the formatter against a notebook.
    pub fn formatter<'n>(&self, notebook: &'n Notebook) -> ModelResult<Option<&'n FormatterSketch>> {
        self.formatter_name()
            .map(|name| notebook.formatter(name))
            .transpose()
    }

    /// Resolve the constraints against a notebook, in declaration order.
    pub fn constraints<'n>(&self, notebook: &'n Notebook) -> ModelResult<Vec<&'n ConstraintSketch>> {
        match &self.scope {
            DomainScope::Primitive { constraints, .. } => constraints
                .iter()
                .map(|name| notebook.constraint(name))
                .collect(),
            _ => Ok(Vec::new()),
        }
    }

    /// Resolve the entity definition of a DataObject domain.
    pub fn entity_definition<'n>(&self, notebook: &'n Notebook) -> ModelResult<&'n DtSketch> {
        let name = self
            .entity_definition_name()
            .ok_or_else(|| NotebookError::WrongKind {
                name: self.name.clone(),
                expected: "DataObject domain".into(),
                actual: "domain of another scope".into(),
            })?;
        notebook.entity_definition(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_parse_round_trips_display() {
        for name in crate::grammar::model::PRIMITIVES {
            let ty = DataType::parse(name).unwrap();
            assert_eq!(ty.to_string(), name);
        }
        assert!(DataType::parse("DtObject").is_none());
    }

    #[test]
    fn scope_accessors_are_exclusive() {
        let domain = DomainSketch {
            name: "DoPerson".into(),
            package: None,
            scope: DomainScope::DataObject {
                entity_definition: "Person".into(),
            },
            store_type: None,
            multiple: false,
        };
        assert_eq!(domain.entity_definition_name(), Some("Person"));
        assert!(domain.data_type().is_none());
        assert!(domain.value_object_class_name().is_none());
        assert!(domain.formatter_name().is_none());
        assert!(!domain.is_primitive());
    }
}
