//! Constraint and formatter sketches attached to primitive domains.

use serde::Serialize;

/// A validation rule a primitive domain enforces on its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintSketch {
    pub name: String,
    pub package: Option<String>,
    pub class_name: String,
    pub args: Option<String>,
    /// Message reported when the constraint fails.
    pub msg: Option<String>,
}

/// The rendering rule of a primitive domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatterSketch {
    pub name: String,
    pub package: Option<String>,
    pub class_name: String,
    pub args: Option<String>,
}
