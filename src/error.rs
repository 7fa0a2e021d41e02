//! Rich diagnostic error types for the modelbook compiler.
//!
//! Each phase of a build (loading, merging, resolution, validation, sketch
//! construction, notebook lookup) has its own error enum with miette
//! `#[diagnostic]` derives. Every error is fatal: the first one aborts the
//! build and no partial notebook is published.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::loader::LoaderError;

/// Top-level error type for the modelbook compiler.
///
/// Each variant wraps a phase-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Raw(#[from] RawError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Sketch(#[from] SketchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Notebook(#[from] NotebookError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Repository errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RawError {
    #[error("duplicate definition: \"{key}\"")]
    #[diagnostic(
        code(modelbook::raw::duplicate),
        help(
            "A definition with this name was already added to the repository. \
             Rename one of them, or use `alter` to contribute to the existing one. \
             Note that every entity definition `X` implicitly declares a domain `DoX`."
        )
    )]
    DuplicateDefinition { key: String },

    #[error("partial definition targets unknown definition \"{key}\"")]
    #[diagnostic(
        code(modelbook::raw::orphan_partial),
        help("An `alter` block needs a matching `create` for the same name in one of the loaded sources.")
    )]
    OrphanPartial { key: String },

    #[error("partial definition \"{key}\" is a {partial} but the base definition is a {base}")]
    #[diagnostic(
        code(modelbook::raw::partial_mismatch),
        help("An `alter` block must use the same entity kind as the definition it extends.")
    )]
    PartialEntityMismatch {
        key: String,
        base: String,
        partial: String,
    },
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ValidationError {
    #[error("unknown property \"{property}\" on {entity} \"{key}\"")]
    #[diagnostic(
        code(modelbook::validate::unknown_property),
        help("The grammar of {entity} does not declare this field. Check the spelling against the grammar.")
    )]
    UnknownProperty {
        key: String,
        entity: String,
        property: String,
    },

    #[error("missing mandatory properties on \"{key}\": {}", .properties.join(", "))]
    #[diagnostic(
        code(modelbook::validate::missing_mandatory),
        help("These fields are required by the grammar and have no value after all `alter` blocks were merged.")
    )]
    MissingMandatoryProperty { key: String, properties: Vec<String> },

    #[error("type mismatch on \"{key}\".{property}: expected {expected}, got {actual}")]
    #[diagnostic(
        code(modelbook::validate::type_mismatch),
        help("Strings are quoted (\"text\"), booleans are bare `true`/`false`, integers are bare digits.")
    )]
    TypeMismatch {
        key: String,
        property: String,
        expected: String,
        actual: String,
    },

    #[error("field \"{field}\" on \"{key}\" is declared as a {expected}")]
    #[diagnostic(
        code(modelbook::validate::kind_mismatch),
        help("Properties take literal values, links take definition names, children take nested blocks.")
    )]
    KindMismatch {
        key: String,
        field: String,
        expected: String,
    },

    #[error("field \"{field}\" on \"{key}\" accepts a single value but got {count}")]
    #[diagnostic(
        code(modelbook::validate::too_many_values),
        help("Only fields declared with cardinality `many` accept a list.")
    )]
    TooManyValues {
        key: String,
        field: String,
        count: usize,
    },
}

// ---------------------------------------------------------------------------
// Resolution errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("unresolved reference: \"{key}\".{field} -> \"{missing}\"")]
    #[diagnostic(
        code(modelbook::resolve::unresolved),
        help(
            "No definition named \"{missing}\" was loaded and no prior notebook provides it. \
             Load the source that defines it, or `declare` it if it lives in another module."
        )
    )]
    UnresolvedReference {
        key: String,
        field: String,
        missing: String,
    },

    #[error("unresolvable definitions: {}", .remaining.join(", "))]
    #[diagnostic(
        code(modelbook::resolve::cycle),
        help(
            "These definitions depend on each other through links and none of them can be built first. \
             Break the cycle by removing one of the links."
        )
    )]
    UnresolvableGraph {
        remaining: Vec<String>,
        cycles: Vec<Vec<String>>,
    },
}

// ---------------------------------------------------------------------------
// Sketch errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SketchError {
    #[error("invalid definition \"{key}\": {rule}")]
    #[diagnostic(
        code(modelbook::sketch::invariant),
        help("The definition is structurally valid but breaks a rule of the model.")
    )]
    SemanticInvariant { key: String, rule: String },

    #[error("field \"{field}\" not found on \"{key}\"")]
    #[diagnostic(
        code(modelbook::sketch::field_not_found),
        help("Sort, display, handle and alias fields must name a field that exists on the definition.")
    )]
    FieldNotFound { key: String, field: String },

    #[error("{entity} \"{key}\" cannot be declared at top level")]
    #[diagnostic(
        code(modelbook::sketch::not_top_level),
        help("Field entities are only valid nested inside an entity definition or fragment.")
    )]
    NotTopLevel { key: String, entity: String },

    #[error("no sketch factory handles entity {entity} (definition \"{key}\")")]
    #[diagnostic(
        code(modelbook::sketch::unknown_entity),
        help("The raw definition was built against a grammar the active factory does not know.")
    )]
    UnknownEntity { key: String, entity: String },
}

impl SketchError {
    /// Shorthand for a semantic invariant violation.
    pub fn invariant(key: impl Into<String>, rule: impl Into<String>) -> Self {
        Self::SemanticInvariant {
            key: key.into(),
            rule: rule.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Notebook errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum NotebookError {
    #[error("sketch not found: \"{name}\"")]
    #[diagnostic(
        code(modelbook::notebook::not_found),
        help("No sketch with this name exists in the notebook.")
    )]
    NotFound { name: String },

    #[error("sketch \"{name}\" is a {actual}, expected a {expected}")]
    #[diagnostic(
        code(modelbook::notebook::wrong_kind),
        help("A link points at a definition of the wrong kind.")
    )]
    WrongKind {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("entity definition \"{name}\" is still open in this build")]
    #[diagnostic(
        code(modelbook::notebook::still_open),
        help("Entity definitions are frozen last. Use Workbench::entity_definition for a snapshot.")
    )]
    StillOpen { name: String },

    #[error("sketch \"{name}\" already exists in the notebook")]
    #[diagnostic(
        code(modelbook::notebook::duplicate),
        help("A definition with this name is already provided by the prior notebook.")
    )]
    Duplicate { name: String },
}

/// Convenience alias for functions returning modelbook results.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Result type for sketch construction.
pub type SketchResult<T> = std::result::Result<T, SketchError>;
