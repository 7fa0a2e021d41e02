//! Loaders: turn external resources into raw definitions.
//!
//! A [`Loader`] reads one resource and adds every definition it finds to a
//! [`RawRepository`], whole or as a partial. Loaders never solve.

pub mod dsl;
pub mod lexer;
pub mod parser;

use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::error::ModelResult;
use crate::raw::repository::RawRepository;

pub use dsl::DslLoader;

/// Reads one external resource into a repository.
pub trait Loader {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Parse the resource at `locator` and add its definitions to `repository`.
    fn load(&self, locator: &str, repository: &mut RawRepository) -> ModelResult<()>;
}

/// Errors raised while reading model sources.
#[derive(Debug, Error, Diagnostic)]
pub enum LoaderError {
    #[error("syntax error: {message}")]
    #[diagnostic(
        code(modelbook::loader::syntax),
        help(
            "Statements are `package <name>;`, `create <Entity> <name>` or \
             `alter <Entity> <name>` followed by a braced body, and \
             `declare <Entity> <name>;`. Body entries are `<field>: \"value\";`, \
             `<field>: Key;`, `<field>: [A, B];` or a nested `<child> <name>` block."
        )
    )]
    Syntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("failed to read model source {path}")]
    #[diagnostic(
        code(modelbook::loader::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown entity \"{entity}\"")]
    #[diagnostic(
        code(modelbook::loader::unknown_entity),
        help(
            "The grammar has no entity with this name. Built-in entities are Constraint, \
             Formatter, Domain, DtDefinition, Fragment, Association and AssociationNN."
        )
    )]
    UnknownEntity {
        entity: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("not an entity of the grammar")]
        span: SourceSpan,
    },

    #[error("{entity} has no field \"{field}\"")]
    #[diagnostic(
        code(modelbook::loader::unknown_field),
        help(
            "Check the spelling against the entity's fields. Nested blocks may be \
             introduced by the child field name (e.g. `id`, `field`) or by the child \
             entity name (e.g. `IdField`, `DataField`)."
        )
    )]
    UnknownField {
        entity: String,
        field: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("unknown field")]
        span: SourceSpan,
    },
}
