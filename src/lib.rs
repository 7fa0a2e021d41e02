// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # modelbook
//!
//! A metamodel compiler. Model definitions (domains, entity definitions,
//! fragments, associations, formatters, constraints) are read as untyped
//! raw definitions, resolved in dependency order and turned into typed,
//! immutable sketches collected in a notebook.
//!
//! ## Architecture
//!
//! - **Grammar** (`grammar`): entities and their fields, the schema of raw definitions
//! - **Raw layer** (`raw`): raw definitions, partial merging, repository, resolver, validator
//! - **Sketches** (`sketch`): the typed model objects
//! - **Factory** (`factory`): raw definition → sketches, semantic checks
//! - **Notebook** (`notebook`): frozen registry of sketches, plus the build workbench
//! - **Loaders** (`loader`): the `.mdl` text DSL
//! - **Compiler** (`compiler`): ties a build together
//!
//! ## Library usage
//!
//! ```no_run
//! use modelbook::compiler::ModelCompiler;
//! use modelbook::notebook::Notebook;
//!
//! let mut compiler = ModelCompiler::new();
//! compiler
//!     .load_str("shop.mdl", "create Domain DoId { dataType: Long; }")
//!     .unwrap();
//! let notebook = compiler.compile(&Notebook::new()).unwrap();
//! assert!(notebook.domain("DoId").is_ok());
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod export;
pub mod factory;
pub mod grammar;
pub mod loader;
pub mod notebook;
pub mod raw;
pub mod sketch;

pub use compiler::ModelCompiler;
pub use error::{ModelError, ModelResult};
pub use notebook::Notebook;
