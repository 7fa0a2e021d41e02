//! Loader for the model DSL text format.
//!
//! ```text
//! package shop;
//!
//! create Domain DoEmail {
//!     dataType: String;
//!     formatter: FmtDefault;
//! }
//!
//! create DtDefinition Person {
//!     id perId { label: "Id"; domain: DoId; }
//!     field email { label: "Email"; domain: DoEmail; cardinality: "1"; }
//! }
//!
//! alter Domain DoEmail { storeType: "VARCHAR(255)"; }
//! declare Formatter FmtShared;
//! ```

use std::path::Path;
use std::sync::Arc;

use miette::NamedSource;

use super::lexer::Span;
use super::parser::{self, Entry, Literal, Spanned, Verb};
use super::{Loader, LoaderError};
use crate::error::ModelResult;
use crate::grammar::{Entity, FieldKind};
use crate::raw::repository::RawRepository;
use crate::raw::{PropertyValue, RawDefinition};

/// Loads `.mdl` model DSL files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DslLoader;

impl DslLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load DSL text held in memory; `name` labels diagnostics.
    pub fn load_source(&self, name: &str, text: &str, repository: &mut RawRepository) -> ModelResult<()> {
        let source = Source { name, text };
        let statements = parser::parse(text).map_err(|err| LoaderError::Syntax {
            message: err.message,
            src: source.named(),
            span: err.span.into(),
        })?;

        let mut created = 0usize;
        let mut altered = 0usize;
        for statement in statements {
            let entity = source.entity(repository, &statement.entity)?;
            match statement.verb {
                Verb::Declare => {
                    repository.declare(statement.name.node);
                }
                Verb::Create | Verb::Alter => {
                    let raw = source.definition(
                        repository,
                        &entity,
                        &statement.name.node,
                        statement.package.as_deref(),
                        &statement.body,
                    )?;
                    if statement.verb == Verb::Create {
                        repository.add(raw)?;
                        created += 1;
                    } else {
                        repository.add_partial(raw);
                        altered += 1;
                    }
                }
            }
        }

        tracing::debug!(source = %name, created, altered, "model source loaded");
        Ok(())
    }
}

impl Loader for DslLoader {
    fn name(&self) -> &str {
        "dsl"
    }

    fn load(&self, locator: &str, repository: &mut RawRepository) -> ModelResult<()> {
        let text = std::fs::read_to_string(Path::new(locator)).map_err(|source| LoaderError::Io {
            path: locator.into(),
            source,
        })?;
        self.load_source(locator, &text, repository)
    }
}

/// One source text being turned into raw definitions.
struct Source<'a> {
    name: &'a str,
    text: &'a str,
}

impl Source<'_> {
    fn named(&self) -> NamedSource<String> {
        NamedSource::new(self.name, self.text.to_string())
    }

    fn entity(&self, repository: &RawRepository, name: &Spanned<String>) -> Result<Arc<Entity>, LoaderError> {
        repository
            .entity(&name.node)
            .cloned()
            .ok_or_else(|| LoaderError::UnknownEntity {
                entity: name.node.clone(),
                src: self.named(),
                span: name.span.into(),
            })
    }

    fn unknown_field(&self, entity: &Entity, field: &str, span: Span) -> LoaderError {
        LoaderError::UnknownField {
            entity: entity.name().to_string(),
            field: field.to_string(),
            src: self.named(),
            span: span.into(),
        }
    }

    fn definition(
        &self,
        repository: &RawRepository,
        entity: &Arc<Entity>,
        name: &str,
        package: Option<&str>,
        body: &[Entry],
    ) -> Result<RawDefinition, LoaderError> {
        let mut builder = RawDefinition::builder(name, entity).with_package_opt(package);

        for entry in body {
            builder = match entry {
                Entry::Property { field, value } => {
                    if !entity.has_field(&field.node) {
                        return Err(self.unknown_field(entity, &field.node, field.span));
                    }
                    let value = match &value.node {
                        Literal::String(s) => PropertyValue::String(s.clone()),
                        Literal::Integer(n) => PropertyValue::Integer(*n),
                        Literal::Boolean(b) => PropertyValue::Boolean(*b),
                    };
                    builder.add_property(&field.node, value)
                }
                Entry::Links { field, targets } => {
                    if !entity.has_field(&field.node) {
                        return Err(self.unknown_field(entity, &field.node, field.span));
                    }
                    builder.add_all_links(
                        &field.node,
                        targets.iter().map(|t| t.node.as_str().into()),
                    )
                }
                Entry::Child { head, name, body } => {
                    // `head` is either the child field or the child entity
                    let field = entity
                        .field(&head.node)
                        .filter(|f| matches!(f.kind, FieldKind::Child { .. }))
                        .or_else(|| entity.child_field_for(&head.node))
                        .ok_or_else(|| self.unknown_field(entity, &head.node, head.span))?;
                    let FieldKind::Child { target } = &field.kind else {
                        return Err(self.unknown_field(entity, &head.node, head.span));
                    };
                    let child_entity = repository
                        .entity(target)
                        .cloned()
                        .ok_or_else(|| LoaderError::UnknownEntity {
                            entity: target.clone(),
                            src: self.named(),
                            span: head.span.into(),
                        })?;
                    let child =
                        self.definition(repository, &child_entity, &name.node, package, body)?;
                    builder.add_child(&field.name, child)
                }
            };
        }
        Ok(builder.build())
    }
}
