//! Sketch factories: grammar-aware translation of resolved raw definitions
//! into typed sketches.
//!
//! [`SketchFactory`] is the plugin seam: it owns a grammar, turns each raw
//! definition into drafts, and may synthesize auxiliary raws as definitions
//! are added. [`ModelSketchFactory`] implements it for the built-in metamodel,
//! dispatching on [`ModelEntity`] with one arm per entity kind.

pub mod association;
pub mod domain;
pub mod entity;

use std::fmt;
use std::sync::Arc;

use crate::error::{ModelResult, SketchError};
use crate::grammar::Grammar;
use crate::grammar::model::{self, ModelEntity};
use crate::notebook::Workbench;
use crate::raw::{RawDefinition, RawKey};
use crate::sketch::Draft;

// ---------------------------------------------------------------------------
// Core trait
// ---------------------------------------------------------------------------

/// Turns resolved raw definitions of one grammar into sketches.
pub trait SketchFactory: Send + Sync + fmt::Debug {
    /// The grammar raw definitions handed to this factory are checked against.
    fn grammar(&self) -> &Grammar;

    /// Create the drafts for one resolved raw definition.
    ///
    /// Everything the raw links to has already been offered to the
    /// workbench. Implementations may contribute fields to entity
    /// definitions still open on the workbench.
    fn create_sketches(&self, bench: &mut Workbench, raw: &RawDefinition) -> ModelResult<Vec<Draft>>;

    /// Auxiliary raw definitions to add alongside `raw`.
    fn on_new_raw(&self, _raw: &RawDefinition) -> Vec<RawDefinition> {
        Vec::new()
    }
}

/// Deferred construction of the sketches of one resolved raw definition.
///
/// Produced by [`crate::raw::repository::RawRepository::solve`] in solved
/// order; the caller decides when to run each one against its workbench.
#[derive(Debug, Clone)]
pub struct SketchSupplier {
    raw: RawDefinition,
    factory: Arc<dyn SketchFactory>,
}

impl SketchSupplier {
    pub(crate) fn new(raw: RawDefinition, factory: Arc<dyn SketchFactory>) -> Self {
        Self { raw, factory }
    }

    pub fn key(&self) -> &RawKey {
        self.raw.key()
    }

    pub fn raw(&self) -> &RawDefinition {
        &self.raw
    }

    /// Run the factory and register its drafts on the workbench.
    pub fn supply(self, bench: &mut Workbench) -> ModelResult<()> {
        let drafts = self.factory.create_sketches(bench, &self.raw)?;
        tracing::debug!(key = %self.raw.key(), drafts = drafts.len(), "sketches created");
        for draft in drafts {
            bench.accept(draft)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Built-in metamodel factory
// ---------------------------------------------------------------------------

/// Factory for the built-in metamodel grammar.
#[derive(Debug)]
pub struct ModelSketchFactory {
    grammar: Grammar,
}

impl ModelSketchFactory {
    pub fn new() -> Self {
        Self {
            grammar: model::model_grammar(),
        }
    }
}

impl Default for ModelSketchFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SketchFactory for ModelSketchFactory {
    fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    fn create_sketches(&self, bench: &mut Workbench, raw: &RawDefinition) -> ModelResult<Vec<Draft>> {
        let Some(kind) = ModelEntity::from_entity(raw.entity()) else {
            return Err(SketchError::UnknownEntity {
                key: raw.key().to_string(),
                entity: raw.entity().name().to_string(),
            }
            .into());
        };

        let draft = match kind {
            ModelEntity::DataType => return Ok(Vec::new()),
            ModelEntity::Constraint => domain::create_constraint(raw)?,
            ModelEntity::Formatter => domain::create_formatter(raw)?,
            ModelEntity::Domain => domain::create_domain(bench, raw)?,
            ModelEntity::DtDefinition => entity::create_dt_definition(bench, raw)?,
            ModelEntity::Fragment => entity::create_fragment(bench, raw)?,
            ModelEntity::Association => association::create_simple(bench, raw)?,
            ModelEntity::AssociationNN => association::create_many_to_many(bench, raw)?,
            ModelEntity::IdField
            | ModelEntity::DataField
            | ModelEntity::ComputedField
            | ModelEntity::AliasField => {
                return Err(SketchError::NotTopLevel {
                    key: raw.key().to_string(),
                    entity: kind.to_string(),
                }
                .into());
            }
        };
        Ok(vec![draft])
    }

    /// Every entity definition and fragment `X` gets an implicit DataObject
    /// domain `DoX`.
    fn on_new_raw(&self, raw: &RawDefinition) -> Vec<RawDefinition> {
        let is_dt = matches!(
            ModelEntity::from_entity(raw.entity()),
            Some(ModelEntity::DtDefinition | ModelEntity::Fragment)
        );
        let Some(domain) = self.grammar.entity(model::DOMAIN).filter(|_| is_dt) else {
            return Vec::new();
        };
        vec![
            RawDefinition::builder(implicit_domain_name(raw.key().name()), domain)
                .with_package_opt(raw.package())
                .add_link(model::DATA_TYPE_LINK, model::DT_OBJECT)
                .add_property(model::TYPE, raw.key().name())
                .build(),
        ]
    }
}

/// Name of the implicit DataObject domain of an entity definition.
pub fn implicit_domain_name(entity_definition: &str) -> String {
    format!("Do{entity_definition}")
}

// ---------------------------------------------------------------------------
// Shared helpers for the factory arms
// ---------------------------------------------------------------------------

/// A required string property; the validator guarantees presence, so a
/// missing value here means the raw bypassed validation.
pub(crate) fn required_string<'a>(raw: &'a RawDefinition, field: &str) -> Result<&'a str, SketchError> {
    raw.string(field)
        .ok_or_else(|| SketchError::invariant(raw.key().name(), format!("\"{field}\" is required")))
}

/// A required single link target.
pub(crate) fn required_link<'a>(raw: &'a RawDefinition, field: &str) -> Result<&'a str, SketchError> {
    raw.link(field)
        .map(RawKey::name)
        .ok_or_else(|| SketchError::invariant(raw.key().name(), format!("\"{field}\" is required")))
}
