//! Notebook: the registry of resolved sketches.
//!
//! A [`Notebook`] is immutable once frozen and is what generators consume.
//! During a build, sketches accumulate on a [`Workbench`], which also keeps
//! entity-definition builders open by name until [`Workbench::freeze`] so that
//! associations and fragments can still contribute foreign keys to them.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{ModelResult, NotebookError, SketchError};
use crate::sketch::{
    AssociationSketch, ConstraintSketch, Draft, DtSketch, DtSketchBuilder, DomainSketch,
    FormatterSketch, Sketch, SketchKind,
};

/// Frozen registry of sketches, in construction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Notebook {
    sketches: IndexMap<String, Sketch>,
}

impl Notebook {
    /// An empty notebook, the usual prior of a first build.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sketches.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Sketch> {
        self.sketches.get(name)
    }

    /// Look up a sketch by name, failing if it is absent or of another kind.
    pub fn resolve(&self, name: &str, kind: SketchKind) -> ModelResult<&Sketch> {
        let sketch = self.sketches.get(name).ok_or_else(|| NotebookError::NotFound {
            name: name.to_string(),
        })?;
        check_kind(sketch, kind)?;
        Ok(sketch)
    }

    /// All sketches of one kind, in construction order.
    pub fn get_all(&self, kind: SketchKind) -> impl Iterator<Item = &Sketch> {
        self.sketches.values().filter(move |s| s.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sketch> {
        self.sketches.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sketches.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sketches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sketches.is_empty()
    }

    pub fn constraint(&self, name: &str) -> ModelResult<&ConstraintSketch> {
        self.typed(name, SketchKind::Constraint, Sketch::as_constraint)
    }

    pub fn formatter(&self, name: &str) -> ModelResult<&FormatterSketch> {
        self.typed(name, SketchKind::Formatter, Sketch::as_formatter)
    }

    pub fn domain(&self, name: &str) -> ModelResult<&DomainSketch> {
        self.typed(name, SketchKind::Domain, Sketch::as_domain)
    }

    pub fn entity_definition(&self, name: &str) -> ModelResult<&DtSketch> {
        self.typed(name, SketchKind::EntityDefinition, Sketch::as_entity_definition)
    }

    pub fn association(&self, name: &str) -> ModelResult<&AssociationSketch> {
        self.typed(name, SketchKind::Association, Sketch::as_association)
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        kind: SketchKind,
        pick: fn(&'a Sketch) -> Option<&'a T>,
    ) -> ModelResult<&'a T> {
        let sketch = self.resolve(name, kind)?;
        pick(sketch).ok_or_else(|| wrong_kind(sketch, kind).into())
    }
}

fn wrong_kind(sketch: &Sketch, expected: SketchKind) -> NotebookError {
    NotebookError::WrongKind {
        name: sketch.name().to_string(),
        expected: expected.to_string(),
        actual: sketch.kind().to_string(),
    }
}

fn check_kind(sketch: &Sketch, kind: SketchKind) -> Result<(), NotebookError> {
    if sketch.kind() != kind {
        return Err(wrong_kind(sketch, kind));
    }
    Ok(())
}

#[derive(Debug)]
enum Slot {
    Built(Sketch),
    Open(DtSketchBuilder),
}

/// Build-time side table: the prior notebook, finished sketches and open
/// entity-definition builders, all addressable by name.
#[derive(Debug)]
pub struct Workbench {
    prior: Notebook,
    slots: IndexMap<String, Slot>,
}

impl Workbench {
    /// Start a build on top of `prior`; its sketches are kept in the result.
    pub fn new(prior: Notebook) -> Self {
        Self {
            prior,
            slots: IndexMap::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.prior.contains(name) || self.slots.contains_key(name)
    }

    /// Look up a finished sketch of the given kind.
    ///
    /// Entity definitions still open in this pass fail with
    /// [`NotebookError::StillOpen`]; read them through
    /// [`Workbench::entity_definition`] instead.
    pub fn resolve(&self, name: &str, kind: SketchKind) -> ModelResult<&Sketch> {
        match self.slots.get(name) {
            Some(Slot::Built(sketch)) => {
                check_kind(sketch, kind)?;
                Ok(sketch)
            }
            Some(Slot::Open(_)) if kind == SketchKind::EntityDefinition => {
                Err(NotebookError::StillOpen {
                    name: name.to_string(),
                }
                .into())
            }
            Some(Slot::Open(_)) => Err(NotebookError::WrongKind {
                name: name.to_string(),
                expected: kind.to_string(),
                actual: SketchKind::EntityDefinition.to_string(),
            }
            .into()),
            None => self.prior.resolve(name, kind),
        }
    }

    /// Current state of an entity definition: the frozen sketch from the
    /// prior notebook, or a snapshot built from the open builder.
    pub fn entity_definition(&self, name: &str) -> ModelResult<Cow<'_, DtSketch>> {
        match self.slots.get(name) {
            Some(Slot::Open(builder)) => Ok(Cow::Owned(builder.build()?)),
            Some(Slot::Built(sketch)) => {
                Err(wrong_kind(sketch, SketchKind::EntityDefinition).into())
            }
            None => self.prior.entity_definition(name).map(Cow::Borrowed),
        }
    }

    /// The open builder of an entity definition of this pass.
    pub fn entity_builder_mut(&mut self, name: &str) -> ModelResult<&mut DtSketchBuilder> {
        match self.slots.get_mut(name) {
            Some(Slot::Open(builder)) => Ok(builder),
            Some(Slot::Built(sketch)) => {
                Err(wrong_kind(sketch, SketchKind::EntityDefinition).into())
            }
            None if self.prior.contains(name) => Err(SketchError::invariant(
                name,
                "entity definition is frozen in a prior notebook and cannot receive new fields",
            )
            .into()),
            None => Err(NotebookError::NotFound {
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// Register the output of a factory for one raw definition.
    pub fn accept(&mut self, draft: Draft) -> ModelResult<()> {
        let name = draft.name().to_string();
        if self.contains(&name) {
            return Err(NotebookError::Duplicate { name }.into());
        }
        tracing::debug!(%name, "sketch drafted");
        let slot = match draft {
            Draft::Sketch(sketch) => Slot::Built(sketch),
            Draft::EntityDefinition(builder) => Slot::Open(builder),
        };
        self.slots.insert(name, slot);
        Ok(())
    }

    /// Build every open entity definition and publish the notebook.
    ///
    /// Fails if a DataObject domain names an entity definition that does not
    /// exist in the result.
    pub fn freeze(self) -> ModelResult<Notebook> {
        let mut sketches = self.prior.sketches;
        for (name, slot) in self.slots {
            let sketch = match slot {
                Slot::Built(sketch) => sketch,
                Slot::Open(builder) => Sketch::EntityDefinition(builder.build()?),
            };
            sketches.insert(name, sketch);
        }

        let notebook = Notebook { sketches };
        for sketch in notebook.get_all(SketchKind::Domain) {
            let Some(domain) = sketch.as_domain() else {
                continue;
            };
            if let Some(target) = domain.entity_definition_name() {
                if notebook.entity_definition(target).is_err() {
                    return Err(SketchError::invariant(
                        domain.name.clone(),
                        format!("data object domain refers to unknown entity definition \"{target}\""),
                    )
                    .into());
                }
            }
        }

        tracing::info!(sketches = notebook.len(), "notebook frozen");
        Ok(notebook)
    }
}
