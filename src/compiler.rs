//! The compiler facade: load sources, solve, construct sketches, freeze.

use std::path::Path;
use std::sync::Arc;

use crate::config::ModelConfig;
use crate::error::ModelResult;
use crate::factory::{ModelSketchFactory, SketchFactory};
use crate::loader::{DslLoader, Loader};
use crate::notebook::{Notebook, Workbench};
use crate::raw::repository::RawRepository;

/// Drives one build: every source is loaded into a single repository, which
/// is then compiled against a prior notebook.
#[derive(Debug)]
pub struct ModelCompiler {
    repository: RawRepository,
    sources: Vec<String>,
}

impl ModelCompiler {
    /// A compiler for the built-in metamodel.
    pub fn new() -> Self {
        Self::with_factory(Arc::new(ModelSketchFactory::new()))
    }

    /// A compiler for another grammar.
    pub fn with_factory(factory: Arc<dyn SketchFactory>) -> Self {
        Self {
            repository: RawRepository::new(factory),
            sources: Vec::new(),
        }
    }

    pub fn repository(&self) -> &RawRepository {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut RawRepository {
        &mut self.repository
    }

    /// Locators loaded so far, in load order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn load(&mut self, loader: &dyn Loader, locator: &str) -> ModelResult<()> {
        tracing::debug!(loader = loader.name(), %locator, "loading");
        loader.load(locator, &mut self.repository)?;
        self.sources.push(locator.to_string());
        Ok(())
    }

    /// Load a DSL file.
    pub fn load_file(&mut self, path: &Path) -> ModelResult<()> {
        self.load(&DslLoader, &path.to_string_lossy())
    }

    /// Load DSL text held in memory.
    pub fn load_str(&mut self, name: &str, text: &str) -> ModelResult<()> {
        DslLoader.load_source(name, text, &mut self.repository)?;
        self.sources.push(name.to_string());
        Ok(())
    }

    /// Solve the repository and build a notebook on top of `prior`.
    ///
    /// The repository is not consumed; compiling twice gives equal notebooks.
    pub fn compile(&self, prior: &Notebook) -> ModelResult<Notebook> {
        tracing::info!(
            sources = self.sources.len(),
            raws = self.repository.len(),
            prior = prior.len(),
            "compile started"
        );

        let suppliers = self.repository.solve(prior)?;
        let mut bench = Workbench::new(prior.clone());
        for supplier in suppliers {
            supplier.supply(&mut bench)?;
        }
        let notebook = bench.freeze()?;

        tracing::info!(sketches = notebook.len(), "compile finished");
        Ok(notebook)
    }

    /// Load every source of `config` (relative to `base`) and compile.
    pub fn compile_config(config: &ModelConfig, base: &Path) -> ModelResult<Notebook> {
        let mut compiler = Self::new();
        for file in config.resolve_sources(base)? {
            compiler.load_file(&file)?;
        }
        tracing::info!(model = %config.model.name, "model loaded");
        compiler.compile(&Notebook::new())
    }
}

impl Default for ModelCompiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::{SketchKind, Stereotype};

    const SHOP: &str = r#"
        package shop;

        create Formatter FmtDefault { className: "fmt.Default"; }
        create Domain DoId { dataType: Long; }
        create Domain DoLabel { dataType: String; formatter: FmtDefault; }

        create DtDefinition Person {
            id perId { label: "Id"; domain: DoId; }
            field name { label: "Name"; domain: DoLabel; cardinality: "1"; }
        }
    "#;

    #[test]
    fn compile_builds_notebook() {
        let mut compiler = ModelCompiler::new();
        compiler.load_str("shop.mdl", SHOP).unwrap();
        let notebook = compiler.compile(&Notebook::new()).unwrap();

        let person = notebook.entity_definition("Person").unwrap();
        assert_eq!(person.stereotype(), Stereotype::Entity);
        assert_eq!(person.package(), Some("shop"));
        assert!(notebook.domain("DoPerson").is_ok());
        assert_eq!(notebook.get_all(SketchKind::Domain).count(), 3);
        assert_eq!(compiler.sources(), ["shop.mdl".to_string()]);
    }

    #[test]
    fn compile_is_idempotent() {
        let mut compiler = ModelCompiler::new();
        compiler.load_str("shop.mdl", SHOP).unwrap();
        let first = compiler.compile(&Notebook::new()).unwrap();
        let second = compiler.compile(&Notebook::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn second_build_links_against_prior() {
        let mut base = ModelCompiler::new();
        base.load_str("shop.mdl", SHOP).unwrap();
        let prior = base.compile(&Notebook::new()).unwrap();

        let mut next = ModelCompiler::new();
        next.load_str(
            "orders.mdl",
            r#"
            create DtDefinition Order {
                id ordId { label: "Id"; domain: DoId; }
                field buyer { label: "Buyer"; domain: DoPerson; }
            }
            "#,
        )
        .unwrap();
        let notebook = next.compile(&prior).unwrap();
        assert!(notebook.contains("Person"));
        assert!(notebook.entity_definition("Order").unwrap().field("buyer").is_some());
    }
}
