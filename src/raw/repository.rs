//! Raw repository: the ordered keyed store loaders write into.
//!
//! The [`RawRepository`] holds whole raw definitions by key, a queue of
//! partials merged at solve time, and names declared as satisfied
//! elsewhere. It is seeded with the grammar's provided root definitions.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::error::{ModelResult, RawError};
use crate::factory::{SketchFactory, SketchSupplier};
use crate::grammar::{Entity, Grammar};
use crate::notebook::Notebook;
use crate::raw::{resolver, validator, RawDefinition, RawKey};

/// Ordered store of raw definitions awaiting resolution.
#[derive(Debug)]
pub struct RawRepository {
    factory: Arc<dyn SketchFactory>,
    raws: IndexMap<RawKey, RawDefinition>,
    partials: Vec<RawDefinition>,
    declared: IndexSet<RawKey>,
}

impl RawRepository {
    /// Create a repository for `factory`'s grammar, seeded with its roots.
    pub fn new(factory: Arc<dyn SketchFactory>) -> Self {
        let raws = factory
            .grammar()
            .root_definitions()
            .iter()
            .map(|raw| (raw.key().clone(), raw.clone()))
            .collect();
        Self {
            factory,
            raws,
            partials: Vec::new(),
            declared: IndexSet::new(),
        }
    }

    pub fn grammar(&self) -> &Grammar {
        self.factory.grammar()
    }

    /// Look up a grammar entity by name.
    pub fn entity(&self, name: &str) -> Option<&Arc<Entity>> {
        self.grammar().entity(name)
    }

    /// Add a whole definition. Errors if the key is already taken.
    ///
    /// Auxiliary raws synthesized by the factory hook are added with it,
    /// under the same duplicate rule. Nothing is added unless every key is free.
    pub fn add(&mut self, raw: RawDefinition) -> ModelResult<()> {
        let mut pending = vec![raw];
        let mut next = 0;
        while next < pending.len() {
            let extra = self.factory.on_new_raw(&pending[next]);
            pending.extend(extra);
            next += 1;
        }

        let mut seen = IndexSet::with_capacity(pending.len());
        for raw in &pending {
            if self.raws.contains_key(raw.key()) || !seen.insert(raw.key()) {
                return Err(RawError::DuplicateDefinition {
                    key: raw.key().to_string(),
                }
                .into());
            }
        }

        for raw in pending {
            tracing::trace!(key = %raw.key(), entity = %raw.entity().name(), "raw added");
            self.raws.insert(raw.key().clone(), raw);
        }
        Ok(())
    }

    /// Queue a partial, merged into the definition with the same key at solve time.
    pub fn add_partial(&mut self, raw: RawDefinition) {
        self.partials.push(raw);
    }

    /// Mark a key as satisfied outside this repository.
    pub fn declare(&mut self, key: impl Into<RawKey>) {
        self.declared.insert(key.into());
    }

    pub fn contains(&self, key: &RawKey) -> bool {
        self.raws.contains_key(key)
    }

    pub fn is_declared(&self, key: &RawKey) -> bool {
        self.declared.contains(key)
    }

    pub fn get(&self, key: &RawKey) -> Option<&RawDefinition> {
        self.raws.get(key)
    }

    /// Number of whole definitions, roots included.
    pub fn len(&self) -> usize {
        self.raws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raws.is_empty()
    }

    pub fn partial_count(&self) -> usize {
        self.partials.len()
    }

    /// Merge partials, order and validate every definition, and return one
    /// supplier per non-provided definition in solved order.
    ///
    /// Names not defined here but present in `prior` or declared satisfy
    /// links without ordering constraints. Links are checked to sit in link
    /// fields before ordering, so a misplaced link reports a kind mismatch
    /// rather than a missing reference. The repository itself is left
    /// untouched, so solving twice yields the same result.
    pub fn solve(&self, prior: &Notebook) -> ModelResult<Vec<SketchSupplier>> {
        let merged = self.merge_partials()?;
        let raws: Vec<RawDefinition> = merged.values().cloned().collect();
        for raw in &raws {
            validator::check_link_fields(raw)?;
        }

        // a name defined here is ordered like any other, even if also declared
        let ordered = resolver::solve(&raws, |key| {
            !merged.contains_key(key) && (prior.contains(key.name()) || self.declared.contains(key))
        })?;
        for raw in &ordered {
            validator::validate(raw)?;
        }

        let suppliers: Vec<SketchSupplier> = ordered
            .into_iter()
            .filter(|raw| !raw.entity().is_provided())
            .map(|raw| SketchSupplier::new(raw.clone(), Arc::clone(&self.factory)))
            .collect();

        tracing::info!(
            raws = raws.len(),
            partials = self.partials.len(),
            suppliers = suppliers.len(),
            "repository solved"
        );
        Ok(suppliers)
    }

    /// Apply queued partials in enqueue order; each merge replaces the entry.
    fn merge_partials(&self) -> ModelResult<IndexMap<RawKey, RawDefinition>> {
        let mut merged = self.raws.clone();
        for partial in &self.partials {
            let base = merged
                .get_mut(partial.key())
                .ok_or_else(|| RawError::OrphanPartial {
                    key: partial.key().to_string(),
                })?;
            if base.entity().name() != partial.entity().name() {
                return Err(RawError::PartialEntityMismatch {
                    key: partial.key().to_string(),
                    base: base.entity().name().to_string(),
                    partial: partial.entity().name().to_string(),
                }
                .into());
            }
            *base = base.merge(partial);
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ModelError, ResolveError, ValidationError};
    use crate::factory::ModelSketchFactory;
    use crate::grammar::model;
    use crate::notebook::Workbench;

    fn repo() -> RawRepository {
        RawRepository::new(Arc::new(ModelSketchFactory::new()))
    }

    fn formatter(repo: &RawRepository, name: &str, class: &str) -> RawDefinition {
        RawDefinition::builder(name, repo.entity(model::FORMATTER).unwrap())
            .add_property(model::CLASS_NAME, class)
            .build()
    }

    fn domain(repo: &RawRepository, name: &str, data_type: &str) -> RawDefinition {
        RawDefinition::builder(name, repo.entity(model::DOMAIN).unwrap())
            .add_link(model::DATA_TYPE_LINK, data_type)
            .build()
    }

    fn keys(suppliers: &[SketchSupplier]) -> Vec<&str> {
        suppliers.iter().map(|s| s.key().name()).collect()
    }

    #[test]
    fn seeded_with_roots() {
        let repo = repo();
        assert!(repo.contains(&RawKey::from("String")));
        assert!(repo.contains(&RawKey::from(model::DT_OBJECT)));
        assert_eq!(repo.len(), model::PRIMITIVES.len() + 2);
    }

    #[test]
    fn duplicate_add_fails() {
        let mut repo = repo();
        let fmt = formatter(&repo, "FmtDefault", "fmt.Default");
        repo.add(fmt.clone()).unwrap();
        let err = repo.add(fmt).unwrap_err();
        assert!(matches!(err, ModelError::Raw(RawError::DuplicateDefinition { .. })));
    }

    #[test]
    fn adding_an_entity_definition_adds_its_domain() {
        let mut repo = repo();
        let dt = RawDefinition::builder("Person", repo.entity(model::DT_DEFINITION).unwrap()).build();
        repo.add(dt).unwrap();
        assert!(repo.contains(&RawKey::from("DoPerson")));

        let clash = domain(&repo, "DoCar", "String");
        repo.add(clash).unwrap();
        let car = RawDefinition::builder("Car", repo.entity(model::DT_DEFINITION).unwrap()).build();
        let err = repo.add(car).unwrap_err();
        assert!(err.to_string().contains("DoCar"));
        // the rejected definition is not left behind
        assert!(!repo.contains(&RawKey::from("Car")));
        let car = RawDefinition::builder("Car", repo.entity(model::DT_DEFINITION).unwrap()).build();
        assert!(repo.add(car).unwrap_err().to_string().contains("DoCar"));
    }

    #[test]
    fn solve_orders_and_skips_provided() {
        let mut repo = repo();
        let email = RawDefinition::builder("DoEmail", repo.entity(model::DOMAIN).unwrap())
            .add_link(model::DATA_TYPE_LINK, "String")
            .add_link(model::FORMATTER_LINK, "FmtDefault")
            .build();
        repo.add(email).unwrap();
        repo.add(formatter(&repo, "FmtDefault", "fmt.Default")).unwrap();

        let suppliers = repo.solve(&Notebook::new()).unwrap();
        assert_eq!(keys(&suppliers), vec!["FmtDefault", "DoEmail"]);
    }

    #[test]
    fn partials_merge_in_enqueue_order() {
        let mut repo = repo();
        repo.add(formatter(&repo, "FmtDefault", "fmt.Default")).unwrap();
        let first = RawDefinition::builder("FmtDefault", repo.entity(model::FORMATTER).unwrap())
            .add_property(model::ARGS, "first")
            .build();
        let second = RawDefinition::builder("FmtDefault", repo.entity(model::FORMATTER).unwrap())
            .add_property(model::ARGS, "second")
            .build();
        repo.add_partial(first);
        repo.add_partial(second);

        let suppliers = repo.solve(&Notebook::new()).unwrap();
        assert_eq!(suppliers[0].raw().string(model::ARGS), Some("second"));
        assert_eq!(suppliers[0].raw().string(model::CLASS_NAME), Some("fmt.Default"));
        // the stored definition is untouched
        assert!(repo.get(&RawKey::from("FmtDefault")).unwrap().string(model::ARGS).is_none());
    }

    #[test]
    fn partial_without_base_is_orphan() {
        let mut repo = repo();
        repo.add_partial(formatter(&repo, "FmtGhost", "fmt.Ghost"));
        let err = repo.solve(&Notebook::new()).unwrap_err();
        assert!(matches!(err, ModelError::Raw(RawError::OrphanPartial { .. })));
    }

    #[test]
    fn partial_of_another_entity_is_rejected() {
        let mut repo = repo();
        repo.add(formatter(&repo, "FmtDefault", "fmt.Default")).unwrap();
        repo.add_partial(domain(&repo, "FmtDefault", "String"));
        let err = repo.solve(&Notebook::new()).unwrap_err();
        assert!(matches!(err, ModelError::Raw(RawError::PartialEntityMismatch { .. })));
    }

    #[test]
    fn declared_names_satisfy_links() {
        let mut repo = repo();
        let email = RawDefinition::builder("DoEmail", repo.entity(model::DOMAIN).unwrap())
            .add_link(model::DATA_TYPE_LINK, "String")
            .add_link(model::FORMATTER_LINK, "FmtShared")
            .build();
        repo.add(email).unwrap();

        let err = repo.solve(&Notebook::new()).unwrap_err();
        assert!(matches!(err, ModelError::Resolve(ResolveError::UnresolvedReference { .. })));

        repo.declare("FmtShared");
        assert!(repo.is_declared(&RawKey::from("FmtShared")));
        assert_eq!(keys(&repo.solve(&Notebook::new()).unwrap()), vec!["DoEmail"]);
    }

    #[test]
    fn declared_name_defined_here_is_still_ordered() {
        let mut repo = repo();
        repo.declare("FmtDefault");
        let code = RawDefinition::builder("DoCode", repo.entity(model::DOMAIN).unwrap())
            .add_link(model::DATA_TYPE_LINK, "String")
            .add_link(model::FORMATTER_LINK, "FmtDefault")
            .build();
        repo.add(code).unwrap();
        repo.add(formatter(&repo, "FmtDefault", "fmt.Default")).unwrap();

        let suppliers = repo.solve(&Notebook::new()).unwrap();
        assert_eq!(keys(&suppliers), vec!["FmtDefault", "DoCode"]);
    }

    #[test]
    fn link_in_property_field_fails_before_resolution() {
        let mut repo = repo();
        let bad = RawDefinition::builder("FmtBad", repo.entity(model::FORMATTER).unwrap())
            .add_link(model::CLASS_NAME, "FmtNowhere")
            .build();
        repo.add(bad).unwrap();
        let err = repo.solve(&Notebook::new()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Validation(ValidationError::KindMismatch { ref field, .. }) if field == model::CLASS_NAME
        ));
    }

    #[test]
    fn validation_runs_after_resolution() {
        let mut repo = repo();
        let bad = RawDefinition::builder("FmtBad", repo.entity(model::FORMATTER).unwrap()).build();
        repo.add(bad).unwrap();
        let err = repo.solve(&Notebook::new()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Validation(ValidationError::MissingMandatoryProperty { .. })
        ));
    }

    #[test]
    fn prior_notebook_satisfies_links() {
        let mut first = repo();
        first.add(formatter(&first, "FmtDefault", "fmt.Default")).unwrap();
        let mut bench = Workbench::new(Notebook::new());
        for supplier in first.solve(&Notebook::new()).unwrap() {
            supplier.supply(&mut bench).unwrap();
        }
        let prior = bench.freeze().unwrap();

        let mut second = repo();
        let email = RawDefinition::builder("DoEmail", second.entity(model::DOMAIN).unwrap())
            .add_link(model::DATA_TYPE_LINK, "String")
            .add_link(model::FORMATTER_LINK, "FmtDefault")
            .build();
        second.add(email).unwrap();
        let suppliers = second.solve(&prior).unwrap();
        assert_eq!(keys(&suppliers), vec!["DoEmail"]);
    }

    #[test]
    fn solving_twice_is_idempotent() {
        let mut repo = repo();
        repo.add(domain(&repo, "DoLabel", "String")).unwrap();
        repo.add(formatter(&repo, "FmtDefault", "fmt.Default")).unwrap();
        let a = keys(&repo.solve(&Notebook::new()).unwrap()).join(",");
        let b = keys(&repo.solve(&Notebook::new()).unwrap()).join(",");
        assert_eq!(a, b);
    }
}
