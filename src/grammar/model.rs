//! The built-in metamodel grammar: domains, entity definitions, fragments
//! and associations.
//!
//! Field names are exposed as constants so loaders, factories and tests
//! agree on spelling. [`ModelEntity`] is the closed set of entity kinds the
//! model sketch factory dispatches on.

use std::fmt;
use std::sync::Arc;

use super::{Cardinality, Entity, Grammar, PropertyType};
use crate::raw::RawDefinition;

pub const DATA_TYPE: &str = "DataType";
pub const CONSTRAINT: &str = "Constraint";
pub const FORMATTER: &str = "Formatter";
pub const DOMAIN: &str = "Domain";
pub const ID_FIELD: &str = "IdField";
pub const DATA_FIELD: &str = "DataField";
pub const COMPUTED_FIELD: &str = "ComputedField";
pub const ALIAS_FIELD: &str = "AliasField";
pub const DT_DEFINITION: &str = "DtDefinition";
pub const FRAGMENT: &str = "Fragment";
pub const ASSOCIATION: &str = "Association";
pub const ASSOCIATION_NN: &str = "AssociationNN";

/// Marker data type selecting the DataObject domain scope.
pub const DT_OBJECT: &str = "DtObject";
/// Marker data type selecting the ValueObject domain scope.
pub const VALUE_OBJECT: &str = "ValueObject";

/// Primitive data types provided as root definitions.
pub const PRIMITIVES: [&str; 9] = [
    "String",
    "Integer",
    "Long",
    "Double",
    "BigDecimal",
    "Boolean",
    "LocalDate",
    "Instant",
    "DataStream",
];

// Field names shared across entities.
pub const CLASS_NAME: &str = "className";
pub const ARGS: &str = "args";
pub const MSG: &str = "msg";
pub const DATA_TYPE_LINK: &str = "dataType";
pub const FORMATTER_LINK: &str = "formatter";
pub const CONSTRAINT_LINK: &str = "constraint";
pub const TYPE: &str = "TYPE";
pub const STORE_TYPE: &str = "storeType";
pub const MULTIPLE: &str = "multiple";
pub const LABEL: &str = "label";
pub const CARDINALITY: &str = "cardinality";
pub const PERSISTENT: &str = "persistent";
pub const EXPRESSION: &str = "expression";
pub const DOMAIN_LINK: &str = "domain";
pub const STEREOTYPE: &str = "stereotype";
pub const DATA_SPACE: &str = "dataSpace";
pub const SORT_FIELD: &str = "sortField";
pub const DISPLAY_FIELD: &str = "displayField";
pub const HANDLE_FIELD: &str = "handleField";
pub const ID_CHILDREN: &str = "id";
pub const FIELD_CHILDREN: &str = "field";
pub const COMPUTED_CHILDREN: &str = "computed";
pub const ALIAS_CHILDREN: &str = "alias";
pub const FROM: &str = "from";
pub const DT_DEFINITION_A: &str = "dtDefinitionA";
pub const DT_DEFINITION_B: &str = "dtDefinitionB";
pub const ASSOCIATION_TYPE: &str = "type";
pub const MULTIPLICITY_A: &str = "multiplicityA";
pub const MULTIPLICITY_B: &str = "multiplicityB";
pub const NAVIGABILITY_A: &str = "navigabilityA";
pub const NAVIGABILITY_B: &str = "navigabilityB";
pub const ROLE_A: &str = "roleA";
pub const ROLE_B: &str = "roleB";
pub const LABEL_A: &str = "labelA";
pub const LABEL_B: &str = "labelB";
pub const FK_FIELD_NAME: &str = "fkFieldName";
pub const TABLE_NAME: &str = "tableName";

/// The closed set of entity kinds in the metamodel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelEntity {
    DataType,
    Constraint,
    Formatter,
    Domain,
    IdField,
    DataField,
    ComputedField,
    AliasField,
    DtDefinition,
    Fragment,
    Association,
    AssociationNN,
}

impl ModelEntity {
    pub const ALL: [ModelEntity; 12] = [
        Self::DataType,
        Self::Constraint,
        Self::Formatter,
        Self::Domain,
        Self::IdField,
        Self::DataField,
        Self::ComputedField,
        Self::AliasField,
        Self::DtDefinition,
        Self::Fragment,
        Self::Association,
        Self::AssociationNN,
    ];

    /// Identify an entity by name.
    pub fn from_entity(entity: &Entity) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == entity.name())
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::DataType => DATA_TYPE,
            Self::Constraint => CONSTRAINT,
            Self::Formatter => FORMATTER,
            Self::Domain => DOMAIN,
            Self::IdField => ID_FIELD,
            Self::DataField => DATA_FIELD,
            Self::ComputedField => COMPUTED_FIELD,
            Self::AliasField => ALIAS_FIELD,
            Self::DtDefinition => DT_DEFINITION,
            Self::Fragment => FRAGMENT,
            Self::Association => ASSOCIATION,
            Self::AssociationNN => ASSOCIATION_NN,
        }
    }

    /// Entity kinds that only appear nested inside another definition.
    pub fn is_child_only(self) -> bool {
        matches!(
            self,
            Self::IdField | Self::DataField | Self::ComputedField | Self::AliasField
        )
    }
}

impl fmt::Display for ModelEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the metamodel grammar with its provided root definitions.
pub fn model_grammar() -> Grammar {
    use Cardinality::{Many, One, Optional};
    use PropertyType::{Boolean, String};

    let data_type = Entity::builder(DATA_TYPE).provided().build();

    let constraint = Entity::builder(CONSTRAINT)
        .property(CLASS_NAME, String, One)
        .property(ARGS, String, Optional)
        .property(MSG, String, Optional)
        .build();

    let formatter = Entity::builder(FORMATTER)
        .property(CLASS_NAME, String, One)
        .property(ARGS, String, Optional)
        .build();

    let domain = Entity::builder(DOMAIN)
        .link(DATA_TYPE_LINK, DATA_TYPE, One)
        .link(FORMATTER_LINK, FORMATTER, Optional)
        .link(CONSTRAINT_LINK, CONSTRAINT, Many)
        .property(TYPE, String, Optional)
        .property(STORE_TYPE, String, Optional)
        .property(MULTIPLE, Boolean, Optional)
        .build();

    let id_field = Entity::builder(ID_FIELD)
        .property(LABEL, String, One)
        .link(DOMAIN_LINK, DOMAIN, One)
        .build();

    let data_field = Entity::builder(DATA_FIELD)
        .property(LABEL, String, One)
        .property(CARDINALITY, String, Optional)
        .property(PERSISTENT, Boolean, Optional)
        .link(DOMAIN_LINK, DOMAIN, One)
        .build();

    let computed_field = Entity::builder(COMPUTED_FIELD)
        .property(LABEL, String, One)
        .property(CARDINALITY, String, Optional)
        .property(EXPRESSION, String, One)
        .property(PERSISTENT, Boolean, Optional)
        .link(DOMAIN_LINK, DOMAIN, One)
        .build();

    let alias_field = Entity::builder(ALIAS_FIELD)
        .property(LABEL, String, Optional)
        .property(CARDINALITY, String, Optional)
        .build();

    let dt_definition = Entity::builder(DT_DEFINITION)
        .property(STEREOTYPE, String, Optional)
        .property(DATA_SPACE, String, Optional)
        .property(SORT_FIELD, String, Optional)
        .property(DISPLAY_FIELD, String, Optional)
        .property(HANDLE_FIELD, String, Optional)
        .child(ID_CHILDREN, ID_FIELD, Many)
        .child(FIELD_CHILDREN, DATA_FIELD, Many)
        .child(COMPUTED_CHILDREN, COMPUTED_FIELD, Many)
        .build();

    let fragment = Entity::builder(FRAGMENT)
        .link(FROM, DT_DEFINITION, One)
        .property(DATA_SPACE, String, Optional)
        .property(SORT_FIELD, String, Optional)
        .property(DISPLAY_FIELD, String, Optional)
        .property(HANDLE_FIELD, String, Optional)
        .child(ALIAS_CHILDREN, ALIAS_FIELD, Many)
        .child(FIELD_CHILDREN, DATA_FIELD, Many)
        .child(COMPUTED_CHILDREN, COMPUTED_FIELD, Many)
        .build();

    let association = Entity::builder(ASSOCIATION)
        .link(DT_DEFINITION_A, DT_DEFINITION, One)
        .link(DT_DEFINITION_B, DT_DEFINITION, One)
        .property(ASSOCIATION_TYPE, String, Optional)
        .property(MULTIPLICITY_A, String, Optional)
        .property(MULTIPLICITY_B, String, Optional)
        .property(NAVIGABILITY_A, Boolean, Optional)
        .property(NAVIGABILITY_B, Boolean, Optional)
        .property(ROLE_A, String, Optional)
        .property(ROLE_B, String, Optional)
        .property(LABEL_A, String, Optional)
        .property(LABEL_B, String, Optional)
        .property(FK_FIELD_NAME, String, Optional)
        .build();

    let association_nn = Entity::builder(ASSOCIATION_NN)
        .link(DT_DEFINITION_A, DT_DEFINITION, One)
        .link(DT_DEFINITION_B, DT_DEFINITION, One)
        .property(TABLE_NAME, String, One)
        .property(NAVIGABILITY_A, Boolean, Optional)
        .property(NAVIGABILITY_B, Boolean, Optional)
        .property(ROLE_A, String, Optional)
        .property(ROLE_B, String, Optional)
        .property(LABEL_A, String, Optional)
        .property(LABEL_B, String, Optional)
        .build();

    let mut grammar = Grammar::new();
    for root in PRIMITIVES.iter().chain([DT_OBJECT, VALUE_OBJECT].iter()) {
        grammar = grammar.with_root(RawDefinition::builder(*root, &data_type).build());
    }

    [
        data_type,
        constraint,
        formatter,
        domain,
        id_field,
        data_field,
        computed_field,
        alias_field,
        dt_definition,
        fragment,
        association,
        association_nn,
    ]
    .into_iter()
    .fold(grammar, |grammar, entity: Arc<Entity>| grammar.with_entity(entity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_model_entity_is_declared() {
        let grammar = model_grammar();
        for kind in ModelEntity::ALL {
            let entity = grammar.entity(kind.name()).unwrap();
            assert_eq!(ModelEntity::from_entity(entity), Some(kind));
        }
    }

    #[test]
    fn roots_are_provided_data_types() {
        let grammar = model_grammar();
        let roots = grammar.root_definitions();
        assert_eq!(roots.len(), PRIMITIVES.len() + 2);
        assert!(roots.iter().all(|r| r.entity().is_provided()));
        assert!(roots.iter().any(|r| r.key().name() == DT_OBJECT));
        assert!(roots.iter().any(|r| r.key().name() == "String"));
    }

    #[test]
    fn domain_requires_data_type() {
        let grammar = model_grammar();
        let domain = grammar.entity(DOMAIN).unwrap();
        let required: Vec<_> = domain.required_fields().collect();
        assert_eq!(required, vec![DATA_TYPE_LINK]);
    }

    #[test]
    fn field_kinds_are_child_only() {
        assert!(ModelEntity::IdField.is_child_only());
        assert!(!ModelEntity::DtDefinition.is_child_only());
    }
}
