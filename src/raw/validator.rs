//! Structural validation of raw definitions against their entity.
//!
//! Checks that every populated field is declared and of the right kind, that
//! property values have the declared type, that single-valued fields hold at
//! most one value and that required fields are populated. Recurses into
//! nested children. Link targets are the resolver's concern; cross-field
//! semantics are the sketch factory's.

use crate::error::ValidationError;
use crate::grammar::{EntityField, FieldKind};
use crate::raw::RawDefinition;

/// Result type for validation.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Validate one raw definition and all of its children.
///
/// Definitions of provided entities are accepted as-is.
pub fn validate(raw: &RawDefinition) -> ValidationResult<()> {
    if raw.entity().is_provided() {
        return Ok(());
    }

    for (name, value) in raw.properties() {
        let field = declared(raw, name)?;
        match &field.kind {
            FieldKind::Property(expected) => {
                let actual = value.property_type();
                if actual != *expected {
                    return Err(ValidationError::TypeMismatch {
                        key: raw.key().to_string(),
                        property: name.clone(),
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    });
                }
            }
            other => return Err(kind_mismatch(raw, name, other)),
        }
    }

    for (name, keys) in raw.links() {
        let field = declared(raw, name)?;
        if !matches!(field.kind, FieldKind::Link { .. }) {
            return Err(kind_mismatch(raw, name, &field.kind));
        }
        check_count(raw, field, keys.len())?;
    }

    for (name, children) in raw.children() {
        let field = declared(raw, name)?;
        let FieldKind::Child { target } = &field.kind else {
            return Err(kind_mismatch(raw, name, &field.kind));
        };
        check_count(raw, field, children.len())?;
        for child in children {
            if child.entity().name() != target {
                return Err(ValidationError::TypeMismatch {
                    key: raw.key().to_string(),
                    property: name.clone(),
                    expected: target.clone(),
                    actual: child.entity().name().to_string(),
                });
            }
            validate(child)?;
        }
    }

    let missing: Vec<String> = raw
        .entity()
        .required_fields()
        .filter(|name| !raw.is_populated(name))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingMandatoryProperty {
            key: raw.key().to_string(),
            properties: missing,
        });
    }

    Ok(())
}

/// Check only that every link sits in a declared link field, recursing into
/// children. Runs before resolution.
pub fn check_link_fields(raw: &RawDefinition) -> ValidationResult<()> {
    if raw.entity().is_provided() {
        return Ok(());
    }
    for name in raw.links().keys() {
        let field = declared(raw, name)?;
        if !matches!(field.kind, FieldKind::Link { .. }) {
            return Err(kind_mismatch(raw, name, &field.kind));
        }
    }
    for child in raw.children().values().flatten() {
        check_link_fields(child)?;
    }
    Ok(())
}

fn declared<'a>(raw: &'a RawDefinition, name: &str) -> ValidationResult<&'a EntityField> {
    raw.entity()
        .field(name)
        .ok_or_else(|| ValidationError::UnknownProperty {
            key: raw.key().to_string(),
            entity: raw.entity().name().to_string(),
            property: name.to_string(),
        })
}

fn kind_mismatch(raw: &RawDefinition, name: &str, declared: &FieldKind) -> ValidationError {
    ValidationError::KindMismatch {
        key: raw.key().to_string(),
        field: name.to_string(),
        expected: declared.describe().to_string(),
    }
}

fn check_count(raw: &RawDefinition, field: &EntityField, count: usize) -> ValidationResult<()> {
    if count > 1 && !field.cardinality.is_multiple() {
        return Err(ValidationError::TooManyValues {
            key: raw.key().to_string(),
            field: field.name.clone(),
            count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::model::{self, model_grammar};

    fn grammar() -> crate::grammar::Grammar {
        model_grammar()
    }

    #[test]
    fn valid_domain_passes() {
        let g = grammar();
        let raw = RawDefinition::builder("DoEmail", g.entity(model::DOMAIN).unwrap())
            .add_link(model::DATA_TYPE_LINK, "String")
            .add_link(model::FORMATTER_LINK, "FmtDefault")
            .build();
        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn unknown_property_is_rejected() {
        let g = grammar();
        let raw = RawDefinition::builder("DoEmail", g.entity(model::DOMAIN).unwrap())
            .add_link(model::DATA_TYPE_LINK, "String")
            .add_property("colour", "blue")
            .build();
        let err = validate(&raw).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnknownProperty { ref property, .. } if property == "colour"
        ));
    }

    #[test]
    fn missing_mandatory_names_the_field() {
        let g = grammar();
        let raw = RawDefinition::builder("DoEmail", g.entity(model::DOMAIN).unwrap()).build();
        let err = validate(&raw).unwrap_err();
        match err {
            ValidationError::MissingMandatoryProperty { key, properties } => {
                assert_eq!(key, "DoEmail");
                assert_eq!(properties, vec![model::DATA_TYPE_LINK.to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let g = grammar();
        let raw = RawDefinition::builder("DoEmail", g.entity(model::DOMAIN).unwrap())
            .add_link(model::DATA_TYPE_LINK, "String")
            .add_property(model::MULTIPLE, "yes")
            .build();
        let err = validate(&raw).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TypeMismatch { ref expected, ref actual, .. }
                if expected == "Boolean" && actual == "String"
        ));
    }

    #[test]
    fn link_in_property_field_is_a_kind_mismatch() {
        let g = grammar();
        let raw = RawDefinition::builder("DoEmail", g.entity(model::DOMAIN).unwrap())
            .add_link(model::DATA_TYPE_LINK, "String")
            .add_link(model::TYPE, "Person")
            .build();
        assert!(matches!(
            validate(&raw).unwrap_err(),
            ValidationError::KindMismatch { .. }
        ));
    }

    #[test]
    fn link_field_check_recurses_and_ignores_missing_fields() {
        let g = grammar();
        let field = RawDefinition::builder("name", g.entity(model::DATA_FIELD).unwrap())
            .add_link(model::LABEL, "DoLabel")
            .build();
        let raw = RawDefinition::builder("Person", g.entity(model::DT_DEFINITION).unwrap())
            .add_child(model::FIELD_CHILDREN, field)
            .build();
        assert!(matches!(
            check_link_fields(&raw).unwrap_err(),
            ValidationError::KindMismatch { ref key, .. } if key == "name"
        ));

        // a required field left empty is not this check's concern
        let empty = RawDefinition::builder("DoEmpty", g.entity(model::DOMAIN).unwrap()).build();
        assert!(check_link_fields(&empty).is_ok());
        assert!(validate(&empty).is_err());
    }

    #[test]
    fn single_valued_link_rejects_lists() {
        let g = grammar();
        let raw = RawDefinition::builder("DoEmail", g.entity(model::DOMAIN).unwrap())
            .add_link(model::DATA_TYPE_LINK, "String")
            .add_link(model::DATA_TYPE_LINK, "Long")
            .build();
        assert!(matches!(
            validate(&raw).unwrap_err(),
            ValidationError::TooManyValues { count: 2, .. }
        ));
    }

    #[test]
    fn children_are_validated_recursively() {
        let g = grammar();
        let field = RawDefinition::builder("name", g.entity(model::DATA_FIELD).unwrap())
            .add_link(model::DOMAIN_LINK, "DoLabel")
            .build();
        let raw = RawDefinition::builder("Person", g.entity(model::DT_DEFINITION).unwrap())
            .add_child(model::FIELD_CHILDREN, field)
            .build();
        let err = validate(&raw).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingMandatoryProperty { ref key, .. } if key == "name"
        ));
    }

    #[test]
    fn child_of_wrong_entity_is_rejected() {
        let g = grammar();
        let field = RawDefinition::builder("id", g.entity(model::ID_FIELD).unwrap())
            .add_property(model::LABEL, "Id")
            .add_link(model::DOMAIN_LINK, "DoId")
            .build();
        let raw = RawDefinition::builder("Person", g.entity(model::DT_DEFINITION).unwrap())
            .add_child(model::FIELD_CHILDREN, field)
            .build();
        assert!(matches!(
            validate(&raw).unwrap_err(),
            ValidationError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn provided_definitions_are_skipped() {
        let g = grammar();
        let raw = &g.root_definitions()[0];
        assert!(validate(raw).is_ok());
    }
}
