//! Association arms of the model factory.
//!
//! A simple association is one-to-many: the single-valued end is the
//! *primary* node and the many-valued end receives a foreign key towards the
//! primary identifier. That foreign key is added to the foreign end's open
//! builder on the workbench, which is why the foreign end must be defined in
//! the same build.

use crate::error::{ModelResult, SketchError};
use crate::grammar::model;
use crate::notebook::Workbench;
use crate::raw::RawDefinition;
use crate::sketch::{
    AssociationNode, AssociationSketch, Draft, FieldCardinality, Multiplicity, NnAssociation,
    Side, SimpleAssociation, Sketch,
};

use super::{required_link, required_string};

/// Expand a `type` shorthand into `(multiplicityA, multiplicityB)`.
fn shorthand(s: &str) -> Option<(Multiplicity, Multiplicity)> {
    match s {
        "*>1" => Some((Multiplicity::ZeroOrMany, Multiplicity::One)),
        "*>?" => Some((Multiplicity::ZeroOrMany, Multiplicity::ZeroOrOne)),
        "*>*" => Some((Multiplicity::ZeroOrMany, Multiplicity::ZeroOrMany)),
        _ => None,
    }
}

pub fn create_simple(bench: &mut Workbench, raw: &RawDefinition) -> ModelResult<Draft> {
    let key = raw.key().name();
    let dt_a = required_link(raw, model::DT_DEFINITION_A)?;
    let dt_b = required_link(raw, model::DT_DEFINITION_B)?;

    let (multiplicity_a, multiplicity_b, navigable_a, navigable_b) =
        match raw.string(model::ASSOCIATION_TYPE) {
            Some(ty) => {
                if raw.is_populated(model::MULTIPLICITY_A) || raw.is_populated(model::MULTIPLICITY_B) {
                    return Err(SketchError::invariant(
                        key,
                        "type and explicit multiplicities are mutually exclusive",
                    )
                    .into());
                }
                let (a, b) = shorthand(ty).ok_or_else(|| {
                    SketchError::invariant(key, format!("type \"{ty}\" must be one of *>1, *>?, *>*"))
                })?;
                (
                    a,
                    b,
                    raw.boolean(model::NAVIGABILITY_A).unwrap_or(false),
                    raw.boolean(model::NAVIGABILITY_B).unwrap_or(true),
                )
            }
            None => (
                multiplicity(raw, model::MULTIPLICITY_A)?,
                multiplicity(raw, model::MULTIPLICITY_B)?,
                navigability(raw, model::NAVIGABILITY_A)?,
                navigability(raw, model::NAVIGABILITY_B)?,
            ),
        };

    match (multiplicity_a.is_many(), multiplicity_b.is_many()) {
        (true, true) => {
            return Err(SketchError::invariant(
                key,
                "both ends are multiple: use the Many-to-Many declaration (AssociationNN)",
            )
            .into());
        }
        (false, false) => {
            return Err(SketchError::invariant(
                key,
                "one-to-one associations are forbidden: one end must be multiple",
            )
            .into());
        }
        _ => {}
    }

    let (role_a, role_b) = roles(raw, dt_a, dt_b)?;
    let node_a = node(raw, dt_a, role_a, model::LABEL_A, navigable_a, multiplicity_a);
    let node_b = node(raw, dt_b, role_b, model::LABEL_B, navigable_b, multiplicity_b);
    let primary = if multiplicity_a.is_many() { Side::B } else { Side::A };

    let mut association = SimpleAssociation {
        name: key.to_string(),
        package: raw.package().map(str::to_string),
        node_a,
        node_b,
        primary,
        fk_field_name: String::new(),
    };

    let primary_node = association.primary_node();
    let (fk_name, fk_domain) = {
        let primary_dt = bench.entity_definition(&primary_node.entity_definition)?;
        let id = primary_dt.id_field().ok_or_else(|| {
            SketchError::invariant(
                key,
                format!(
                    "primary entity definition \"{}\" has no identifier field",
                    primary_dt.name()
                ),
            )
        })?;
        let fk_name = raw
            .string(model::FK_FIELD_NAME)
            .unwrap_or(id.name())
            .to_string();
        (fk_name, id.domain().to_string())
    };
    let fk_label = primary_node.label.clone();
    let fk_target = primary_node.entity_definition.clone();
    let fk_cardinality = if primary_node.multiplicity.is_not_null() {
        FieldCardinality::One
    } else {
        FieldCardinality::Optional
    };

    let foreign = bench.entity_builder_mut(&association.foreign_node().entity_definition)?;
    if foreign.has_field(&fk_name) {
        return Err(SketchError::invariant(
            key,
            format!(
                "foreign key \"{fk_name}\" already exists on \"{}\"; set fkFieldName",
                foreign.name()
            ),
        )
        .into());
    }
    foreign.add_foreign_key(&fk_name, &fk_label, &fk_domain, fk_cardinality, &fk_target);

    tracing::debug!(
        association = %key,
        foreign = %association.foreign_node().entity_definition,
        fk = %fk_name,
        "foreign key contributed"
    );
    association.fk_field_name = fk_name;
    Ok(Sketch::Association(AssociationSketch::Simple(association)).into())
}

pub fn create_many_to_many(bench: &mut Workbench, raw: &RawDefinition) -> ModelResult<Draft> {
    let key = raw.key().name();
    let dt_a = required_link(raw, model::DT_DEFINITION_A)?;
    let dt_b = required_link(raw, model::DT_DEFINITION_B)?;
    bench.entity_definition(dt_a)?;
    bench.entity_definition(dt_b)?;

    let table_name = required_string(raw, model::TABLE_NAME)?.trim();
    if table_name.is_empty() {
        return Err(SketchError::invariant(key, "tableName must not be empty").into());
    }

    let (role_a, role_b) = roles(raw, dt_a, dt_b)?;
    let node_a = node(
        raw,
        dt_a,
        role_a,
        model::LABEL_A,
        raw.boolean(model::NAVIGABILITY_A).unwrap_or(true),
        Multiplicity::ZeroOrMany,
    );
    let node_b = node(
        raw,
        dt_b,
        role_b,
        model::LABEL_B,
        raw.boolean(model::NAVIGABILITY_B).unwrap_or(true),
        Multiplicity::ZeroOrMany,
    );

    Ok(Sketch::Association(AssociationSketch::ManyToMany(NnAssociation {
        name: key.to_string(),
        package: raw.package().map(str::to_string),
        node_a,
        node_b,
        table_name: table_name.to_string(),
    }))
    .into())
}

/// Roles of both ends; a self-reference needs explicit, distinct roles.
fn roles<'a>(raw: &'a RawDefinition, dt_a: &'a str, dt_b: &'a str) -> Result<(&'a str, &'a str), SketchError> {
    let role_a = raw.string(model::ROLE_A);
    let role_b = raw.string(model::ROLE_B);
    if dt_a == dt_b {
        match (role_a, role_b) {
            (Some(a), Some(b)) if a != b => {}
            _ => {
                return Err(SketchError::invariant(
                    raw.key().name(),
                    format!("self-referencing association on \"{dt_a}\" requires distinct roleA and roleB"),
                ));
            }
        }
    }
    Ok((role_a.unwrap_or(dt_a), role_b.unwrap_or(dt_b)))
}

fn node(
    raw: &RawDefinition,
    entity_definition: &str,
    role: &str,
    label_field: &str,
    navigable: bool,
    multiplicity: Multiplicity,
) -> AssociationNode {
    AssociationNode {
        entity_definition: entity_definition.to_string(),
        navigable,
        role: role.to_string(),
        label: raw.string(label_field).unwrap_or(role).to_string(),
        multiplicity,
    }
}

fn multiplicity(raw: &RawDefinition, field: &str) -> Result<Multiplicity, SketchError> {
    let value = raw.string(field).ok_or_else(|| {
        SketchError::invariant(
            raw.key().name(),
            format!("{field} is required when no type shorthand is given"),
        )
    })?;
    Multiplicity::parse(value).ok_or_else(|| {
        SketchError::invariant(
            raw.key().name(),
            format!("{field} \"{value}\" must be one of 0..1, 1..1, 0..*, 1..*"),
        )
    })
}

fn navigability(raw: &RawDefinition, field: &str) -> Result<bool, SketchError> {
    raw.boolean(field).ok_or_else(|| {
        SketchError::invariant(
            raw.key().name(),
            format!("{field} is required when no type shorthand is given"),
        )
    })
}
