//! Entity definition and fragment arms of the model factory.
//!
//! Both produce an open [`DtSketchBuilder`] rather than a sketch: the builder
//! is built once here so that invariant violations are reported against the
//! defining raw, then stays on the workbench until freeze.

use crate::error::{ModelResult, SketchError};
use crate::grammar::model;
use crate::notebook::Workbench;
use crate::raw::RawDefinition;
use crate::sketch::{Draft, DtField, DtSketchBuilder, FieldCardinality, SketchKind, Stereotype};

use super::{required_link, required_string};

pub fn create_dt_definition(bench: &Workbench, raw: &RawDefinition) -> ModelResult<Draft> {
    let key = raw.key().name();
    let mut builder = DtSketchBuilder::new(key);
    builder.with_package(raw.package().map(str::to_string));

    if let Some(stereotype) = raw.string(model::STEREOTYPE) {
        let stereotype = Stereotype::parse(stereotype).ok_or_else(|| {
            SketchError::invariant(key, format!("unknown stereotype \"{stereotype}\""))
        })?;
        builder.with_stereotype(stereotype);
    }
    if let Some(data_space) = raw.string(model::DATA_SPACE) {
        builder.with_data_space(data_space);
    }

    for id in raw.children_of(model::ID_CHILDREN) {
        let domain = field_domain(bench, id)?;
        builder.add_id_field(id.key().name(), required_string(id, model::LABEL)?, domain);
    }
    add_data_and_computed_fields(bench, raw, &mut builder)?;

    if let Some(field) = raw.string(model::SORT_FIELD) {
        builder.with_sort_field(field);
    }
    if let Some(field) = raw.string(model::DISPLAY_FIELD) {
        builder.with_display_field(field);
    }
    if let Some(field) = raw.string(model::HANDLE_FIELD) {
        builder.with_handle_field(field);
    }

    builder.build()?;
    Ok(Draft::EntityDefinition(builder))
}

/// Build a fragment of the entity definition named by `from`.
///
/// Aliases re-expose origin fields as non-persistent data fields, except an
/// alias of the origin identifier, which becomes the back-reference foreign
/// key. Without such an alias, a foreign key named after the origin
/// identifier is appended after the fragment's own fields.
pub fn create_fragment(bench: &Workbench, raw: &RawDefinition) -> ModelResult<Draft> {
    let key = raw.key().name();
    let origin_name = required_link(raw, model::FROM)?;
    let origin = bench.entity_definition(origin_name)?;

    let mut builder = DtSketchBuilder::new(key);
    builder
        .with_package(raw.package().map(str::to_string))
        .with_fragment_of(origin_name)
        .with_data_space(raw.string(model::DATA_SPACE).unwrap_or(origin.data_space()));

    let mut back_reference = false;
    for alias in raw.children_of(model::ALIAS_CHILDREN) {
        let name = alias.key().name();
        let field = origin.field(name).ok_or_else(|| SketchError::FieldNotFound {
            key: origin_name.to_string(),
            field: name.to_string(),
        })?;
        let label = alias.string(model::LABEL).unwrap_or(field.label());
        let cardinality = cardinality(alias, field.cardinality())?;
        if field.is_id() {
            builder.add_foreign_key(name, label, field.domain(), cardinality, origin_name);
            back_reference = true;
        } else {
            builder.add_data_field(name, label, field.domain(), cardinality, Some(false));
        }
    }
    add_data_and_computed_fields(bench, raw, &mut builder)?;

    if !back_reference {
        if let Some(id) = origin.id_field() {
            builder.add_foreign_key(
                id.name(),
                id.label(),
                id.domain(),
                FieldCardinality::One,
                origin_name,
            );
        }
    }

    // inherited selections apply only to fields the fragment ends up with
    let selections = [
        (model::SORT_FIELD, origin.sort_field()),
        (model::DISPLAY_FIELD, origin.display_field()),
        (model::HANDLE_FIELD, origin.handle_field()),
    ];
    for (property, inherited) in selections {
        let selected = match raw.string(property) {
            Some(field) => Some(field),
            None => inherited
                .map(DtField::name)
                .filter(|name| builder.has_field(name)),
        };
        let Some(field) = selected else { continue };
        match property {
            model::SORT_FIELD => builder.with_sort_field(field),
            model::DISPLAY_FIELD => builder.with_display_field(field),
            _ => builder.with_handle_field(field),
        };
    }

    builder.build()?;
    Ok(Draft::EntityDefinition(builder))
}

fn add_data_and_computed_fields(
    bench: &Workbench,
    raw: &RawDefinition,
    builder: &mut DtSketchBuilder,
) -> ModelResult<()> {
    for field in raw.children_of(model::FIELD_CHILDREN) {
        let domain = field_domain(bench, field)?;
        builder.add_data_field(
            field.key().name(),
            required_string(field, model::LABEL)?,
            domain,
            cardinality(field, FieldCardinality::Optional)?,
            field.boolean(model::PERSISTENT),
        );
    }

    for computed in raw.children_of(model::COMPUTED_CHILDREN) {
        if computed.boolean(model::PERSISTENT) == Some(true) {
            return Err(SketchError::invariant(
                raw.key().name(),
                format!("computed field \"{}\" cannot be persistent", computed.key()),
            )
            .into());
        }
        let domain = field_domain(bench, computed)?;
        builder.add_computed_field(
            computed.key().name(),
            required_string(computed, model::LABEL)?,
            domain,
            cardinality(computed, FieldCardinality::Optional)?,
            required_string(computed, model::EXPRESSION)?,
        );
    }
    Ok(())
}

/// The domain of a field child, checked to be a domain.
fn field_domain<'a>(bench: &Workbench, field: &'a RawDefinition) -> ModelResult<&'a str> {
    let domain = required_link(field, model::DOMAIN_LINK)?;
    bench.resolve(domain, SketchKind::Domain)?;
    Ok(domain)
}

fn cardinality(field: &RawDefinition, default: FieldCardinality) -> Result<FieldCardinality, SketchError> {
    match field.string(model::CARDINALITY) {
        None => Ok(default),
        Some(s) => FieldCardinality::parse(s).ok_or_else(|| {
            SketchError::invariant(
                field.key().name(),
                format!("cardinality \"{s}\" must be one of 1, ?, *"),
            )
        }),
    }
}
