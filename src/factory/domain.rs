//! Constraint, formatter and domain arms of the model factory.

use crate::error::{ModelResult, SketchError};
use crate::grammar::model;
use crate::notebook::Workbench;
use crate::raw::{RawDefinition, RawKey};
use crate::sketch::{
    ConstraintSketch, DataType, DomainScope, DomainSketch, Draft, FormatterSketch, Sketch,
    SketchKind,
};

use super::{required_link, required_string};

pub fn create_constraint(raw: &RawDefinition) -> ModelResult<Draft> {
    Ok(Sketch::Constraint(ConstraintSketch {
        name: raw.key().name().to_string(),
        package: raw.package().map(str::to_string),
        class_name: required_string(raw, model::CLASS_NAME)?.to_string(),
        args: raw.string(model::ARGS).map(str::to_string),
        msg: raw.string(model::MSG).map(str::to_string),
    })
    .into())
}

pub fn create_formatter(raw: &RawDefinition) -> ModelResult<Draft> {
    Ok(Sketch::Formatter(FormatterSketch {
        name: raw.key().name().to_string(),
        package: raw.package().map(str::to_string),
        class_name: required_string(raw, model::CLASS_NAME)?.to_string(),
        args: raw.string(model::ARGS).map(str::to_string),
    })
    .into())
}

/// Build a domain, deriving its scope from the `dataType` link.
///
/// `DtObject` selects a DataObject scope and `ValueObject` a ValueObject
/// scope, both named by `TYPE`. Any other data type must be a primitive and
/// may carry a formatter and constraints.
pub fn create_domain(bench: &Workbench, raw: &RawDefinition) -> ModelResult<Draft> {
    let key = raw.key().name();
    let data_type = required_link(raw, model::DATA_TYPE_LINK)?;
    let type_name = raw.string(model::TYPE);
    let formatter = raw.link(model::FORMATTER_LINK).map(RawKey::name);
    let constraints: Vec<&str> = raw
        .link_all(model::CONSTRAINT_LINK)
        .iter()
        .map(RawKey::name)
        .collect();

    let scope = match data_type {
        model::DT_OBJECT | model::VALUE_OBJECT => {
            if formatter.is_some() || !constraints.is_empty() {
                return Err(SketchError::invariant(
                    key,
                    format!("formatter and constraints are only allowed on primitive domains, not {data_type}"),
                )
                .into());
            }
            let Some(type_name) = type_name else {
                return Err(SketchError::invariant(
                    key,
                    format!("a {data_type} domain requires a TYPE"),
                )
                .into());
            };
            if data_type == model::DT_OBJECT {
                DomainScope::DataObject {
                    entity_definition: type_name.to_string(),
                }
            } else {
                DomainScope::ValueObject {
                    class_name: type_name.to_string(),
                }
            }
        }
        primitive => {
            let data_type = DataType::parse(primitive).ok_or_else(|| {
                SketchError::invariant(key, format!("unsupported data type \"{primitive}\""))
            })?;
            if type_name.is_some() {
                return Err(SketchError::invariant(
                    key,
                    "TYPE is only allowed on DtObject and ValueObject domains",
                )
                .into());
            }
            if let Some(name) = formatter {
                bench.resolve(name, SketchKind::Formatter)?;
            }
            for name in &constraints {
                bench.resolve(name, SketchKind::Constraint)?;
            }
            DomainScope::Primitive {
                data_type,
                formatter: formatter.map(str::to_string),
                constraints: constraints.iter().map(|c| c.to_string()).collect(),
            }
        }
    };

    Ok(Sketch::Domain(DomainSketch {
        name: key.to_string(),
        package: raw.package().map(str::to_string),
        scope,
        store_type: raw.string(model::STORE_TYPE).map(str::to_string),
        multiple: raw.boolean(model::MULTIPLE).unwrap_or(false),
    })
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::notebook::Notebook;

    fn grammar() -> Grammar {
        model::model_grammar()
    }

    fn bench_with_formatter(g: &Grammar) -> Workbench {
        let mut bench = Workbench::new(Notebook::new());
        let fmt = RawDefinition::builder("FmtDefault", g.entity(model::FORMATTER).unwrap())
            .add_property(model::CLASS_NAME, "fmt.Default")
            .build();
        bench.accept(create_formatter(&fmt).unwrap()).unwrap();
        bench
    }

    fn domain(name: &str, g: &Grammar) -> crate::raw::RawDefinitionBuilder {
        RawDefinition::builder(name, g.entity(model::DOMAIN).unwrap())
    }

    fn built(draft: Draft) -> DomainSketch {
        match draft {
            Draft::Sketch(Sketch::Domain(d)) => d,
            other => panic!("expected a domain, got {other:?}"),
        }
    }

    #[test]
    fn primitive_domain_with_formatter() {
        let g = grammar();
        let bench = bench_with_formatter(&g);
        let raw = domain("DoEmail", &g)
            .add_link(model::DATA_TYPE_LINK, "String")
            .add_link(model::FORMATTER_LINK, "FmtDefault")
            .build();

        let d = built(create_domain(&bench, &raw).unwrap());
        assert_eq!(d.data_type(), Some(DataType::String));
        assert_eq!(d.formatter_name(), Some("FmtDefault"));
        assert!(!d.multiple);
    }

    #[test]
    fn data_object_domain_uses_type() {
        let g = grammar();
        let bench = Workbench::new(Notebook::new());
        let raw = domain("DoPerson", &g)
            .add_link(model::DATA_TYPE_LINK, model::DT_OBJECT)
            .add_property(model::TYPE, "Person")
            .build();
        let d = built(create_domain(&bench, &raw).unwrap());
        assert_eq!(d.entity_definition_name(), Some("Person"));
    }

    #[test]
    fn value_object_domain_requires_type() {
        let g = grammar();
        let bench = Workbench::new(Notebook::new());
        let raw = domain("DoMoney", &g)
            .add_link(model::DATA_TYPE_LINK, model::VALUE_OBJECT)
            .build();
        let err = create_domain(&bench, &raw).unwrap_err();
        assert!(err.to_string().contains("requires a TYPE"));
    }

    #[test]
    fn formatter_on_data_object_domain_is_rejected() {
        let g = grammar();
        let bench = bench_with_formatter(&g);
        let raw = domain("DoPerson", &g)
            .add_link(model::DATA_TYPE_LINK, model::DT_OBJECT)
            .add_link(model::FORMATTER_LINK, "FmtDefault")
            .add_property(model::TYPE, "Person")
            .build();
        let err = create_domain(&bench, &raw).unwrap_err();
        assert!(err.to_string().contains("only allowed on primitive"));
    }

    #[test]
    fn formatter_link_must_name_a_formatter() {
        let g = grammar();
        let mut bench = Workbench::new(Notebook::new());
        let c = RawDefinition::builder("CkEmail", g.entity(model::CONSTRAINT).unwrap())
            .add_property(model::CLASS_NAME, "ck.Regex")
            .build();
        bench.accept(create_constraint(&c).unwrap()).unwrap();

        let raw = domain("DoEmail", &g)
            .add_link(model::DATA_TYPE_LINK, "String")
            .add_link(model::FORMATTER_LINK, "CkEmail")
            .build();
        let err = create_domain(&bench, &raw).unwrap_err();
        assert!(err.to_string().contains("expected a Formatter"));

        let raw = domain("DoEmail", &g)
            .add_link(model::DATA_TYPE_LINK, "String")
            .add_link(model::CONSTRAINT_LINK, "CkEmail")
            .build();
        let d = built(create_domain(&bench, &raw).unwrap());
        let DomainScope::Primitive { constraints, .. } = d.scope else {
            panic!("expected a primitive scope");
        };
        assert_eq!(constraints, vec!["CkEmail".to_string()]);
    }

    #[test]
    fn type_on_primitive_domain_is_rejected() {
        let g = grammar();
        let bench = Workbench::new(Notebook::new());
        let raw = domain("DoCode", &g)
            .add_link(model::DATA_TYPE_LINK, "String")
            .add_property(model::TYPE, "Code")
            .build();
        assert!(create_domain(&bench, &raw).is_err());
    }

    #[test]
    fn constraint_carries_message() {
        let g = grammar();
        let raw = RawDefinition::builder("CkLength", g.entity(model::CONSTRAINT).unwrap())
            .with_package("shop")
            .add_property(model::CLASS_NAME, "ck.Length")
            .add_property(model::ARGS, "80")
            .add_property(model::MSG, "too long")
            .build();
        let Draft::Sketch(Sketch::Constraint(c)) = create_constraint(&raw).unwrap() else {
            panic!("expected a constraint");
        };
        assert_eq!(c.args.as_deref(), Some("80"));
        assert_eq!(c.msg.as_deref(), Some("too long"));
        assert_eq!(c.package.as_deref(), Some("shop"));
    }
}
