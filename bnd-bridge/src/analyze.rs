//! Analysis pass — declaration tree → [`BindingModel`].
//!
//! Type declarations are swept first so that every struct, class, enum and
//! alias is in the registry before any function argument is classified.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, trace, warn};

use crate::config::{self, Config};
use crate::decl::{Decl, ParamNode, TypeNode};
use crate::enums::EnumCollector;
use crate::methods::analyze_function;
use crate::model::{BindingModel, FunctionId};
use crate::registry::TypeRegistry;
use crate::structs::StructTable;

/// Run the analysis over a complete declaration tree.
///
/// `base_dir` is the directory relative to which `[enums] headers` are
/// resolved.
pub fn analyze(decls: &[Decl], cfg: &Config, base_dir: &Path) -> Result<BindingModel> {
    info!(declarations = decls.len(), "analyzing declaration tree");

    let mut registry = TypeRegistry::seeded(&cfg.types);
    let mut structs = StructTable::default();
    let mut enums = EnumCollector::new(&cfg.enums)?;
    let mut enum_types = Vec::new();
    let mut functions: Vec<(&str, &[ParamNode])> = Vec::new();

    for decl in decls {
        match decl {
            Decl::TypedefEnum { name, constants } => {
                registry
                    .register_basic(name)
                    .with_context(|| format!("declaring enum `{name}`"))?;
                enum_types.push(name.clone());
                enums.add_enum_constants(constants);
                debug!(name = %name, constants = constants.len(), "collected enum");
            }
            Decl::TypedefStruct(node) | Decl::Struct(node) => {
                structs.declare(node, &mut registry, cfg)?;
            }
            Decl::TypedefAlias { name, ty } => {
                declare_alias(name, ty, &mut registry)?;
            }
            Decl::Function { name, params } => {
                functions.push((name, params));
            }
            Decl::Unrecognized { kind, dump } => {
                anyhow::bail!("unrecognized top-level declaration `{kind}`:\n{dump}");
            }
        }
    }

    for header in &cfg.enums.headers {
        let path = config::resolve_header(header, base_dir, &cfg.include_paths);
        enums.scan_header(&path)?;
    }

    validate_overrides(cfg, &functions)?;

    let mut global_functions = Vec::new();
    let methods: Vec<_> = functions
        .iter()
        .enumerate()
        .map(|(i, (name, params))| {
            analyze_function(
                FunctionId(i),
                name,
                params,
                &registry,
                &mut structs,
                &mut global_functions,
                cfg,
            )
        })
        .collect();

    let model = BindingModel {
        enums: enums.finish(),
        structs: structs.into_entities(),
        functions: methods,
        global_functions,
        enum_types,
    };

    info!(
        enums = model.enums.len(),
        structs = model.structs.len(),
        functions = model.functions.len(),
        globals = model.global_functions.len(),
        not_generated = model.functions.iter().filter(|f| !f.generated).count(),
        "analysis complete"
    );

    Ok(model)
}

/// `typedef <type> NAME;` is folded onto a basic type when the aliased type
/// is one.
fn declare_alias(name: &str, ty: &TypeNode, registry: &mut TypeRegistry) -> Result<()> {
    if registry.is_basic(name) {
        trace!(name, "typedef of an already-basic name");
        return Ok(());
    }
    let desc = registry.classify(ty);
    if registry.is_basic(&desc.name) {
        registry
            .alias_basic(name, &desc.name)
            .with_context(|| format!("declaring typedef `{name}`"))?;
    } else {
        warn!(name, underlying = %ty, "unknown typedef");
    }
    Ok(())
}

/// Every override entry must name an existing function and one of its
/// parameters.
fn validate_overrides(cfg: &Config, functions: &[(&str, &[ParamNode])]) -> Result<()> {
    let mut problems = Vec::new();
    for (table, target) in cfg.override_targets() {
        match functions.iter().find(|(name, _)| *name == target.function) {
            None => problems.push(format!(
                "`{table}` entry names unknown function `{}`",
                target.function
            )),
            Some((_, params)) if !params.iter().any(|p| p.name == target.argument) => {
                problems.push(format!(
                    "`{table}` entry names unknown argument `{}` of function `{}`",
                    target.argument, target.function
                ))
            }
            Some(_) => {}
        }
    }

    if problems.is_empty() {
        return Ok(());
    }

    let mut msg = format!(
        "{} override(s) do not match any declaration.\n\
         Hint: check the function and argument names against the headers.\n",
        problems.len()
    );
    for p in &problems {
        msg.push_str(&format!("\n  • {p}"));
    }
    anyhow::bail!("{msg}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::decl::StructNode;
    use crate::model::{Library, Shape, Usage};

    fn ptr(pointee: TypeNode) -> TypeNode {
        TypeNode::pointer_to(pointee)
    }

    fn cfg(extra: &str) -> Config {
        parse_config(&format!(
            r#"
            [types]
            bool_alias = "EXAMPLE_BOOL"

            [[namespace]]
            prefix = "EXAMPLE_"
            library = "LL"
            table_index = -2

            [enums]
            prefix = "EXAMPLE_"
            skip_suffixes = ["_FORCEINT"]
            {extra}
            "#
        ))
        .unwrap()
    }

    #[test]
    fn functions_see_types_declared_after_them() {
        let decls = vec![
            Decl::function(
                "EXAMPLE_Widget_Show",
                vec![("widget", ptr(TypeNode::named("EXAMPLE_WIDGET")))],
            ),
            Decl::opaque("EXAMPLE_WIDGET"),
        ];
        let model = analyze(&decls, &cfg(""), Path::new(".")).unwrap();
        let f = model.function_by_name("EXAMPLE_Widget_Show").unwrap();
        assert_eq!(model.owner_of(f).unwrap().name, "EXAMPLE_WIDGET");
        assert!(model.global_functions.is_empty());
    }

    #[test]
    fn enums_and_aliases_become_basic_types() {
        let decls = vec![
            Decl::TypedefEnum {
                name: "EXAMPLE_MODE".to_string(),
                constants: vec![
                    "EXAMPLE_MODE_A".to_string(),
                    "EXAMPLE_MODE_B".to_string(),
                    "EXAMPLE_MODE_FORCEINT".to_string(),
                ],
            },
            Decl::TypedefAlias {
                name: "EXAMPLE_FLAGS".to_string(),
                ty: TypeNode::named("unsigned int"),
            },
            Decl::TypedefAlias {
                name: "EXAMPLE_BOOL".to_string(),
                ty: TypeNode::named("int"),
            },
            Decl::TypedefAlias {
                name: "EXAMPLE_CALLBACK".to_string(),
                ty: ptr(TypeNode::Other {
                    spelling: "int (int)".to_string(),
                }),
            },
            Decl::function(
                "EXAMPLE_SetMode",
                vec![
                    ("mode", TypeNode::named("EXAMPLE_MODE")),
                    ("flags", TypeNode::named("EXAMPLE_FLAGS")),
                    ("enabled", TypeNode::named("EXAMPLE_BOOL")),
                ],
            ),
        ];
        let model = analyze(&decls, &cfg(""), Path::new(".")).unwrap();
        assert_eq!(model.enum_types, ["EXAMPLE_MODE"]);
        assert_eq!(model.enums, ["MODE_A", "MODE_B"]);

        let f = model.function_by_name("EXAMPLE_SetMode").unwrap();
        assert!(f.generated);
        assert!(f.args.iter().all(|a| a.usage == Usage::Input));
        assert_eq!(f.args[1].ty.name, "unsigned_int");
        assert_eq!(f.args[1].ty.c_type, "EXAMPLE_FLAGS");
        assert_eq!(f.library, Library::LowLevel);
        assert_eq!(model.global_functions[0].name, "set_mode");
    }

    #[test]
    fn value_struct_by_value_is_dereferenced_input() {
        let decls = vec![
            Decl::value_struct(
                "EXAMPLE_VECTOR3",
                vec![
                    ("x", TypeNode::named("float")),
                    ("y", TypeNode::named("float")),
                    ("z", TypeNode::named("float")),
                ],
            ),
            Decl::function(
                "EXAMPLE_SetPosition",
                vec![("position", TypeNode::named("EXAMPLE_VECTOR3"))],
            ),
        ];
        let model = analyze(&decls, &cfg(""), Path::new(".")).unwrap();
        let s = model.struct_by_name("EXAMPLE_VECTOR3").unwrap();
        assert!(!s.is_class);
        assert_eq!(s.fields.len(), 3);
        assert!(s.fields.iter().all(|f| f.ty.shape == Shape::Basic));

        let f = model.function_by_name("EXAMPLE_SetPosition").unwrap();
        assert_eq!(f.args[0].usage, Usage::InputDeref);
        assert_eq!(f.args[0].accessor.symbol(), "*");
        assert_eq!(f.args[0].input_index, Some(1));
        assert!(f.generated);
    }

    #[test]
    fn unrecognized_declaration_aborts() {
        let decls = vec![Decl::Unrecognized {
            kind: "VarDecl".to_string(),
            dump: "int example_global".to_string(),
        }];
        let err = analyze(&decls, &cfg(""), Path::new(".")).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("VarDecl"), "got: {msg}");
        assert!(msg.contains("example_global"), "got: {msg}");
    }

    #[test]
    fn conflicting_redeclaration_aborts() {
        let decls = vec![
            Decl::opaque("EXAMPLE_THING"),
            Decl::TypedefEnum {
                name: "EXAMPLE_THING".to_string(),
                constants: vec![],
            },
        ];
        let err = analyze(&decls, &cfg(""), Path::new(".")).unwrap_err();
        assert!(format!("{err:#}").contains("EXAMPLE_THING"));
    }

    #[test]
    fn dangling_overrides_are_reported_together() {
        let cfg = cfg(
            r#"
            [[usage_override]]
            function = "EXAMPLE_Missing"
            argument = "x"
            usage = "input"

            [[optional_argument]]
            function = "EXAMPLE_Present"
            argument = "nope"
            "#,
        );
        let decls = vec![Decl::function(
            "EXAMPLE_Present",
            vec![("value", TypeNode::named("int"))],
        )];
        let err = analyze(&decls, &cfg, Path::new(".")).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("2 override(s)"), "got: {msg}");
        assert!(msg.contains("EXAMPLE_Missing"), "got: {msg}");
        assert!(msg.contains("`nope`"), "got: {msg}");
    }

    #[test]
    fn repeated_struct_declarations_refine_one_entry() {
        let decls = vec![
            Decl::Struct(StructNode {
                name: "EXAMPLE_GUID".to_string(),
                fields: None,
            }),
            Decl::value_struct("EXAMPLE_GUID", vec![("Data1", TypeNode::named("unsigned int"))]),
        ];
        let model = analyze(&decls, &cfg(""), Path::new(".")).unwrap();
        assert_eq!(model.structs.len(), 1);
        assert!(!model.structs[0].is_class);
    }
}
