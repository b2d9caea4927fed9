//! Extraction — clang `Entity`/`Type` → declaration tree.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clang::{Entity, EntityKind, Index, Type as ClangType, TypeKind};
use tracing::{debug, trace};

use crate::config::{self, Config};
use crate::decl::{Decl, FieldNode, ParamNode, StructNode, TypeNode};

/// Parse the configured headers and map every in-scope top-level entity to a
/// [`Decl`], in source order.
pub fn extract_decls(index: &Index, cfg: &Config, base_dir: &Path) -> Result<Vec<Decl>> {
    let header_path = cfg.input.wrapper_header(base_dir, &cfg.include_paths)?;
    debug!(header = %header_path.display(), "parsing headers");

    // Build clang arguments: user-specified args + -I flags from include_paths
    let mut all_args: Vec<String> = cfg.clang_args.clone();
    for inc in &cfg.include_paths {
        let flag = format!("-I{}", base_dir.join(inc).display());
        if !all_args.contains(&flag) {
            all_args.push(flag);
        }
    }

    let header_str = header_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("non UTF-8 header path {}", header_path.display()))?;
    let tu = index
        .parser(header_str)
        .arguments(&all_args)
        .parse()
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {:?}", header_path.display(), e))?;

    // Resolve traverse files through include_paths so relative names work
    let traverse: Vec<PathBuf> = cfg
        .input
        .traverse_files()
        .iter()
        .map(|t| config::resolve_header(t, base_dir, &cfg.include_paths))
        .collect();

    let decls: Vec<Decl> = tu
        .get_entity()
        .get_children()
        .iter()
        .filter(|e| in_traversed_file(e, &traverse))
        .filter_map(map_entity)
        .collect();

    tracing::info!(
        header = %header_path.display(),
        declarations = decls.len(),
        "extraction complete"
    );
    Ok(decls)
}

fn map_entity(entity: &Entity) -> Option<Decl> {
    match entity.get_kind() {
        EntityKind::TypedefDecl => map_typedef(entity),
        EntityKind::StructDecl => {
            if is_anonymous(entity) {
                // Carried by the typedef that names it.
                return None;
            }
            Some(Decl::Struct(struct_node(entity, entity.get_name()?)))
        }
        EntityKind::FunctionDecl => Some(map_function(entity)),
        EntityKind::EnumDecl => {
            trace!(name = ?entity.get_name(), "enum carried by its typedef");
            None
        }
        EntityKind::MacroDefinition
        | EntityKind::MacroExpansion
        | EntityKind::InclusionDirective => None,
        other => Some(Decl::Unrecognized {
            kind: format!("{other:?}"),
            dump: format!("{entity:?}"),
        }),
    }
}

fn map_typedef(entity: &Entity) -> Option<Decl> {
    let name = entity.get_name().filter(|n| !n.is_empty())?;
    let underlying = entity.get_typedef_underlying_type()?;
    let target = strip_elaborated(underlying);

    let decl = match target.get_kind() {
        TypeKind::Enum => {
            let constants = target
                .get_declaration()
                .map(|e| {
                    e.get_children()
                        .into_iter()
                        .filter(|c| c.get_kind() == EntityKind::EnumConstantDecl)
                        .filter_map(|c| c.get_name())
                        .collect()
                })
                .unwrap_or_default();
            Decl::TypedefEnum { name, constants }
        }
        TypeKind::Record
            if target
                .get_declaration()
                .is_some_and(|d| d.get_kind() == EntityKind::StructDecl) =>
        {
            let record = target.get_declaration()?;
            let tag = if is_anonymous(&record) {
                name
            } else {
                record.get_name().unwrap_or(name)
            };
            Decl::TypedefStruct(struct_node(&record, tag))
        }
        _ => Decl::TypedefAlias {
            name,
            ty: type_node(&underlying),
        },
    };
    trace!(decl = %decl, "mapped typedef");
    Some(decl)
}

/// Fields come from the definition when one is visible.
fn struct_node(entity: &Entity, name: String) -> StructNode {
    let fields = entity.get_definition().map(|def| {
        def.get_children()
            .iter()
            .filter(|c| c.get_kind() == EntityKind::FieldDecl)
            .map(|c| FieldNode {
                name: c.get_name().filter(|n| !n.is_empty()),
                ty: c
                    .get_type()
                    .map(|t| type_node(&t))
                    .unwrap_or_else(|| other_node("<untyped field>")),
            })
            .collect()
    });
    StructNode { name, fields }
}

fn map_function(entity: &Entity) -> Decl {
    let name = entity.get_name().unwrap_or_default();
    let params = entity
        .get_arguments()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, arg)| ParamNode {
            name: arg
                .get_name()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("param{i}")),
            ty: arg
                .get_type()
                .map(|t| type_node(&t))
                .unwrap_or_else(|| other_node("<untyped parameter>")),
        })
        .collect();
    Decl::Function { name, params }
}

// ---------------------------------------------------------------------------
// Type mapping: clang TypeKind → TypeNode
// ---------------------------------------------------------------------------

fn type_node(ty: &ClangType) -> TypeNode {
    let is_const = ty.is_const_qualified();
    match ty.get_kind() {
        TypeKind::Pointer => match ty.get_pointee_type() {
            Some(pointee) => TypeNode::Pointer {
                is_const,
                pointee: Box::new(type_node(&pointee)),
            },
            None => other_node(&ty.get_display_name()),
        },

        TypeKind::Elaborated => match ty.get_elaborated_type() {
            Some(inner) => with_const(type_node(&inner), is_const),
            None => other_node(&ty.get_display_name()),
        },

        TypeKind::Typedef | TypeKind::Record | TypeKind::Enum => {
            match ty.get_declaration().filter(|d| !is_anonymous(d)) {
                Some(decl) => match decl.get_name() {
                    Some(name) if !name.is_empty() => TypeNode::Named {
                        names: vec![name],
                        is_const,
                    },
                    _ => other_node(&ty.get_display_name()),
                },
                None => other_node(&ty.get_display_name()),
            }
        }

        kind => match builtin_words(kind) {
            Some(words) => TypeNode::Named {
                names: words.iter().map(|w| w.to_string()).collect(),
                is_const,
            },
            None => other_node(&ty.get_display_name()),
        },
    }
}

fn builtin_words(kind: TypeKind) -> Option<&'static [&'static str]> {
    let words: &[&str] = match kind {
        TypeKind::Void => &["void"],
        TypeKind::Bool => &["_Bool"],
        TypeKind::CharS | TypeKind::CharU => &["char"],
        TypeKind::SChar => &["signed", "char"],
        TypeKind::UChar => &["unsigned", "char"],
        TypeKind::Short => &["short"],
        TypeKind::UShort => &["unsigned", "short"],
        TypeKind::Int => &["int"],
        TypeKind::UInt => &["unsigned", "int"],
        TypeKind::Long => &["long"],
        TypeKind::ULong => &["unsigned", "long"],
        TypeKind::LongLong => &["long", "long"],
        TypeKind::ULongLong => &["unsigned", "long", "long"],
        TypeKind::Float => &["float"],
        TypeKind::Double => &["double"],
        TypeKind::LongDouble => &["long", "double"],
        _ => return None,
    };
    Some(words)
}

fn with_const(node: TypeNode, outer_const: bool) -> TypeNode {
    match node {
        TypeNode::Named { names, is_const } => TypeNode::Named {
            names,
            is_const: is_const || outer_const,
        },
        TypeNode::Pointer { is_const, pointee } => TypeNode::Pointer {
            is_const: is_const || outer_const,
            pointee,
        },
        other => other,
    }
}

fn other_node(spelling: &str) -> TypeNode {
    TypeNode::Other {
        spelling: spelling.to_string(),
    }
}

fn strip_elaborated(ty: ClangType) -> ClangType {
    if ty.get_kind() == TypeKind::Elaborated {
        if let Some(inner) = ty.get_elaborated_type() {
            return strip_elaborated(inner);
        }
    }
    ty
}

/// clang names anonymous records and enums like
/// `struct (unnamed at example.h:3:9)`.
fn is_anonymous(entity: &Entity) -> bool {
    entity.is_anonymous()
        || entity
            .get_name()
            .is_none_or(|n| n.is_empty() || n.contains("(unnamed") || n.contains("(anonymous"))
}

// ---------------------------------------------------------------------------
// Source-location filtering
// ---------------------------------------------------------------------------

fn in_traversed_file(entity: &Entity, traverse_files: &[PathBuf]) -> bool {
    let location = match entity.get_location() {
        Some(loc) => loc,
        None => return false,
    };
    let file_location = location.get_file_location();
    let file = match file_location.file {
        Some(f) => f,
        None => return false,
    };
    let file_path = file.get_path();

    traverse_files
        .iter()
        .any(|tf| file_path == *tf || file_path.ends_with(tf))
}
