//! Function analysis: argument roles, method/global scope, and the derived
//! indices a renderer needs to emit a wrapper.

use tracing::{debug, warn};

use crate::config::Config;
use crate::decl::ParamNode;
use crate::model::{
    ArgumentEntity, FunctionId, GlobalFunction, Library, MethodEntity, MethodRef, Shape, Usage,
};
use crate::naming::to_snake_case;
use crate::registry::TypeRegistry;
use crate::structs::StructTable;
use crate::usage::infer_usage;

/// Classify every parameter of `name`, applying the override tables.
pub fn parse_arguments(
    name: &str,
    params: &[ParamNode],
    registry: &TypeRegistry,
    cfg: &Config,
) -> Vec<ArgumentEntity> {
    params
        .iter()
        .map(|param| {
            let ty = registry.classify(&param.ty);
            let usage = cfg
                .usage_override(name, &param.name)
                .unwrap_or_else(|| infer_usage(&ty, registry));
            ArgumentEntity {
                name: param.name.clone(),
                ty,
                usage,
                optional: cfg.is_optional(name, &param.name),
                input_index: None,
                output_index: None,
                output_ptr_index: None,
                accessor: Default::default(),
            }
        })
        .collect()
}

/// Where a function ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Attached to a class as `short_name`.
    Method { class: String, short_name: String },
    /// Listed among global functions.
    Global { table_index: i32, short_name: String },
}

/// Decide whether `method` is a method of a class or a free function.
///
/// It is a method when its first argument points at a class and its
/// upper-cased name starts with `<CLASS>_`. The method is appended to that
/// class; a free function is appended to `globals`.
pub fn resolve_scope(
    id: FunctionId,
    method: &mut MethodEntity,
    structs: &mut StructTable,
    globals: &mut Vec<GlobalFunction>,
    cfg: &Config,
) -> Scope {
    let caps_name = method.name.to_uppercase();

    let receiver = method
        .args
        .first()
        .and_then(|arg| arg.ty.pointee())
        .filter(|child| child.shape == Shape::Class)
        .and_then(|child| {
            let rest = caps_name.strip_prefix(child.name.as_str())?;
            rest.strip_prefix('_')?;
            structs.get(&child.name)
        });

    if let Some(owner) = receiver {
        let class = structs.entity_mut(owner);
        let rest = method.name.get(class.name.len() + 1..).unwrap_or_default();
        let short_name = to_snake_case(rest);
        class.methods.push(MethodRef {
            name: short_name.clone(),
            function: id,
        });
        method.owner = Some(owner);
        method.short_name = short_name.clone();
        method.library = cfg
            .namespace_for(&method.name)
            .map_or(Library::Unknown, |rule| rule.library);
        return Scope::Method {
            class: class.name.clone(),
            short_name,
        };
    }

    let (rest, table_index, library) = match cfg.namespace_for(&method.name) {
        Some(rule) => (
            rule.strip(&method.name).unwrap_or(&method.name),
            rule.table_index,
            rule.library,
        ),
        None => (method.name.as_str(), cfg.fallback_table_index, Library::Unknown),
    };
    let short_name = to_snake_case(rest);
    method.short_name = short_name.clone();
    method.library = library;
    globals.push(GlobalFunction {
        table_index,
        name: short_name.clone(),
        function: id,
    });
    Scope::Global {
        table_index,
        short_name,
    }
}

/// Assign argument indices and accessors, count outputs, and detect
/// reference-count release methods.
pub fn derive_metadata(method: &mut MethodEntity, structs: &mut StructTable, cfg: &Config) {
    let mut input_index = 1;
    let mut return_count = 0;
    let mut output_ptr_count = 0;
    let mut generated = true;

    for arg in &mut method.args {
        match arg.usage {
            usage if usage.is_input() => {
                arg.input_index = Some(input_index);
                input_index += 1;
            }
            Usage::Output => {
                arg.output_index = Some(return_count);
                return_count += 1;
            }
            Usage::OutputPtr => {
                arg.output_ptr_index = Some(output_ptr_count);
                arg.output_index = Some(return_count);
                output_ptr_count += 1;
                return_count += 1;
            }
            Usage::Unknown => generated = false,
            _ => {}
        }
        arg.accessor = cfg.accessor_for(arg.usage);
    }

    method.generated = generated;
    method.return_count = return_count;
    method.output_ptr_count = output_ptr_count;

    if let Some(owner) = method.owner {
        let class = structs.entity_mut(owner);
        let release_name = format!("{}_RELEASE", class.name);
        if class.ref_counted && method.name.to_uppercase() == release_name {
            method.is_release_method = true;
            class.release_method = Some(method.name.clone());
            debug!(class = %class.name, method = %method.name, "detected release method");
        }
    }

    if !method.generated {
        warn!(name = %method.name, "cannot auto-generate wrapper");
    }
}

/// Build the entity for one function: classify arguments, resolve scope and
/// derive metadata.
pub fn analyze_function(
    id: FunctionId,
    name: &str,
    params: &[ParamNode],
    registry: &TypeRegistry,
    structs: &mut StructTable,
    globals: &mut Vec<GlobalFunction>,
    cfg: &Config,
) -> MethodEntity {
    let mut method = MethodEntity {
        name: name.to_string(),
        short_name: String::new(),
        args: parse_arguments(name, params, registry, cfg),
        owner: None,
        library: Library::Unknown,
        generated: true,
        return_count: 0,
        output_ptr_count: 0,
        is_release_method: false,
    };
    let scope = resolve_scope(id, &mut method, structs, globals, cfg);
    debug!(name, ?scope, args = method.args.len(), "resolved function");
    derive_metadata(&mut method, structs, cfg);
    method
}
