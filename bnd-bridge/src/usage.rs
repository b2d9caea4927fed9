//! What role a parameter plays at the call site.

use crate::model::{Shape, TypeDesc, Usage};
use crate::registry::TypeRegistry;

/// Infer the usage of an argument from its classified type.
///
/// First match wins:
/// 1. a basic type that is not a pointer to non-const data → `Input`
/// 2. a struct passed by value → `InputDeref`
/// 3. a pointer to
///    - a class → `Input`
///    - a const struct → `Input`
///    - const basic data → `InputPtr`
///    - a mutable struct → `OutputPtr`
///    - mutable writeable basic data other than `char`, or a pointer to a
///      class or struct → `Output`
/// 4. anything else → `Unknown`
pub fn infer_usage(ty: &TypeDesc, registry: &TypeRegistry) -> Usage {
    let mutable_pointee = ty.pointee().is_some_and(|child| !child.is_const);
    if registry.is_basic(&ty.name) && !mutable_pointee {
        return Usage::Input;
    }

    match &ty.shape {
        Shape::Struct => Usage::InputDeref,
        Shape::Pointer(child) => pointer_usage(child),
        Shape::Basic | Shape::Class | Shape::Unknown => Usage::Unknown,
    }
}

fn pointer_usage(child: &TypeDesc) -> Usage {
    match &child.shape {
        Shape::Class => Usage::Input,
        Shape::Struct if child.is_const => Usage::Input,
        Shape::Basic if child.is_const => Usage::InputPtr,
        _ if child.is_const => Usage::Unknown,
        Shape::Struct => Usage::OutputPtr,
        Shape::Basic if child.writeable && child.name != "char" => Usage::Output,
        Shape::Pointer(grandchild) if grandchild.is_class() || grandchild.is_struct() => {
            Usage::Output
        }
        Shape::Basic | Shape::Pointer(_) | Shape::Unknown => Usage::Unknown,
    }
}
