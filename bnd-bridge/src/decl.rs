//! Already-parsed C declarations, the input to analysis.
//!
//! Produced by [`crate::extract`] from libclang, or deserialized from JSON
//! when the tree comes from another parser.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum Decl {
    /// `typedef enum { ... } NAME;`
    TypedefEnum { name: String, constants: Vec<String> },
    /// `typedef struct TAG { ... } NAME;` or `typedef struct TAG NAME;`
    TypedefStruct(StructNode),
    /// `typedef <type> NAME;`
    TypedefAlias { name: String, ty: TypeNode },
    /// `struct TAG;` or `struct TAG { ... };`
    Struct(StructNode),
    /// A function prototype.
    Function { name: String, params: Vec<ParamNode> },
    /// Anything the tree contract does not cover. Rejected by analysis.
    Unrecognized { kind: String, dump: String },
}

/// A struct declaration. `fields` is `None` for forward declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructNode {
    pub name: String,
    #[serde(default)]
    pub fields: Option<Vec<FieldNode>>,
}

/// A direct child declaration of a struct. Unnamed members have no name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNode {
    #[serde(default)]
    pub name: Option<String>,
    pub ty: TypeNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamNode {
    pub name: String,
    pub ty: TypeNode,
}

/// A type declarator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TypeNode {
    /// `is_const` qualifies the pointer itself (`T * const`).
    Pointer { is_const: bool, pointee: Box<TypeNode> },
    /// A type named by one or more words (`unsigned int`, `FMOD_SYSTEM`).
    Named {
        names: Vec<String>,
        #[serde(default)]
        is_const: bool,
    },
    /// Arrays, function prototypes and other shapes analysis does not model.
    Other { spelling: String },
}

impl TypeNode {
    pub fn named(name: &str) -> Self {
        TypeNode::Named {
            names: name.split_whitespace().map(str::to_string).collect(),
            is_const: false,
        }
    }

    pub fn const_named(name: &str) -> Self {
        TypeNode::Named {
            names: name.split_whitespace().map(str::to_string).collect(),
            is_const: true,
        }
    }

    pub fn pointer_to(pointee: TypeNode) -> Self {
        TypeNode::Pointer {
            is_const: false,
            pointee: Box::new(pointee),
        }
    }
}

impl Decl {
    pub fn function(name: &str, params: Vec<(&str, TypeNode)>) -> Self {
        Decl::Function {
            name: name.to_string(),
            params: params
                .into_iter()
                .map(|(name, ty)| ParamNode {
                    name: name.to_string(),
                    ty,
                })
                .collect(),
        }
    }

    /// `typedef struct NAME NAME;`
    pub fn opaque(name: &str) -> Self {
        Decl::TypedefStruct(StructNode {
            name: name.to_string(),
            fields: None,
        })
    }

    /// `typedef struct NAME { fields } NAME;`
    pub fn value_struct(name: &str, fields: Vec<(&str, TypeNode)>) -> Self {
        Decl::TypedefStruct(StructNode {
            name: name.to_string(),
            fields: Some(
                fields
                    .into_iter()
                    .map(|(name, ty)| FieldNode {
                        name: Some(name.to_string()),
                        ty,
                    })
                    .collect(),
            ),
        })
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNode::Pointer { is_const, pointee } => {
                write!(f, "{pointee}*")?;
                if *is_const {
                    f.write_str(" const")?;
                }
                Ok(())
            }
            TypeNode::Named { names, is_const } => {
                if *is_const {
                    f.write_str("const ")?;
                }
                f.write_str(&names.join(" "))
            }
            TypeNode::Other { spelling } => f.write_str(spelling),
        }
    }
}

impl fmt::Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decl::TypedefEnum { name, constants } => {
                writeln!(f, "typedef enum {name}")?;
                for c in constants {
                    writeln!(f, "  {c}")?;
                }
                Ok(())
            }
            Decl::TypedefStruct(s) | Decl::Struct(s) => {
                match &s.fields {
                    None => writeln!(f, "struct {} (opaque)", s.name)?,
                    Some(fields) => {
                        writeln!(f, "struct {}", s.name)?;
                        for field in fields {
                            let name = field.name.as_deref().unwrap_or("<unnamed>");
                            writeln!(f, "  {} {name}", field.ty)?;
                        }
                    }
                }
                Ok(())
            }
            Decl::TypedefAlias { name, ty } => writeln!(f, "typedef {ty} {name}"),
            Decl::Function { name, params } => {
                let params: Vec<String> = params
                    .iter()
                    .map(|p| format!("{} {}", p.ty, p.name))
                    .collect();
                writeln!(f, "{name}({})", params.join(", "))
            }
            Decl::Unrecognized { kind, dump } => writeln!(f, "{kind}: {dump}"),
        }
    }
}
