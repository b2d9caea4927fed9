//! The model handed from analysis to the rendering stage.
//!
//! Everything here is clang-independent and renderer-independent. The model is
//! built in a single pass by [`crate::analyze`] and serialized as-is for the
//! rendering stage.

use serde::{Deserialize, Serialize};

/// Index of a [`StructEntity`] in [`BindingModel::structs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StructId(pub usize);

/// Index of a [`MethodEntity`] in [`BindingModel::functions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FunctionId(pub usize);

/// The complete result of one analysis run.
#[derive(Debug, Default, Serialize)]
pub struct BindingModel {
    /// Enumeration constant names, prefix-stripped, in discovery order.
    pub enums: Vec<String>,
    /// Value structs and opaque classes, in first-declaration order.
    pub structs: Vec<StructEntity>,
    /// Every function, including the ones attached to a class as methods.
    pub functions: Vec<MethodEntity>,
    /// Functions that did not resolve onto a class.
    pub global_functions: Vec<GlobalFunction>,
    /// Names of typedef'd enumerations.
    pub enum_types: Vec<String>,
}

impl BindingModel {
    pub fn struct_by_name(&self, name: &str) -> Option<&StructEntity> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn function_by_name(&self, name: &str) -> Option<&MethodEntity> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn function(&self, id: FunctionId) -> &MethodEntity {
        &self.functions[id.0]
    }

    pub fn owner_of(&self, method: &MethodEntity) -> Option<&StructEntity> {
        method.owner.map(|id| &self.structs[id.0])
    }
}

/// How a type is classified.
///
/// `Pointer` owns the descriptor of what it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "pointee")]
pub enum Shape {
    Basic,
    Struct,
    Class,
    Pointer(Box<TypeDesc>),
    Unknown,
}

/// A classified C type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDesc {
    /// Canonical name. Basic aliases collapse onto the name they alias.
    pub name: String,
    /// C spelling used when emitting declarations, including `const`.
    pub c_type: String,
    /// Whether this level of the type is `const` qualified.
    pub is_const: bool,
    pub readable: bool,
    pub writeable: bool,
    pub shape: Shape,
}

impl TypeDesc {
    pub const UNKNOWN_NAME: &'static str = "__UNKNOWN__";

    /// A basic (scalar) type spelled `c_type`. The canonical name replaces
    /// spaces with underscores (`unsigned int` → `unsigned_int`).
    pub fn basic(c_type: &str) -> Self {
        Self {
            name: c_type.replace(' ', "_"),
            c_type: c_type.to_string(),
            is_const: false,
            readable: true,
            writeable: true,
            shape: Shape::Basic,
        }
    }

    pub fn unknown() -> Self {
        Self {
            name: Self::UNKNOWN_NAME.to_string(),
            c_type: Self::UNKNOWN_NAME.to_string(),
            is_const: false,
            readable: false,
            writeable: false,
            shape: Shape::Unknown,
        }
    }

    /// The pointee, if this is a pointer.
    pub fn pointee(&self) -> Option<&TypeDesc> {
        match &self.shape {
            Shape::Pointer(child) => Some(child),
            _ => None,
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.shape, Shape::Struct)
    }

    pub fn is_class(&self) -> bool {
        matches!(self.shape, Shape::Class)
    }
}

/// A value struct or opaque class.
#[derive(Debug, Clone, Serialize)]
pub struct StructEntity {
    pub name: String,
    /// `true` for opaque handles, `false` for value structs.
    pub is_class: bool,
    /// Empty for classes.
    pub fields: Vec<Field>,
    /// Native name with the namespace prefix stripped; a leading digit is
    /// escaped with `_`.
    pub constructor_name: String,
    /// Snake-case form of `constructor_name`.
    pub short_name: String,
    /// Table sentinel of the namespace rule that matched the name.
    pub constructor_table: i32,
    pub methods: Vec<MethodRef>,
    pub ref_counted: bool,
    /// Native name of the designated release method, once resolved.
    pub release_method: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeDesc,
}

/// A method attached to a class: its short name and the function it wraps.
#[derive(Debug, Clone, Serialize)]
pub struct MethodRef {
    pub name: String,
    pub function: FunctionId,
}

/// A free function entry, tagged with the table it belongs in.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalFunction {
    pub table_index: i32,
    pub name: String,
    pub function: FunctionId,
}

/// API subsystem a function belongs to, derived from its name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Library {
    #[serde(rename = "ST")]
    Studio,
    #[serde(rename = "LL")]
    LowLevel,
    #[serde(rename = "UK")]
    Unknown,
}

/// A C function, either a method of some class or a free function.
#[derive(Debug, Clone, Serialize)]
pub struct MethodEntity {
    pub name: String,
    pub short_name: String,
    pub args: Vec<ArgumentEntity>,
    pub owner: Option<StructId>,
    pub library: Library,
    /// `false` when some argument's usage could not be inferred; renderers
    /// must not emit a wrapper body for it.
    pub generated: bool,
    pub return_count: usize,
    pub output_ptr_count: usize,
    pub is_release_method: bool,
}

/// Direction and shape contract of a function argument.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Usage {
    Input,
    InputPtr,
    InputDeref,
    Output,
    OutputPtr,
    Unknown,
}

impl Usage {
    pub fn is_input(self) -> bool {
        matches!(self, Usage::Input | Usage::InputPtr | Usage::InputDeref)
    }
}

/// How the generated call site must reference an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Accessor {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "*")]
    Deref,
    #[serde(rename = "&")]
    AddressOf,
}

impl Accessor {
    pub fn symbol(self) -> &'static str {
        match self {
            Accessor::None => "",
            Accessor::Deref => "*",
            Accessor::AddressOf => "&",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArgumentEntity {
    pub name: String,
    pub ty: TypeDesc,
    pub usage: Usage,
    /// The caller may omit this argument.
    pub optional: bool,
    /// 1-based position among input arguments.
    pub input_index: Option<usize>,
    /// 0-based position among all outputs.
    pub output_index: Option<usize>,
    /// 0-based position among output pointers.
    pub output_ptr_index: Option<usize>,
    pub accessor: Accessor,
}
