//! Type registry — name → classification table, and the classifier that turns
//! declaration-tree type nodes into [`TypeDesc`]s.

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, trace};

use crate::config::TypesConfig;
use crate::decl::TypeNode;
use crate::model::{Shape, TypeDesc};

/// Registry classification of a named type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Basic,
    Struct,
    Class,
}

/// Tracks how every named type has been classified, plus the canonical
/// descriptor of each basic type.
///
/// A name holds at most one [`Kind`]. The only reclassification allowed is
/// `Class` → `Struct`, when a forward-declared struct is later defined.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    kinds: HashMap<String, Kind>,
    basics: HashMap<String, TypeDesc>,
}

/// C scalar spellings registered before any declaration is read.
const SEED_SCALARS: &[&str] = &[
    "char",
    "short",
    "int",
    "long long",
    "unsigned char",
    "unsigned short",
    "unsigned int",
    "unsigned long long",
    "float",
    "double",
];

impl TypeRegistry {
    /// A registry holding the seed basic types: the integer and floating
    /// scalars, `char*` (readable, not writeable), the configured boolean
    /// alias, and every excluded value type.
    pub fn seeded(types: &TypesConfig) -> Self {
        let mut registry = Self::default();
        for c_type in SEED_SCALARS {
            registry.seed(TypeDesc::basic(c_type));
        }
        if let Some(alias) = &types.bool_alias {
            registry.seed(TypeDesc::basic(alias));
        }
        registry.seed(TypeDesc {
            name: "ptr_char".to_string(),
            c_type: "char*".to_string(),
            is_const: false,
            readable: true,
            writeable: false,
            shape: Shape::Pointer(Box::new(TypeDesc::basic("char"))),
        });
        for excluded in &types.exclusions {
            registry.seed(TypeDesc::basic(excluded));
        }
        registry
    }

    fn seed(&mut self, desc: TypeDesc) {
        self.kinds.insert(desc.name.clone(), Kind::Basic);
        self.basics.insert(desc.name.clone(), desc);
    }

    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.kinds.get(name).copied()
    }

    pub fn is_basic(&self, name: &str) -> bool {
        self.basics.contains_key(name)
    }

    pub fn basic(&self, name: &str) -> Option<&TypeDesc> {
        self.basics.get(name)
    }

    /// Register `name` as a new basic type spelled the same way.
    pub fn register_basic(&mut self, name: &str) -> Result<()> {
        self.claim(name, Kind::Basic)?;
        self.basics.insert(name.to_string(), TypeDesc::basic(name));
        debug!(name, "registered basic type");
        Ok(())
    }

    /// Fold `alias` onto the existing basic type `canonical`.
    pub fn alias_basic(&mut self, alias: &str, canonical: &str) -> Result<()> {
        let Some(desc) = self.basics.get(canonical).cloned() else {
            anyhow::bail!("cannot alias `{alias}` to `{canonical}`: not a basic type");
        };
        self.claim(alias, Kind::Basic)?;
        self.basics.insert(alias.to_string(), desc);
        debug!(alias, canonical, "collapsed typedef onto basic type");
        Ok(())
    }

    /// Record a struct-like name as a value struct or an opaque class.
    ///
    /// Returns the kind the name ends up with: a later forward declaration
    /// of a known struct leaves it a struct.
    pub fn register_record(&mut self, name: &str, kind: Kind) -> Result<Kind> {
        debug_assert!(kind != Kind::Basic);
        let settled = match (self.kind_of(name), kind) {
            (Some(Kind::Struct), Kind::Class) => Kind::Struct,
            _ => {
                self.claim(name, kind)?;
                kind
            }
        };
        trace!(name, kind = ?settled, "registered record");
        Ok(settled)
    }

    fn claim(&mut self, name: &str, kind: Kind) -> Result<()> {
        match self.kinds.get(name).copied() {
            None => {}
            Some(existing) if existing == kind => {}
            Some(Kind::Class) if kind == Kind::Struct => {}
            Some(existing) => anyhow::bail!(
                "type `{name}` is already classified as {existing:?} and cannot be \
                 redeclared as {kind:?}"
            ),
        }
        self.kinds.insert(name.to_string(), kind);
        Ok(())
    }

    /// Classify a declaration-tree type node.
    ///
    /// Shapes the registry cannot model yield [`TypeDesc::unknown`].
    pub fn classify(&self, node: &TypeNode) -> TypeDesc {
        match node {
            TypeNode::Pointer { is_const, pointee } => {
                let child = self.classify(pointee);
                let mut c_type = format!("{}*", child.c_type);
                if *is_const {
                    c_type.push_str(" const");
                }
                let readable = matches!(child.shape, Shape::Struct | Shape::Class)
                    || child.name == "char";
                TypeDesc {
                    name: format!("ptr_{}", child.name),
                    c_type,
                    is_const: *is_const,
                    readable,
                    writeable: false,
                    shape: Shape::Pointer(Box::new(child)),
                }
            }
            TypeNode::Named { names, is_const } => {
                let name = names.join("_");
                let mut c_type = names.join(" ");
                if *is_const {
                    c_type.insert_str(0, "const ");
                }

                if let Some(basic) = self.basics.get(&name) {
                    return TypeDesc {
                        c_type,
                        is_const: *is_const,
                        ..basic.clone()
                    };
                }

                let shape = match self.kind_of(&name) {
                    Some(Kind::Struct) => Shape::Struct,
                    Some(Kind::Class) => Shape::Class,
                    Some(Kind::Basic) | None => Shape::Unknown,
                };
                let aggregate = shape == Shape::Struct;
                TypeDesc {
                    name,
                    c_type,
                    is_const: *is_const,
                    readable: aggregate,
                    writeable: aggregate,
                    shape,
                }
            }
            TypeNode::Other { spelling } => {
                trace!(spelling = %spelling, "unclassifiable type shape");
                TypeDesc::unknown()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmod_types() -> TypesConfig {
        TypesConfig {
            bool_alias: Some("FMOD_BOOL".to_string()),
            exclusions: vec!["FMOD_VECTOR".to_string()],
            ref_counted: vec![],
        }
    }

    fn ptr(is_const: bool, pointee: TypeNode) -> TypeNode {
        TypeNode::Pointer {
            is_const,
            pointee: Box::new(pointee),
        }
    }

    #[test]
    fn seed_contains_scalars_bool_and_exclusions() {
        let reg = TypeRegistry::seeded(&fmod_types());
        for name in [
            "char",
            "int",
            "unsigned_long_long",
            "double",
            "FMOD_BOOL",
            "ptr_char",
            "FMOD_VECTOR",
        ] {
            assert_eq!(reg.kind_of(name), Some(Kind::Basic), "{name}");
        }
        assert!(!reg.basic("ptr_char").unwrap().writeable);
        assert!(reg.basic("ptr_char").unwrap().readable);
    }

    #[test]
    fn named_basic_keeps_spelling_and_constness() {
        let reg = TypeRegistry::seeded(&fmod_types());
        let desc = reg.classify(&TypeNode::const_named("unsigned int"));
        assert_eq!(desc.name, "unsigned_int");
        assert_eq!(desc.c_type, "const unsigned int");
        assert!(desc.is_const);
        assert_eq!(desc.shape, Shape::Basic);
    }

    #[test]
    fn aliases_compare_equal_to_their_basic_type() {
        let mut reg = TypeRegistry::seeded(&fmod_types());
        reg.alias_basic("FMOD_MODE", "unsigned_int").unwrap();
        let alias = reg.classify(&TypeNode::named("FMOD_MODE"));
        let direct = reg.classify(&TypeNode::named("unsigned int"));
        assert_eq!(alias.name, direct.name);
        assert_eq!(alias.shape, direct.shape);
        assert_eq!(alias.c_type, "FMOD_MODE");
    }

    #[test]
    fn pointer_derives_name_spelling_and_flags() {
        let mut reg = TypeRegistry::seeded(&fmod_types());
        reg.register_record("FMOD_SYSTEM", Kind::Class).unwrap();
        reg.register_record("FMOD_GUID", Kind::Struct).unwrap();

        let handle = reg.classify(&ptr(false, TypeNode::named("FMOD_SYSTEM")));
        assert_eq!(handle.name, "ptr_FMOD_SYSTEM");
        assert_eq!(handle.c_type, "FMOD_SYSTEM*");
        assert!(handle.readable);
        assert!(!handle.writeable);
        assert!(handle.pointee().unwrap().is_class());

        let guid = reg.classify(&ptr(true, TypeNode::const_named("FMOD_GUID")));
        assert_eq!(guid.c_type, "const FMOD_GUID* const");
        assert!(guid.readable);

        let string = reg.classify(&ptr(false, TypeNode::const_named("char")));
        assert_eq!(string.name, "ptr_char");
        assert!(string.readable);
        assert!(!string.writeable);

        let int_out = reg.classify(&ptr(false, TypeNode::named("int")));
        assert!(!int_out.readable);
        assert!(!int_out.writeable);
    }

    #[test]
    fn named_struct_is_readable_and_writeable_class_is_not() {
        let mut reg = TypeRegistry::seeded(&fmod_types());
        reg.register_record("FMOD_GUID", Kind::Struct).unwrap();
        reg.register_record("FMOD_SOUND", Kind::Class).unwrap();

        let guid = reg.classify(&TypeNode::named("FMOD_GUID"));
        assert!(guid.readable && guid.writeable);
        let sound = reg.classify(&TypeNode::named("FMOD_SOUND"));
        assert_eq!(sound.shape, Shape::Class);
        assert!(!sound.readable && !sound.writeable);
    }

    #[test]
    fn unknown_shapes_and_names() {
        let reg = TypeRegistry::seeded(&fmod_types());
        let other = reg.classify(&TypeNode::Other {
            spelling: "int (*)(void)".to_string(),
        });
        assert_eq!(other, TypeDesc::unknown());

        let void = reg.classify(&TypeNode::named("void"));
        assert_eq!(void.shape, Shape::Unknown);
        assert_eq!(void.name, "void");

        let void_ptr = reg.classify(&ptr(false, TypeNode::named("void")));
        assert_eq!(void_ptr.name, "ptr_void");
        assert!(!void_ptr.readable);
    }

    #[test]
    fn forward_declaration_then_definition_promotes_class() {
        let mut reg = TypeRegistry::default();
        assert_eq!(reg.register_record("S", Kind::Class).unwrap(), Kind::Class);
        assert_eq!(reg.register_record("S", Kind::Struct).unwrap(), Kind::Struct);
        assert_eq!(reg.register_record("S", Kind::Class).unwrap(), Kind::Struct);
        assert_eq!(reg.kind_of("S"), Some(Kind::Struct));
    }

    #[test]
    fn conflicting_classification_is_rejected() {
        let mut reg = TypeRegistry::seeded(&fmod_types());
        let err = reg.register_record("int", Kind::Struct).unwrap_err();
        assert!(err.to_string().contains("`int`"));

        reg.register_record("FMOD_SOUND", Kind::Class).unwrap();
        assert!(reg.register_basic("FMOD_SOUND").is_err());
        assert!(reg.alias_basic("FMOD_SOUND", "int").is_err());
        assert_eq!(reg.kind_of("FMOD_SOUND"), Some(Kind::Class));
    }
}
