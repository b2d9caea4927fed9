//! Value structs versus opaque classes.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{debug, trace};

use crate::config::Config;
use crate::decl::StructNode;
use crate::model::{Field, StructEntity, StructId};
use crate::naming::to_snake_case;
use crate::registry::{Kind, TypeRegistry};

/// Struct and class entities, in first-declaration order.
#[derive(Debug, Default)]
pub struct StructTable {
    entries: Vec<StructEntity>,
    by_name: HashMap<String, StructId>,
}

impl StructTable {
    pub fn get(&self, name: &str) -> Option<StructId> {
        self.by_name.get(name).copied()
    }

    pub fn entity(&self, id: StructId) -> &StructEntity {
        &self.entries[id.0]
    }

    pub fn entity_mut(&mut self, id: StructId) -> &mut StructEntity {
        &mut self.entries[id.0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entities(self) -> Vec<StructEntity> {
        self.entries
    }

    /// Classify one struct declaration.
    ///
    /// Without a field list the name becomes an opaque class, unless it is
    /// already known. With a field list it becomes (or is refined into) a
    /// value struct. Excluded names are ignored entirely.
    pub fn declare(
        &mut self,
        node: &StructNode,
        registry: &mut TypeRegistry,
        cfg: &Config,
    ) -> Result<()> {
        if cfg.types.is_excluded(&node.name) {
            trace!(name = %node.name, "skipping excluded struct");
            return Ok(());
        }

        match &node.fields {
            None => {
                if self.by_name.contains_key(&node.name) {
                    trace!(name = %node.name, "repeated forward declaration");
                    return Ok(());
                }
                registry
                    .register_record(&node.name, Kind::Class)
                    .with_context(|| format!("declaring class `{}`", node.name))?;
                let entity = new_entity(&node.name, true, Vec::new(), cfg);
                debug!(name = %node.name, ctor = %entity.constructor_name, "classified opaque class");
                self.insert(entity);
            }
            Some(decls) => {
                registry
                    .register_record(&node.name, Kind::Struct)
                    .with_context(|| format!("declaring struct `{}`", node.name))?;
                let fields: Vec<Field> = decls
                    .iter()
                    .filter_map(|d| {
                        let name = d.name.clone()?;
                        let ty = registry.classify(&d.ty);
                        trace!(field = %name, ty = %ty.c_type, "  field");
                        Some(Field { name, ty })
                    })
                    .collect();
                debug!(name = %node.name, fields = fields.len(), "classified value struct");

                match self.get(&node.name) {
                    Some(id) => {
                        let existing = self.entity_mut(id);
                        existing.is_class = false;
                        existing.fields = fields;
                    }
                    None => {
                        let entity = new_entity(&node.name, false, fields, cfg);
                        self.insert(entity);
                    }
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, entity: StructEntity) {
        let id = StructId(self.entries.len());
        self.by_name.insert(entity.name.clone(), id);
        self.entries.push(entity);
    }
}

fn new_entity(name: &str, is_class: bool, fields: Vec<Field>, cfg: &Config) -> StructEntity {
    let (constructor_name, constructor_table) = constructor_name(name, cfg);
    StructEntity {
        name: name.to_string(),
        is_class,
        fields,
        short_name: to_snake_case(&constructor_name),
        constructor_name,
        constructor_table,
        methods: Vec::new(),
        ref_counted: cfg.types.is_ref_counted(name),
        release_method: None,
    }
}

/// Strip the first matching namespace prefix and escape a leading digit.
pub fn constructor_name(name: &str, cfg: &Config) -> (String, i32) {
    let (stripped, table) = match cfg.namespace_for(name) {
        Some(rule) => (rule.strip(name).unwrap_or(name), rule.table_index),
        None => (name, cfg.fallback_table_index),
    };
    let ctor = if stripped.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{stripped}")
    } else {
        stripped.to_string()
    };
    (ctor, table)
}
