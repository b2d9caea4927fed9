//! Enumeration constants from typedef'd enums and `#define` lines.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, trace};

use crate::config::EnumConfig;

/// Collects normalized enum constant names in discovery order.
///
/// A name discovered twice (e.g. both as an enum constant and a `#define`)
/// is kept at its first position only.
pub struct EnumCollector<'a> {
    cfg: &'a EnumConfig,
    define: Regex,
    names: Vec<String>,
    seen: HashSet<String>,
}

impl<'a> EnumCollector<'a> {
    pub fn new(cfg: &'a EnumConfig) -> Result<Self> {
        let define = Regex::new(&format!(
            r"^\s*#\s*define\s+{}([A-Za-z0-9_]+)",
            regex::escape(&cfg.prefix)
        ))
        .with_context(|| format!("building #define pattern for prefix `{}`", cfg.prefix))?;
        Ok(Self {
            cfg,
            define,
            names: Vec::new(),
            seen: HashSet::new(),
        })
    }

    /// Add the constants of one typedef'd enum.
    pub fn add_enum_constants<S: AsRef<str>>(&mut self, constants: &[S]) {
        for constant in constants {
            let constant = constant.as_ref();
            if self
                .cfg
                .skip_suffixes
                .iter()
                .any(|suffix| constant.ends_with(suffix.as_str()))
            {
                trace!(name = constant, "skipping sentinel enum constant");
                continue;
            }
            let name = constant.strip_prefix(self.cfg.prefix.as_str()).unwrap_or(constant);
            self.push(name);
        }
    }

    /// Scan header text line by line for `#define <prefix>NAME`.
    pub fn scan_source(&mut self, source: &str) {
        for line in source.lines() {
            let Some(caps) = self.define.captures(line) else {
                continue;
            };
            let name = &caps[1];
            if self.is_excluded_define(name) {
                trace!(name, "skipping excluded #define");
                continue;
            }
            self.push(name);
        }
    }

    pub fn scan_header(&mut self, path: &Path) -> Result<()> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading enum header {}", path.display()))?;
        let before = self.names.len();
        self.scan_source(&source);
        debug!(
            header = %path.display(),
            added = self.names.len() - before,
            "scanned #define constants"
        );
        Ok(())
    }

    fn is_excluded_define(&self, name: &str) -> bool {
        self.cfg
            .exclude_prefixes
            .iter()
            .any(|p| name.starts_with(p.as_str()))
            || self.cfg.exceptions.iter().any(|e| e == name)
    }

    fn push(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.names.push(name.to_string());
        } else {
            debug!(name, "dropping duplicate enum constant");
        }
    }

    pub fn finish(self) -> Vec<String> {
        self.names
    }
}
