//! Configuration types for `bnd-bridge.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::model::{Accessor, Library, Usage};

/// Root configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    /// Additional directories to search when resolving header and traverse
    /// paths.  Each entry is tried in order after `base_dir` (the TOML
    /// file's parent directory).  Also injected as `-I` flags for clang.
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    /// Extra clang arguments (e.g. `-DFOO`).
    #[serde(default)]
    pub clang_args: Vec<String>,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub types: TypesConfig,
    /// Namespace prefix rules, evaluated in order. A more specific prefix
    /// must come before any prefix it extends.
    #[serde(default)]
    pub namespace: Vec<NamespaceRule>,
    /// Table sentinel for names that match no namespace rule.
    #[serde(default = "default_fallback_table_index")]
    pub fallback_table_index: i32,
    /// Usage role → call-site accessor. Roles not listed get no accessor.
    #[serde(default = "default_accessors")]
    pub accessors: BTreeMap<Usage, Accessor>,
    #[serde(default)]
    pub usage_override: Vec<UsageOverride>,
    #[serde(default)]
    pub optional_argument: Vec<ArgumentRef>,
    #[serde(default)]
    pub enums: EnumConfig,
}

/// Output file settings.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output file path for the JSON model.
    #[serde(default = "default_output_file")]
    pub file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: default_output_file(),
        }
    }
}

fn default_output_file() -> PathBuf {
    PathBuf::from("bindings.json")
}

fn default_fallback_table_index() -> i32 {
    -2
}

fn default_accessors() -> BTreeMap<Usage, Accessor> {
    BTreeMap::from([
        (Usage::InputDeref, Accessor::Deref),
        (Usage::InputPtr, Accessor::AddressOf),
        (Usage::Output, Accessor::AddressOf),
    ])
}

/// The headers handed to clang.
#[derive(Debug, Default, Deserialize)]
pub struct InputConfig {
    /// Headers to include (all are parsed for dependency resolution).
    #[serde(default)]
    pub headers: Vec<PathBuf>,
    /// Which files to actually take declarations from.
    /// If empty, uses `headers`.
    #[serde(default)]
    pub traverse: Vec<PathBuf>,
}

impl InputConfig {
    /// Returns the traverse list, falling back to `headers` if empty.
    pub fn traverse_files(&self) -> &[PathBuf] {
        if self.traverse.is_empty() {
            &self.headers
        } else {
            &self.traverse
        }
    }

    /// Returns the translation unit file to parse.
    ///
    /// If there's a single header, returns it directly. If there are
    /// several, writes a wrapper `.c` file that `#include`s all of them.
    pub fn wrapper_header(
        &self,
        base_dir: &Path,
        include_paths: &[PathBuf],
    ) -> anyhow::Result<PathBuf> {
        match self.headers.as_slice() {
            [] => anyhow::bail!("no headers configured under [input]"),
            [single] => Ok(resolve_header(single, base_dir, include_paths)),
            headers => {
                let wrapper_dir = std::env::temp_dir().join("bnd_bridge_wrappers");
                std::fs::create_dir_all(&wrapper_dir)?;
                let wrapper_path =
                    wrapper_dir.join(format!("wrapper_{}.c", std::process::id()));

                let mut content = String::new();
                for h in headers {
                    let abs = resolve_header(h, base_dir, include_paths);
                    content.push_str(&format!("#include \"{}\"\n", abs.display()));
                }
                std::fs::write(&wrapper_path, &content)?;
                Ok(wrapper_path)
            }
        }
    }
}

/// Seed and classification tables for the type registry.
#[derive(Debug, Default, Deserialize)]
pub struct TypesConfig {
    /// Library boolean typedef, registered as a basic type up front.
    #[serde(default)]
    pub bool_alias: Option<String>,
    /// Struct names kept as basic value types; their struct declarations
    /// are ignored.
    #[serde(default)]
    pub exclusions: Vec<String>,
    /// Classes whose `<CLASS>_RELEASE` method is tracked.
    #[serde(default)]
    pub ref_counted: Vec<String>,
}

impl TypesConfig {
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclusions.iter().any(|e| e == name)
    }

    pub fn is_ref_counted(&self, name: &str) -> bool {
        self.ref_counted.iter().any(|r| r == name)
    }
}

/// Maps a name prefix to a library tag and table sentinel.
#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceRule {
    pub prefix: String,
    pub library: Library,
    pub table_index: i32,
}

impl NamespaceRule {
    /// Case-insensitive prefix match; returns the remainder of `name`.
    pub fn strip<'a>(&self, name: &'a str) -> Option<&'a str> {
        let head = name.get(..self.prefix.len())?;
        if head.eq_ignore_ascii_case(&self.prefix) {
            Some(&name[self.prefix.len()..])
        } else {
            None
        }
    }
}

impl Config {
    /// First namespace rule whose prefix matches `name`.
    pub fn namespace_for(&self, name: &str) -> Option<&NamespaceRule> {
        self.namespace.iter().find(|r| r.strip(name).is_some())
    }

    pub fn accessor_for(&self, usage: Usage) -> Accessor {
        self.accessors.get(&usage).copied().unwrap_or_default()
    }

    pub fn usage_override(&self, function: &str, argument: &str) -> Option<Usage> {
        self.usage_override
            .iter()
            .find(|o| o.target.function == function && o.target.argument == argument)
            .map(|o| o.usage)
    }

    pub fn is_optional(&self, function: &str, argument: &str) -> bool {
        self.optional_argument
            .iter()
            .any(|o| o.function == function && o.argument == argument)
    }

    /// Every (function, argument) pair named by an override table.
    pub fn override_targets(&self) -> impl Iterator<Item = (&'static str, &ArgumentRef)> {
        self.usage_override
            .iter()
            .map(|o| ("usage_override", &o.target))
            .chain(
                self.optional_argument
                    .iter()
                    .map(|o| ("optional_argument", o)),
            )
    }

    /// Checks that can run before any header is read.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, later) in self.namespace.iter().enumerate() {
            if let Some(earlier) = self.namespace[..i]
                .iter()
                .find(|e| e.strip(&later.prefix).is_some())
            {
                anyhow::bail!(
                    "namespace rule `{}` can never match: earlier rule `{}` already covers it \
                     (list the more specific prefix first)",
                    later.prefix,
                    earlier.prefix
                );
            }
        }
        Ok(())
    }
}

/// A (function, argument) pair.
#[derive(Debug, Clone, Deserialize)]
pub struct ArgumentRef {
    pub function: String,
    pub argument: String,
}

/// Forces the usage role of one argument.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageOverride {
    #[serde(flatten)]
    pub target: ArgumentRef,
    pub usage: Usage,
}

/// Enumeration constant collection.
#[derive(Debug, Default, Deserialize)]
pub struct EnumConfig {
    /// Stripped from typedef'd enum constants; `#define` names must carry it.
    #[serde(default)]
    pub prefix: String,
    /// Typedef'd enum constants ending in one of these are skipped.
    #[serde(default)]
    pub skip_suffixes: Vec<String>,
    /// Headers scanned line by line for `#define <prefix>NAME`.
    #[serde(default)]
    pub headers: Vec<PathBuf>,
    /// Scanned names (prefix stripped) starting with one of these are skipped.
    #[serde(default)]
    pub exclude_prefixes: Vec<String>,
    /// Scanned names (prefix stripped) that are skipped outright.
    #[serde(default)]
    pub exceptions: Vec<String>,
}

/// Resolve a header path by searching `base_dir` first, then each
/// `include_paths` entry.  Absolute paths are returned as-is.  If the
/// file is not found anywhere, falls back to `base_dir.join(path)` so
/// that the caller gets a meaningful error.
pub fn resolve_header(path: &Path, base_dir: &Path, include_paths: &[PathBuf]) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let candidate = base_dir.join(path);
    if candidate.exists() {
        return candidate;
    }
    for inc in include_paths {
        let candidate = inc.join(path);
        if candidate.exists() {
            return candidate;
        }
    }
    base_dir.join(path)
}

/// Load and parse a `bnd-bridge.toml` configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let config = parse_config(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {:#}", path.display(), e))?;
    Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}
