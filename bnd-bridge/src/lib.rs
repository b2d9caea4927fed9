//! bnd-bridge — C API headers → binding metadata.
//!
//! Parses C headers via libclang into a declaration tree, classifies every
//! type, argument and function, and produces a [`model::BindingModel`] that a
//! rendering stage turns into binding source.
//!
//! # Quick start
//!
//! Generate the model from a config and write it as JSON:
//!
//! ```no_run
//! use std::path::Path;
//!
//! // Reads config TOML, parses headers, writes the JSON model.
//! bnd_bridge::run(Path::new("bnd-bridge.toml"), None, None).unwrap();
//! ```
//!
//! Or get the model without writing to disk:
//!
//! ```no_run
//! use std::path::Path;
//!
//! let model = bnd_bridge::generate(Path::new("bnd-bridge.toml")).unwrap();
//! println!("{} functions", model.functions.len());
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

pub mod analyze;
pub mod config;
pub mod decl;
pub mod enums;
pub mod extract;
pub mod methods;
pub mod model;
pub mod naming;
pub mod registry;
pub mod structs;
pub mod usage;

/// Run the full pipeline: load config, obtain the declaration tree, analyze
/// it, and write the model as JSON.
///
/// `config_path` is the path to a `bnd-bridge.toml` configuration file.
/// `output` optionally overrides the output file path from the config.
/// `decls` optionally names a JSON declaration tree to analyze instead of
/// parsing the configured headers with libclang.
///
/// Returns the path the model was written to.
pub fn run(config_path: &Path, output: Option<&Path>, decls: Option<&Path>) -> Result<PathBuf> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let model = match decls {
        Some(path) => {
            let decls = load_decls(path)?;
            analyze::analyze(&decls, &cfg, base_dir)?
        }
        None => generate_from_config(&cfg, base_dir)?,
    };

    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => base_dir.join(&cfg.output.file),
    };
    let json = serde_json::to_string_pretty(&model).context("serializing binding model")?;
    std::fs::write(&output_path, &json)
        .with_context(|| format!("writing output to {}", output_path.display()))?;

    info!(
        path = %output_path.display(),
        size = json.len(),
        "wrote binding model"
    );

    Ok(output_path)
}

/// Parse a `bnd-bridge.toml` config file, extract declarations from the
/// referenced C headers, and return the model without writing to disk.
pub fn generate(config_path: &Path) -> Result<model::BindingModel> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    generate_from_config(&cfg, base_dir)
}

/// Extract and analyze with an already-loaded [`config::Config`].
///
/// `base_dir` is the directory relative to which header paths in the config
/// are resolved (typically the parent directory of the TOML file).
pub fn generate_from_config(cfg: &config::Config, base_dir: &Path) -> Result<model::BindingModel> {
    info!(headers = cfg.input.headers.len(), "loaded configuration");

    // Initialize clang
    let clang =
        clang::Clang::new().map_err(|e| anyhow::anyhow!("failed to initialize libclang: {e}"))?;
    let index = clang::Index::new(&clang, false, false);

    let decls = extract::extract_decls(&index, cfg, base_dir)?;
    analyze::analyze(&decls, cfg, base_dir)
}

/// Read a declaration tree serialized as a JSON array of [`decl::Decl`].
pub fn load_decls(path: &Path) -> Result<Vec<decl::Decl>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading declaration tree {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing declaration tree {}", path.display()))
}
