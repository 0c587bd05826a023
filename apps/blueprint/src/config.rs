//! # Configuration Loading
//!
//! Resolves the [`EditorConfig`] for a run:
//!
//! 1. `--config <path>` if given (must exist)
//! 2. `blueprint.toml` in the working directory, if present
//! 3. Built-in defaults
//!
//! Then environment overrides are applied on top:
//! - `BLUEPRINT_CONNECTION_POLICY`: `permissive` | `strict`
//! - `BLUEPRINT_ID_STRATEGY`: `uuid` | `sequential`
//!
//! ```toml
//! # blueprint.toml
//! connection_policy = "strict"
//! id_strategy = "sequential"
//! suggestion_limit = 4
//!
//! [default_node_size]
//! width = 180.0
//! height = 120.0
//! ```

use blueprint_core::{BlueprintError, ConnectionPolicy, EditorConfig, IdStrategy};
use std::path::Path;

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "blueprint.toml";

pub const ENV_CONNECTION_POLICY: &str = "BLUEPRINT_CONNECTION_POLICY";
pub const ENV_ID_STRATEGY: &str = "BLUEPRINT_ID_STRATEGY";

/// Parse a TOML config document.
pub fn from_toml_str(s: &str) -> Result<EditorConfig, BlueprintError> {
    toml::from_str(s).map_err(|e| BlueprintError::ConfigError(e.to_string()))
}

/// Read and parse a TOML config file.
pub fn from_toml_file(path: &Path) -> Result<EditorConfig, BlueprintError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        BlueprintError::ConfigError(format!("cannot read '{}': {}", path.display(), e))
    })?;
    from_toml_str(&content)
}

/// Resolve the configuration for this process.
pub fn load(explicit: Option<&Path>) -> Result<EditorConfig, BlueprintError> {
    let config = match explicit {
        Some(path) => from_toml_file(path)?,
        None => {
            let implicit = Path::new(DEFAULT_CONFIG_FILE);
            if implicit.is_file() {
                tracing::debug!("Loading config from {}", DEFAULT_CONFIG_FILE);
                from_toml_file(implicit)?
            } else {
                EditorConfig::default()
            }
        }
    };
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Apply `BLUEPRINT_*` overrides using `lookup` to read variables.
///
/// Unknown values are an error rather than silently ignored.
pub fn apply_env_overrides<F>(mut config: EditorConfig, lookup: F) -> Result<EditorConfig, BlueprintError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_CONNECTION_POLICY) {
        config.connection_policy = ConnectionPolicy::parse(&value).ok_or_else(|| {
            BlueprintError::ConfigError(format!(
                "{}: unknown policy '{}' (use permissive or strict)",
                ENV_CONNECTION_POLICY, value
            ))
        })?;
    }
    if let Some(value) = lookup(ENV_ID_STRATEGY) {
        config.id_strategy = IdStrategy::parse(&value).ok_or_else(|| {
            BlueprintError::ConfigError(format!(
                "{}: unknown strategy '{}' (use uuid or sequential)",
                ENV_ID_STRATEGY, value
            ))
        })?;
    }
    Ok(config)
}
