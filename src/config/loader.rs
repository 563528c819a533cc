//! Configuration loading from disk.
//!
//! Layers, lowest precedence first:
//! 1. `application.toml` (required)
//! 2. `application-{env}.toml` (optional)
//! 3. `APP__SECTION__KEY=value` environment variables

use std::fs;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Base configuration file name.
pub const BASE_FILE: &str = "application.toml";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "APP__";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Deserialize(#[source] toml::de::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, merge and validate the configuration for `env` from `dir`,
/// applying overrides from the process environment.
pub fn load_config_for_env(dir: &Path, env: &str) -> Result<ServiceConfig, ConfigError> {
    load_config_with_overrides(dir, env, std::env::vars())
}

/// Same as [`load_config_for_env`] with an explicit set of variables.
pub fn load_config_with_overrides<I>(
    dir: &Path,
    env: &str,
    vars: I,
) -> Result<ServiceConfig, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut merged = read_table(&dir.join(BASE_FILE))?;

    let overlay_path = dir.join(format!("application-{env}.toml"));
    if overlay_path.exists() {
        let overlay = read_table(&overlay_path)?;
        merge_tables(&mut merged, overlay);
        tracing::debug!(path = %overlay_path.display(), "Applied environment config");
    }

    apply_env_overrides(&mut merged, vars);

    let config: ServiceConfig = Value::Table(merged)
        .try_into()
        .map_err(ConfigError::Deserialize)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_table(path: &Path) -> Result<Table, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    content.parse::<Table>().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Deep-merge `overlay` into `base`. Tables merge key by key; anything
/// else in `overlay` replaces the value in `base`.
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match value {
            Value::Table(incoming) => {
                if let Some(Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                } else {
                    base.insert(key, Value::Table(incoming));
                }
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}

/// Apply `APP__SECTION__KEY=value` overrides. Values are read as TOML
/// literals when possible (`250`, `true`), otherwise as strings.
fn apply_env_overrides<I>(table: &mut Table, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (name, raw) in vars {
        let Some(path) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let keys: Vec<String> = path
            .split("__")
            .filter(|k| !k.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        if keys.is_empty() {
            continue;
        }

        tracing::debug!(variable = %name, "Applying config override");
        insert_path(table, &keys, parse_literal(&raw));
    }
}

fn insert_path(table: &mut Table, keys: &[String], value: Value) {
    let (last, parents) = match keys.split_last() {
        Some(split) => split,
        None => return,
    };

    let mut current = table;
    for key in parents {
        let entry = current
            .entry(key.clone())
            .or_insert(Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }
        current = match entry {
            Value::Table(t) => t,
            _ => return,
        };
    }
    current.insert(last.clone(), value);
}

fn parse_literal(raw: &str) -> Value {
    format!("v = {raw}")
        .parse::<Table>()
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| Value::String(raw.to_string()))
}
