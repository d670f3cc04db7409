//! Load config: built-in defaults, optionally overridden by a JSON file.

use crate::config::{validate, AppConfig};
use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::path::Path;

/// Env var naming the override file.
pub const CONFIG_PATH_ENV: &str = "WEBPLAN_CONFIG";

/// Recursive merge. Only keys present in `defaults` are kept; objects merge, everything else is replaced.
pub fn merge(defaults: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (k, v) in defaults {
        let merged = match (v, overrides.get(k)) {
            (Value::Object(d), Some(Value::Object(o))) => Value::Object(merge(d, o)),
            (_, Some(o)) => o.clone(),
            (_, None) => v.clone(),
        };
        out.insert(k.clone(), merged);
    }
    out
}

/// Apply a JSON override document on top of the defaults, then validate.
pub fn from_override(overrides: &str) -> Result<AppConfig, ConfigError> {
    let defaults = match serde_json::to_value(AppConfig::default())? {
        Value::Object(m) => m,
        _ => return Err(ConfigError::Load("defaults must serialize to an object".into())),
    };
    let overrides = match serde_json::from_str::<Value>(overrides)? {
        Value::Object(m) => m,
        _ => return Err(ConfigError::Load("override must be a JSON object".into())),
    };
    let config: AppConfig = serde_json::from_value(Value::Object(merge(&defaults, &overrides)))?;
    validate(&config)?;
    Ok(config)
}

/// Defaults, merged with `path` when given.
pub async fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        let config = AppConfig::default();
        validate(&config)?;
        return Ok(config);
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    tracing::info!(path = %path.display(), "loaded config override");
    from_override(&text)
}

/// [`load_config`] with the path taken from `WEBPLAN_CONFIG`, if set.
pub async fn load_config_from_env() -> Result<AppConfig, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV).ok();
    load_config(path.as_deref().map(Path::new)).await
}
