mod types;

pub use types::*;

use crate::{Error, Result};
use std::{env, path::Path};
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Loads the configuration file (if any) and applies environment overrides.
///
/// When `CONFIG_PATH` is unset and `config.yaml` does not exist, built-in
/// defaults are used. An explicitly configured path that does not exist is an
/// error.
pub async fn load() -> Result<Config> {
    let explicit_path = env::var("CONFIG_PATH").ok();
    let config_path = explicit_path
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let mut config = if explicit_path.is_some() || Path::new(&config_path).exists() {
        debug!("Loading configuration from: {}", config_path);
        from_file(&config_path).await?
    } else {
        debug!("No configuration file found, using defaults");
        Config::default()
    };

    apply_env_overrides(&mut config, |key| env::var(key).ok())?;

    Ok(config)
}

pub async fn from_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config_str = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::config(format!("Cannot read {}: {}", path.display(), e))
    })?;
    let config: Config = serde_yaml::from_str(&config_str)?;
    Ok(config)
}

/// Overlays environment variables onto `config`. `lookup` abstracts the
/// environment so callers can supply their own source.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup("GOOGLE_API_KEY") {
        config.llm.api_key = key;
    }
    if let Some(base_url) = lookup("LLM_BASE_URL") {
        config.llm.base_url = base_url;
    }
    if let Some(model) = lookup("LLM_MODEL") {
        config.llm.model = model;
    }
    if let Some(key) = lookup("SERPAPI_API_KEY") {
        config.search.api_key = Some(key).filter(|k| !k.is_empty());
    }
    if let Some(host) = lookup("HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("PORT") {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|_| Error::config(format!("Invalid PORT value: '{}'", port)))?;
    }
    // FLASK_DEBUG is honoured for existing deployments; DEBUG wins when both are set
    if let Some(debug) = lookup("DEBUG").or_else(|| lookup("FLASK_DEBUG")) {
        config.server.debug = parse_flag(&debug);
    }
    if let Some(dir) = lookup("FRONTEND_DIR") {
        config.server.frontend_dir = dir;
    }

    Ok(())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
