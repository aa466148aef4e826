//! Loading command payloads from JSON or YAML files.

use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use lenses_api_models::ConnectorConfig;
use serde::de::DeserializeOwned;

use crate::client::{CliError, CliResult};

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Decode `path` as JSON when it has a `.json` extension, as YAML otherwise.
pub(crate) fn load_file<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .map_err(CliError::failure)?;

    if is_json(path) {
        serde_json::from_str(&raw).map_err(|err| {
            CliError::validation(format!("{} is not valid JSON: {err}", path.display()))
        })
    } else {
        serde_yaml::from_str(&raw).map_err(|err| {
            CliError::validation(format!("{} is not valid YAML: {err}", path.display()))
        })
    }
}

/// A connector config given as a file path or as inline JSON.
pub(crate) fn load_connector_config(raw: &str) -> CliResult<ConnectorConfig> {
    let raw = raw.trim();
    let path = Path::new(raw);
    if !raw.starts_with('{') && path.is_file() {
        return load_file(path);
    }
    serde_json::from_str(raw).map_err(|err| {
        CliError::validation(format!(
            "--config must be a JSON object or a path to a JSON/YAML file: {:#}",
            anyhow!(err)
        ))
    })
}
