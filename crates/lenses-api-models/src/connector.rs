//! Kafka Connect resources proxied by the Lenses API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Version label shown for plugins that do not report one.
pub const UNKNOWN_PLUGIN_VERSION: &str = "X.X.X";

/// Connector configuration keyed by property name.
pub type ConnectorConfig = BTreeMap<String, Value>;

/// A connector as returned by the connect cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    /// Cluster the connector was read from; local only, never sent or received.
    #[serde(rename = "clusterName", default, skip_serializing_if = "String::is_empty")]
    pub cluster_name: String,
    /// Connector name.
    pub name: String,
    /// Connector configuration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: ConnectorConfig,
    /// Tasks currently assigned to the connector.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<ConnectorTaskId>,
}

/// Identifies a task of a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorTaskId {
    /// Owning connector.
    pub connector: String,
    /// Task number.
    pub task: i32,
}

/// A task together with the configuration the worker runs it with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorTask {
    /// Task identity.
    pub id: ConnectorTaskId,
    /// Task configuration.
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

/// Body of a connector creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateConnectorRequest<'a> {
    /// Connector name.
    pub name: &'a str,
    /// Connector configuration, including its `name` entry.
    pub config: &'a ConnectorConfig,
}

/// Errors raised while reconciling connector names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// Neither the payload nor the configuration named the connector.
    #[error("connector name is required (pass --name or set config.name)")]
    MissingName,
    /// The payload and its configuration disagree on the name.
    #[error("connector name '{name}' does not match config name '{config_name}'")]
    NameMismatch {
        /// Name given on the payload.
        name: String,
        /// Name found in the configuration.
        config_name: String,
    },
}

/// Payload used by `connector create` and `connector update`, either built
/// from flags or loaded from a JSON/YAML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateUpdateConnectorPayload {
    /// Target connect cluster.
    #[serde(rename = "clusterName", default)]
    pub cluster_name: String,
    /// Connector name.
    #[serde(default)]
    pub name: String,
    /// Connector configuration.
    #[serde(default)]
    pub config: ConnectorConfig,
}

impl CreateUpdateConnectorPayload {
    /// Reconcile `name` with `config.name` and write the result back into
    /// the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when no name can be found or the two names differ.
    pub fn apply_and_validate_name(&mut self) -> Result<(), PayloadError> {
        let config_name = self
            .config
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        let name = self.name.trim().to_string();

        let resolved = match (name.is_empty(), config_name.is_empty()) {
            (true, true) => return Err(PayloadError::MissingName),
            (true, false) => config_name,
            (false, true) => name,
            (false, false) if name == config_name => name,
            (false, false) => {
                return Err(PayloadError::NameMismatch { name, config_name });
            }
        };

        self.config
            .insert("name".to_string(), Value::String(resolved.clone()));
        self.name = resolved;
        Ok(())
    }
}

/// A connector plugin installed on a connect cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorPlugin {
    /// Fully qualified connector class.
    pub class: String,
    /// `source` or `sink`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Plugin version as reported by the worker.
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub version: String,
}

impl ConnectorPlugin {
    /// Replace a missing or `"null"` version with [`UNKNOWN_PLUGIN_VERSION`].
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.version.is_empty() || self.version == "null" {
            self.version = UNKNOWN_PLUGIN_VERSION.to_string();
        }
        self
    }
}

/// A Kafka Connect cluster known to Lenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectCluster {
    /// Cluster name.
    pub name: String,
    /// Worker REST endpoint(s).
    #[serde(default)]
    pub url: String,
    /// Status storage topic.
    #[serde(default)]
    pub statuses: String,
    /// Config storage topic.
    #[serde(default)]
    pub configs: String,
    /// Offset storage topic.
    #[serde(default)]
    pub offsets: String,
}

/// Runtime state of a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorState {
    /// `RUNNING`, `PAUSED`, `FAILED`, ...
    pub state: String,
    /// Worker running the connector.
    #[serde(default)]
    pub worker_id: String,
}

/// Runtime state of a connector task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorTaskStatus {
    /// Task number.
    pub id: i32,
    /// `RUNNING`, `PAUSED`, `FAILED`, ...
    pub state: String,
    /// Worker running the task.
    #[serde(default)]
    pub worker_id: String,
    /// Stack trace of the last failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

/// Combined connector and task status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorStatus {
    /// Connector name.
    pub name: String,
    /// Connector state.
    pub connector: ConnectorState,
    /// Task states.
    #[serde(default)]
    pub tasks: Vec<ConnectorTaskStatus>,
}

fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
