#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(
    dead_code,
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs
)]
//! Shared HTTP DTOs for the Lenses management API.
//!
//! These types are used by the client for request/response encoding and by
//! the CLI for rendering and for loading payloads from JSON/YAML files, so
//! the wire shape lives in a single place.
//!
//! Layout: `acl.rs` (Kafka ACLs and their validation), `connector.rs`
//! (Kafka Connect resources), `user.rs` (session and license data).

pub mod acl;
pub mod connector;
pub mod user;

pub use acl::{Acl, AclOperation, AclPermissionType, AclResourceType, AclValidationError};
pub use connector::{
    ConnectCluster, Connector, ConnectorConfig, ConnectorPlugin, ConnectorState, ConnectorStatus,
    ConnectorTask, ConnectorTaskId, ConnectorTaskStatus, CreateConnectorRequest,
    CreateUpdateConnectorPayload, PayloadError, UNKNOWN_PLUGIN_VERSION,
};
pub use user::{LicenseInfo, LoginRequest, LoginResponse, User};

use serde_json::{Map, Value};

/// Wrap a list of plain names into single-key objects, e.g. `[{"name": "a"}]`.
///
/// Used when a command prints names only but still emits JSON.
#[must_use]
pub fn outline_string_results(key: &str, names: &[String]) -> Vec<Value> {
    names
        .iter()
        .map(|name| {
            let mut entry = Map::with_capacity(1);
            entry.insert(key.to_string(), Value::String(name.clone()));
            Value::Object(entry)
        })
        .collect()
}
