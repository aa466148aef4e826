//! Session setup and endpoint wrappers.
//!
//! # Design
//! - One `LensesClient` per authenticated session; the token is attached to
//!   every request after login.
//! - Connect endpoints are addressed through `path_segments_mut` so cluster
//!   and connector names are percent-encoded.

use lenses_api_models::{
    Acl, ConnectCluster, Connector, ConnectorConfig, ConnectorPlugin, ConnectorStatus,
    ConnectorTask, ConnectorTaskStatus, CreateConnectorRequest, LicenseInfo, LoginRequest,
    LoginResponse, User,
};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, ClientResult, resource_error};

/// Header carrying the session token.
pub const HEADER_TOKEN: &str = "X-Kafka-Lenses-Token";

/// Configuration entry listing the connect clusters.
pub const CONNECT_CLUSTERS_KEY: &str = "lenses.connect.clusters";

/// How a session authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// A previously issued access token.
    Token(String),
    /// User and password exchanged for a token at login.
    Credentials {
        /// User name.
        user: String,
        /// Plain password.
        password: String,
    },
}

/// Authenticated client for a single Lenses instance.
#[derive(Debug, Clone)]
pub struct LensesClient {
    http: Client,
    base_url: Url,
    token: String,
    user: User,
}

struct PreparedRequest {
    method: Method,
    path: String,
    builder: RequestBuilder,
}

impl PreparedRequest {
    fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.builder = self.builder.json(body);
        self
    }

    async fn send(self) -> ClientResult<(String, Response)> {
        debug!(method = %self.method, path = %self.path, "sending request");
        let response = self
            .builder
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                method: self.method.clone(),
                path: self.path.clone(),
                source,
            })?;

        if response.status().is_success() {
            Ok((self.path, response))
        } else {
            Err(resource_error(self.method, self.path, response).await)
        }
    }

    async fn execute(self) -> ClientResult<()> {
        self.send().await.map(|_| ())
    }

    async fn fetch<T: DeserializeOwned>(self) -> ClientResult<T> {
        let (path, response) = self.send().await?;
        response
            .json::<T>()
            .await
            .map_err(|source| ClientError::Decode { path, source })
    }
}

impl LensesClient {
    /// Open a session against `host`.
    ///
    /// Credentials are exchanged for a token through `POST /api/login`; a
    /// token is used as-is without a round trip.
    ///
    /// # Errors
    ///
    /// Returns an error when the host is not a URL, the credentials are
    /// empty, or the login request fails.
    pub async fn connect(http: Client, host: &str, auth: Authentication) -> ClientResult<Self> {
        let base_url = Url::parse(host.trim()).map_err(|source| ClientError::InvalidHost {
            host: host.to_string(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::CannotBeBase(host.to_string()));
        }

        let mut client = Self {
            http,
            base_url,
            token: String::new(),
            user: User::default(),
        };

        match auth {
            Authentication::Token(token) => {
                if token.trim().is_empty() {
                    return Err(ClientError::MissingCredentials);
                }
                client.token = token.trim().to_string();
            }
            Authentication::Credentials { user, password } => {
                if user.trim().is_empty() || password.is_empty() {
                    return Err(ClientError::MissingCredentials);
                }
                let login = client
                    .prepare(Method::POST, &["api", "login"])?
                    .json(&LoginRequest {
                        user: user.trim(),
                        password: &password,
                    })
                    .fetch::<LoginResponse>()
                    .await?;
                if !login.success || login.token.trim().is_empty() {
                    return Err(ClientError::LoginRejected(user));
                }
                client.token = login.token;
                client.user = login.user;
                debug!(user = %client.user.name, "login succeeded");
            }
        }

        Ok(client)
    }

    /// The authenticated user; empty when the session uses a raw token.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn prepare(&self, method: Method, segments: &[&str]) -> ClientResult<PreparedRequest> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::CannotBeBase(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        let path = url.path().to_string();

        let mut builder = self.http.request(method.clone(), url);
        if !self.token.is_empty() {
            builder = builder.header(HEADER_TOKEN, &self.token);
        }
        Ok(PreparedRequest {
            method,
            path,
            builder,
        })
    }

    /// List every ACL.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails or the body cannot be decoded.
    pub async fn get_acls(&self) -> ClientResult<Vec<Acl>> {
        self.prepare(Method::GET, &["api", "acl"])?.fetch().await
    }

    /// Create an ACL, or update the matching one.
    ///
    /// # Errors
    ///
    /// Returns an error when the ACL is invalid or the request fails.
    pub async fn create_or_update_acl(&self, mut acl: Acl) -> ClientResult<()> {
        acl.validate()?;
        self.prepare(Method::PUT, &["api", "acl"])?
            .json(&acl)
            .execute()
            .await
    }

    /// Delete an ACL.
    ///
    /// # Errors
    ///
    /// Returns an error when the ACL is invalid or the request fails.
    pub async fn delete_acl(&self, mut acl: Acl) -> ClientResult<()> {
        acl.validate()?;
        self.prepare(Method::DELETE, &["api", "acl"])?
            .json(&acl)
            .execute()
            .await
    }

    /// List the connect clusters configured on the instance.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration cannot be fetched or the
    /// cluster entry is malformed.
    pub async fn get_connect_clusters(&self) -> ClientResult<Vec<ConnectCluster>> {
        let mut config: Value = self.prepare(Method::GET, &["api", "config"])?.fetch().await?;
        match config.get_mut(CONNECT_CLUSTERS_KEY).map(Value::take) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(entry) => {
                serde_json::from_value(entry).map_err(|source| ClientError::ConfigEntry {
                    key: CONNECT_CLUSTERS_KEY,
                    source,
                })
            }
        }
    }

    /// Names of the connectors running on `cluster`.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn get_connectors(&self, cluster: &str) -> ClientResult<Vec<String>> {
        self.prepare(Method::GET, &connect_path(cluster, &[]))?
            .fetch()
            .await
    }

    /// A single connector.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn get_connector(&self, cluster: &str, name: &str) -> ClientResult<Connector> {
        let mut connector: Connector = self
            .prepare(Method::GET, &connect_path(cluster, &[name]))?
            .fetch()
            .await?;
        connector.cluster_name = cluster.to_string();
        Ok(connector)
    }

    /// Create a connector.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn create_connector(
        &self,
        cluster: &str,
        name: &str,
        config: &ConnectorConfig,
    ) -> ClientResult<Connector> {
        let mut connector: Connector = self
            .prepare(Method::POST, &connect_path(cluster, &[]))?
            .json(&CreateConnectorRequest { name, config })
            .fetch()
            .await?;
        connector.cluster_name = cluster.to_string();
        Ok(connector)
    }

    /// Replace a connector's configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn update_connector(
        &self,
        cluster: &str,
        name: &str,
        config: &ConnectorConfig,
    ) -> ClientResult<Connector> {
        let mut connector: Connector = self
            .prepare(Method::PUT, &connect_path(cluster, &[name, "config"]))?
            .json(config)
            .fetch()
            .await?;
        connector.cluster_name = cluster.to_string();
        Ok(connector)
    }

    /// A connector's configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn get_connector_config(
        &self,
        cluster: &str,
        name: &str,
    ) -> ClientResult<ConnectorConfig> {
        self.prepare(Method::GET, &connect_path(cluster, &[name, "config"]))?
            .fetch()
            .await
    }

    /// A connector's runtime status.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn get_connector_status(
        &self,
        cluster: &str,
        name: &str,
    ) -> ClientResult<ConnectorStatus> {
        self.prepare(Method::GET, &connect_path(cluster, &[name, "status"]))?
            .fetch()
            .await
    }

    /// Pause a connector and its tasks.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn pause_connector(&self, cluster: &str, name: &str) -> ClientResult<()> {
        self.prepare(Method::PUT, &connect_path(cluster, &[name, "pause"]))?
            .execute()
            .await
    }

    /// Resume a paused connector.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn resume_connector(&self, cluster: &str, name: &str) -> ClientResult<()> {
        self.prepare(Method::PUT, &connect_path(cluster, &[name, "resume"]))?
            .execute()
            .await
    }

    /// Restart a connector.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn restart_connector(&self, cluster: &str, name: &str) -> ClientResult<()> {
        self.prepare(Method::POST, &connect_path(cluster, &[name, "restart"]))?
            .execute()
            .await
    }

    /// Tasks of a connector with their configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn get_connector_tasks(
        &self,
        cluster: &str,
        name: &str,
    ) -> ClientResult<Vec<ConnectorTask>> {
        self.prepare(Method::GET, &connect_path(cluster, &[name, "tasks"]))?
            .fetch()
            .await
    }

    /// Current status of one task.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn get_connector_task_status(
        &self,
        cluster: &str,
        name: &str,
        task: i32,
    ) -> ClientResult<ConnectorTaskStatus> {
        let task = task.to_string();
        self.prepare(
            Method::GET,
            &connect_path(cluster, &[name, "tasks", &task, "status"]),
        )?
        .fetch()
        .await
    }

    /// Restart one task.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn restart_connector_task(
        &self,
        cluster: &str,
        name: &str,
        task: i32,
    ) -> ClientResult<()> {
        let task = task.to_string();
        self.prepare(
            Method::POST,
            &connect_path(cluster, &[name, "tasks", &task, "restart"]),
        )?
        .execute()
        .await
    }

    /// Delete a connector.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn delete_connector(&self, cluster: &str, name: &str) -> ClientResult<()> {
        self.prepare(Method::DELETE, &connect_path(cluster, &[name]))?
            .execute()
            .await
    }

    /// Connector plugins installed on `cluster`.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn get_connector_plugins(&self, cluster: &str) -> ClientResult<Vec<ConnectorPlugin>> {
        self.prepare(
            Method::GET,
            &["api", "proxy-connect", cluster, "connector-plugins"],
        )?
        .fetch()
        .await
    }

    /// License of the connected instance.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails.
    pub async fn get_license_info(&self) -> ClientResult<LicenseInfo> {
        self.prepare(Method::GET, &["api", "license"])?.fetch().await
    }
}

fn connect_path<'a>(cluster: &'a str, rest: &[&'a str]) -> Vec<&'a str> {
    let mut segments = vec!["api", "proxy-connect", cluster, "connectors"];
    segments.extend_from_slice(rest);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;
    use lenses_api_models::{AclOperation, AclPermissionType, AclResourceType};
    use reqwest::StatusCode;
    use serde_json::json;

    async fn token_client(server: &MockServer) -> Result<LensesClient> {
        Ok(LensesClient::connect(
            Client::new(),
            &server.base_url(),
            Authentication::Token("secret-token".into()),
        )
        .await?)
    }

    fn sample_acl() -> Acl {
        Acl {
            resource_type: AclResourceType::Topic,
            resource_name: "transactions".into(),
            principal: "User:alice".into(),
            permission_type: AclPermissionType::Allow,
            host: String::new(),
            operation: AclOperation::Read,
        }
    }

    #[tokio::test]
    async fn connect_logs_in_with_credentials() -> Result<()> {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST)
                .path("/api/login")
                .json_body(json!({"user": "admin", "password": "pw"}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "success": true,
                    "token": "tok-1",
                    "user": {"id": "admin", "name": "Admin", "roles": ["admin", "write"]}
                }));
        });
        let license = server.mock(|when, then| {
            when.method(GET)
                .path("/api/license")
                .header(HEADER_TOKEN, "tok-1");
            then.status(200).json_body(json!({
                "clientId": "acme",
                "isRespected": true,
                "maxBrokers": 3,
                "maxMessages": 10,
                "expiry": 1
            }));
        });

        let client = LensesClient::connect(
            Client::new(),
            &server.base_url(),
            Authentication::Credentials {
                user: "admin".into(),
                password: "pw".into(),
            },
        )
        .await?;
        assert_eq!(client.user().name, "Admin");
        assert_eq!(client.user().roles, vec!["admin", "write"]);

        let info = client.get_license_info().await?;
        assert_eq!(info.client_id, "acme");
        login.assert();
        license.assert();
        Ok(())
    }

    #[tokio::test]
    async fn connect_rejects_unsuccessful_login() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/login");
            then.status(200)
                .json_body(json!({"success": false, "token": ""}));
        });

        let err = LensesClient::connect(
            Client::new(),
            &server.base_url(),
            Authentication::Credentials {
                user: "admin".into(),
                password: "pw".into(),
            },
        )
        .await
        .expect_err("login should be rejected");
        assert!(matches!(err, ClientError::LoginRejected(user) if user == "admin"));
    }

    #[tokio::test]
    async fn connect_requires_credentials() {
        let err = LensesClient::connect(
            Client::new(),
            "http://localhost:3030",
            Authentication::Token("  ".into()),
        )
        .await
        .expect_err("empty token");
        assert!(matches!(err, ClientError::MissingCredentials));

        let err = LensesClient::connect(
            Client::new(),
            "not a url",
            Authentication::Token("t".into()),
        )
        .await
        .expect_err("invalid host");
        assert!(matches!(err, ClientError::InvalidHost { .. }));
    }

    #[tokio::test]
    async fn acl_set_sends_validated_payload() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/acl")
                .header(HEADER_TOKEN, "secret-token")
                .json_body(json!({
                    "resourceType": "TOPIC",
                    "resourceName": "transactions",
                    "principal": "User:alice",
                    "permissionType": "ALLOW",
                    "host": "*",
                    "operation": "READ"
                }));
            then.status(201);
        });

        let client = token_client(&server).await?;
        client.create_or_update_acl(sample_acl()).await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn invalid_acl_is_not_sent() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/api/acl");
            then.status(200);
        });

        let client = token_client(&server).await?;
        let acl = Acl {
            principal: String::new(),
            ..sample_acl()
        };
        let err = client.delete_acl(acl).await.expect_err("invalid acl");
        assert!(matches!(err, ClientError::InvalidAcl(_)));
        mock.assert_calls(0);
        Ok(())
    }

    #[tokio::test]
    async fn connector_names_are_percent_encoded() -> Result<()> {
        let client = LensesClient::connect(
            Client::new(),
            "http://localhost:3030/lenses/",
            Authentication::Token("t".into()),
        )
        .await?;
        let prepared = client.prepare(Method::GET, &connect_path("dev cluster", &["my/sink"]))?;
        assert_eq!(
            prepared.path,
            "/lenses/api/proxy-connect/dev%20cluster/connectors/my%2Fsink"
        );
        Ok(())
    }

    #[tokio::test]
    async fn get_connector_records_cluster_name() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/proxy-connect/dev/connectors/sink")
                .header(HEADER_TOKEN, "secret-token");
            then.status(200).json_body(json!({
                "name": "sink",
                "config": {"name": "sink"},
                "tasks": [{"connector": "sink", "task": 0}]
            }));
        });

        let client = token_client(&server).await?;
        let connector = client.get_connector("dev", "sink").await?;
        assert_eq!(connector.cluster_name, "dev");
        assert_eq!(connector.tasks.len(), 1);
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn missing_connector_surfaces_not_found() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/proxy-connect/dev/connectors/ghost/status");
            then.status(404)
                .json_body(json!({"error_code": 404, "message": "Connector ghost not found"}));
        });

        let client = token_client(&server).await?;
        let err = client
            .get_connector_status("dev", "ghost")
            .await
            .expect_err("missing connector");
        assert!(err.is_not_found());
        assert!(matches!(
            err,
            ClientError::Resource { status: StatusCode::NOT_FOUND, ref message, .. }
                if message == "Connector ghost not found"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn connect_clusters_are_read_from_config() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/config");
            then.status(200).json_body(json!({
                "lenses.version": "2.1",
                "lenses.connect.clusters": [
                    {"name": "prod", "url": "http://prod:8083", "statuses": "s", "configs": "c", "offsets": "o"},
                    {"name": "dev", "url": "http://dev:8083", "statuses": "s", "configs": "c", "offsets": "o"}
                ]
            }));
        });

        let client = token_client(&server).await?;
        let clusters = client.get_connect_clusters().await?;
        let names: Vec<&str> = clusters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["prod", "dev"]);
        Ok(())
    }

    #[tokio::test]
    async fn task_restart_targets_task_path() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/proxy-connect/dev/connectors/sink/tasks/2/restart");
            then.status(204);
        });

        let client = token_client(&server).await?;
        client.restart_connector_task("dev", "sink", 2).await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn create_connector_posts_name_and_config() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/proxy-connect/dev/connectors")
                .json_body(json!({"name": "sink", "config": {"name": "sink", "tasks.max": "1"}}));
            then.status(201).json_body(json!({
                "name": "sink",
                "config": {"name": "sink", "tasks.max": "1"},
                "tasks": []
            }));
        });

        let client = token_client(&server).await?;
        let mut config = ConnectorConfig::new();
        config.insert("name".into(), json!("sink"));
        config.insert("tasks.max".into(), json!("1"));
        let created = client.create_connector("dev", "sink", &config).await?;
        assert_eq!(created.cluster_name, "dev");
        mock.assert();
        Ok(())
    }
}
