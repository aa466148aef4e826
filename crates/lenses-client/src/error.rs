//! Error types for API calls.

use lenses_api_models::AclValidationError;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while talking to the Lenses API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured host is not a usable URL.
    #[error("invalid host '{host}'")]
    InvalidHost {
        /// Host as configured.
        host: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// The host URL cannot carry a path (e.g. `mailto:`).
    #[error("host '{0}' cannot be used as a base URL")]
    CannotBeBase(String),
    /// Neither a token nor a user/password pair was configured.
    #[error("client: credentials missing or invalid")]
    MissingCredentials,
    /// The login endpoint answered but refused the session.
    #[error("login rejected for user '{0}'")]
    LoginRejected(String),
    /// The request never produced a response.
    #[error("request to {method} {path} failed")]
    Transport {
        /// HTTP method.
        method: Method,
        /// Request path.
        path: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("{method} {path} returned {status}: {message}")]
    Resource {
        /// HTTP method.
        method: Method,
        /// Request path.
        path: String,
        /// Response status.
        status: StatusCode,
        /// Message extracted from the response body.
        message: String,
    },
    /// The response body did not match the expected shape.
    #[error("failed to decode response from {path}")]
    Decode {
        /// Request path.
        path: String,
        /// Underlying decode error.
        #[source]
        source: reqwest::Error,
    },
    /// A configuration entry the client relies on was malformed.
    #[error("configuration entry '{key}' is malformed")]
    ConfigEntry {
        /// Configuration key.
        key: &'static str,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// An ACL was rejected before being sent.
    #[error(transparent)]
    InvalidAcl(#[from] AclValidationError),
}

impl ClientError {
    /// HTTP status of a resource error.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Resource { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Build a [`ClientError::Resource`] from a failed response.
pub(crate) async fn resource_error(
    method: Method,
    path: String,
    response: reqwest::Response,
) -> ClientError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();
    let body_text = String::from_utf8_lossy(&bytes).trim().to_string();

    let message = serde_json::from_slice::<ErrorBody>(&bytes)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            if body_text.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body_text
            }
        });

    ClientError::Resource {
        method,
        path,
        status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(status: StatusCode) -> ClientError {
        ClientError::Resource {
            method: Method::GET,
            path: "/api/acl".into(),
            status,
            message: "nope".into(),
        }
    }

    #[test]
    fn not_found_is_detected_from_status() {
        assert!(resource(StatusCode::NOT_FOUND).is_not_found());
        assert!(!resource(StatusCode::BAD_REQUEST).is_not_found());
        assert!(!ClientError::MissingCredentials.is_not_found());
    }

    #[test]
    fn resource_error_display_includes_request() {
        assert_eq!(
            resource(StatusCode::FORBIDDEN).to_string(),
            "GET /api/acl returned 403 Forbidden: nope"
        );
    }
}
