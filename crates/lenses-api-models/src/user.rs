//! Session and license payloads.

use serde::{Deserialize, Serialize};

/// Credentials posted to the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    /// User name.
    pub user: &'a str,
    /// Plain password.
    pub password: &'a str,
}

/// Successful login response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Whether the platform accepted the credentials.
    #[serde(default)]
    pub success: bool,
    /// Access token for subsequent requests.
    pub token: String,
    /// Authenticated user.
    #[serde(default)]
    pub user: User,
}

/// The authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier; empty when the session was opened with a raw token.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Contact address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Roles granted by the administrator.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// License of the connected Lenses instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseInfo {
    /// License holder.
    pub client_id: String,
    /// Whether current usage stays within the license.
    pub is_respected: bool,
    /// Broker limit.
    pub max_brokers: i64,
    /// Message limit.
    pub max_messages: i64,
    /// Expiry as epoch milliseconds.
    pub expiry: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_response_tolerates_missing_user() {
        let response: LoginResponse =
            serde_json::from_value(json!({"success": true, "token": "abc"})).expect("login");
        assert_eq!(response.token, "abc");
        assert!(response.user.id.is_empty());
    }

    #[test]
    fn license_uses_camel_case_fields() {
        let license: LicenseInfo = serde_json::from_value(json!({
            "clientId": "acme",
            "isRespected": true,
            "maxBrokers": 3,
            "maxMessages": 1000,
            "expiry": 1_700_000_000_000_i64
        }))
        .expect("license");
        assert_eq!(license.client_id, "acme");
        assert_eq!(license.max_brokers, 3);
    }
}
