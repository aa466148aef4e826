//! Context and configuration file models.
//!
//! The file keeps the `CurrentContext` / `Contexts` YAML layout with
//! PascalCase keys; a file holding a single top-level `Host`/`User`/...
//! block is read as the `master` context.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::{DEFAULT_CONTEXT, DEFAULT_TIMEOUT};

/// Mask printed in place of secrets.
pub const REDACTED: &str = "****";

/// Connection settings for one Lenses instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientConfiguration {
    /// Full address including scheme and port.
    #[serde(default)]
    pub host: String,
    /// User name for the login exchange.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    /// Password; plain in memory, encrypted on disk.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    /// Pre-issued access token, used instead of user/password.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Request timeout such as `15s` or `500ms`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timeout: String,
    /// Enables debug logging for this context.
    #[serde(default)]
    pub debug: bool,
}

impl ClientConfiguration {
    /// Normalise the host: trim, drop trailing slashes and default the
    /// scheme to `http://`.
    pub fn format_host(&mut self) {
        let trimmed = self.host.trim().trim_end_matches('/');
        self.host = if trimmed.is_empty() {
            String::new()
        } else if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };
    }

    /// A host plus either a token or a user/password pair.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.host.trim().is_empty()
            && (!self.token.trim().is_empty()
                || (!self.user.trim().is_empty() && !self.password.is_empty()))
    }

    /// Parsed request timeout, falling back to the default.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        parse_timeout(&self.timeout).unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Copy safe for printing: password and token are masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.password.is_empty() {
            copy.password = REDACTED.to_string();
        }
        if !copy.token.is_empty() {
            copy.token = REDACTED.to_string();
        }
        copy
    }

    /// Merge non-empty overrides into this context.
    pub fn apply(&mut self, overrides: &ContextOverrides) {
        let fields = [
            (&mut self.host, &overrides.host),
            (&mut self.user, &overrides.user),
            (&mut self.password, &overrides.password),
            (&mut self.token, &overrides.token),
            (&mut self.timeout, &overrides.timeout),
        ];
        for (target, value) in fields {
            if let Some(value) = value.as_deref().filter(|value| !value.trim().is_empty()) {
                *target = value.to_string();
            }
        }
        if overrides.debug {
            self.debug = true;
        }
        self.format_host();
    }
}

/// Values supplied on the command line or through the environment that
/// take precedence over the stored context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOverrides {
    /// Host override.
    pub host: Option<String>,
    /// User override.
    pub user: Option<String>,
    /// Password override.
    pub password: Option<String>,
    /// Token override.
    pub token: Option<String>,
    /// Timeout override.
    pub timeout: Option<String>,
    /// Forces debug logging on.
    pub debug: bool,
}

impl ContextOverrides {
    /// Whether any credential or connection value was supplied.
    #[must_use]
    pub fn has_connection_values(&self) -> bool {
        [&self.host, &self.user, &self.password, &self.token]
            .into_iter()
            .any(|value| value.as_deref().is_some_and(|value| !value.trim().is_empty()))
    }
}

/// On-disk document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigFile {
    /// Name of the selected context.
    #[serde(default)]
    pub current_context: String,
    /// Contexts keyed by name.
    #[serde(default)]
    pub contexts: BTreeMap<String, ClientConfiguration>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ConfigDocument {
    #[serde(default)]
    current_context: String,
    #[serde(default)]
    contexts: BTreeMap<String, ClientConfiguration>,
    #[serde(flatten)]
    legacy: ClientConfiguration,
}

impl From<ConfigDocument> for ConfigFile {
    fn from(document: ConfigDocument) -> Self {
        if document.contexts.is_empty() && !document.legacy.host.trim().is_empty() {
            let mut contexts = BTreeMap::new();
            contexts.insert(DEFAULT_CONTEXT.to_string(), document.legacy);
            return Self {
                current_context: DEFAULT_CONTEXT.to_string(),
                contexts,
            };
        }
        Self {
            current_context: document.current_context,
            contexts: document.contexts,
        }
    }
}

/// Parse durations such as `15s`, `500ms`, `2m`, `1h30m`; a bare number is
/// read as seconds.
#[must_use]
pub fn parse_timeout(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let mut total = Duration::ZERO;
    let mut rest = raw;
    while !rest.is_empty() {
        let digits = rest.find(|ch: char| !ch.is_ascii_digit())?;
        if digits == 0 {
            return None;
        }
        let value: u64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];
        let unit_len = rest
            .find(|ch: char| ch.is_ascii_digit())
            .unwrap_or(rest.len());
        let component = match &rest[..unit_len] {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.checked_mul(60)?),
            "h" => Duration::from_secs(value.checked_mul(3600)?),
            _ => return None,
        };
        total = total.checked_add(component)?;
        rest = &rest[unit_len..];
    }
    Some(total)
}
