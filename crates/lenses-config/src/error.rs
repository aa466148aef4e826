//! Error types for configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration file failed.
    #[error("failed to read configuration file {path}")]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing the configuration file failed.
    #[error("failed to write configuration file {path}")]
    Write {
        /// File or directory that could not be written.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The YAML document was malformed.
    #[error("configuration file {path} is not valid YAML")]
    Yaml {
        /// Offending file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },
    /// The JSON document was malformed.
    #[error("configuration file {path} is not valid JSON")]
    Json {
        /// Offending file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// Serialising the configuration failed.
    #[error("failed to serialize configuration")]
    Serialize {
        /// Underlying error detail.
        detail: String,
    },
    /// A password was required but empty.
    #[error("empty password")]
    EmptyPassword,
    /// Encrypted material could not be processed.
    #[error("password encryption failed: {reason}")]
    Crypto {
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// No home directory could be located for the default path.
    #[error("unable to locate the home directory")]
    HomeDirUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(ConfigError::EmptyPassword.to_string(), "empty password");
        assert_eq!(
            ConfigError::Crypto {
                reason: "short cipher"
            }
            .to_string(),
            "password encryption failed: short cipher"
        );
        assert_eq!(
            ConfigError::Read {
                path: PathBuf::from("/tmp/lenses-cli.yml"),
                source: io::Error::other("io"),
            }
            .to_string(),
            "failed to read configuration file /tmp/lenses-cli.yml"
        );
    }
}
