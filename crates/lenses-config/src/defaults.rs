//! Well-known names and default locations.

use std::path::PathBuf;
use std::time::Duration;

use directories::BaseDirs;

use crate::error::{ConfigError, ConfigResult};

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "lenses-cli.yml";

/// Directory under `$HOME` holding the configuration file.
pub const CONFIG_HOME_DIR: &str = ".lenses";

/// Context created when none has been named.
pub const DEFAULT_CONTEXT: &str = "master";

/// Request timeout applied when a context does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// `$HOME/.lenses/lenses-cli.yml`.
///
/// # Errors
///
/// Returns an error when no home directory can be determined.
pub fn default_config_path() -> ConfigResult<PathBuf> {
    let dirs = BaseDirs::new().ok_or(ConfigError::HomeDirUnavailable)?;
    Ok(dirs.home_dir().join(CONFIG_HOME_DIR).join(CONFIG_FILE_NAME))
}

/// `./lenses-cli.yml`, consulted before the home location.
#[must_use]
pub fn local_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}
