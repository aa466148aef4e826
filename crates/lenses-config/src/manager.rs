//! Context manager backed by the configuration file.
//!
//! # Design
//! - Passwords are plain in memory and encrypted only in the copy written
//!   to disk.
//! - A password that fails to decrypt is dropped with a warning; the context
//!   then reports invalid and can be re-configured.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::crypto::{decrypt_password, encrypt_password};
use crate::defaults::{DEFAULT_CONTEXT, default_config_path, local_config_path};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ClientConfiguration, ConfigDocument, ConfigFile, ContextOverrides};

/// Owns the loaded configuration and the location it is saved to.
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    path: Option<PathBuf>,
    config: ConfigFile,
}

impl ConfigManager {
    /// Empty manager that saves to `path`, or to the home location when `None`.
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            config: ConfigFile::default(),
        }
    }

    /// Load from `explicit`, else `./lenses-cli.yml`, else
    /// `$HOME/.lenses/lenses-cli.yml`.
    ///
    /// A missing file yields an empty manager; an explicit path is kept as
    /// the save target.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Self::from_file(path);
            }
            debug!(path = %path.display(), "configuration file not found");
            return Ok(Self::new(Some(path.to_path_buf())));
        }

        let candidates = [Some(local_config_path()), default_config_path().ok()];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::new(None))
    }

    /// Load a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let document: ConfigDocument = if is_json(path) {
            serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };

        let mut config = ConfigFile::from(document);
        for (name, context) in &mut config.contexts {
            context.format_host();
            if let Err(err) = decrypt_password(context) {
                warn!(context = %name, error = %err, "discarding undecryptable password");
                context.password.clear();
            }
        }

        debug!(path = %path.display(), contexts = config.contexts.len(), "configuration loaded");
        Ok(Self {
            path: Some(path.to_path_buf()),
            config,
        })
    }

    /// File the configuration was loaded from or will be saved to.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Change the save target.
    pub fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    /// Name of the selected context; may not exist yet.
    #[must_use]
    pub fn current_name(&self) -> &str {
        &self.config.current_context
    }

    /// Select a context by name.
    pub fn set_current(&mut self, name: &str) {
        self.config.current_context = name.trim().to_string();
    }

    /// Whether the selected context is stored.
    #[must_use]
    pub fn current_context_exists(&self) -> bool {
        !self.config.current_context.is_empty()
            && self
                .config
                .contexts
                .contains_key(&self.config.current_context)
    }

    /// The selected context, if stored.
    #[must_use]
    pub fn current(&self) -> Option<&ClientConfiguration> {
        self.config.contexts.get(&self.config.current_context)
    }

    /// The selected context, created empty when missing; an unnamed
    /// selection becomes `master`.
    pub fn current_mut(&mut self) -> &mut ClientConfiguration {
        if self.config.current_context.is_empty() {
            self.config.current_context = DEFAULT_CONTEXT.to_string();
        }
        self.config
            .contexts
            .entry(self.config.current_context.clone())
            .or_default()
    }

    /// A context by name.
    #[must_use]
    pub fn context(&self, name: &str) -> Option<&ClientConfiguration> {
        self.config.contexts.get(name)
    }

    /// Stored context names in sorted order.
    #[must_use]
    pub fn context_names(&self) -> Vec<String> {
        self.config.contexts.keys().cloned().collect()
    }

    /// Whether a context was selected and at least one is stored.
    #[must_use]
    pub fn has_saved_contexts(&self) -> bool {
        !self.config.current_context.is_empty() && !self.config.contexts.is_empty()
    }

    /// Whether the selected context can open a session.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.current().is_some_and(ClientConfiguration::is_valid)
    }

    /// Merge command line values into the selected context.
    ///
    /// The context is only created when connection values were supplied.
    pub fn apply_overrides(&mut self, overrides: &ContextOverrides) {
        if overrides.has_connection_values() {
            self.current_mut().apply(overrides);
        } else if let Some(context) = self
            .config
            .contexts
            .get_mut(&self.config.current_context)
        {
            context.apply(overrides);
        }
    }

    /// Remove a context and persist the change.
    ///
    /// Removing the selected context moves the selection to the first other
    /// valid context; without one the removal is refused. Returns `false`
    /// when nothing was removed.
    ///
    /// # Errors
    ///
    /// Returns an error when the updated file cannot be saved.
    pub fn remove_context(&mut self, name: &str) -> ConfigResult<bool> {
        if !self.config.contexts.contains_key(name) {
            return Ok(false);
        }

        if self.config.current_context == name {
            let replacement = self
                .config
                .contexts
                .iter()
                .find(|(candidate, context)| candidate.as_str() != name && context.is_valid())
                .map(|(candidate, _)| candidate.clone());
            let Some(replacement) = replacement else {
                return Ok(false);
            };
            self.config.current_context = replacement;
        }

        self.config.contexts.remove(name);
        self.save()?;
        info!(context = %name, current = %self.config.current_context, "context removed");
        Ok(true)
    }

    /// Write the configuration, encrypting passwords, and return the path.
    ///
    /// # Errors
    ///
    /// Returns an error when no target can be determined, encryption fails
    /// or the file cannot be written.
    pub fn save(&mut self) -> ConfigResult<PathBuf> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };

        let mut file = self.config.clone();
        for context in file.contexts.values_mut() {
            context.format_host();
            if !context.password.is_empty() {
                encrypt_password(context)?;
            }
        }

        let body = if is_json(&path) {
            serde_json::to_string_pretty(&file).map_err(|err| ConfigError::Serialize {
                detail: err.to_string(),
            })?
        } else {
            serde_yaml::to_string(&file).map_err(|err| ConfigError::Serialize {
                detail: err.to_string(),
            })?
        };

        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, body).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;
        restrict_permissions(&path)?;

        info!(path = %path.display(), "configuration saved");
        self.path = Some(path.clone());
        Ok(path)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> ConfigResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|source| {
        ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> ConfigResult<()> {
    Ok(())
}
