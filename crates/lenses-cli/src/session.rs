//! State shared by every command of one process: the loaded contexts, the
//! prompter and the API client once a command needed one.

use lenses_client::LensesClient;
use lenses_config::{ClientConfiguration, ConfigManager, ContextOverrides};
use tracing::debug;

use crate::client::{AppContext, CliResult, check_context, connect_context};
use crate::output::OutputSettings;
use crate::prompt::Prompter;

pub(crate) struct Session {
    pub(crate) manager: ConfigManager,
    pub(crate) overrides: ContextOverrides,
    pub(crate) output: OutputSettings,
    pub(crate) prompter: Prompter,
    pub(crate) trace_id: String,
    client: Option<LensesClient>,
}

impl Session {
    pub(crate) fn new(
        manager: ConfigManager,
        overrides: ContextOverrides,
        output: OutputSettings,
        prompter: Prompter,
        trace_id: String,
    ) -> Self {
        Self {
            manager,
            overrides,
            output,
            prompter,
            trace_id,
            client: None,
        }
    }

    /// The selected context with the command line overrides applied.
    ///
    /// The stored context is left untouched; only `configure` persists
    /// overrides.
    pub(crate) fn active_configuration(&self) -> ClientConfiguration {
        let mut cfg = self.manager.current().cloned().unwrap_or_default();
        cfg.apply(&self.overrides);
        cfg
    }

    /// Context for API commands, logging in on first use.
    pub(crate) async fn app_context(&mut self) -> CliResult<AppContext> {
        let client = if let Some(client) = &self.client {
            client.clone()
        } else {
            let cfg = self.active_configuration();
            let client = connect_context(&cfg, &self.trace_id).await?;
            debug!(host = %client.base_url(), context = %self.manager.current_name(), "session opened");
            self.client = Some(client.clone());
            client
        };
        Ok(AppContext {
            client,
            output: self.output,
        })
    }

    /// Drop the cached client after the selected context changed.
    pub(crate) fn reset_client(&mut self) {
        self.client = None;
    }

    /// Whether the named context is accepted by its server.
    pub(crate) async fn context_connects(&self, name: &str) -> bool {
        let Some(cfg) = self.manager.context(name) else {
            return false;
        };
        match check_context(cfg, &self.trace_id).await {
            Ok(()) => true,
            Err(err) => {
                debug!(context = %name, error = %err.display_message(), "context failed validation");
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn scripted(manager: ConfigManager, script: &str) -> Self {
        Self::new(
            manager,
            ContextOverrides::default(),
            OutputSettings::default(),
            Prompter::scripted(script),
            "trace-test".to_string(),
        )
    }
}
