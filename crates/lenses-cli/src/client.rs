//! Shared client utilities and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;
use lenses_client::{Authentication, ClientError, LensesClient};
use lenses_config::ClientConfiguration;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::output::OutputSettings;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Application context passed to handlers that talk to the API.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: LensesClient,
    pub(crate) output: OutputSettings,
}

/// Build the HTTP client used for one context.
pub(crate) fn build_http_client(timeout: Duration, trace_id: &str) -> CliResult<Client> {
    let mut default_headers = HeaderMap::new();
    let request_id = HeaderValue::from_str(trace_id)
        .map_err(|_| CliError::failure(anyhow!("trace identifier contains invalid characters")))?;
    default_headers.insert(HEADER_REQUEST_ID, request_id);

    Client::builder()
        .timeout(timeout)
        .default_headers(default_headers)
        .build()
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))
}

/// Open an API session with the credentials of `cfg`.
pub(crate) async fn connect_context(
    cfg: &ClientConfiguration,
    trace_id: &str,
) -> CliResult<LensesClient> {
    if !cfg.is_valid() {
        return Err(CliError::validation(format!(
            "{}, run 'configure' or pass --host with --user/--pass or --token",
            ClientError::MissingCredentials
        )));
    }

    let http = build_http_client(cfg.timeout(), trace_id)?;
    let auth = if cfg.token.trim().is_empty() {
        Authentication::Credentials {
            user: cfg.user.clone(),
            password: cfg.password.clone(),
        }
    } else {
        Authentication::Token(cfg.token.clone())
    };

    debug!(host = %cfg.host, "connecting");
    LensesClient::connect(http, &cfg.host, auth)
        .await
        .map_err(classify)
}

/// Open a session for `cfg` and prove the server accepts it.
///
/// A login already round-trips; a token is exercised with an
/// authenticated request.
pub(crate) async fn check_context(cfg: &ClientConfiguration, trace_id: &str) -> CliResult<()> {
    let client = connect_context(cfg, trace_id).await?;
    if !cfg.token.trim().is_empty() {
        client.get_license_info().await.map_err(classify)?;
    }
    Ok(())
}

/// Map an API error onto the CLI error split.
pub(crate) fn classify(err: ClientError) -> CliError {
    match &err {
        ClientError::InvalidHost { .. }
        | ClientError::CannotBeBase(_)
        | ClientError::MissingCredentials
        | ClientError::InvalidAcl(_) => CliError::validation(format!("{:#}", anyhow!(err))),
        ClientError::Resource { status, .. }
            if matches!(
                *status,
                StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
            ) =>
        {
            CliError::validation(err.to_string())
        }
        _ => CliError::failure(err),
    }
}

/// Like [`classify`], but a 404 is reported with `message` instead.
pub(crate) fn classify_not_found(err: ClientError, message: impl FnOnce() -> String) -> CliError {
    if err.is_not_found() {
        CliError::failure(anyhow!(message()))
    } else {
        classify(err)
    }
}
