//! Argument parsing and command dispatch.

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use lenses_api_models::{AclOperation, AclPermissionType, AclResourceType};
use lenses_config::{ConfigManager, ContextOverrides};
use lenses_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, effective_level, init_logging};
use tracing::debug;
use uuid::Uuid;

use crate::client::{CliError, CliResult};
use crate::commands::acl::{handle_acl_delete, handle_acl_set, handle_acls};
use crate::commands::connectors::{
    handle_connect_clusters, handle_connector, handle_connector_plugins, handle_connectors,
};
use crate::commands::contexts::{
    handle_configure, handle_context, handle_context_delete, handle_context_set, handle_contexts,
};
use crate::commands::login::handle_login;
use crate::commands::user::{handle_license, handle_user};
use crate::output::OutputSettings;
use crate::prompt::Prompter;
use crate::session::Session;

/// Parses CLI arguments, executes the requested command and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let trace_id = Uuid::new_v4().to_string();

    match execute(cli, trace_id).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli, trace_id: String) -> CliResult<()> {
    let mut manager = ConfigManager::load(cli.global.file.as_deref()).map_err(CliError::failure)?;
    if let Some(context) = cli.global.context.as_deref() {
        manager.set_current(context);
    }
    let overrides = cli.global.overrides();
    let debug_context = manager.current().is_some_and(|cfg| cfg.debug);
    init_logging(&LoggingConfig {
        level: effective_level(&cli.global.log_level, debug_context),
        format: cli.global.log_format,
    })
    .map_err(CliError::failure)?;
    debug!(trace_id = %trace_id, context = %manager.current_name(), "starting");

    let mut session = Session::new(
        manager,
        overrides,
        cli.global.output(),
        Prompter::stdio(),
        trace_id,
    );
    dispatch(&mut session, cli.command).await
}

/// Top-level dispatch; only here can the login shell be started.
pub(crate) async fn dispatch(session: &mut Session, command: Command) -> CliResult<()> {
    match command {
        Command::Login => handle_login(session).await,
        other => dispatch_in_session(session, other).await,
    }
}

/// Dispatch shared by the command line and the login shell.
pub(crate) async fn dispatch_in_session(session: &mut Session, command: Command) -> CliResult<()> {
    match command {
        Command::Acls => handle_acls(&session.app_context().await?).await,
        Command::Acl(AclCommand::Set(args)) => {
            handle_acl_set(&session.app_context().await?, args).await
        }
        Command::Acl(AclCommand::Delete(args)) => {
            handle_acl_delete(&session.app_context().await?, args).await
        }
        Command::Connectors(args) => {
            let ctx = session.app_context().await?;
            match args.command {
                Some(ConnectorsCommand::Plugins(plugins)) => {
                    handle_connector_plugins(&ctx, plugins).await
                }
                Some(ConnectorsCommand::Clusters(clusters)) => {
                    handle_connect_clusters(&ctx, clusters).await
                }
                None => handle_connectors(&ctx, args.list).await,
            }
        }
        Command::Connector(args) => handle_connector(&session.app_context().await?, args).await,
        Command::Contexts => handle_contexts(session).await,
        Command::Context(args) => match args.command {
            Some(ContextCommand::Delete(target)) => handle_context_delete(session, &target.name),
            Some(ContextCommand::Set(target)) => handle_context_set(session, &target.name).await,
            None => handle_context(session).await,
        },
        Command::Configure(args) => handle_configure(session, &args),
        Command::Login => Err(CliError::failure(anyhow!(
            "unable to run inside a started session"
        ))),
        Command::User => handle_user(&session.app_context().await?),
        Command::License => handle_license(&session.app_context().await?).await,
    }
}

#[derive(Parser)]
#[command(
    name = "lenses-cli",
    version,
    about = "Command line client for the Lenses management platform"
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) global: GlobalArgs,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct GlobalArgs {
    #[arg(
        long,
        global = true,
        env = "LENSES_CLI_CONFIG",
        help = "Configuration file; defaults to ./lenses-cli.yml then $HOME/.lenses/lenses-cli.yml"
    )]
    pub(crate) file: Option<PathBuf>,
    #[arg(long, global = true, help = "Name of the configuration context to use")]
    pub(crate) context: Option<String>,
    #[arg(long, global = true, env = "LENSES_HOST", help = "Lenses host, including scheme and port")]
    pub(crate) host: Option<String>,
    #[arg(long, global = true, env = "LENSES_USER")]
    pub(crate) user: Option<String>,
    #[arg(long = "pass", global = true, env = "LENSES_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
    #[arg(long, global = true, env = "LENSES_TOKEN", hide_env_values = true)]
    pub(crate) token: Option<String>,
    #[arg(long, global = true, env = "LENSES_TIMEOUT", help = "Request timeout, e.g. 15s or 500ms")]
    pub(crate) timeout: Option<String>,
    #[arg(long, global = true, help = "Print JSON on a single line")]
    pub(crate) no_pretty: bool,
    #[arg(long, global = true, help = "Suppress status messages")]
    pub(crate) silent: bool,
    #[arg(long, global = true, env = "LENSES_LOG", default_value = DEFAULT_LOG_LEVEL)]
    pub(crate) log_level: String,
    #[arg(long, global = true, default_value = "pretty", help = "Log format: pretty or json")]
    pub(crate) log_format: LogFormat,
}

impl GlobalArgs {
    pub(crate) fn overrides(&self) -> ContextOverrides {
        ContextOverrides {
            host: self.host.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            token: self.token.clone(),
            timeout: self.timeout.clone(),
            debug: false,
        }
    }

    pub(crate) const fn output(&self) -> OutputSettings {
        OutputSettings {
            compact: self.no_pretty,
            silent: self.silent,
        }
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Print the list of Kafka Access Control Lists
    Acls,
    /// Work with a Kafka Access Control List
    #[command(subcommand)]
    Acl(AclCommand),
    /// List connectors, their plugins or the connect clusters
    #[command(visible_alias = "connect")]
    Connectors(ConnectorsArgs),
    /// Get or manage a particular connector
    Connector(ConnectorArgs),
    /// Print and validate every configuration context
    Contexts,
    /// Print the current context, or edit and delete contexts
    Context(ContextArgs),
    /// Create and save the configuration and client credentials
    Configure(ConfigureArgs),
    /// Log in and start an interactive session
    #[command(hide = true)]
    Login,
    /// Print the authenticated user
    User,
    /// Print the license of the connected instance
    License,
}

#[derive(Subcommand, Debug)]
pub(crate) enum AclCommand {
    /// Create or update an ACL
    #[command(visible_aliases = ["create", "update"])]
    Set(AclArgs),
    /// Delete an ACL
    Delete(AclArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct AclArgs {
    #[arg(value_name = "FILE", help = "JSON or YAML file describing the ACL")]
    pub(crate) source: Option<PathBuf>,
    #[arg(long = "resourceType", help = "TOPIC, CLUSTER, GROUP or TRANSACTIONALID")]
    pub(crate) resource_type: Option<AclResourceType>,
    #[arg(long = "resourceName")]
    pub(crate) resource_name: Option<String>,
    #[arg(long, help = "Principal, e.g. User:alice")]
    pub(crate) principal: Option<String>,
    #[arg(long = "permissionType", help = "ALLOW or DENY")]
    pub(crate) permission_type: Option<AclPermissionType>,
    #[arg(long = "aclHost", help = "Client host the ACL applies to; defaults to *")]
    pub(crate) acl_host: Option<String>,
    #[arg(long, help = "ALL, READ, WRITE, CREATE, DELETE, ALTER, DESCRIBE, ...")]
    pub(crate) operation: Option<AclOperation>,
}

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub(crate) struct ConnectorsArgs {
    #[command(subcommand)]
    pub(crate) command: Option<ConnectorsCommand>,
    #[command(flatten)]
    pub(crate) list: ConnectorsListArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ConnectorsListArgs {
    #[arg(long = "clusterName", default_value = "", help = "Cluster name, or * for every cluster")]
    pub(crate) cluster_name: String,
    #[arg(long, help = "Print connector names only")]
    pub(crate) names: bool,
    #[arg(long, help = "With --names, print plain lines instead of JSON")]
    pub(crate) no_json: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ConnectorsCommand {
    /// List the available connector plugins
    Plugins(PluginsArgs),
    /// List the connect clusters
    Clusters(ClustersArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct PluginsArgs {
    #[arg(long = "clusterName", default_value = "", help = "Cluster name, or * for every cluster")]
    pub(crate) cluster_name: String,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ClustersArgs {
    #[arg(long, help = "Print cluster names only")]
    pub(crate) names: bool,
    #[arg(long, help = "With --names, do not separate names with line breaks")]
    pub(crate) no_newline: bool,
}

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub(crate) struct ConnectorArgs {
    #[command(subcommand)]
    pub(crate) command: Option<ConnectorCommand>,
    #[command(flatten)]
    pub(crate) target: ConnectorTarget,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ConnectorTarget {
    #[arg(long = "clusterName", default_value = "")]
    pub(crate) cluster_name: String,
    #[arg(long, default_value = "")]
    pub(crate) name: String,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ConnectorCommand {
    /// Create a new connector
    Create(ConnectorPayloadArgs),
    /// Update a connector's configuration
    Update(ConnectorPayloadArgs),
    /// Get a connector's configuration
    Config(ConnectorTarget),
    /// Get a connector's status
    Status(ConnectorTarget),
    /// Pause a connector
    Pause(ConnectorTarget),
    /// Resume a paused connector
    Resume(ConnectorTarget),
    /// Restart a connector
    Restart(ConnectorTarget),
    /// List a connector's tasks
    Tasks(ConnectorTarget),
    /// Delete a connector
    Delete(ConnectorTarget),
    /// Work with a particular connector task
    #[command(subcommand)]
    Task(TaskCommand),
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ConnectorPayloadArgs {
    #[arg(value_name = "FILE", help = "JSON or YAML file with clusterName, name and config")]
    pub(crate) source: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) target: ConnectorTarget,
    #[arg(long, help = "Connector config as inline JSON or a path to a JSON/YAML file")]
    pub(crate) config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum TaskCommand {
    /// Get the current status of a task
    Status(TaskArgs),
    /// Restart a task
    Restart(TaskArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct TaskArgs {
    #[command(flatten)]
    pub(crate) target: ConnectorTarget,
    #[arg(long, help = "Task id")]
    pub(crate) task: i32,
}

#[derive(Args, Debug)]
pub(crate) struct ContextArgs {
    #[command(subcommand)]
    pub(crate) command: Option<ContextCommand>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ContextCommand {
    /// Delete a configuration context
    Delete(ContextName),
    /// Add or edit a configuration context
    #[command(visible_aliases = ["edit", "update", "create", "add"])]
    Set(ContextName),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ContextName {
    pub(crate) name: String,
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub(crate) struct ConfigureArgs {
    #[arg(long, help = "Reset the current configuration")]
    pub(crate) reset: bool,
    #[arg(long, help = "Do not print the banner")]
    pub(crate) no_banner: bool,
    #[arg(
        long,
        help = "Save to the default location without asking, unless --file is given"
    )]
    pub(crate) default_location: bool,
}
