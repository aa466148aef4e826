use std::collections::BTreeMap;

use lenses_api_models::{
    ConnectCluster, Connector, ConnectorPlugin, CreateUpdateConnectorPayload,
    outline_string_results,
};
use serde_json::Value;
use tracing::warn;

use crate::cli::{
    ClustersArgs, ConnectorArgs, ConnectorCommand, ConnectorPayloadArgs, ConnectorTarget,
    ConnectorsListArgs, PluginsArgs, TaskArgs, TaskCommand,
};
use crate::client::{AppContext, CliError, CliResult, classify, classify_not_found};
use crate::commands::files::{load_connector_config, load_file};
use crate::output::{echo, join_names, print_json, render_json};

const ALL_CLUSTERS: &str = "*";

fn require_flags(flags: &[(&str, &str)]) -> CliResult<()> {
    let missing: Vec<String> = flags
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(flag, _)| format!("--{flag}"))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CliError::validation(format!(
            "required flag(s) {} not set",
            missing.join(", ")
        )))
    }
}

fn require_target(target: &ConnectorTarget) -> CliResult<(&str, &str)> {
    require_flags(&[
        ("clusterName", &target.cluster_name),
        ("name", &target.name),
    ])?;
    Ok((target.cluster_name.trim(), target.name.trim()))
}

async fn cluster_names(ctx: &AppContext, cluster: &str) -> CliResult<Vec<String>> {
    let cluster = cluster.trim();
    if cluster.is_empty() || cluster == ALL_CLUSTERS {
        let clusters = ctx.client.get_connect_clusters().await.map_err(classify)?;
        Ok(clusters.into_iter().map(|cluster| cluster.name).collect())
    } else {
        Ok(vec![cluster.to_string()])
    }
}

pub(crate) async fn handle_connectors(ctx: &AppContext, args: ConnectorsListArgs) -> CliResult<()> {
    let by_cluster = connector_names_by_cluster(ctx, &args.cluster_name).await?;
    if args.names {
        println!(
            "{}",
            render_connector_names(by_cluster, args.no_json, ctx.output.compact)?
        );
        return Ok(());
    }
    let connectors = fetch_connectors(ctx, &by_cluster).await;
    print_json(&ctx.output, &connectors)
}

async fn connector_names_by_cluster(
    ctx: &AppContext,
    cluster_name: &str,
) -> CliResult<BTreeMap<String, Vec<String>>> {
    let explicit = !matches!(cluster_name.trim(), "" | ALL_CLUSTERS);
    let mut by_cluster: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for cluster in cluster_names(ctx, cluster_name).await? {
        let names = ctx.client.get_connectors(&cluster).await.map_err(|err| {
            if explicit {
                classify_not_found(err, || {
                    format!(
                        "unable to retrieve connectors, cluster with name '{cluster}' does not exist"
                    )
                })
            } else {
                classify(err)
            }
        })?;
        by_cluster.entry(cluster).or_default().extend(names);
    }
    Ok(by_cluster)
}

/// Names of every cluster merged and sorted, as `[{"name": ..}]` JSON or
/// one per line.
fn render_connector_names(
    by_cluster: BTreeMap<String, Vec<String>>,
    no_json: bool,
    compact: bool,
) -> CliResult<String> {
    let mut names: Vec<String> = by_cluster.into_values().flatten().collect();
    names.sort();
    if no_json {
        return Ok(names.join("\n"));
    }
    render_json(&outline_string_results("name", &names), compact)
}

/// Fetch each listed connector; failures are reported and skipped.
async fn fetch_connectors(
    ctx: &AppContext,
    by_cluster: &BTreeMap<String, Vec<String>>,
) -> BTreeMap<String, Vec<Connector>> {
    let mut connectors: BTreeMap<String, Vec<Connector>> = BTreeMap::new();
    for (cluster, names) in by_cluster {
        for name in names {
            match ctx.client.get_connector(cluster, name).await {
                Ok(connector) => connectors.entry(cluster.clone()).or_default().push(connector),
                Err(err) => {
                    warn!(cluster = %cluster, connector = %name, error = %err, "skipping connector");
                    eprintln!("get connector error: {err}");
                }
            }
        }
    }
    connectors
}

pub(crate) async fn handle_connector_plugins(ctx: &AppContext, args: PluginsArgs) -> CliResult<()> {
    require_flags(&[("clusterName", &args.cluster_name)])?;

    let mut plugins: Vec<ConnectorPlugin> = Vec::new();
    for cluster in cluster_names(ctx, &args.cluster_name).await? {
        let found = ctx
            .client
            .get_connector_plugins(&cluster)
            .await
            .map_err(classify)?;
        plugins.extend(found.into_iter().map(ConnectorPlugin::normalized));
    }
    print_json(&ctx.output, &plugins)
}

pub(crate) async fn handle_connect_clusters(ctx: &AppContext, args: ClustersArgs) -> CliResult<()> {
    let clusters = ctx.client.get_connect_clusters().await.map_err(classify)?;
    println!(
        "{}",
        render_connect_clusters(clusters, &args, ctx.output.compact)?
    );
    Ok(())
}

fn render_connect_clusters(
    mut clusters: Vec<ConnectCluster>,
    args: &ClustersArgs,
    compact: bool,
) -> CliResult<String> {
    clusters.sort_by(|left, right| left.name.cmp(&right.name));
    if args.names {
        return Ok(join_names(
            clusters.iter().map(|cluster| cluster.name.as_str()),
            !args.no_newline,
        ));
    }
    render_json(&clusters, compact)
}

pub(crate) async fn handle_connector(ctx: &AppContext, args: ConnectorArgs) -> CliResult<()> {
    match args.command {
        None => handle_connector_get(ctx, &args.target).await,
        Some(ConnectorCommand::Create(payload)) => handle_connector_create(ctx, payload).await,
        Some(ConnectorCommand::Update(payload)) => handle_connector_update(ctx, payload).await,
        Some(ConnectorCommand::Config(target)) => handle_connector_config(ctx, &target).await,
        Some(ConnectorCommand::Status(target)) => handle_connector_status(ctx, &target).await,
        Some(ConnectorCommand::Pause(target)) => handle_connector_pause(ctx, &target).await,
        Some(ConnectorCommand::Resume(target)) => handle_connector_resume(ctx, &target).await,
        Some(ConnectorCommand::Restart(target)) => handle_connector_restart(ctx, &target).await,
        Some(ConnectorCommand::Tasks(target)) => handle_connector_tasks(ctx, &target).await,
        Some(ConnectorCommand::Delete(target)) => handle_connector_delete(ctx, &target).await,
        Some(ConnectorCommand::Task(TaskCommand::Status(task))) => {
            handle_task_status(ctx, &task).await
        }
        Some(ConnectorCommand::Task(TaskCommand::Restart(task))) => {
            handle_task_restart(ctx, &task).await
        }
    }
}

async fn handle_connector_get(ctx: &AppContext, target: &ConnectorTarget) -> CliResult<()> {
    let (cluster, name) = require_target(target)?;
    let connector = ctx
        .client
        .get_connector(cluster, name)
        .await
        .map_err(|err| {
            classify_not_found(err, || format!("connector '{cluster}:{name}' does not exist"))
        })?;
    print_json(&ctx.output, &connector)
}

/// File first, then non-empty flags, then the name reconciliation.
fn build_payload(args: ConnectorPayloadArgs) -> CliResult<CreateUpdateConnectorPayload> {
    let mut payload = match args.source.as_deref() {
        Some(path) => load_file::<CreateUpdateConnectorPayload>(path)?,
        None => CreateUpdateConnectorPayload::default(),
    };
    if !args.target.cluster_name.trim().is_empty() {
        payload.cluster_name = args.target.cluster_name.trim().to_string();
    }
    if !args.target.name.trim().is_empty() {
        payload.name = args.target.name.trim().to_string();
    }
    if let Some(raw) = args.config.as_deref().filter(|raw| !raw.trim().is_empty()) {
        payload.config = load_connector_config(raw)?;
    }

    payload
        .apply_and_validate_name()
        .map_err(|err| CliError::validation(err.to_string()))?;
    require_flags(&[
        ("clusterName", &payload.cluster_name),
        ("name", &payload.name),
    ])?;
    Ok(payload)
}

async fn handle_connector_create(ctx: &AppContext, args: ConnectorPayloadArgs) -> CliResult<()> {
    let payload = build_payload(args)?;
    ctx.client
        .create_connector(&payload.cluster_name, &payload.name, &payload.config)
        .await
        .map_err(classify)?;
    echo(&ctx.output, format!("Connector {} created", payload.name));
    Ok(())
}

async fn handle_connector_update(ctx: &AppContext, args: ConnectorPayloadArgs) -> CliResult<()> {
    let payload = build_payload(args)?;
    let (cluster, name) = (payload.cluster_name.as_str(), payload.name.as_str());

    let existing = ctx
        .client
        .get_connector(cluster, name)
        .await
        .map_err(|err| {
            classify_not_found(err, || format!("connector '{cluster}:{name}' does not exist"))
        })?;
    if !existing.config.is_empty() {
        let existing_name = existing.config.get("name").and_then(Value::as_str);
        if existing_name != Some(name) {
            return Err(CliError::validation(format!(
                "connector config[\"name\"] '{name}' does not match with the existing one '{}'",
                existing_name.unwrap_or_default()
            )));
        }
    }

    let updated = ctx
        .client
        .update_connector(cluster, name, &payload.config)
        .await
        .map_err(classify)?;
    if ctx.output.silent {
        return Ok(());
    }
    echo(&ctx.output, format!("Connector {name} updated\n"));
    print_json(&ctx.output, &updated)
}

async fn handle_connector_config(ctx: &AppContext, target: &ConnectorTarget) -> CliResult<()> {
    let (cluster, name) = require_target(target)?;
    let config = ctx
        .client
        .get_connector_config(cluster, name)
        .await
        .map_err(|err| {
            classify_not_found(err, || {
                format!("unable to retrieve config, connector '{cluster}:{name}' does not exist")
            })
        })?;
    print_json(&ctx.output, &config)
}

async fn handle_connector_status(ctx: &AppContext, target: &ConnectorTarget) -> CliResult<()> {
    let (cluster, name) = require_target(target)?;
    let status = ctx
        .client
        .get_connector_status(cluster, name)
        .await
        .map_err(|err| {
            classify_not_found(err, || {
                format!("unable to retrieve status, connector '{cluster}:{name}' does not exist")
            })
        })?;
    print_json(&ctx.output, &status)
}

async fn handle_connector_pause(ctx: &AppContext, target: &ConnectorTarget) -> CliResult<()> {
    let (cluster, name) = require_target(target)?;
    ctx.client
        .pause_connector(cluster, name)
        .await
        .map_err(|err| {
            classify_not_found(err, || {
                format!("unable to pause, connector '{cluster}:{name}' does not exist")
            })
        })?;
    echo(&ctx.output, format!("Connector {cluster}:{name} paused"));
    Ok(())
}

async fn handle_connector_resume(ctx: &AppContext, target: &ConnectorTarget) -> CliResult<()> {
    let (cluster, name) = require_target(target)?;
    ctx.client
        .resume_connector(cluster, name)
        .await
        .map_err(|err| {
            classify_not_found(err, || {
                format!("unable to resume, connector '{cluster}:{name}' does not exist")
            })
        })?;
    echo(&ctx.output, format!("Connector {cluster}:{name} resumed"));
    Ok(())
}

async fn handle_connector_restart(ctx: &AppContext, target: &ConnectorTarget) -> CliResult<()> {
    let (cluster, name) = require_target(target)?;
    ctx.client
        .restart_connector(cluster, name)
        .await
        .map_err(|err| {
            classify_not_found(err, || {
                format!("unable to restart, connector '{cluster}:{name}' does not exist")
            })
        })?;
    echo(&ctx.output, format!("Connector {cluster}:{name} restarted"));
    Ok(())
}

async fn handle_connector_tasks(ctx: &AppContext, target: &ConnectorTarget) -> CliResult<()> {
    let (cluster, name) = require_target(target)?;
    let tasks = ctx
        .client
        .get_connector_tasks(cluster, name)
        .await
        .map_err(|err| {
            classify_not_found(err, || {
                format!("unable to retrieve tasks, connector '{cluster}:{name}' does not exist")
            })
        })?;
    print_json(&ctx.output, &tasks)
}

async fn handle_connector_delete(ctx: &AppContext, target: &ConnectorTarget) -> CliResult<()> {
    let (cluster, name) = require_target(target)?;
    ctx.client
        .delete_connector(cluster, name)
        .await
        .map_err(|err| {
            classify_not_found(err, || {
                format!("unable to delete, connector '{cluster}:{name}' does not exist")
            })
        })?;
    echo(&ctx.output, format!("Connector {cluster}:{name} deleted"));
    Ok(())
}

async fn handle_task_status(ctx: &AppContext, args: &TaskArgs) -> CliResult<()> {
    let (cluster, name) = require_target(&args.target)?;
    let status = ctx
        .client
        .get_connector_task_status(cluster, name, args.task)
        .await
        .map_err(|err| classify_not_found(err, || "task does not exist".to_string()))?;
    print_json(&ctx.output, &status)
}

async fn handle_task_restart(ctx: &AppContext, args: &TaskArgs) -> CliResult<()> {
    let (cluster, name) = require_target(&args.target)?;
    ctx.client
        .restart_connector_task(cluster, name, args.task)
        .await
        .map_err(|err| classify_not_found(err, || "task does not exist".to_string()))?;
    echo(
        &ctx.output,
        format!("Connector task {cluster}:{name}:{} restarted", args.task),
    );
    Ok(())
}
