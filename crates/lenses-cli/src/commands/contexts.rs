//! Configuration context commands: listing, selection, removal and the
//! interactive `configure` flow.

use anyhow::anyhow;
use lenses_config::{ClientConfiguration, default_config_path};
use tracing::info;

use crate::cli::ConfigureArgs;
use crate::client::{CliError, CliResult};
use crate::output::{echo, render_json};
use crate::session::Session;

const BANNER: &str = r"
 ___      _______  __    _  _______  _______  _______
|   |    |       ||  |  | ||       ||       ||       |
|   |    |    ___||   |_| ||  _____||    ___||  _____|
|   |    |   |___ |       || |_____ |   |___ | |_____
|   |___ |    ___||  _    ||_____  ||    ___||_____  |
|       ||   |___ | | |   | _____| ||   |___  _____| |
|_______||_______||_|  |__||_______||_______||_______|
";

const INVALID_CONTEXT_ACTIONS: [&str; 3] = ["skip", "edit", "delete"];

fn config_error(err: lenses_config::ConfigError) -> CliError {
    CliError::failure(anyhow::Error::new(err))
}

/// Header line plus redacted JSON for one context.
fn render_context(
    name: &str,
    cfg: &ClientConfiguration,
    valid: bool,
    current: bool,
    compact: bool,
) -> CliResult<String> {
    let mut cfg = cfg.redacted();
    cfg.format_host();
    let state = match (valid, current) {
        (true, true) => "valid, current",
        (true, false) => "valid",
        (false, true) => "invalid, current",
        (false, false) => "invalid",
    };
    Ok(format!("{name} [{state}]\n{}", render_json(&cfg, compact)?))
}

/// Print one context with its state; returns whether it is valid.
async fn print_context(session: &Session, name: &str) -> CliResult<bool> {
    let Some(cfg) = session.manager.context(name) else {
        return Ok(false);
    };
    let valid = session.context_connects(name).await;
    let current = name == session.manager.current_name();
    println!(
        "{}",
        render_context(name, cfg, valid, current, session.output.compact)?
    );
    Ok(valid)
}

async fn offer_invalid_context_actions(session: &mut Session, name: &str) -> CliResult<()> {
    let action = session.prompter.select(
        &format!("Would you like to skip, edit or delete the '{name}' invalid configuration context?"),
        &INVALID_CONTEXT_ACTIONS,
    )?;
    match action {
        "delete" => handle_context_delete(session, name),
        "edit" => handle_context_set(session, name).await,
        _ => Ok(()),
    }
}

pub(crate) async fn handle_contexts(session: &mut Session) -> CliResult<()> {
    for name in session.manager.context_names() {
        if !print_context(session, &name).await? && !session.output.silent {
            offer_invalid_context_actions(session, &name).await?;
        }
    }
    Ok(())
}

pub(crate) async fn handle_context(session: &mut Session) -> CliResult<()> {
    if !session.manager.current_context_exists() {
        return Err(CliError::failure(anyhow!(
            "current context does not exist, please use the `configure` command first"
        )));
    }
    let name = session.manager.current_name().to_string();
    if !print_context(session, &name).await? && !session.output.silent {
        offer_invalid_context_actions(session, &name).await?;
    }
    Ok(())
}

pub(crate) fn handle_context_delete(session: &mut Session, name: &str) -> CliResult<()> {
    let was_current = session.manager.current_name() == name;
    let deleted = session.manager.remove_context(name).map_err(config_error)?;
    if !deleted {
        return Err(CliError::validation(format!(
            "unable to delete context '{name}', at least one more valid context should be present"
        )));
    }

    if was_current {
        session.reset_client();
        echo(
            &session.output,
            format!(
                "'{name}' context deleted, current context set to '{}'",
                session.manager.current_name()
            ),
        );
    } else {
        echo(&session.output, format!("'{name}' context deleted"));
    }
    Ok(())
}

/// Edit or add `name` through `configure`, offering retries until the
/// context validates or the user gives up.
pub(crate) async fn handle_context_set(session: &mut Session, name: &str) -> CliResult<()> {
    let args = ConfigureArgs {
        reset: true,
        no_banner: true,
        default_location: true,
    };
    loop {
        session.manager.set_current(name);
        session.reset_client();
        handle_configure(session, &args)?;

        if session.context_connects(name).await {
            echo(
                &session.output,
                format!("{name} was successfully validated and saved, it is the current context now"),
            );
            return Ok(());
        }

        let retry = session.prompter.confirm(
            &format!("{name} is still invalid, do you mind to retry fixing it?"),
            true,
        )?;
        if !retry {
            return Ok(());
        }
    }
}

pub(crate) fn handle_configure(session: &mut Session, args: &ConfigureArgs) -> CliResult<()> {
    if session.active_configuration().is_valid() && !args.reset {
        if !session.overrides.has_connection_values() {
            return Err(CliError::validation(
                "configuration already exists, try 'configure --reset' instead",
            ));
        }
        session.manager.apply_overrides(&session.overrides);
        return save(session);
    }

    if !args.no_banner {
        println!("{BANNER}");
    }

    let had_saved_contexts = session.manager.has_saved_contexts();
    let current = session.active_configuration();

    let host = session.prompter.input("Host", &current.host)?;
    let user = session.prompter.input("User", &current.user)?;
    let password = session.prompter.password("Password")?;
    let debug = session.prompter.confirm("Enable debug mode?", current.debug)?;

    let cfg = session.manager.current_mut();
    cfg.host = host;
    cfg.user = user;
    cfg.password = password;
    cfg.debug = debug;
    cfg.format_host();

    if session.manager.path().is_none() && !args.default_location && !had_saved_contexts {
        let suggested = default_config_path()
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        let target = session.prompter.input("Save configuration file to", &suggested)?;
        session.manager.set_path(target.into());
    }

    session.reset_client();
    save(session)
}

fn save(session: &mut Session) -> CliResult<()> {
    let path = session.manager.save().map_err(config_error)?;
    info!(path = %path.display(), context = %session.manager.current_name(), "configuration saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use lenses_config::{ConfigManager, ContextOverrides};
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn manager_with(path: &Path, contexts: &[(&str, ClientConfiguration)], current: &str) -> ConfigManager {
        let mut manager = ConfigManager::new(Some(path.to_path_buf()));
        for (name, cfg) in contexts {
            manager.set_current(name);
            *manager.current_mut() = cfg.clone();
        }
        manager.set_current(current);
        manager.save().expect("seed configuration");
        manager
    }

    fn token_context(host: &str) -> ClientConfiguration {
        ClientConfiguration {
            host: host.to_string(),
            token: "t0k3n".to_string(),
            ..ClientConfiguration::default()
        }
    }

    #[test]
    fn configure_prompts_and_saves_the_current_context() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("lenses-cli.yml");
        let manager = ConfigManager::new(Some(path.clone()));
        let mut session =
            Session::scripted(manager, "lenses.local:3030\nadmin\nsecret\nn\n");

        let args = ConfigureArgs {
            no_banner: true,
            ..ConfigureArgs::default()
        };
        handle_configure(&mut session, &args).expect("configure");

        let reloaded = ConfigManager::from_file(&path).expect("reload");
        let cfg = reloaded.context("master").expect("master context");
        assert_eq!(cfg.host, "http://lenses.local:3030");
        assert_eq!(cfg.user, "admin");
        assert_eq!(cfg.password, "secret");
        assert!(!cfg.debug);
        assert_eq!(reloaded.current_name(), "master");
    }

    #[test]
    fn configure_refuses_to_overwrite_a_valid_context() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("lenses-cli.yml");
        let manager = manager_with(&path, &[("dev", token_context("http://dev"))], "dev");
        let mut session = Session::scripted(manager, "");

        let err = handle_configure(&mut session, &ConfigureArgs::default())
            .expect_err("already configured");
        assert_eq!(
            err.display_message(),
            "configuration already exists, try 'configure --reset' instead"
        );
    }

    #[test]
    fn configure_saves_overrides_without_prompting() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("lenses-cli.yml");
        let manager = manager_with(&path, &[("dev", token_context("http://dev"))], "dev");
        let overrides = ContextOverrides {
            host: Some("http://dev-2".into()),
            ..ContextOverrides::default()
        };
        let mut session = Session::scripted(manager, "");
        session.overrides = overrides;

        handle_configure(&mut session, &ConfigureArgs::default()).expect("save overrides");
        let reloaded = ConfigManager::from_file(&path).expect("reload");
        assert_eq!(reloaded.context("dev").expect("dev").host, "http://dev-2");
    }

    #[test]
    fn delete_switches_current_to_another_valid_context() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("lenses-cli.yml");
        let manager = manager_with(
            &path,
            &[
                ("dev", token_context("http://dev")),
                ("prod", token_context("http://prod")),
            ],
            "dev",
        );
        let mut session = Session::scripted(manager, "");

        handle_context_delete(&mut session, "dev").expect("delete");
        assert_eq!(session.manager.current_name(), "prod");
        assert!(session.manager.context("dev").is_none());
    }

    #[test]
    fn delete_of_the_last_valid_context_is_refused() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("lenses-cli.yml");
        let manager = manager_with(&path, &[("dev", token_context("http://dev"))], "dev");
        let mut session = Session::scripted(manager, "");

        let err = handle_context_delete(&mut session, "dev").expect_err("refused");
        assert!(matches!(err, CliError::Validation(_)));
        assert!(session.manager.context("dev").is_some());
    }

    #[tokio::test]
    async fn context_without_a_current_one_asks_for_configure() {
        let mut session = Session::scripted(ConfigManager::new(None), "");
        let err = handle_context(&mut session).await.expect_err("no context");
        assert_eq!(
            err.display_message(),
            "current context does not exist, please use the `configure` command first"
        );
    }

    #[test]
    fn delete_does_not_persist_command_line_overrides() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("lenses-cli.yml");
        let manager = manager_with(
            &path,
            &[
                ("dev", token_context("http://dev")),
                ("prod", token_context("http://prod")),
            ],
            "dev",
        );
        let mut session = Session::scripted(manager, "");
        session.overrides = ContextOverrides {
            host: Some("http://one-off".into()),
            token: Some("one-off".into()),
            ..ContextOverrides::default()
        };

        handle_context_delete(&mut session, "prod").expect("delete");
        let reloaded = ConfigManager::from_file(&path).expect("reload");
        let dev = reloaded.context("dev").expect("dev");
        assert_eq!(dev.host, "http://dev");
        assert_eq!(dev.token, "t0k3n");
        assert_eq!(session.active_configuration().token, "one-off");
    }

    #[test]
    fn context_lines_show_state_and_redacted_secrets() {
        let cfg = ClientConfiguration {
            host: "lenses.local:3030/".into(),
            user: "admin".into(),
            password: "secret".into(),
            ..ClientConfiguration::default()
        };
        assert_eq!(
            render_context("dev", &cfg, true, true, true).expect("render"),
            "dev [valid, current]\n{\"Host\":\"http://lenses.local:3030\",\"User\":\"admin\",\"Password\":\"****\",\"Debug\":false}"
        );
        let header = render_context("dev", &cfg, false, false, false).expect("render");
        assert!(header.starts_with("dev [invalid]\n{\n"));
        assert!(!header.contains("secret"));
    }

    #[tokio::test]
    async fn contexts_offers_to_delete_invalid_entries() {
        let server = MockServer::start_async().await;
        let license = server.mock(|when, then| {
            when.method(GET)
                .path("/api/license")
                .header("X-Kafka-Lenses-Token", "t0k3n");
            then.status(200).json_body(json!({
                "clientId": "acme",
                "isRespected": true,
                "maxBrokers": 5,
                "maxMessages": 1000,
                "expiry": 0
            }));
        });

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("lenses-cli.yml");
        let broken = ClientConfiguration {
            host: "http://broken".into(),
            ..ClientConfiguration::default()
        };
        let manager = manager_with(
            &path,
            &[("broken", broken), ("dev", token_context(&server.base_url()))],
            "dev",
        );
        let mut session = Session::scripted(manager, "delete\n");

        handle_contexts(&mut session).await.expect("contexts");
        license.assert();
        assert_eq!(session.manager.context_names(), vec!["dev".to_string()]);
    }

    #[tokio::test]
    async fn rejected_token_makes_a_context_invalid() {
        let server = MockServer::start_async().await;
        let license = server.mock(|when, then| {
            when.method(GET).path("/api/license");
            then.status(401).body("token expired");
        });

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("lenses-cli.yml");
        let manager = manager_with(&path, &[("dev", token_context(&server.base_url()))], "dev");
        let mut session = Session::scripted(manager, "skip\n");

        assert!(!session.context_connects("dev").await);
        handle_context(&mut session).await.expect("context");
        license.assert_calls(2);
        assert!(session.manager.context("dev").is_some());
    }

    #[tokio::test]
    async fn context_set_validates_through_login() {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST)
                .path("/api/login")
                .json_body(json!({"user": "admin", "password": "secret"}));
            then.status(200).json_body(json!({
                "success": true,
                "token": "issued",
                "user": {"id": "1", "name": "admin", "roles": ["admin"]}
            }));
        });

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("lenses-cli.yml");
        let manager = manager_with(&path, &[("dev", token_context("http://dev"))], "dev");
        let script = format!("{}\nadmin\nsecret\n\n", server.base_url());
        let mut session = Session::scripted(manager, &script);

        handle_context_set(&mut session, "staging").await.expect("context set");
        login.assert();
        assert_eq!(session.manager.current_name(), "staging");
        let reloaded = ConfigManager::from_file(&path).expect("reload");
        assert_eq!(reloaded.current_name(), "staging");
        assert_eq!(reloaded.context("staging").expect("staging").user, "admin");
    }
}
