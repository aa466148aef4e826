//! Interactive shell started by `login`.
//!
//! Every line is tokenised, parsed with the regular command tree and run
//! against the session's client, so one login serves the whole session.

use std::iter;

use clap::Parser;
use tracing::debug;

use crate::cli::{Cli, Command, dispatch_in_session};
use crate::client::CliResult;
use crate::session::Session;

const EXIT_COMMAND: &str = "exit";
const PROMPT: &str = "> ";

pub(crate) async fn handle_login(session: &mut Session) -> CliResult<()> {
    let ctx = session.app_context().await?;
    let user = ctx.client.user();
    println!(
        "Welcome {}[{}],\ntype 'help' to learn more about the available commands or '{EXIT_COMMAND}' to terminate.",
        user.name,
        user.roles.join(", ")
    );

    loop {
        session.prompter.show(PROMPT)?;
        let Some(line) = session.prompter.read_line()? else {
            return Ok(());
        };
        let line = line.trim();
        if line == EXIT_COMMAND {
            return Ok(());
        }
        if line.is_empty() {
            continue;
        }

        let tokens = match tokenize(line) {
            Ok(tokens) => tokens,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        let cli = match Cli::try_parse_from(iter::once("lenses-cli".to_string()).chain(tokens)) {
            Ok(cli) => cli,
            Err(err) => {
                println!("{}", err.render());
                continue;
            }
        };
        if matches!(cli.command, Command::Login | Command::Configure(_)) {
            println!("unable to run inside a started session");
            continue;
        }

        debug!(line = %line, "running session command");
        session.output = cli.global.output();
        if let Err(err) = dispatch_in_session(session, cli.command).await {
            println!("{}", err.display_message());
        }
        println!();
    }
}

/// Split a command line on whitespace, keeping quoted sections together.
///
/// Single quotes are literal; inside double quotes and bare words a
/// backslash escapes the next character.
pub(crate) fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('\''), _) => current.push(ch),
            (_, '\\') => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| "trailing escape character".to_string())?;
                current.push(escaped);
                in_token = true;
            }
            (Some(_), _) => current.push(ch),
            (None, '\'' | '"') => {
                quote = Some(ch);
                in_token = true;
            }
            (None, _) if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, _) => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if let Some(open) = quote {
        return Err(format!("unterminated {open} quote"));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
