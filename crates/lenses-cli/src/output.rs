//! Output renderers for CLI commands.

use std::fmt::Display;

use anyhow::anyhow;
use serde::Serialize;

use crate::client::{CliError, CliResult};

/// Per-invocation output switches taken from the global flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct OutputSettings {
    /// Single-line JSON instead of indented.
    pub(crate) compact: bool,
    /// Suppress status lines.
    pub(crate) silent: bool,
}

pub(crate) fn render_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> CliResult<String> {
    let text = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    text.map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(
    settings: &OutputSettings,
    value: &T,
) -> CliResult<()> {
    let text = render_json(value, settings.compact)?;
    println!("{text}");
    Ok(())
}

/// Print a status line unless `--silent` was given.
pub(crate) fn echo(settings: &OutputSettings, message: impl Display) {
    if !settings.silent {
        println!("{message}");
    }
}

/// Names on separate lines, or run together when `newline` is off.
pub(crate) fn join_names<'a>(names: impl IntoIterator<Item = &'a str>, newline: bool) -> String {
    let separator = if newline { "\n" } else { "" };
    names.into_iter().collect::<Vec<_>>().join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_json_switches_between_pretty_and_compact() {
        let value = json!({"name": "sink", "tasks": 1});
        assert_eq!(
            render_json(&value, true).expect("compact"),
            r#"{"name":"sink","tasks":1}"#
        );
        let pretty = render_json(&value, false).expect("pretty");
        assert!(pretty.contains("\n  \"name\": \"sink\""));
    }

    #[test]
    fn join_names_honours_newline_switch() {
        assert_eq!(join_names(["a", "b", "c"], true), "a\nb\nc");
        assert_eq!(join_names(["a", "b", "c"], false), "abc");
        assert_eq!(join_names([], true), "");
    }
}
