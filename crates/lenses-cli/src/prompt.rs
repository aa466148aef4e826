//! Interactive prompts.
//!
//! Lines are read from a generic `BufRead`; passwords use `rpassword` when
//! stdin is a terminal and fall back to a plain line otherwise.

use std::io::{self, BufRead, BufReader, IsTerminal, Write};

use anyhow::anyhow;

use crate::client::{CliError, CliResult};

pub(crate) struct Prompter {
    input: Box<dyn BufRead + Send>,
    output: Box<dyn Write + Send>,
    terminal: bool,
}

impl Prompter {
    /// Prompts on stdout, answers from stdin.
    pub(crate) fn stdio() -> Self {
        Self {
            terminal: io::stdin().is_terminal(),
            input: Box::new(BufReader::new(io::stdin())),
            output: Box::new(io::stdout()),
        }
    }

    /// Answers taken from `script`, one per line; prompts are discarded.
    #[cfg(test)]
    pub(crate) fn scripted(script: &str) -> Self {
        Self {
            terminal: false,
            input: Box::new(io::Cursor::new(script.as_bytes().to_vec())),
            output: Box::new(io::sink()),
        }
    }

    pub(crate) fn show(&mut self, text: &str) -> CliResult<()> {
        self.output
            .write_all(text.as_bytes())
            .and_then(|()| self.output.flush())
            .map_err(|err| CliError::failure(anyhow!("failed to write prompt: {err}")))
    }

    /// Next line without its terminator; `None` once input is exhausted.
    pub(crate) fn read_line(&mut self) -> CliResult<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|err| CliError::failure(anyhow!("failed to read input: {err}")))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn answer(&mut self) -> CliResult<String> {
        self.read_line()?
            .ok_or_else(|| CliError::validation("input closed before all questions were answered"))
    }

    /// Ask for a value; an empty answer keeps `default`. Repeats while the
    /// result is empty.
    pub(crate) fn input(&mut self, message: &str, default: &str) -> CliResult<String> {
        loop {
            if default.is_empty() {
                self.show(&format!("{message}: "))?;
            } else {
                self.show(&format!("{message} ({default}): "))?;
            }
            let answer = self.answer()?;
            let value = if answer.trim().is_empty() {
                default.to_string()
            } else {
                answer.trim().to_string()
            };
            if !value.is_empty() {
                return Ok(value);
            }
            self.show("Value is required\n")?;
        }
    }

    /// Ask for a secret without echo when possible. Repeats while empty.
    pub(crate) fn password(&mut self, message: &str) -> CliResult<String> {
        loop {
            let value = if self.terminal {
                rpassword::prompt_password(format!("{message}: "))
                    .map_err(|err| CliError::failure(anyhow!("failed to read password: {err}")))?
            } else {
                self.show(&format!("{message}: "))?;
                self.answer()?
            };
            if !value.is_empty() {
                return Ok(value);
            }
            self.show("Value is required\n")?;
        }
    }

    pub(crate) fn confirm(&mut self, message: &str, default: bool) -> CliResult<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            self.show(&format!("{message} ({hint}): "))?;
            let answer = self.answer()?;
            match answer.trim().to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.show("Please answer yes or no\n")?,
            }
        }
    }

    /// Pick one of `options` by name or 1-based position.
    pub(crate) fn select<'a>(&mut self, message: &str, options: &[&'a str]) -> CliResult<&'a str> {
        loop {
            self.show(&format!("{message} [{}]: ", options.join("/")))?;
            let answer = self.answer()?;
            let answer = answer.trim();
            let by_position = answer
                .parse::<usize>()
                .ok()
                .and_then(|index| index.checked_sub(1))
                .and_then(|index| options.get(index))
                .copied();
            let by_name = options
                .iter()
                .copied()
                .find(|option| option.eq_ignore_ascii_case(answer));
            if let Some(choice) = by_position.or(by_name) {
                return Ok(choice);
            }
            self.show(&format!("Choose one of: {}\n", options.join(", ")))?;
        }
    }
}
