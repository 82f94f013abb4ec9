use anyhow::{Context, Result};
use colored::Colorize;
use console::{Term, style};
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use std::io::{self, BufRead, Write};

use crate::error::ConfigError;

const BLOCK_HINT: &str = "(Enter multiple lines. End with a blank line)";

/// One value the collector asks the operator for.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    pub key: &'static str,
    pub text: &'static str,
    pub default: Option<&'static str>,
    pub multiline: bool,
}

/// Where answers come from.
///
/// Both methods return `None` once the input is exhausted.
pub trait AnswerSource {
    /// One line, without its line terminator.
    fn line(&mut self, spec: &PromptSpec) -> Result<Option<String>>;

    /// Lines up to the first blank one, joined with a trailing newline.
    ///
    /// An empty block yields `Some("")`.
    fn block(&mut self, spec: &PromptSpec) -> Result<Option<String>>;
}

/// Answers read from any reader, questions written to any writer.
///
/// Used for piped stdin and in tests.
pub struct LineSource<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineSource<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn next_line(&mut self, spec: &PromptSpec) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .with_context(|| format!("failed to read `{}`", spec.key))?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl<R: BufRead, W: Write> AnswerSource for LineSource<R, W> {
    fn line(&mut self, spec: &PromptSpec) -> Result<Option<String>> {
        let default_text = spec
            .default
            .map(|d| format!(" [{}]", d))
            .unwrap_or_default();
        write!(self.output, "{}{}: ", spec.text.bold(), default_text)?;
        self.output.flush()?;
        self.next_line(spec)
    }

    fn block(&mut self, spec: &PromptSpec) -> Result<Option<String>> {
        writeln!(self.output, "{} {}:", spec.text.bold(), BLOCK_HINT)?;
        self.output.flush()?;

        let mut lines: Vec<String> = Vec::new();
        while let Some(line) = self.next_line(spec)? {
            if line.is_empty() {
                return Ok(Some(join_block(&lines)));
            }
            lines.push(line);
        }
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(join_block(&lines)))
    }
}

/// Interactive answers on a terminal, rendered with dialoguer.
pub struct TerminalSource {
    theme: ColorfulTheme,
    term: Term,
}

impl TerminalSource {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AnswerSource for TerminalSource {
    fn line(&mut self, spec: &PromptSpec) -> Result<Option<String>> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(spec.text)
            .allow_empty(true);
        if let Some(d) = spec.default {
            input = input.default(d.to_string());
        }
        match input.interact_text() {
            Ok(v) => Ok(Some(v)),
            Err(dialoguer::Error::IO(e)) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read `{}`", spec.key)),
        }
    }

    fn block(&mut self, spec: &PromptSpec) -> Result<Option<String>> {
        self.term
            .write_line(&format!("{} {}:", style(spec.text).bold(), BLOCK_HINT))?;

        let mut lines: Vec<String> = Vec::new();
        loop {
            let line = match self.term.read_line() {
                Ok(l) => l,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && lines.is_empty() => {
                    return Ok(None);
                }
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => {
                    return Err(e).with_context(|| format!("failed to read `{}`", spec.key));
                }
            };
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                break;
            }
            lines.push(line.to_string());
        }
        Ok(Some(join_block(&lines)))
    }
}

fn join_block(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    lines.join("\n") + "\n"
}

/// Bounded prompting on top of an [`AnswerSource`].
pub struct Prompter<S> {
    source: S,
    max_attempts: usize,
}

impl<S: AnswerSource> Prompter<S> {
    pub fn new(source: S, max_attempts: usize) -> Self {
        Self {
            source,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Ask for `spec` until a usable value arrives.
    ///
    /// An empty answer falls back to the default when there is one, otherwise
    /// the question is repeated up to `max_attempts` times. An empty
    /// multiline block counts as an empty answer.
    ///
    /// # Errors
    /// - [`ConfigError::NoValue`] when attempts run out or input hits EOF.
    /// - I/O errors from the answer source.
    pub fn ask(&mut self, spec: &PromptSpec) -> Result<String> {
        for _ in 0..self.max_attempts {
            let answer = if spec.multiline {
                self.source.block(spec)?
            } else {
                self.source.line(spec)?
            };
            match answer {
                Some(v) if !v.is_empty() => return Ok(v),
                Some(_) => {
                    if let Some(d) = spec.default {
                        return Ok(d.to_string());
                    }
                }
                None => break,
            }
        }
        Err(ConfigError::NoValue {
            key: spec.key.to_string(),
        }
        .into())
    }
}
