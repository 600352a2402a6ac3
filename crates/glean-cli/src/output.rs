//! Rendering shared by every `gl` command.
//!
//! Mode precedence: `--format`, then the hidden `--json` flag, then the
//! `FORMAT` environment variable, then pretty on a terminal and text when
//! stdout is piped. Results go to stdout; failures go to stderr in the same
//! mode so JSON consumers can parse both.

use clap::ValueEnum;
use glean_core::ErrorCode;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Headings, ranks and ANSI highlights for people.
    Pretty,
    /// One record per line for pipes and scripts.
    Text,
    /// A single JSON document (JSON lines for `interactive`).
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    fn from_env_value(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value.trim(), true).ok()
    }

    fn pick(flag: Option<Self>, json: bool, env: Option<&str>, tty: bool) -> Self {
        flag.or(json.then_some(Self::Json))
            .or_else(|| env.and_then(Self::from_env_value))
            .unwrap_or(if tty { Self::Pretty } else { Self::Text })
    }

    /// Resolve against the process environment and stdout.
    pub fn resolve(flag: Option<Self>, json: bool) -> Self {
        let env = std::env::var("FORMAT").ok();
        Self::pick(flag, json, env.as_deref(), io::stdout().is_terminal())
    }
}

/// Underlined heading for pretty output.
pub fn heading(w: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(w, "{title}")?;
    writeln!(w, "{}", "=".repeat(title.chars().count()))
}

/// A command result that knows its human renderings. JSON comes from serde.
pub trait Render: Serialize {
    fn text(&self, w: &mut dyn Write) -> io::Result<()>;
    fn pretty(&self, w: &mut dyn Write) -> io::Result<()>;
}

fn write_report(w: &mut dyn Write, mode: OutputMode, report: &impl Render) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *w, report)?;
            writeln!(w)?;
        }
        OutputMode::Text => report.text(w)?,
        OutputMode::Pretty => report.pretty(w)?,
    }
    Ok(())
}

/// Print a command result to stdout.
pub fn emit(mode: OutputMode, report: &impl Render) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    write_report(&mut out, mode, report)
}

/// A failure as shown to the user: stable code, message, optional hint.
#[derive(Debug, Serialize)]
pub struct Failure {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl Failure {
    /// `detail` is appended to the code's summary.
    pub fn new(code: ErrorCode, detail: impl std::fmt::Display) -> Self {
        Self {
            code: code.code(),
            message: format!("{}: {detail}", code.message()),
            hint: code.hint(),
        }
    }

    fn write(&self, w: &mut dyn Write, mode: OutputMode) -> anyhow::Result<()> {
        if mode.is_json() {
            serde_json::to_writer(&mut *w, &serde_json::json!({ "error": self }))?;
            writeln!(w)?;
            return Ok(());
        }
        writeln!(w, "error[{}]: {}", self.code, self.message)?;
        if let Some(hint) = self.hint {
            writeln!(w, "  hint: {hint}")?;
        }
        Ok(())
    }

    /// Print to stderr.
    pub fn report(&self, mode: OutputMode) -> anyhow::Result<()> {
        let mut err = io::stderr().lock();
        self.write(&mut err, mode)
    }
}
