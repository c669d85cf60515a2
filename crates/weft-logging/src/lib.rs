//! ---
//! weft_section: "03-persistence-logging"
//! weft_subsection: "module"
//! weft_type: "source"
//! weft_scope: "code"
//! weft_description: "Structured logging adapters and sinks."
//! weft_version: "v0.0.0-prealpha"
//! weft_owner: "tbd"
//! ---
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Newline-delimited JSON events.
    StructuredJson,
    /// Human-readable output for interactive sessions.
    Pretty,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::StructuredJson
    }
}

/// Initialize a baseline tracing subscriber suitable for development.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer())
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Process instance identifier associated with the log event.
    pub process: Option<&'a str>,
    /// Task identifier associated with the log event.
    pub task: Option<&'a str>,
    /// Identity performing the logged operation.
    pub actor: Option<&'a str>,
    /// Engine command being executed (e.g. `task.complete`).
    pub command: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a process instance identifier.
    pub fn with_process(mut self, process: &'a str) -> Self {
        self.process = Some(process);
        self
    }

    /// Attach a task identifier.
    pub fn with_task(mut self, task: &'a str) -> Self {
        self.task = Some(task);
        self
    }

    /// Attach the acting identity.
    pub fn with_actor(mut self, actor: &'a str) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Attach the engine command descriptor.
    pub fn with_command(mut self, command: &'a str) -> Self {
        self.command = Some(command);
        self
    }
}

/// High-level outcome used when emitting lifecycle log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEventOutcome {
    /// The operation completed successfully.
    Success,
    /// The operation failed or was aborted.
    Fault,
}

impl EngineEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            EngineEventOutcome::Success => "success",
            EngineEventOutcome::Fault => "fault",
        }
    }

    fn level(&self) -> Level {
        match self {
            EngineEventOutcome::Success => Level::INFO,
            EngineEventOutcome::Fault => Level::ERROR,
        }
    }
}

/// Emit a standardized engine event with a success/fault outcome.
pub fn log_engine_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: EngineEventOutcome,
) {
    let fallback = LogContext::default();
    let ctx = context.unwrap_or(&fallback);
    match outcome.level() {
        Level::INFO => tracing::event!(
            Level::INFO,
            event,
            outcome = outcome.as_str(),
            process = ctx.process.unwrap_or(""),
            task = ctx.task.unwrap_or(""),
            actor = ctx.actor.unwrap_or(""),
            command = ctx.command.unwrap_or(""),
            message = %message
        ),
        _ => tracing::event!(
            Level::ERROR,
            event,
            outcome = outcome.as_str(),
            process = ctx.process.unwrap_or(""),
            task = ctx.task.unwrap_or(""),
            actor = ctx.actor.unwrap_or(""),
            command = ctx.command.unwrap_or(""),
            message = %message
        ),
    }
}
