//! ---
//! weft_section: "03-persistence-logging"
//! weft_subsection: "module"
//! weft_type: "source"
//! weft_scope: "code"
//! weft_description: "Structured logging adapters and sinks."
//! weft_version: "v0.0.0-prealpha"
//! weft_owner: "tbd"
//! ---
/// Emit an informational log enriched with Weft engine context.
#[macro_export]
macro_rules! weft_info {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::INFO,
            process = ctx.process.unwrap_or(""),
            task = ctx.task.unwrap_or(""),
            actor = ctx.actor.unwrap_or(""),
            command = ctx.command.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::INFO,
            process = ctx.process.unwrap_or(""),
            task = ctx.task.unwrap_or(""),
            actor = ctx.actor.unwrap_or(""),
            command = ctx.command.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit a debug log enriched with Weft engine context.
#[macro_export]
macro_rules! weft_debug {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::DEBUG,
            process = ctx.process.unwrap_or(""),
            task = ctx.task.unwrap_or(""),
            actor = ctx.actor.unwrap_or(""),
            command = ctx.command.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::DEBUG,
            process = ctx.process.unwrap_or(""),
            task = ctx.task.unwrap_or(""),
            actor = ctx.actor.unwrap_or(""),
            command = ctx.command.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an error log enriched with Weft engine context.
#[macro_export]
macro_rules! weft_error {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::ERROR,
            process = ctx.process.unwrap_or(""),
            task = ctx.task.unwrap_or(""),
            actor = ctx.actor.unwrap_or(""),
            command = ctx.command.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::ERROR,
            process = ctx.process.unwrap_or(""),
            task = ctx.task.unwrap_or(""),
            actor = ctx.actor.unwrap_or(""),
            command = ctx.command.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}
