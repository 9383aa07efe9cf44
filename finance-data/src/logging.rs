use std::{
    fs::File,
    io::{self, IsTerminal},
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

// --- Formatter ---

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[36m";

fn level_color(level: Level) -> &'static str {
    match level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

/// Writes `text` wrapped in `color` when the writer supports ANSI.
fn styled(
    writer: &mut Writer<'_>,
    color: &str,
    text: impl std::fmt::Display,
) -> std::fmt::Result {
    if writer.has_ansi_escapes() {
        write!(writer, "{color}{text}{RESET} ")
    } else {
        write!(writer, "{text} ")
    }
}

/// `<local time> <LEVEL> <target> <fields>` on one line.
struct CalcFormat;

impl<S, N> FormatEvent<S, N> for CalcFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let level = *meta.level();

        styled(&mut writer, DIM, Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))?;
        styled(&mut writer, level_color(level), format_args!("{level:>5}"))?;
        styled(&mut writer, CYAN, meta.target())?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn make_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).map_err(|e| anyhow!("invalid log level '{level}': {e}")),
    }
}

/// Initializes logging. Call once at startup.
///
/// - Stderr: colored when attached to a terminal, plain when piped, so
///   stdout stays clean for reports.
/// - File: appended to when `log_file` is given, never colored.
/// - Level: `RUST_LOG` when set, otherwise `level`, which may be a bare
///   level or any `EnvFilter` directive.
pub fn init_logging(
    level: &str,
    log_file: Option<&Path>,
) -> Result<()> {
    let filter = make_filter(level)?;

    let file_layer = match log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file '{}'", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .event_format(CalcFormat)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(CalcFormat)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("logging already initialized: {e}"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn styled_is_plain_without_ansi() {
        let mut out = String::new();
        let mut writer = Writer::new(&mut out);

        styled(&mut writer, CYAN, "finance_core::payoff").unwrap();
        styled(&mut writer, level_color(Level::INFO), format_args!("{:>5}", Level::INFO)).unwrap();

        assert_eq!(out, "finance_core::payoff  INFO ");
    }

    #[test]
    fn every_level_has_its_own_color() {
        let colors: std::collections::HashSet<_> =
            [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE]
                .into_iter()
                .map(level_color)
                .collect();

        assert_eq!(colors.len(), 5);
    }

    #[test]
    fn explicit_level_is_used_when_rust_log_is_unset() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }

        let filter = make_filter("debug").expect("valid level");

        assert_eq!(filter.to_string(), "debug");
    }
}
