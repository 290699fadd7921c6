//! File and console logging.
//!
//! Every line written to the log file has the shape
//! `<timestamp> - <LEVEL> - <message>`, with five levels: DEBUG, INFO,
//! WARNING, ERROR and CRITICAL. `tracing` has no critical level, so critical
//! events are emitted at ERROR on [`CRITICAL_TARGET`] and relabelled by
//! [`LineFormat`].

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::sync::Arc;

use chrono::Local;
use strum::{Display, EnumString};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn, Event, Level, Metadata, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt as fmt_layer, prelude::*, EnvFilter};

use crate::config::Config;
use crate::error::Result;

/// Target used for critical events.
pub const CRITICAL_TARGET: &str = "pessoas::critical";

/// Timestamp layout of the file sink.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Log level accepted by [`log_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal operation, e.g. access lines.
    Info,
    /// Something unexpected that did not fail the request.
    Warning,
    /// A failed operation.
    Error,
    /// A failure that needs immediate attention.
    Critical,
}

/// Emit `message` at `level`.
pub fn emit(level: LogLevel, message: &str) {
    match level {
        LogLevel::Debug => debug!("{message}"),
        LogLevel::Info => info!("{message}"),
        LogLevel::Warning => warn!("{message}"),
        LogLevel::Error => error!("{message}"),
        LogLevel::Critical => error!(target: CRITICAL_TARGET, "{message}"),
    }
}

/// Emit `message` at the level named by `level`.
///
/// Unknown level names do not fail the caller: an error line naming the bad
/// level is logged instead.
pub fn log_message(level: &str, message: &str) {
    match level.parse::<LogLevel>() {
        Ok(level) => emit(level, message),
        Err(_) => error!("Unrecognized logging level: {level}"),
    }
}

/// Level label written to the file sink.
pub fn level_label(metadata: &Metadata<'_>) -> &'static str {
    if metadata.target() == CRITICAL_TARGET {
        return "CRITICAL";
    }

    let level = *metadata.level();
    if level == Level::ERROR {
        "ERROR"
    } else if level == Level::WARN {
        "WARNING"
    } else if level == Level::INFO {
        "INFO"
    } else if level == Level::DEBUG {
        "DEBUG"
    } else {
        "TRACE"
    }
}

/// Event formatter producing `<timestamp> - <LEVEL> - <message>` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - {} - ",
            Local::now().format(TIMESTAMP_FORMAT),
            level_label(event.metadata())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Keeps the log file open for the lifetime of the process.
/// Syncs it to disk when flushed or dropped.
#[derive(Debug)]
pub struct LogGuard {
    file: Arc<File>,
}

impl LogGuard {
    /// Sync buffered log data to disk.
    pub fn flush(&self) -> std::io::Result<()> {
        self.file.sync_all()
    }
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        let _ = self.file.sync_all();
    }
}

/// Open the log file in append mode, creating its directory if needed.
pub fn open_log_file(config: &Config) -> Result<Arc<File>> {
    if let Some(parent) = config.log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    Ok(Arc::new(file))
}

/// Install the process-wide subscriber: console output filtered by
/// `RUST_LOG` (or the config value), plus the file sink at DEBUG and above.
pub fn init(config: &Config, verbose: bool) -> Result<LogGuard> {
    let file = open_log_file(config)?;

    let console_filter = if verbose {
        EnvFilter::new("pessoas_api=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log))
    };

    let file_layer = fmt_layer::layer()
        .event_format(LineFormat)
        .with_ansi(false)
        .with_writer(file.clone())
        .with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(fmt_layer::layer().with_filter(console_filter))
        .with(file_layer)
        .try_init()?;

    Ok(LogGuard { file })
}
