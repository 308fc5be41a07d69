//! Process-wide `tracing` setup for the `salon-booking` binary.
//!
//! Two layers share one reloadable level filter: a console layer on stderr
//! that can be muted, and a log-file layer whose target file can be swapped
//! while the process runs.

use anyhow::{Result, anyhow, bail};
use chrono::Local;
use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    Layer, // needed for .with_filter() on the console layer
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

use crate::config::LoggingConfig;

const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

/// `<local timestamp> <LEVEL> <target> <fields>`, colored on a terminal.
struct SalonFormat;

impl<S, N> FormatEvent<S, N> for SalonFormat
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
        let stamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");

        if writer.has_ansi_escapes() {
            write!(
                writer,
                "{DIM}{stamp}{RESET} {}{:>5}{RESET} {CYAN}{}{RESET} ",
                level_color(meta.level()),
                meta.level(),
                meta.target()
            )?;
        } else {
            write!(writer, "{stamp} {:>5} {} ", meta.level(), meta.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Shared, swappable log file. Records are dropped while it holds `None`.
#[derive(Clone, Default)]
struct LogFile(Arc<Mutex<Option<File>>>);

impl LogFile {
    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace(
        &self,
        file: Option<File>,
    ) {
        *self.lock() = file;
    }
}

struct LogFileWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for LogFileWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match self.0.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), Write::flush)
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter(self.lock())
    }
}

type Reloader = Box<dyn Fn(EnvFilter) -> Result<()> + Send + Sync>;

fn reloader<S>(handle: reload::Handle<EnvFilter, S>) -> Reloader
where
    S: 'static,
{
    Box::new(move |filter| {
        handle
            .reload(filter)
            .map_err(|e| anyhow!("log filter reload failed: {e}"))
    })
}

/// Runtime controls, available once [`init_logging`] has installed the
/// subscriber.
struct Controls {
    level: Reloader,
    console: Reloader,
    file: LogFile,
}

static CONTROLS: OnceLock<Controls> = OnceLock::new();

fn controls() -> Result<&'static Controls> {
    match CONTROLS.get() {
        Some(controls) => Ok(controls),
        None => bail!("logging not yet initialized"),
    }
}

/// `RUST_LOG` when set, otherwise `level`, otherwise `info`.
fn initial_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber and applies the `[logging]` table.
///
/// Only the first call installs anything; later calls just re-apply the
/// console and file settings.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    if CONTROLS.get().is_none() {
        let file = LogFile::default();
        // The console gate only mutes or unmutes; the level filter decides what passes.
        let (console_gate, console_handle) = reload::Layer::new(EnvFilter::new("trace"));
        let (level_filter, level_handle) = reload::Layer::new(initial_filter(&config.level));

        let console = tracing_subscriber::fmt::layer()
            .event_format(SalonFormat)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_filter(console_gate);
        let to_file = tracing_subscriber::fmt::layer()
            .event_format(SalonFormat)
            .with_ansi(false)
            .with_writer(file.clone());

        tracing_subscriber::registry()
            .with(level_filter)
            .with(console)
            .with(to_file)
            .try_init()
            .map_err(|e| anyhow!("cannot install log subscriber: {e}"))?;

        let _ = CONTROLS.set(Controls {
            level: reloader(level_handle),
            console: reloader(console_handle),
            file,
        });
    }

    set_console_enabled(config.stdout)?;
    match &config.file {
        Some(path) => log_to_file(path),
        None => {
            stop_file_logging();
            Ok(())
        }
    }
}

/// Replaces the level filter. Takes a bare level such as `debug` or a full
/// directive such as `info,booking_core=trace`.
pub fn set_log_level(directive: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directive)
        .map_err(|e| anyhow!("invalid log level '{directive}': {e}"))?;
    (controls()?.level)(filter)
}

/// Mutes or unmutes console output. The log file is unaffected.
pub fn set_console_enabled(enabled: bool) -> Result<()> {
    let gate = EnvFilter::new(if enabled { "trace" } else { "off" });
    (controls()?.console)(gate)
}

/// Appends records to `path`, creating the file if needed. Its directory
/// must exist.
pub fn log_to_file(path: &Path) -> Result<()> {
    let controls = controls()?;
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow!("cannot open log file '{}': {e}", path.display()))?;
    controls.file.replace(Some(file));
    Ok(())
}

pub fn stop_file_logging() {
    if let Some(controls) = CONTROLS.get() {
        controls.file.replace(None);
    }
}
