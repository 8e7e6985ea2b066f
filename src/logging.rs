//! Logging initialization
//!
//! Structured logging through `tracing`. The generator CLI and hosting
//! processes of the service dispatcher call [`init_logging_with_config`] once
//! at startup; library code only emits events.
//!
//! Logs go to stderr so generator output on stdout (e.g. the `args` command)
//! stays clean.

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::env;
use std::io;
use std::path::Path;
use tracing::{warn, Level, Subscriber};
use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for services, pretty-print for interactive use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    /// Log format: json/pretty
    pub format: LogFormat,
    /// Extra filter directives (comma-separated, `target=level`)
    pub target_filter: Option<String>,
    /// Include file:line location
    pub include_location: bool,
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("TCV3_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("TCV3_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            ),
            target_filter: env::var("TCV3_LOG_TARGET_FILTER").ok(),
            include_location: env::var("TCV3_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Create a default configuration for testing
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            target_filter: None,
            include_location: true,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let mut env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));

        if let Some(target_filter) = &self.target_filter {
            for filter in target_filter.split(',') {
                let filter = filter.trim();
                if filter.is_empty() {
                    continue;
                }
                match filter.parse() {
                    Ok(directive) => env_filter = env_filter.add_directive(directive),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
                }
            }
        }
        env_filter
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Initialize logging at `log_level`, other settings from the environment.
///
/// # Example
///
/// ```no_run
/// tcv3::logging::init_logging("debug").expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: &str) -> Result<()> {
    let mut config = LogConfig::from_env();
    config.log_level = log_level.to_string();
    init_logging_with_config(&config)
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    build_subscriber(config, std::io::stderr)
        .try_init()
        .context("Failed to initialize logging")
}

/// The subscriber [`init_logging_with_config`] installs, writing the main log
/// to `writer`.
///
/// Besides the main fmt layer it carries the session layer, which copies
/// events of a thread running inside [`with_session_log`] to that session's
/// file.
pub fn build_subscriber<W>(config: &LogConfig, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .with(session_layer())
}

fn session_layer<S>() -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(SessionWriter)
}

thread_local! {
    static SESSION_FILE: RefCell<Option<NonBlocking>> = const { RefCell::new(None) };
}

/// `MakeWriter` for the session layer: the current thread's session file, or
/// nothing outside a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionWriter;

impl<'a> MakeWriter<'a> for SessionWriter {
    type Writer = SessionSink;

    fn make_writer(&'a self) -> Self::Writer {
        SessionSink
    }
}

#[derive(Debug)]
pub struct SessionSink;

impl io::Write for SessionSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        SESSION_FILE.with(|file| match file.borrow_mut().as_mut() {
            Some(writer) => writer.write(buf),
            None => Ok(buf.len()),
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        SESSION_FILE.with(|file| match file.borrow_mut().as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        })
    }
}

/// Restores the previous session file of the thread when dropped.
struct SessionScope(Option<NonBlocking>);

impl Drop for SessionScope {
    fn drop(&mut self) {
        let previous = self.0.take();
        SESSION_FILE.with(|file| *file.borrow_mut() = previous);
    }
}

/// Run `f` with events of the current thread also written to `<dir>/<name>.log`.
///
/// Used by the service dispatcher to give every webhook session its own log
/// file. Events keep flowing to the main log. The file is created (or
/// truncated) before `f` runs and flushed when it returns.
///
/// When the file cannot be created the failure is logged and `f` runs without
/// a session file. Without a subscriber from [`build_subscriber`] in effect,
/// a scoped subscriber writing only the session file is used.
pub fn with_session_log<T>(dir: &Path, name: &str, f: impl FnOnce() -> T) -> T {
    let appender = match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .filename_suffix("log")
        .build(dir)
    {
        Ok(appender) => appender,
        Err(e) => {
            warn!(dir = %dir.display(), session = name, error = %e, "Session log unavailable");
            return f();
        }
    };
    let (writer, _guard) = tracing_appender::non_blocking(appender);

    if tracing::dispatcher::get_default(|d| d.is::<SessionWriter>()) {
        let previous = SESSION_FILE.with(|file| file.borrow_mut().replace(writer));
        let _scope = SessionScope(previous);
        return f();
    }

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new(LogConfig::from_env().level().as_str()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer),
        );
    tracing::subscriber::with_default(subscriber, f)
}
