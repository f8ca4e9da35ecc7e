//! # Logging & Tracing Infrastructure
//!
//! Installs the process-wide `tracing` subscriber for the editor core.
//!
//! ## Overview
//!
//! [`init_logging`] builds a `tracing-subscriber` registry with three layers:
//! an `EnvFilter` (the workspace crates at the configured level, everything
//! else at `warn`), a stderr formatter in pretty, JSON or compact style, and a
//! [`HostLogLayer`] that copies each surviving event into the host's
//! [`LogSink`] when one is configured.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use bridge_traits::log::{LogLevel, StderrSink};
//! use std::sync::Arc;
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Pretty)
//!     .with_level(LogLevel::Debug)
//!     .with_log_sink(Arc::new(StderrSink::default()));
//!
//! init_logging(config)?;
//! tracing::info!("Editor started");
//! ```

use crate::error::{Error, Result};

use bridge_traits::log::{LogEntry, LogLevel, LogSink};

use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layered, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Crates whose events are shown at the configured level by default.
const WORKSPACE_CRATES: &[&str] = &[
    "subcache_workspace",
    "core_runtime",
    "core_audio",
    "bridge_desktop",
];

/// Stderr output style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, colored; the default for debug builds
    Pretty,
    /// One JSON object per event
    Json,
    /// One line per event; the default for release builds
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Compact
        }
    }
}

/// Logging configuration
#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level for the workspace crates when no `filter` is given
    pub level: LogLevel,
    /// Full `EnvFilter` directive string, replacing the default filter
    pub filter: Option<String>,
    /// Host sink receiving a copy of every event
    pub log_sink: Option<Arc<dyn LogSink>>,
    pub display_target: bool,
    /// Show thread names, which tells `hd-audio-cache` workers apart
    pub display_thread_names: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            log_sink: None,
            display_target: true,
            display_thread_names: false,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("filter", &self.filter)
            .field("log_sink", &self.log_sink.is_some())
            .field("display_target", &self.display_target)
            .field("display_thread_names", &self.display_thread_names)
            .finish()
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_names(mut self, display: bool) -> Self {
        self.display_thread_names = display;
        self
    }

    /// The filter directives this configuration installs.
    pub fn filter_directives(&self) -> String {
        match &self.filter {
            Some(custom) => custom.clone(),
            None => {
                let level = self.level.as_str();
                let mut directives = String::from("warn");
                for krate in WORKSPACE_CRATES {
                    directives.push_str(&format!(",{}={}", krate, level));
                }
                directives
            }
        }
    }
}

/// Install the global subscriber.
///
/// Call once at startup. Fails if a global subscriber is already installed or
/// the filter does not parse.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.filter_directives())
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer(&config))
        .with(HostLogLayer::new(config.log_sink.clone()))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

type FilteredRegistry = Layered<EnvFilter, Registry>;

fn stderr_layer(config: &LoggingConfig) -> Box<dyn Layer<FilteredRegistry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(config.display_target)
        .with_thread_names(config.display_thread_names);

    match config.format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Json => layer.json().flatten_event(true).boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

/// Copies events into a host [`LogSink`].
pub struct HostLogLayer {
    sink: Option<Arc<dyn LogSink>>,
}

impl HostLogLayer {
    pub fn new(sink: Option<Arc<dyn LogSink>>) -> Self {
        Self { sink }
    }
}

impl<S> Layer<S> for HostLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(sink) = &self.sink else {
            return;
        };

        let metadata = event.metadata();
        let level = log_level(metadata.level());
        if level < sink.min_level() {
            return;
        }

        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let message = fields
            .message
            .take()
            .unwrap_or_else(|| metadata.name().to_string());
        let mut entry = LogEntry::new(level, metadata.target(), message);
        entry.fields = fields.values;
        entry.span = ctx.lookup_current().map(|span| span.name().to_string());

        // Logging must not fail the caller; a broken sink is reported on stderr.
        if let Err(e) = sink.log(entry) {
            eprintln!("Host log sink failed: {}", e);
        }
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    values: std::collections::BTreeMap<String, String>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            name => {
                self.values.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{:?}", value));
    }
}

fn log_level(level: &tracing::Level) -> LogLevel {
    match *level {
        tracing::Level::TRACE => LogLevel::Trace,
        tracing::Level::DEBUG => LogLevel::Debug,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::WARN => LogLevel::Warn,
        tracing::Level::ERROR => LogLevel::Error,
    }
}

/// Final component of a `/` or `\` separated path, for compact log fields.
///
/// ```ignore
/// tracing::info!(file = %strip_path("/tmp/audio-1700000000-4242"), "Created cache file");
/// // file=audio-1700000000-4242
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
