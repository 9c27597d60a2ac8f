//! Console log sink understood by the CI worker.
//!
//! The worker recognises lines prefixed with `##[info]`, `##[warning]`,
//! `##[error]` and friends. Library code logs through `tracing`; [`init`]
//! installs a [`SinkLayer`] that renders every event as one such line.
//! Lines from concurrent threads never interleave.

use std::fmt::{self, Write as _};
use std::io::Write as _;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Line kinds the worker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Command,
    Group,
    EndGroup,
}

impl LogLevel {
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Debug => "##[debug]",
            Self::Info => "##[info]",
            Self::Warn => "##[warning]",
            Self::Error => "##[error]",
            Self::Command => "##[command]",
            Self::Group => "##[group]",
            Self::EndGroup => "##[endgroup]",
        }
    }

    fn from_tracing(level: &Level) -> Self {
        match *level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => Self::Info,
            _ => Self::Debug,
        }
    }
}

/// Destination for rendered log lines.
pub trait LogSink: Send + Sync {
    fn write_line(&self, level: LogLevel, text: &str);
}

/// Writes prefixed lines to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    lock: Mutex<()>,
}

impl LogSink for ConsoleSink {
    fn write_line(&self, level: LogLevel, text: &str) {
        let _guard = self.lock.lock();
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}{}", level.prefix(), text);
        let _ = out.flush();
    }
}

/// Keeps lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().clone()
    }

    /// Lines as the console would show them.
    pub fn rendered(&self) -> Vec<String> {
        self.lines.lock().iter().map(|(level, text)| format!("{}{}", level.prefix(), text)).collect()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, level: LogLevel, text: &str) {
        self.lines.lock().push((level, text.to_string()));
    }
}

static SINK: Lazy<RwLock<Arc<dyn LogSink>>> =
    Lazy::new(|| RwLock::new(Arc::new(ConsoleSink::default())));

/// The process-wide sink.
pub fn sink() -> Arc<dyn LogSink> {
    SINK.read().clone()
}

/// Replace the process-wide sink.
pub fn set_sink(sink: Arc<dyn LogSink>) {
    *SINK.write() = sink;
}

/// Install the tracing subscriber. Later calls are no-ops.
///
/// The filter defaults to `info` and honours `RUST_LOG`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry().with(SinkLayer::global()).with(filter).try_init();
}

/// Echo a command line.
pub fn command(text: impl fmt::Display) {
    sink().write_line(LogLevel::Command, &text.to_string());
}

/// Open a collapsible group.
pub fn group(title: impl fmt::Display) {
    sink().write_line(LogLevel::Group, &title.to_string());
}

/// Close the innermost group.
pub fn end_group() {
    sink().write_line(LogLevel::EndGroup, "");
}

/// Tracing layer rendering events into a [`LogSink`].
pub struct SinkLayer {
    sink: Option<Arc<dyn LogSink>>,
}

impl SinkLayer {
    /// Write into a dedicated sink.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Write into whatever [`sink`] currently returns.
    pub fn global() -> Self {
        Self { sink: None }
    }
}

impl<S: Subscriber> Layer<S> for SinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let level = LogLevel::from_tracing(event.metadata().level());
        let line = visitor.into_line();
        match &self.sink {
            Some(sink) => sink.write_line(level, &line),
            None => sink().write_line(level, &line),
        }
    }
}

/// Message first, then `key=value` for other fields.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn into_line(self) -> String {
        let mut line = self.message;
        line.push_str(&self.fields);
        line
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn capture<F: FnOnce()>(f: F) -> Arc<MemorySink> {
        let sink = MemorySink::new();
        let subscriber = tracing_subscriber::registry().with(SinkLayer::new(sink.clone()));
        tracing::subscriber::with_default(subscriber, f);
        sink
    }

    #[test]
    fn test_levels_are_prefixed() {
        let sink = capture(|| {
            tracing::info!("starting");
            tracing::warn!("careful");
            tracing::error!("http request failed, status: {}", 500);
            tracing::debug!("details");
        });

        assert_eq!(
            sink.rendered(),
            vec![
                "##[info]starting",
                "##[warning]careful",
                "##[error]http request failed, status: 500",
                "##[debug]details",
            ]
        );
    }

    #[test]
    fn test_structured_fields_follow_message() {
        let sink = capture(|| tracing::info!(code = 7, "done"));
        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1.starts_with("done"));
        assert!(lines[0].1.contains("code=7"));
    }

    #[test]
    fn test_concurrent_lines_stay_whole() {
        let sink = MemorySink::new();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = sink.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        sink.write_line(LogLevel::Info, &format!("thread {t} line {i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = sink.lines();
        assert_eq!(lines.len(), 400);
        assert!(lines.iter().all(|(_, text)| text.starts_with("thread ")));
    }

    #[test]
    #[serial]
    fn test_group_helpers_use_global_sink() {
        let memory = MemorySink::new();
        set_sink(memory.clone());
        group("Build");
        command("make all");
        end_group();
        set_sink(Arc::new(ConsoleSink::default()));

        assert_eq!(memory.rendered(), vec!["##[group]Build", "##[command]make all", "##[endgroup]"]);
    }
}
