//! Tracing subscriber setup. Formatted events go either to stderr or into
//! a [`DiagnosticsHandle`] ring buffer.

use std::io::{self, Write};

use tracing::Level;

use crate::diagnostics::{DiagnosticsHandle, DiagnosticsWriter};

#[derive(Clone, Debug, Default)]
pub enum LogSink {
    #[default]
    Stderr,
    Diagnostics(DiagnosticsHandle),
}

pub struct SinkWriter {
    inner: SinkInner,
}

enum SinkInner {
    Diagnostics(DiagnosticsWriter),
    Stderr(io::Stderr),
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            SinkInner::Diagnostics(w) => w.write(buf),
            SinkInner::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            SinkInner::Diagnostics(w) => w.flush(),
            SinkInner::Stderr(s) => s.flush(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SinkMakeWriter {
    sink: LogSink,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SinkMakeWriter {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        let inner = match &self.sink {
            LogSink::Diagnostics(handle) => SinkInner::Diagnostics(handle.writer()),
            LogSink::Stderr => SinkInner::Stderr(io::stderr()),
        };
        SinkWriter { inner }
    }
}

/// Compact, uncoloured formatter writing to `sink`.
pub fn subscriber(level: Level, sink: LogSink) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(SinkMakeWriter { sink })
        .with_target(false)
        .with_thread_names(false)
        .with_ansi(false)
        .finish()
}

/// Install [`subscriber`] globally. Returns false if a global subscriber
/// was already set.
pub fn init(level: Level, sink: LogSink) -> bool {
    tracing::subscriber::set_global_default(subscriber(level, sink)).is_ok()
}
