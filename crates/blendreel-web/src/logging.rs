#![forbid(unsafe_code)]

//! `tracing` output routed line by line to a [`LineSink`].
//!
//! On wasm32 the sink is the browser console, with the event level picking
//! `console.error`/`warn`/`info`/`debug`. Natively any sink works, which is
//! how the formatting is tested.

use std::io;

use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::fmt::MakeWriter;

/// Receives one formatted log line at a time.
pub trait LineSink: Clone + Send + Sync + 'static {
    fn emit(&self, level: Level, line: &str);
}

/// Buffers one event and hands it to the sink when dropped.
pub struct SinkWriter<S: LineSink> {
    sink: S,
    level: Level,
    buf: Vec<u8>,
}

impl<S: LineSink> io::Write for SinkWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: LineSink> Drop for SinkWriter<S> {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        let line = text.trim_end();
        if !line.is_empty() {
            self.sink.emit(self.level, line);
        }
    }
}

/// [`MakeWriter`] that tags each writer with its event's level.
#[derive(Debug, Clone)]
pub struct SinkMakeWriter<S>(pub S);

impl<'a, S: LineSink> MakeWriter<'a> for SinkMakeWriter<S> {
    type Writer = SinkWriter<S>;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter {
            sink: self.0.clone(),
            level: Level::INFO,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        SinkWriter {
            sink: self.0.clone(),
            level: *meta.level(),
            buf: Vec::new(),
        }
    }
}

/// Subscriber writing plain (no color, no timestamp) lines to `sink`.
///
/// Timestamps are left to the console; `SystemTime` is unavailable on
/// wasm32-unknown-unknown.
pub fn subscriber<S: LineSink>(sink: S, max_level: Level) -> impl Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_writer(SinkMakeWriter(sink))
        .with_max_level(max_level)
        .without_time()
        .with_target(true)
        .finish()
}

/// Parse a level name such as `"debug"`; unknown names fall back to `INFO`.
#[must_use]
pub fn parse_level(name: &str) -> Level {
    name.trim().parse().unwrap_or(Level::INFO)
}

#[cfg(target_arch = "wasm32")]
pub use console::{ConsoleSink, install_console_logging};

#[cfg(target_arch = "wasm32")]
mod console {
    use std::sync::Once;

    use tracing::Level;
    use wasm_bindgen::JsValue;
    use web_sys::console;

    use super::{LineSink, subscriber};

    #[derive(Debug, Clone, Copy)]
    pub struct ConsoleSink;

    impl LineSink for ConsoleSink {
        fn emit(&self, level: Level, line: &str) {
            let value = JsValue::from_str(line);
            match level {
                Level::ERROR => console::error_1(&value),
                Level::WARN => console::warn_1(&value),
                Level::INFO => console::info_1(&value),
                _ => console::debug_1(&value),
            }
        }
    }

    /// Install the console subscriber once; later calls are ignored.
    pub fn install_console_logging(max_level: Level) {
        static ONCE: Once = Once::new();
        ONCE.call_once(|| {
            let _ = tracing::subscriber::set_global_default(subscriber(ConsoleSink, max_level));
        });
    }
}
