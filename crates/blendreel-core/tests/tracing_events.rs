#![forbid(unsafe_code)]

//! Log contract: phase transitions and recovered failures are visible in
//! tracing output with their structured fields.
//!
//! Run:
//!   cargo test -p blendreel-core --test tracing_events

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use blendreel_core::ambient::Viewport;
use blendreel_core::{ImageHandle, ImageId, MarqueeSession, MeasuredSize};
use tracing_subscriber::fmt::MakeWriter;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// Shared in-memory sink for the fmt layer.
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn with_capture(level: tracing::Level, f: impl FnOnce()) -> String {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .without_time()
        .with_writer(capture.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    capture.text()
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn failure_and_completion_are_logged() {
    let logs = with_capture(tracing::Level::INFO, || {
        let mut session = MarqueeSession::with_defaults(Viewport::default(), 2);
        let handles = (0..3)
            .map(|i| ImageHandle::new(ImageId(i), format!("{i}.jpg")))
            .collect();
        session.discover(handles, Duration::ZERO).unwrap();
        session.image_failed(ImageId(1), ms(10)).unwrap();
        for i in [0, 2] {
            session
                .image_loaded(ImageId(i), MeasuredSize::natural(800.0, 600.0), ms(20))
                .unwrap();
        }
    });

    assert!(logs.contains("image failed to load"), "{logs}");
    assert!(logs.contains("load batch complete"), "{logs}");
    assert!(logs.contains("loaded=2"), "{logs}");
    assert!(logs.contains("hidden=1"), "{logs}");
    assert!(logs.contains("marquee running"), "{logs}");
}

#[test]
fn skip_is_logged() {
    let logs = with_capture(tracing::Level::INFO, || {
        let mut session = MarqueeSession::with_defaults(Viewport::default(), 2);
        let _ = session.discover(Vec::new(), Duration::ZERO);
    });
    assert!(logs.contains("marquee skipped"), "{logs}");
}

#[test]
fn wraparound_is_a_debug_event() {
    let logs = with_capture(tracing::Level::DEBUG, || {
        let mut motion = blendreel_core::MotionController::with_defaults();
        motion.on_unit_ready(100.0);
        for _ in 0..40 {
            motion.frame();
        }
    });
    assert!(logs.contains("autoplay running"), "{logs}");
    assert!(logs.contains("wraparound"), "{logs}");
}

#[test]
fn per_frame_numbers_stay_below_debug() {
    let logs = with_capture(tracing::Level::DEBUG, || {
        let mut motion = blendreel_core::MotionController::with_defaults();
        motion.on_unit_ready(10_000.0);
        motion.frame();
    });
    assert!(!logs.contains("motion frame"), "{logs}");
}
