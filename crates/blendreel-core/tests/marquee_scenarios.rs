#![forbid(unsafe_code)]

//! End-to-end scenarios through `MarqueeSession`, driven the way the web
//! host drives it: discovery, load signals, frame ticks and input.
//!
//! Run:
//!   cargo test -p blendreel-core --test marquee_scenarios

use std::time::Duration;

use blendreel_core::ambient::Viewport;
use blendreel_core::input::{InputEvent, TouchPhase};
use blendreel_core::session::{SessionEvent, SessionPhase};
use blendreel_core::{
    BlendMode, ImageHandle, ImageId, MarqueeConfig, MarqueeError, MarqueeSession, MeasuredSize,
    UnitSlot,
};
use pretty_assertions::assert_eq;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn discovered(n: u32) -> Vec<ImageHandle> {
    (0..n)
        .map(|i| ImageHandle::new(ImageId(i), format!("/photos/{i}.webp")))
        .collect()
}

fn running_session(n: u32, width: f64) -> MarqueeSession {
    let mut session = MarqueeSession::with_defaults(Viewport::default(), 7);
    session.discover(discovered(n), Duration::ZERO).unwrap();
    for i in 0..n {
        session
            .image_loaded(ImageId(i), MeasuredSize::uniform(width, 600.0), ms(20))
            .unwrap();
    }
    assert_eq!(session.phase(), SessionPhase::Running);
    session
}

// -- five images of 800 px --

#[test]
fn five_images_layout_and_tripling() {
    let session = running_session(5, 800.0);
    let unit = session.unit().unwrap();

    let offsets: Vec<f64> = unit.slots().iter().map(|s| s.offset).collect();
    assert_eq!(offsets, vec![0.0, 400.0, 800.0, 1200.0, 1600.0]);
    assert_eq!(unit.one_set_width(), 2000.0);

    let blends: Vec<BlendMode> = unit.slots().iter().map(|s| s.blend).collect();
    assert_eq!(
        blends,
        vec![
            BlendMode::Normal,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::SoftLight,
            BlendMode::HardLight,
        ]
    );

    let region = session.region().unwrap();
    assert_eq!(region.len(), 15);
    assert_eq!(region.unit(UnitSlot::Before)[0].offset, -2000.0);
    assert_eq!(region.unit(UnitSlot::After)[0].offset, 2000.0);
    assert_eq!(region.total_width(), 6000.0);
    assert_eq!(region.initial_scroll(), 2000.0);
    assert_eq!(session.motion().offset(), 2000.0);
}

#[test]
fn wheel_jumps_and_clamps_velocity() {
    let mut session = running_session(5, 800.0);
    let before = session.motion().offset();
    let prior = session.motion().velocity();

    assert!(session.input(InputEvent::wheel(100.0)));

    assert_eq!(session.motion().offset(), before + 200.0);
    assert_eq!(session.motion().velocity(), (prior + 60.0).min(50.0));
}

// -- loading outcomes --

#[test]
fn zero_images_rejects_without_motion() {
    let mut session = MarqueeSession::with_defaults(Viewport::default(), 1);
    let err = session.discover(Vec::new(), Duration::ZERO).unwrap_err();
    assert!(matches!(err, MarqueeError::NoImages));
    assert!(err.is_skip());

    for t in 1..=10 {
        let frame = session.frame(ms(t * 16));
        assert_eq!(frame.motion, None);
    }
    assert_eq!(session.motion().offset(), 0.0);
    assert!(!session.motion().is_autoplay_running());
}

#[test]
fn one_failure_three_successes() {
    let mut session = MarqueeSession::with_defaults(Viewport::default(), 3);
    session.discover(discovered(4), Duration::ZERO).unwrap();

    session.image_failed(ImageId(1), ms(4_000)).unwrap();
    for i in [0, 2, 3] {
        session
            .image_loaded(ImageId(i), MeasuredSize::natural(1024.0, 768.0), ms(300))
            .unwrap();
    }

    let frame = session.frame(ms(4_016));
    assert_eq!(frame.phase, SessionPhase::Running);
    assert_eq!(
        frame.events[0],
        SessionEvent::LoadComplete {
            loaded: 3,
            hidden: vec![ImageId(1)],
        }
    );
    let unit = session.unit().unwrap();
    assert_eq!(unit.len(), 3);
    assert!(unit.images().iter().all(|h| h.id != ImageId(1)));
}

#[test]
fn stalled_image_times_out_and_is_hidden() {
    let mut session = MarqueeSession::with_defaults(Viewport::default(), 3);
    session.discover(discovered(3), Duration::ZERO).unwrap();
    session
        .image_loaded(ImageId(0), MeasuredSize::natural(800.0, 600.0), ms(50))
        .unwrap();
    session
        .image_loaded(ImageId(2), MeasuredSize::natural(800.0, 600.0), ms(60))
        .unwrap();

    let mut t = 0;
    while session.phase() == SessionPhase::Loading {
        t += 16;
        session.frame(ms(t));
        assert!(t <= 5_016, "batch never completed");
    }
    assert_eq!(session.hidden(), &[ImageId(1)]);
    assert_eq!(session.unit().map(|u| u.len()), Some(2));
}

// -- motion over time --

#[test]
fn autoplay_wraps_seamlessly() {
    let mut session = running_session(2, 500.0);
    let w = session.region().unwrap().one_set_width();
    assert_eq!(w, 500.0);

    let mut wraps = 0;
    for t in 1..=1_000 {
        let snapshot = session.frame(ms(t * 16)).motion.unwrap();
        assert!(snapshot.offset >= 0.0 && snapshot.offset < 2.0 * w);
        wraps += u32::from(snapshot.wrapped);
    }
    // drift reaches 3500 px; corrections at 1000, 1500, ..., 3500
    assert_eq!(wraps, 6);
}

#[test]
fn touch_drag_pauses_autoplay_then_flings() {
    let mut session = running_session(5, 800.0);
    session.frame(ms(16));
    let start = session.motion().offset();

    session.input(InputEvent::touch(TouchPhase::Start, 600.0, 300.0, 1_000.0));
    assert!(session.input(InputEvent::touch(TouchPhase::Move, 560.0, 301.0, 1_016.0)));
    session.frame(ms(32));
    assert_eq!(session.motion().offset(), start + 40.0);
    assert!(!session.motion().is_autoplay_running());

    session.input(InputEvent::touch(TouchPhase::End, 0.0, 0.0, 1_040.0));
    assert_eq!(session.motion().velocity(), 20.0);
    assert!(session.motion().is_autoplay_running());
    assert!(session.motion().is_momentum_running());
}

#[test]
fn vertical_swipe_is_not_consumed() {
    let mut session = running_session(5, 800.0);
    session.input(InputEvent::touch(TouchPhase::Start, 600.0, 300.0, 0.0));
    assert!(!session.input(InputEvent::touch(TouchPhase::Move, 598.0, 200.0, 16.0)));
}

#[test]
fn options_json_configures_session() {
    let config = MarqueeConfig::from_json_str(r#"{"motion":{"autoplay":false}}"#).unwrap();
    let mut session = MarqueeSession::new(config, Viewport::default(), 5).unwrap();
    session.discover(discovered(1), Duration::ZERO).unwrap();
    session
        .image_loaded(ImageId(0), MeasuredSize::uniform(800.0, 600.0), ms(1))
        .unwrap();
    let snapshot = session.frame(ms(16)).motion.unwrap();
    assert!(!snapshot.autoplay_running);
    assert_eq!(snapshot.offset, 400.0);
}
