#![forbid(unsafe_code)]

//! Host-agnostic engine for an infinitely scrolling, blended image marquee.
//!
//! # Role in BlendReel
//! `blendreel-core` owns every decision that has algorithmic content: which
//! images made it through loading, where each one sits in the strip, how the
//! strip is tripled so the loop is seamless, and how the shared scroll offset
//! moves under autoplay, momentum and wraparound. It never touches a DOM.
//!
//! # Pipeline
//! 1. [`loader`]: shuffle the discovered images and wait (join-with-timeout)
//!    until enough of them report a usable size.
//! 2. [`layout`]: assign offsets, blend modes and the session flip; derive
//!    the width of one repeating unit.
//! 3. [`tripler`]: describe the before/middle/after copies as an arena of
//!    layout records.
//! 4. [`motion`]: reconcile autoplay, momentum and wraparound on one offset,
//!    one host frame at a time, with [`scheduler`] preventing duplicate
//!    writers.
//!
//! [`session::MarqueeSession`] ties the four together behind one object that
//! the host drives with input events and frame ticks.
//!
//! # Time
//! The host advances time explicitly (`Duration` since an arbitrary origin).
//! Nothing in this crate reads a wall clock, spawns threads, or blocks, so the
//! same code runs in `wasm32-unknown-unknown` and in deterministic tests.

pub mod ambient;
pub mod config;
pub mod cursor;
pub mod error;
pub mod frame_stats;
pub mod image;
pub mod input;
pub mod layout;
pub mod loader;
pub mod motion;
pub mod scheduler;
pub mod session;
pub mod tripler;

pub use config::MarqueeConfig;
pub use error::{MarqueeError, Result};
pub use image::{ImageHandle, ImageId, LoadState, MeasuredSize};
pub use input::InputEvent;
pub use layout::{BlendMode, Flip, StripUnit};
pub use motion::{MotionController, MotionSnapshot};
pub use session::{MarqueeSession, SessionPhase};
pub use tripler::{LoopRegion, UnitReadiness, UnitSlot};
