#![forbid(unsafe_code)]

//! Browser frontend for the BlendReel marquee.
//!
//! The engine lives in `blendreel-core`; this crate only discovers `img`
//! nodes, forwards host events, and writes styles. The JavaScript side owns
//! the event listeners and the `requestAnimationFrame` loop and calls into
//! `BlendReelWeb` once per event and once per frame.

pub mod clock;
pub mod logging;
pub mod plan;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::BlendReelWeb;

pub use clock::host_time;
pub use plan::{CloneOp, DomPlan, FrameWrites, SlotStyle, WriteCache};
