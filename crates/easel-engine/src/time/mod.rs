//! Time subsystem.
//!
//! Two clocks share one operation, `on_frame() -> FrameTime`:
//! - `RealtimeClock`: measured wall-clock intervals
//! - `FixedStepClock`: exactly `1 / framerate` per frame, for deterministic export
//!
//! The runtime ticks the active [`Clock`] once per `update`, never while the
//! loop is paused.

mod clock;

pub use clock::{Clock, FixedStepClock, FrameTime, RealtimeClock};
