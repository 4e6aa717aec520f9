use std::time::Instant;

use crate::error::{SketchError, SketchResult};

/// Time snapshot produced once per `update`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameTime {
    /// Seconds since the clock started.
    pub time: f64,

    /// Seconds since the previous frame; `0.0` on the first frame.
    pub delta_time: f64,
}

/// Wall-clock time source.
///
/// `time` is the sum of measured frame intervals, so a paused loop (no ticks)
/// still sees the paused interval in the next `delta_time`.
#[derive(Debug, Clone, Default)]
pub struct RealtimeClock {
    last: Option<Instant>,
    time: f64,
}

impl RealtimeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_frame(&mut self) -> FrameTime {
        self.on_frame_at(Instant::now())
    }

    /// Advances the clock as if the frame started at `now`.
    pub fn on_frame_at(&mut self, now: Instant) -> FrameTime {
        let delta_time = match self.last {
            None => 0.0,
            Some(last) => now.saturating_duration_since(last).as_secs_f64(),
        };
        self.last = Some(now);
        self.time += delta_time;

        FrameTime {
            time: self.time,
            delta_time,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Deterministic time source advancing exactly `1 / framerate` per frame.
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    framerate: f64,
    frames: Option<u64>,
}

impl FixedStepClock {
    /// Fails unless `framerate` is finite and positive.
    pub fn new(framerate: f64) -> SketchResult<Self> {
        if !framerate.is_finite() || framerate <= 0.0 {
            return Err(SketchError::invalid(format!(
                "fixed-step framerate must be positive, got {framerate}"
            )));
        }
        Ok(Self {
            framerate,
            frames: None,
        })
    }

    pub fn framerate(&self) -> f64 {
        self.framerate
    }

    pub fn on_frame(&mut self) -> FrameTime {
        match self.frames {
            None => {
                self.frames = Some(0);
                FrameTime::default()
            }
            Some(n) => {
                let n = n + 1;
                self.frames = Some(n);
                // Derived from the frame count so frame k reports exactly k / framerate.
                FrameTime {
                    time: n as f64 / self.framerate,
                    delta_time: 1.0 / self.framerate,
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.frames = None;
    }
}

/// The active time source.
///
/// Switching modes replaces the value; the new clock starts again at zero.
#[derive(Debug, Clone)]
pub enum Clock {
    Realtime(RealtimeClock),
    FixedStep(FixedStepClock),
}

impl Clock {
    pub fn realtime() -> Self {
        Clock::Realtime(RealtimeClock::new())
    }

    pub fn fixed_step(framerate: f64) -> SketchResult<Self> {
        FixedStepClock::new(framerate).map(Clock::FixedStep)
    }

    pub fn on_frame(&mut self) -> FrameTime {
        match self {
            Clock::Realtime(c) => c.on_frame(),
            Clock::FixedStep(c) => c.on_frame(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Clock::Realtime(c) => c.reset(),
            Clock::FixedStep(c) => c.reset(),
        }
    }

    pub fn is_fixed_step(&self) -> bool {
        matches!(self, Clock::FixedStep(_))
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock::realtime()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    // ── realtime ──────────────────────────────────────────────────────────

    #[test]
    fn realtime_first_frame_is_zero() {
        let mut clock = RealtimeClock::new();
        assert_eq!(clock.on_frame_at(Instant::now()), FrameTime::default());
    }

    #[test]
    fn realtime_measures_intervals() {
        let start = Instant::now();
        let mut clock = RealtimeClock::new();
        clock.on_frame_at(start);
        let ft = clock.on_frame_at(start + Duration::from_millis(250));
        assert!((ft.delta_time - 0.25).abs() < 1e-9);
        let ft = clock.on_frame_at(start + Duration::from_millis(300));
        assert!((ft.delta_time - 0.05).abs() < 1e-9);
        assert!((ft.time - 0.3).abs() < 1e-9);
    }

    #[test]
    fn realtime_is_monotonic_even_if_instants_go_backwards() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut clock = RealtimeClock::new();
        clock.on_frame_at(start);
        let ft = clock.on_frame_at(start - Duration::from_millis(10));
        assert_eq!(ft.delta_time, 0.0);
        assert_eq!(ft.time, 0.0);
    }

    #[test]
    fn realtime_paused_interval_shows_up_in_next_delta() {
        let start = Instant::now();
        let mut clock = RealtimeClock::new();
        clock.on_frame_at(start);
        clock.on_frame_at(start + Duration::from_millis(16));
        // No ticks for 2s (loop paused), then resume.
        let ft = clock.on_frame_at(start + Duration::from_millis(2016));
        assert!((ft.time - 2.016).abs() < 1e-9);
    }

    // ── fixed step ────────────────────────────────────────────────────────

    #[test]
    fn fixed_step_sequence_is_exact() {
        let mut clock = FixedStepClock::new(60.0).unwrap();
        for k in 0..120u64 {
            let ft = clock.on_frame();
            assert_eq!(ft.time, k as f64 / 60.0);
            if k == 0 {
                assert_eq!(ft.delta_time, 0.0);
            } else {
                assert_eq!(ft.delta_time, 1.0 / 60.0);
            }
        }
    }

    #[test]
    fn fixed_step_time_and_delta_never_decrease() {
        let mut clock = Clock::fixed_step(24.0).unwrap();
        let mut prev = clock.on_frame();
        for _ in 0..1000 {
            let ft = clock.on_frame();
            assert!(ft.time >= prev.time);
            assert!(ft.delta_time >= 0.0);
            prev = ft;
        }
    }

    #[test]
    fn reset_restarts_at_zero() {
        let mut clock = Clock::fixed_step(30.0).unwrap();
        clock.on_frame();
        clock.on_frame();
        clock.reset();
        assert_eq!(clock.on_frame(), FrameTime::default());
    }

    #[test]
    fn fixed_step_rejects_unusable_framerates() {
        for framerate in [0.0, -30.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(FixedStepClock::new(framerate), Err(SketchError::InvalidArgument(_))),
                "{framerate} accepted"
            );
            assert!(Clock::fixed_step(framerate).is_err());
        }
    }
}
