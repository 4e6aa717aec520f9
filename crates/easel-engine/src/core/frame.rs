use crate::coords::Vec2;
use crate::error::{SketchError, SketchResult};
use crate::input::{InputTranslator, SemanticEvent};
use crate::time::{Clock, FrameTime};

/// Framerate used by the fixed-step clock when no cap was set.
pub const DEFAULT_FRAMERATE: f64 = 60.0;

/// Per-frame scheduling state: clock, looping flag, mouse accumulation and
/// the input translator.
///
/// One frame is:
/// 1. raw input fed to the translator, dispatching button/key/scroll events
/// 2. [`tick_input`](Self::tick_input): the movement check
/// 3. [`tick_clock`](Self::tick_clock): `Some` only while looping
/// 4. `update`, then [`end_update`](Self::end_update)
#[derive(Debug)]
pub(crate) struct FrameState {
    clock: Clock,
    framerate: f64,
    capped: bool,
    looping: bool,
    time: FrameTime,
    input: InputTranslator,
    /// Sum of `MouseMove` deltas since the last `update`.
    mouse_delta: Vec2,
    frame_count: u64,
}

impl FrameState {
    pub(crate) fn new() -> Self {
        Self {
            clock: Clock::realtime(),
            framerate: DEFAULT_FRAMERATE,
            capped: false,
            looping: true,
            time: FrameTime::default(),
            input: InputTranslator::new(),
            mouse_delta: Vec2::zero(),
            frame_count: 0,
        }
    }

    // ── queries ────────────────────────────────────────────────────────────

    pub(crate) fn time(&self) -> FrameTime {
        self.time
    }

    pub(crate) fn is_looping(&self) -> bool {
        self.looping
    }

    pub(crate) fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    pub(crate) fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub(crate) fn input(&self) -> &InputTranslator {
        &self.input
    }

    pub(crate) fn input_mut(&mut self) -> &mut InputTranslator {
        &mut self.input
    }

    /// Target frames per second, if capped.
    pub(crate) fn framerate_cap(&self) -> Option<f64> {
        self.capped.then_some(self.framerate)
    }

    pub(crate) fn is_fixed_step(&self) -> bool {
        self.clock.is_fixed_step()
    }

    // ── configuration ──────────────────────────────────────────────────────

    pub(crate) fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub(crate) fn set_time_mode_realtime(&mut self) {
        self.clock = Clock::realtime();
        self.time = FrameTime::default();
        log::debug!("time mode: realtime");
    }

    /// Switches to a fixed-step clock at the current framerate.
    pub(crate) fn set_time_mode_fixedstep(&mut self) -> SketchResult<()> {
        self.clock = Clock::fixed_step(self.framerate)?;
        self.time = FrameTime::default();
        log::debug!("time mode: fixed step at {} fps", self.framerate);
        Ok(())
    }

    /// A running fixed-step clock keeps its rate; the new rate applies to the
    /// next switch to fixed-step mode.
    pub(crate) fn cap_framerate(&mut self, fps: f64) -> SketchResult<()> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(SketchError::invalid(format!(
                "framerate must be positive, got {fps}"
            )));
        }
        self.framerate = fps;
        self.capped = true;
        Ok(())
    }

    pub(crate) fn uncap_framerate(&mut self) {
        self.capped = false;
    }

    // ── frame steps ────────────────────────────────────────────────────────

    /// Runs the per-frame movement check and accumulates the reported motion.
    pub(crate) fn tick_input(&mut self, out: &mut Vec<SemanticEvent>) {
        let first_new = out.len();
        self.input.check_for_mouse_movements(out);
        for event in &out[first_new..] {
            if let SemanticEvent::MouseMoved(m) = event {
                self.mouse_delta += m.delta;
            }
        }
    }

    /// Advances the clock if the loop is running.
    pub(crate) fn tick_clock(&mut self) -> Option<FrameTime> {
        if !self.looping {
            return None;
        }
        self.time = self.clock.on_frame();
        Some(self.time)
    }

    pub(crate) fn end_update(&mut self) {
        self.mouse_delta = Vec2::zero();
        self.frame_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Button;

    /// One full frame; returns whether `update` would have run, and the
    /// events dispatched before it.
    fn frame(state: &mut FrameState) -> (Option<FrameTime>, Vec<SemanticEvent>) {
        let mut events = Vec::new();
        state.tick_input(&mut events);
        let t = state.tick_clock();
        if t.is_some() {
            state.end_update();
        }
        (t, events)
    }

    fn moves(events: &[SemanticEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SemanticEvent::MouseMoved(_)))
            .count()
    }

    // ── looping ────────────────────────────────────────────────────────────

    #[test]
    fn paused_loop_still_dispatches_moves() {
        let mut s = FrameState::new();
        s.set_looping(false);

        s.input_mut().cursor_moved(Vec2::new(0.1, 0.0));
        let (t, events) = frame(&mut s);
        assert!(t.is_none());
        assert_eq!(moves(&events), 1);
        assert_eq!(s.frame_count(), 0);

        s.set_looping(true);
        let (t, _) = frame(&mut s);
        assert!(t.is_some());
        assert_eq!(s.frame_count(), 1);
    }

    #[test]
    fn fixed_step_time_does_not_advance_while_paused() {
        let mut s = FrameState::new();
        s.set_time_mode_fixedstep().unwrap();

        for _ in 0..3 {
            frame(&mut s);
        }
        assert_eq!(s.time().time, 2.0 / 60.0);

        s.set_looping(false);
        for _ in 0..10 {
            frame(&mut s);
        }
        assert_eq!(s.time().time, 2.0 / 60.0);

        s.set_looping(true);
        let (t, _) = frame(&mut s);
        assert_eq!(t.map(|t| t.time), Some(3.0 / 60.0));
    }

    #[test]
    fn realtime_resume_includes_paused_interval() {
        let mut s = FrameState::new();
        frame(&mut s);
        s.set_looping(false);
        std::thread::sleep(std::time::Duration::from_millis(20));
        frame(&mut s);
        s.set_looping(true);
        let (t, _) = frame(&mut s);
        let t = t.unwrap();
        assert!(t.delta_time >= 0.02);
        assert!(t.time >= t.delta_time);
    }

    // ── time ───────────────────────────────────────────────────────────────

    #[test]
    fn time_is_monotonic() {
        let mut s = FrameState::new();
        let mut last = -1.0;
        for _ in 0..50 {
            let (t, _) = frame(&mut s);
            let t = t.unwrap();
            assert!(t.delta_time >= 0.0);
            assert!(t.time >= last);
            last = t.time;
        }
    }

    #[test]
    fn mode_switch_restarts_time() {
        let mut s = FrameState::new();
        s.set_time_mode_fixedstep().unwrap();
        frame(&mut s);
        frame(&mut s);
        s.set_time_mode_fixedstep().unwrap();
        assert_eq!(s.time().time, 0.0);
        let (t, _) = frame(&mut s);
        assert_eq!(t, Some(FrameTime::default()));
    }

    #[test]
    fn fixed_step_uses_configured_framerate() {
        let mut s = FrameState::new();
        s.cap_framerate(30.0).unwrap();
        s.set_time_mode_fixedstep().unwrap();
        frame(&mut s);
        let (t, _) = frame(&mut s);
        assert_eq!(t.unwrap().delta_time, 1.0 / 30.0);
        assert_eq!(s.framerate_cap(), Some(30.0));
    }

    #[test]
    fn invalid_framerate_is_rejected() {
        let mut s = FrameState::new();
        assert!(s.cap_framerate(0.0).is_err());
        assert!(s.cap_framerate(f64::NAN).is_err());
        assert_eq!(s.framerate_cap(), None);
    }

    // ── mouse delta ────────────────────────────────────────────────────────

    #[test]
    fn mouse_delta_sums_moves_since_last_update() {
        let mut s = FrameState::new();
        s.set_looping(false);

        s.input_mut().cursor_moved(Vec2::new(0.1, 0.0));
        frame(&mut s);
        s.input_mut().cursor_moved(Vec2::new(0.3, -0.2));
        frame(&mut s);

        let mut events = Vec::new();
        s.tick_input(&mut events);
        assert!((s.mouse_delta().x - 0.3).abs() < 1e-6);
        assert!((s.mouse_delta().y + 0.2).abs() < 1e-6);

        s.set_looping(true);
        s.tick_clock();
        s.end_update();
        assert_eq!(s.mouse_delta(), Vec2::zero());
    }

    #[test]
    fn drags_do_not_count_twice() {
        let mut s = FrameState::new();
        let mut events = Vec::new();
        s.input_mut().button_down(Button::Left, &mut events);
        s.input_mut().cursor_moved(Vec2::new(0.5, 0.0));
        s.tick_input(&mut events);
        assert_eq!(s.mouse_delta(), Vec2::new(0.5, 0.0));
    }
}
