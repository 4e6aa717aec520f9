use crate::coords::Vec2;

use super::types::{
    Button, KeyAction, KeyEvent, ModifierFlags, MouseButton, MouseDrag, MouseMove, MouseScroll,
    SemanticEvent,
};

/// A button currently held down.
#[derive(Debug, Copy, Clone)]
struct HeldButton {
    button: Button,
    drag_start: Vec2,
    /// Position at this button's last drag report.
    last: Vec2,
    /// Focus was lost while held; the release may never be observed.
    stale: bool,
}

/// Converts raw input into semantic events.
///
/// All positions are sketch space. Motion is accumulated and only reported
/// by [`check_for_mouse_movements`](Self::check_for_mouse_movements), which the
/// runtime calls once per frame; this is what turns N raw cursor events into a
/// single `MouseMove` (plus at most one `MouseDrag` per held button) per frame.
#[derive(Debug, Default)]
pub struct InputTranslator {
    position: Vec2,
    /// Position at the last movement tick.
    reported: Vec2,
    /// Held buttons in press order.
    held: Vec<HeldButton>,
    modifiers: ModifierFlags,
    cursor_in_window: bool,
    focused: bool,
}

impl InputTranslator {
    pub fn new() -> Self {
        Self {
            focused: true,
            ..Self::default()
        }
    }

    // ── queries ────────────────────────────────────────────────────────────

    pub fn mouse(&self) -> Vec2 {
        self.position
    }

    pub fn modifiers(&self) -> ModifierFlags {
        self.modifiers
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.held.iter().any(|h| h.button == button)
    }

    pub fn any_pressed(&self) -> bool {
        !self.held.is_empty()
    }

    pub fn cursor_in_window(&self) -> bool {
        self.cursor_in_window
    }

    pub fn focused(&self) -> bool {
        self.focused
    }

    // ── raw transitions ────────────────────────────────────────────────────

    /// Records pointer motion. Reported on the next movement tick.
    pub fn cursor_moved(&mut self, position: Vec2) {
        self.position = position;
        self.cursor_in_window = true;
    }

    pub fn cursor_entered(&mut self) {
        self.cursor_in_window = true;
    }

    pub fn cursor_left(&mut self) {
        self.cursor_in_window = false;
    }

    pub fn modifiers_changed(&mut self, modifiers: ModifierFlags) {
        self.modifiers = modifiers;
    }

    pub fn button_down(&mut self, button: Button, out: &mut Vec<SemanticEvent>) {
        // A press for a button we still think is held means its release was
        // lost (typically while unfocused): close the previous pair first.
        if let Some(i) = self.held_index(button) {
            self.held.remove(i);
            out.push(SemanticEvent::MouseReleased(self.button_event(button)));
        }

        self.held.push(HeldButton {
            button,
            drag_start: self.position,
            last: self.position,
            stale: false,
        });
        out.push(SemanticEvent::MousePressed(self.button_event(button)));
    }

    pub fn button_up(&mut self, button: Button, out: &mut Vec<SemanticEvent>) {
        let Some(i) = self.held_index(button) else {
            // Release without a matching press (pressed outside the window).
            return;
        };
        let held = self.held.remove(i);

        // Flush motion not yet reported by a tick so the drag ends where the button went up.
        let pending = self.position - held.last;
        if pending != Vec2::zero() {
            out.push(SemanticEvent::MouseDragged(MouseDrag {
                start: held.drag_start,
                position: self.position,
                delta: pending,
                button,
            }));
        }

        out.push(SemanticEvent::MouseReleased(self.button_event(button)));
    }

    pub fn scroll(&mut self, dx: f32, dy: f32, out: &mut Vec<SemanticEvent>) {
        out.push(SemanticEvent::MouseScrolled(MouseScroll { dx, dy }));
    }

    pub fn key(
        &mut self,
        physical_key: super::Key,
        logical_key: super::LogicalKey,
        action: KeyAction,
        out: &mut Vec<SemanticEvent>,
    ) {
        let event = KeyEvent {
            physical_key,
            logical_key,
            modifiers: self.modifiers,
        };
        out.push(match action {
            KeyAction::Press => SemanticEvent::KeyPressed(event),
            KeyAction::Release => SemanticEvent::KeyReleased(event),
            KeyAction::Repeat => SemanticEvent::KeyRepeated(event),
        });
    }

    pub fn focus_changed(&mut self, focused: bool, out: &mut Vec<SemanticEvent>) {
        self.focused = focused;

        if !focused {
            for held in &mut self.held {
                held.stale = true;
            }
            return;
        }

        // Focus is back: releases that happened elsewhere were never delivered.
        let stale: Vec<Button> = self
            .held
            .iter()
            .filter(|h| h.stale)
            .map(|h| h.button)
            .collect();
        self.held.retain(|h| !h.stale);
        for button in stale {
            log::debug!("synthesizing release for {button:?} after focus loss");
            out.push(SemanticEvent::MouseReleased(self.button_event(button)));
        }
    }

    // ── per-frame tick ─────────────────────────────────────────────────────

    /// Emits `MouseMove` if the pointer moved since the previous tick, and a
    /// `MouseDrag` for each held button that moved since its last report.
    pub fn check_for_mouse_movements(&mut self, out: &mut Vec<SemanticEvent>) {
        let position = self.position;
        let delta = position - self.reported;
        if delta != Vec2::zero() {
            self.reported = position;
            out.push(SemanticEvent::MouseMoved(MouseMove { position, delta }));
        }
        for held in &mut self.held {
            // Measured from the press, so motion before it never counts as a drag.
            let delta = position - held.last;
            if delta == Vec2::zero() {
                continue;
            }
            held.last = position;
            out.push(SemanticEvent::MouseDragged(MouseDrag {
                start: held.drag_start,
                position,
                delta,
                button: held.button,
            }));
        }
    }

    /// Re-bases positions after the window (and therefore sketch space) changed
    /// size, without reporting the jump as motion.
    pub fn rebase(&mut self, position: Vec2) {
        self.position = position;
        self.reported = position;
        for held in &mut self.held {
            held.last = position;
        }
    }

    fn held_index(&self, button: Button) -> Option<usize> {
        self.held.iter().position(|h| h.button == button)
    }

    fn button_event(&self, button: Button) -> MouseButton {
        MouseButton {
            position: self.position,
            button,
            modifiers: self.modifiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Key, LogicalKey};

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    fn names(events: &[SemanticEvent]) -> Vec<&'static str> {
        events
            .iter()
            .map(|e| match e {
                SemanticEvent::MouseMoved(_) => "moved",
                SemanticEvent::MouseDragged(_) => "dragged",
                SemanticEvent::MousePressed(_) => "pressed",
                SemanticEvent::MouseReleased(_) => "released",
                SemanticEvent::MouseScrolled(_) => "scrolled",
                SemanticEvent::KeyPressed(_) => "key_pressed",
                SemanticEvent::KeyReleased(_) => "key_released",
                SemanticEvent::KeyRepeated(_) => "key_repeated",
            })
            .collect()
    }

    // ── drag synthesis ────────────────────────────────────────────────────

    #[test]
    fn drag_sequence_with_one_tick_per_move() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();

        t.button_down(Button::Left, &mut out);
        t.cursor_moved(v(5.0, 0.0));
        t.check_for_mouse_movements(&mut out);
        t.cursor_moved(v(10.0, 0.0));
        t.check_for_mouse_movements(&mut out);
        t.button_up(Button::Left, &mut out);

        assert_eq!(
            names(&out),
            ["pressed", "moved", "dragged", "moved", "dragged", "released"]
        );

        let drags: Vec<&MouseDrag> = out
            .iter()
            .filter_map(|e| match e {
                SemanticEvent::MouseDragged(d) => Some(d),
                _ => None,
            })
            .collect();
        assert_eq!(drags.len(), 2);
        for d in drags {
            assert_eq!(d.delta, v(5.0, 0.0));
            assert_eq!(d.start, v(0.0, 0.0));
            assert_eq!(d.button, Button::Left);
        }
    }

    #[test]
    fn moves_within_a_frame_are_coalesced() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.cursor_moved(v(1.0, 0.0));
        t.cursor_moved(v(2.0, 1.0));
        t.cursor_moved(v(3.0, 3.0));
        t.check_for_mouse_movements(&mut out);

        assert_eq!(
            out,
            vec![SemanticEvent::MouseMoved(MouseMove {
                position: v(3.0, 3.0),
                delta: v(3.0, 3.0),
            })]
        );
    }

    #[test]
    fn no_motion_no_events() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.cursor_moved(v(0.0, 0.0));
        t.check_for_mouse_movements(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn release_flushes_unreported_motion_as_terminal_drag() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.button_down(Button::Right, &mut out);
        t.cursor_moved(v(0.5, 0.25));
        t.button_up(Button::Right, &mut out);

        assert_eq!(names(&out), ["pressed", "dragged", "released"]);
        match &out[1] {
            SemanticEvent::MouseDragged(d) => assert_eq!(d.delta, v(0.5, 0.25)),
            other => panic!("unexpected {other:?}"),
        }

        // The move itself is still reported on the next tick, without a drag.
        out.clear();
        t.check_for_mouse_movements(&mut out);
        assert_eq!(names(&out), ["moved"]);
    }

    #[test]
    fn each_held_button_gets_a_drag() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.button_down(Button::Left, &mut out);
        t.button_down(Button::Middle, &mut out);
        t.cursor_moved(v(0.1, 0.0));
        out.clear();

        t.check_for_mouse_movements(&mut out);
        assert_eq!(names(&out), ["moved", "dragged", "dragged"]);
        match (&out[1], &out[2]) {
            (SemanticEvent::MouseDragged(a), SemanticEvent::MouseDragged(b)) => {
                assert_eq!((a.button, a.delta), (Button::Left, v(0.1, 0.0)));
                assert_eq!((b.button, b.delta), (Button::Middle, v(0.1, 0.0)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn drag_delta_counts_from_each_buttons_press() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.button_down(Button::Left, &mut out);
        t.cursor_moved(v(0.1, 0.0));
        t.button_down(Button::Middle, &mut out);
        t.cursor_moved(v(0.3, 0.0));
        out.clear();

        t.check_for_mouse_movements(&mut out);
        assert_eq!(names(&out), ["moved", "dragged", "dragged"]);
        match (&out[1], &out[2]) {
            (SemanticEvent::MouseDragged(a), SemanticEvent::MouseDragged(b)) => {
                assert_eq!((a.button, a.start, a.delta), (Button::Left, v(0.0, 0.0), v(0.3, 0.0)));
                assert_eq!(
                    (b.button, b.start, b.delta),
                    (Button::Middle, v(0.1, 0.0), v(0.2, 0.0))
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn click_after_unreported_move_is_not_a_drag() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.cursor_moved(v(0.5, 0.0));
        t.button_down(Button::Left, &mut out);
        t.button_up(Button::Left, &mut out);
        assert_eq!(names(&out), ["pressed", "released"]);

        out.clear();
        t.check_for_mouse_movements(&mut out);
        assert_eq!(names(&out), ["moved"]);
    }

    #[test]
    fn motion_before_press_is_reported_as_move_only() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.cursor_moved(v(0.5, 0.0));
        t.button_down(Button::Left, &mut out);
        out.clear();

        t.check_for_mouse_movements(&mut out);
        assert_eq!(
            out,
            vec![SemanticEvent::MouseMoved(MouseMove {
                position: v(0.5, 0.0),
                delta: v(0.5, 0.0),
            })]
        );

        // Motion after the press is a drag from the press point.
        out.clear();
        t.cursor_moved(v(0.75, 0.0));
        t.check_for_mouse_movements(&mut out);
        assert_eq!(names(&out), ["moved", "dragged"]);
        match &out[1] {
            SemanticEvent::MouseDragged(d) => {
                assert_eq!((d.start, d.delta), (v(0.5, 0.0), v(0.25, 0.0)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn release_after_tick_has_no_terminal_drag() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.button_down(Button::Left, &mut out);
        t.cursor_moved(v(0.2, 0.0));
        t.check_for_mouse_movements(&mut out);
        t.button_up(Button::Left, &mut out);
        assert_eq!(names(&out), ["pressed", "moved", "dragged", "released"]);
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.button_up(Button::Left, &mut out);
        assert!(out.is_empty());
    }

    // ── focus loss ────────────────────────────────────────────────────────

    #[test]
    fn focus_regain_releases_stale_buttons() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.button_down(Button::Left, &mut out);
        t.focus_changed(false, &mut out);
        assert!(t.is_pressed(Button::Left));

        t.focus_changed(true, &mut out);
        assert_eq!(names(&out), ["pressed", "released"]);
        assert!(!t.any_pressed());
    }

    #[test]
    fn repeated_press_closes_previous_pair() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.button_down(Button::Left, &mut out);
        t.focus_changed(false, &mut out);
        t.button_down(Button::Left, &mut out);
        t.button_up(Button::Left, &mut out);
        assert_eq!(names(&out), ["pressed", "released", "pressed", "released"]);
    }

    #[test]
    fn buttons_pressed_after_focus_loss_are_not_stale() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.focus_changed(false, &mut out);
        t.button_down(Button::Left, &mut out);
        t.focus_changed(true, &mut out);
        assert!(t.is_pressed(Button::Left));
        assert_eq!(names(&out), ["pressed"]);
    }

    // ── keys / modifiers / scroll ─────────────────────────────────────────

    #[test]
    fn key_actions_dispatch_to_matching_events() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.modifiers_changed(ModifierFlags::CTRL | ModifierFlags::SHIFT);
        for action in [KeyAction::Press, KeyAction::Repeat, KeyAction::Release] {
            t.key(Key::S, LogicalKey::Character("S".into()), action, &mut out);
        }
        assert_eq!(names(&out), ["key_pressed", "key_repeated", "key_released"]);
        match &out[0] {
            SemanticEvent::KeyPressed(k) => {
                assert!(k.modifiers.ctrl() && k.modifiers.shift());
                assert_eq!(k.logical_key.as_str(), Some("S"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn button_events_carry_modifiers_and_position() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.cursor_moved(v(0.3, -0.2));
        t.modifiers_changed(ModifierFlags::ALT);
        t.button_down(Button::Left, &mut out);
        match &out[0] {
            SemanticEvent::MousePressed(b) => {
                assert_eq!(b.position, v(0.3, -0.2));
                assert!(b.modifiers.alt());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scroll_is_forwarded() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.scroll(0.0, -2.0, &mut out);
        assert_eq!(out, vec![SemanticEvent::MouseScrolled(MouseScroll { dx: 0.0, dy: -2.0 })]);
    }

    #[test]
    fn rebase_does_not_report_motion() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.rebase(v(0.7, 0.7));
        t.check_for_mouse_movements(&mut out);
        assert!(out.is_empty());
        assert_eq!(t.mouse(), v(0.7, 0.7));
    }

    #[test]
    fn rebase_while_held_does_not_report_a_drag() {
        let mut t = InputTranslator::new();
        let mut out = Vec::new();
        t.button_down(Button::Left, &mut out);
        t.rebase(v(0.7, 0.7));
        t.button_up(Button::Left, &mut out);
        assert_eq!(names(&out), ["pressed", "released"]);
    }
}
