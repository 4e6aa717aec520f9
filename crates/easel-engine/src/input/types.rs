use std::fmt;

use bitflags::bitflags;

use crate::coords::Vec2;

/// Physical keyboard key (position on a US layout).
///
/// The platform layer maps scancodes into these variants where possible.
/// Unsupported keys use `Key::Unknown(u32)` with a stable platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    // Common control keys
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    // Modifiers as keys
    Shift,
    Control,
    Alt,
    Super,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    /// Platform-dependent key not represented here.
    Unknown(u32),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Layout-dependent meaning of a key press.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum LogicalKey {
    /// Text the key produces under the active layout (e.g. `"a"`, `"A"`, `"é"`).
    Character(String),
    /// A key without text (arrows, Escape, ...).
    Named(Key),
    Unidentified,
}

impl LogicalKey {
    /// The produced text, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LogicalKey::Character(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyAction {
    Press,
    Release,
    Repeat,
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Button {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

bitflags! {
    /// Logical modifier mask.
    ///
    /// `CTRL` is "Ctrl or Cmd": it is set by Control on non-Apple platforms and
    /// by Command on Apple platforms, so shortcuts read the same everywhere.
    #[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
    pub struct ModifierFlags: u8 {
        const SHIFT = 1 << 0;
        const CTRL  = 1 << 1;
        const ALT   = 1 << 2;
        const SUPER = 1 << 3;
    }
}

impl ModifierFlags {
    /// Builds the logical mask from physical modifier state.
    ///
    /// `apple` selects the Cmd-as-Ctrl mapping.
    pub fn from_physical(shift: bool, control: bool, alt: bool, super_key: bool, apple: bool) -> Self {
        let mut flags = ModifierFlags::empty();
        flags.set(ModifierFlags::SHIFT, shift);
        flags.set(ModifierFlags::CTRL, if apple { super_key } else { control });
        flags.set(ModifierFlags::ALT, alt);
        flags.set(ModifierFlags::SUPER, super_key);
        flags
    }

    #[inline]
    pub fn ctrl(self) -> bool {
        self.contains(ModifierFlags::CTRL)
    }

    #[inline]
    pub fn shift(self) -> bool {
        self.contains(ModifierFlags::SHIFT)
    }

    #[inline]
    pub fn alt(self) -> bool {
        self.contains(ModifierFlags::ALT)
    }
}

// ── semantic events (delivered to sketch callbacks) ────────────────────────

/// Pointer moved. Positions are in sketch space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MouseMove {
    pub position: Vec2,
    /// Movement since the previous `MouseMove`.
    pub delta: Vec2,
}

/// Pointer moved while `button` was held.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MouseDrag {
    /// Where `button` was pressed.
    pub start: Vec2,
    pub position: Vec2,
    pub delta: Vec2,
    pub button: Button,
}

/// Button press or release.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MouseButton {
    pub position: Vec2,
    pub button: Button,
    pub modifiers: ModifierFlags,
}

/// Wheel movement in lines (ticks).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MouseScroll {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub physical_key: Key,
    pub logical_key: LogicalKey,
    pub modifiers: ModifierFlags,
}

/// Events synthesized by the input translator, in dispatch order.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticEvent {
    MouseMoved(MouseMove),
    MouseDragged(MouseDrag),
    MousePressed(MouseButton),
    MouseReleased(MouseButton),
    MouseScrolled(MouseScroll),
    KeyPressed(KeyEvent),
    KeyReleased(KeyEvent),
    KeyRepeated(KeyEvent),
}

// ── raw events (produced by the platform layer) ────────────────────────────

/// Platform-agnostic window input.
///
/// Positions are window pixels (origin top-left, +Y down); conversion to
/// sketch space happens when the event is fed to a context.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    CursorMoved { x: f32, y: f32 },
    CursorEntered,
    CursorLeft,
    MouseButton { button: Button, pressed: bool },
    /// Wheel delta in lines.
    Scroll { dx: f32, dy: f32 },
    Key {
        physical_key: Key,
        logical_key: LogicalKey,
        action: KeyAction,
    },
    ModifiersChanged(ModifierFlags),
    Focused(bool),
    /// New drawable size in physical pixels.
    Resized { width: u32, height: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_sets_ctrl_off_apple() {
        let m = ModifierFlags::from_physical(false, true, false, false, false);
        assert!(m.ctrl());
        assert!(!m.contains(ModifierFlags::SUPER));
    }

    #[test]
    fn command_sets_ctrl_on_apple() {
        let m = ModifierFlags::from_physical(false, false, false, true, true);
        assert!(m.ctrl());
    }

    #[test]
    fn control_alone_is_not_ctrl_on_apple() {
        let m = ModifierFlags::from_physical(false, true, false, false, true);
        assert!(!m.ctrl());
    }

    #[test]
    fn shift_and_alt_pass_through() {
        let m = ModifierFlags::from_physical(true, false, true, false, false);
        assert!(m.shift() && m.alt() && !m.ctrl());
    }
}
