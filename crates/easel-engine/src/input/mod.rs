//! Input subsystem.
//!
//! Raw window events ([`RawInput`], window pixels) go through the
//! [`InputTranslator`], which turns them into [`SemanticEvent`]s (sketch space)
//! delivered to the sketch callbacks. The public API does not expose winit
//! types; `platform::winit` does the translation at the edge.

pub(crate) mod platform;
mod translator;
mod types;

pub use translator::InputTranslator;
pub use types::{
    Button,
    Key,
    KeyAction,
    KeyEvent,
    LogicalKey,
    ModifierFlags,
    MouseButton,
    MouseDrag,
    MouseMove,
    MouseScroll,
    RawInput,
    SemanticEvent,
};
