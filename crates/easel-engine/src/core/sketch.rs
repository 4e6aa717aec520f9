use crate::input::{KeyEvent, MouseButton, MouseDrag, MouseMove, MouseScroll};

use super::Context;

/// User program driven by the runtime.
///
/// Every method has a default: callbacks do nothing, and [`on_error`](Self::on_error)
/// treats every error as fatal. Errors returned from a callback, and errors
/// recorded by drawing calls made inside it, are handed to `on_error` once the
/// callback returns.
///
/// Within a frame, input callbacks run first (in the order the input
/// translator produced them), then `update`.
pub trait Sketch {
    /// Called once, after the window and GPU context exist and before the first frame.
    fn setup(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called once per frame while the loop runs.
    fn update(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
        let _ = ctx;
        Ok(())
    }

    fn mouse_moved(&mut self, ctx: &mut Context, event: MouseMove) -> anyhow::Result<()> {
        let _ = (ctx, event);
        Ok(())
    }

    fn mouse_dragged(&mut self, ctx: &mut Context, event: MouseDrag) -> anyhow::Result<()> {
        let _ = (ctx, event);
        Ok(())
    }

    fn mouse_pressed(&mut self, ctx: &mut Context, event: MouseButton) -> anyhow::Result<()> {
        let _ = (ctx, event);
        Ok(())
    }

    fn mouse_released(&mut self, ctx: &mut Context, event: MouseButton) -> anyhow::Result<()> {
        let _ = (ctx, event);
        Ok(())
    }

    fn mouse_scrolled(&mut self, ctx: &mut Context, event: MouseScroll) -> anyhow::Result<()> {
        let _ = (ctx, event);
        Ok(())
    }

    fn key_pressed(&mut self, ctx: &mut Context, event: KeyEvent) -> anyhow::Result<()> {
        let _ = (ctx, event);
        Ok(())
    }

    fn key_released(&mut self, ctx: &mut Context, event: KeyEvent) -> anyhow::Result<()> {
        let _ = (ctx, event);
        Ok(())
    }

    fn key_repeated(&mut self, ctx: &mut Context, event: KeyEvent) -> anyhow::Result<()> {
        let _ = (ctx, event);
        Ok(())
    }

    /// Receives every error raised while running the sketch.
    ///
    /// Returning `Ok(())` keeps the sketch running; the operation that failed
    /// stays a no-op. Returning an error stops the loop and makes `run` return it.
    fn on_error(&mut self, ctx: &mut Context, error: anyhow::Error) -> anyhow::Result<()> {
        let _ = ctx;
        Err(error)
    }
}
