use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowId};

use crate::coords::ImageSize;
use crate::core::{Context, Sketch, WindowCommand};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::error::SketchError;
use crate::input::platform::winit::translate_window_event;
use crate::input::RawInput;
use crate::render::PresentRenderer;

use super::WindowCreationParams;

/// Opens a window and runs `sketch` until the window closes.
///
/// Returns the first error the sketch's `on_error` did not handle, or an
/// initialization error if the window or the GPU context could not be created.
/// All work happens on the calling thread.
pub fn run<S>(params: WindowCreationParams, sketch: S) -> Result<()>
where
    S: Sketch + 'static,
{
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut state = AppState::new(params, sketch);

    event_loop
        .run_app(&mut state)
        .context("winit event loop terminated with error")?;

    match state.fatal.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<S>
where
    S: Sketch + 'static,
{
    params: WindowCreationParams,
    gpu_init: GpuInit,
    sketch: S,

    entry: Option<WindowEntry>,
    ctx: Option<Context>,
    presenter: Option<PresentRenderer>,

    /// Start of the last frame, for the framerate cap.
    last_frame: Option<Instant>,
    fatal: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<S> AppState<S>
where
    S: Sketch + 'static,
{
    fn new(params: WindowCreationParams, sketch: S) -> Self {
        let gpu_init = GpuInit::with_vsync(params.vsync);
        Self {
            params,
            gpu_init,
            sketch,
            entry: None,
            ctx: None,
            presenter: None,
            last_frame: None,
            fatal: None,
            exit_requested: false,
        }
    }

    /// Stops the loop; the first error wins.
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        if self.fatal.is_none() {
            self.fatal = Some(error);
        }
        self.request_exit(event_loop);
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let params = &self.params;
        let attrs = Window::default_attributes()
            .with_title(params.title.clone())
            .with_inner_size(PhysicalSize::new(params.size.width(), params.size.height()))
            .with_resizable(params.resizable)
            .with_fullscreen(params.fullscreen.then_some(Fullscreen::Borderless(None)));

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| SketchError::Initialization(format!("failed to create window: {e}")))?;

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()?;

        let (device, size, format) =
            entry.with_gpu(|gpu| (gpu.device().clone(), gpu.size(), gpu.surface_format()));
        let presenter = PresentRenderer::new(&device, format);
        let ctx = Context::new(device, ImageSize::clamped(size.width, size.height))?;
        log::info!("window created: {size:?}");

        self.entry = Some(entry);
        self.ctx = Some(ctx);
        self.presenter = Some(presenter);
        Ok(())
    }

    /// Feeds one raw event to the sketch.
    fn feed(&mut self, event_loop: &ActiveEventLoop, input: RawInput) {
        let Some(ctx) = self.ctx.as_mut() else { return };
        if let Err(e) = ctx.feed_input(&mut self.sketch, input) {
            self.fail(event_loop, e);
        }
    }

    fn resize(&mut self, event_loop: &ActiveEventLoop, new_size: PhysicalSize<u32>) {
        let Some(entry) = self.entry.as_mut() else { return };
        entry.with_gpu_mut(|gpu| gpu.resize(new_size));
        entry.with_window(|w| w.request_redraw());
        self.feed(
            event_loop,
            RawInput::Resized {
                width: new_size.width,
                height: new_size.height,
            },
        );
    }

    /// Runs one sketch frame and presents the window target.
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.last_frame = Some(Instant::now());

        let Self {
            entry,
            ctx,
            sketch,
            presenter,
            ..
        } = self;
        let (Some(entry), Some(ctx), Some(presenter)) =
            (entry.as_mut(), ctx.as_mut(), presenter.as_ref())
        else {
            return;
        };

        if let Err(e) = ctx.advance_frame(sketch) {
            self.fail(event_loop, e);
            return;
        }

        let source = ctx.window_texture();
        let mut surface_fatal = false;
        entry.with_mut(|fields| {
            // Minimized: nothing to present, the work is already submitted.
            if !fields.gpu.is_drawable() {
                return;
            }

            match fields.gpu.begin_frame() {
                Ok(frame) => {
                    presenter.present(fields.gpu.device(), &source, &frame.view);
                    fields.window.pre_present_notify();
                    fields.gpu.submit(frame);
                }
                Err(err) => {
                    log::debug!("surface error: {err:?}");
                    let action = fields.gpu.handle_surface_error(err);
                    surface_fatal = action == SurfaceErrorAction::Fatal;
                }
            }
        });

        if surface_fatal {
            self.fail(event_loop, anyhow::anyhow!("surface ran out of memory"));
            return;
        }

        self.apply_commands(event_loop);
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop) {
        let Some(ctx) = self.ctx.as_mut() else { return };
        for cmd in ctx.take_commands() {
            match cmd {
                WindowCommand::Maximize => {
                    if let Some(entry) = self.entry.as_ref() {
                        entry.with_window(|w| w.set_maximized(true));
                    }
                }
                WindowCommand::Close => self.request_exit(event_loop),
            }
        }
    }

    fn is_our_window(&self, window_id: WindowId) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|entry| entry.with_window(|w| w.id()) == window_id)
    }
}

impl<S> ApplicationHandler for AppState<S>
where
    S: Sketch + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("failed to create window: {e:#}");
            self.fail(event_loop, e);
            return;
        }

        if let Some(ctx) = self.ctx.as_mut() {
            if let Err(e) = ctx.setup(&mut self.sketch) {
                self.fail(event_loop, e);
                return;
            }
        }
        self.apply_commands(event_loop);

        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        let Some(entry) = self.entry.as_ref() else { return };

        let cap = self.ctx.as_ref().and_then(|ctx| ctx.framerate_cap());
        let deadline = match (cap, self.last_frame) {
            (Some(fps), Some(last)) => Some(last + Duration::from_secs_f64(1.0 / fps)),
            _ => None,
        };

        match deadline {
            Some(deadline) if Instant::now() < deadline => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
            }
            _ => {
                event_loop.set_control_flow(ControlFlow::Wait);
                entry.with_window(|w| w.request_redraw());
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        if !self.is_our_window(window_id) {
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested");
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => self.resize(event_loop, *new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(new_size) = self
                    .entry
                    .as_ref()
                    .map(|entry| entry.with_window(|w| w.inner_size()))
                {
                    self.resize(event_loop, new_size);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            other => {
                if let Some(input) = translate_window_event(other) {
                    self.feed(event_loop, input);
                    self.apply_commands(event_loop);
                }
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Sketch resources first, then the surface and the window.
        self.ctx = None;
        self.presenter = None;
        self.entry = None;
        log::info!("runtime stopped");
    }
}
