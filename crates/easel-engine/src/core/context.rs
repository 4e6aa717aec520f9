use crate::canvas::Canvas;
use crate::coords::{ImageSize, SketchSpace, Vec2};
use crate::device::{GpuDevice, GpuInit};
use crate::error::{SketchError, SketchResult};
use crate::input::{Button, ModifierFlags, RawInput, SemanticEvent};
use crate::paint::Color;
use crate::render::shapes::{
    ellipse_program, rect_program, ImageRenderer, RectangleParams, ShapeProgram, ShapeRenderer,
};
use crate::render::{self, DrawTarget, RenderTarget, Shader};
use crate::texture::{Texture, TextureLayout, WeakTexture};

use super::frame::FrameState;
use super::Sketch;

pub const DEFAULT_FILL: Color = Color::rgba(1.0, 1.0, 1.0, 0.5);
pub const DEFAULT_STROKE: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
pub const DEFAULT_STROKE_WEIGHT: f32 = 0.01;

/// Window requests buffered during a callback and applied by the runtime.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum WindowCommand {
    Maximize,
    Close,
}

/// Everything a sketch can do: drawing, input queries, time and loop control.
///
/// The window target is an offscreen texture the size of the window, presented
/// every frame, so drawings persist until [`background`](Self::background)
/// clears them.
///
/// Drawing calls never fail: invalid arguments or GPU errors are recorded,
/// the call is skipped, and the error reaches [`Sketch::on_error`] after the
/// current callback returns.
pub struct Context {
    /// Interior color of shapes.
    pub fill: Color,
    /// Outline color of shapes.
    pub stroke: Color,
    /// Outline thickness in sketch units, measured inward from the shape edge.
    pub stroke_weight: f32,

    gpu: GpuDevice,
    window_target: RenderTarget,
    /// Canvas receiving draws; `None` is the window.
    active: Option<WeakTexture>,

    shapes: ShapeRenderer,
    rect: ShapeProgram,
    ellipse: ShapeProgram,
    images: ImageRenderer,

    frame: FrameState,
    /// Last cursor position in window pixels.
    cursor_px: Option<Vec2>,

    commands: Vec<WindowCommand>,
    close_requested: bool,
    errors: Vec<SketchError>,
}

impl Context {
    /// Creates a context with a window target of `size` pixels.
    pub(crate) fn new(gpu: GpuDevice, size: ImageSize) -> SketchResult<Self> {
        let window_target = RenderTarget::new(&gpu, size, TextureLayout::RGBA8)?;
        let shapes = ShapeRenderer::new(&gpu);
        let rect = rect_program(&gpu)?;
        let ellipse = ellipse_program(&gpu)?;
        Ok(Self {
            fill: DEFAULT_FILL,
            stroke: DEFAULT_STROKE,
            stroke_weight: DEFAULT_STROKE_WEIGHT,
            gpu,
            window_target,
            active: None,
            shapes,
            rect,
            ellipse,
            images: ImageRenderer::new(),
            frame: FrameState::new(),
            cursor_px: None,
            commands: Vec::new(),
            close_requested: false,
            errors: Vec::new(),
        })
    }

    /// Creates a context without a window, for offline rendering and tests.
    ///
    /// The window target is a plain texture of `size` pixels. Drive it with
    /// [`setup`](Self::setup), [`feed_input`](Self::feed_input) and
    /// [`advance_frame`](Self::advance_frame).
    pub fn headless(size: ImageSize) -> SketchResult<Self> {
        Self::headless_with(size, &GpuInit::default())
    }

    pub fn headless_with(size: ImageSize, init: &GpuInit) -> SketchResult<Self> {
        let gpu = GpuDevice::headless(init)?;
        Self::new(gpu, size)
    }

    // ── drawing ────────────────────────────────────────────────────────────

    /// Clears the active target to `color`, without blending.
    ///
    /// The color is written as-is, alpha included. Alpha below 1 only matters
    /// if the target is later composited, for example a canvas drawn with
    /// [`image`](Self::image) or a texture saved to PNG; the window itself is
    /// presented opaque.
    pub fn background(&mut self, color: impl Into<Color>) {
        let color = color.into();
        if !color.is_finite() {
            self.record_error(SketchError::invalid(format!("non-finite color {color:?}")));
            return;
        }
        let texture = self.active_texture();
        render::clear(&texture, color);
    }

    /// Draws a rectangle with the current fill, stroke and stroke weight.
    pub fn rectangle(&mut self, params: RectangleParams) {
        let Some((target, uniform)) = self.prepare_shape(&params) else { return };
        let result = self
            .shapes
            .draw(&self.gpu, &mut self.rect, &target, &uniform, None);
        self.record_result(result);
    }

    /// Draws the ellipse inscribed in `params`.
    pub fn ellipse(&mut self, params: RectangleParams) {
        let Some((target, uniform)) = self.prepare_shape(&params) else { return };
        let result = self
            .shapes
            .draw(&self.gpu, &mut self.ellipse, &target, &uniform, None);
        self.record_result(result);
    }

    pub fn circle(&mut self, center: impl Into<Vec2>, radius: f32) {
        self.ellipse(RectangleParams::square(center, radius * 2.0));
    }

    /// Draws `texture` stretched over `params`. Fill and stroke are ignored.
    pub fn image(&mut self, texture: &Texture, params: RectangleParams) {
        if !texture.device().same_device(&self.gpu) {
            self.record_error(SketchError::invalid("texture belongs to another GPU context"));
            return;
        }
        if texture.ptr_eq(&self.active_texture()) {
            self.record_error(SketchError::invalid(
                "cannot draw a canvas into itself",
            ));
            return;
        }
        let Some((target, uniform)) = self.prepare_shape(&params) else { return };
        let result = self
            .images
            .draw(&self.gpu, &mut self.shapes, &target, &uniform, texture);
        self.record_result(result);
    }

    /// Draws a rectangle shaded by a user fragment shader.
    pub fn rectangle_with_shader(&mut self, shader: &Shader, params: RectangleParams) {
        if shader.samples(&self.active_texture()) {
            self.record_error(SketchError::invalid(
                "shader samples the texture it is drawing into",
            ));
            return;
        }
        let Some((target, uniform)) = self.prepare_shape(&params) else { return };
        let result = shader.draw(&mut self.shapes, &target, &uniform);
        self.record_result(result);
    }

    /// Rectangle covering the whole active target.
    pub fn full_screen(&mut self) -> RectangleParams {
        let space = SketchSpace::new(self.active_texture().size());
        RectangleParams::full_screen(space)
    }

    fn prepare_shape(
        &mut self,
        params: &RectangleParams,
    ) -> Option<(DrawTarget, crate::render::shapes::ShapeUniform)> {
        if let Err(e) = params.validate() {
            self.record_error(e);
            return None;
        }
        if !self.fill.is_finite() || !self.stroke.is_finite() || !self.stroke_weight.is_finite() {
            self.record_error(SketchError::invalid(format!(
                "non-finite drawing state: fill {:?}, stroke {:?}, stroke_weight {}",
                self.fill, self.stroke, self.stroke_weight
            )));
            return None;
        }

        let texture = self.active_texture();
        let target = render::draw_target(&texture);
        let uniform = params.to_uniform(target.space, self.fill, self.stroke, self.stroke_weight);
        Some((target, uniform))
    }

    // ── render targets ─────────────────────────────────────────────────────

    /// Sends subsequent draws to `canvas` until [`render_to_screen`](Self::render_to_screen).
    pub fn render_to_canvas(&mut self, canvas: &Canvas) {
        self.active = Some(canvas.texture().downgrade());
    }

    /// Sends subsequent draws to the window.
    pub fn render_to_screen(&mut self) {
        self.active = None;
    }

    /// Draws into `canvas` for the duration of `f`, then restores the previous target.
    pub fn with_canvas<R>(&mut self, canvas: &Canvas, f: impl FnOnce(&mut Context) -> R) -> R {
        let previous = self.active.replace(canvas.texture().downgrade());
        let out = f(self);
        self.active = previous;
        out
    }

    /// Whether draws currently go to the window.
    pub fn is_rendering_to_screen(&self) -> bool {
        self.active.is_none()
    }

    /// The texture backing the window. Reading it returns what the window shows.
    pub fn window_texture(&self) -> Texture {
        self.window_target.texture().clone()
    }

    fn active_texture(&mut self) -> Texture {
        if let Some(weak) = &self.active {
            if let Some(texture) = weak.upgrade() {
                return texture;
            }
            self.active = None;
            self.record_error(SketchError::invalid(
                "the active canvas was dropped; drawing to the window instead",
            ));
        }
        self.window_target.texture().clone()
    }

    // ── input queries ──────────────────────────────────────────────────────

    /// Pointer position in the window's sketch space.
    pub fn mouse(&self) -> Vec2 {
        self.frame.input().mouse()
    }

    /// Pointer movement since the previous `update`.
    pub fn mouse_delta(&self) -> Vec2 {
        self.frame.mouse_delta()
    }

    /// Whether the pointer is over the window and the window has focus.
    pub fn mouse_is_in_window(&self) -> bool {
        self.frame.input().cursor_in_window() && self.frame.input().focused()
    }

    pub fn mouse_button_is_pressed(&self, button: Button) -> bool {
        self.frame.input().is_pressed(button)
    }

    /// Ctrl on Windows and Linux, Cmd on macOS.
    pub fn ctrl(&self) -> bool {
        self.frame.input().modifiers().ctrl()
    }

    pub fn shift(&self) -> bool {
        self.frame.input().modifiers().shift()
    }

    pub fn alt(&self) -> bool {
        self.frame.input().modifiers().alt()
    }

    pub fn modifiers(&self) -> ModifierFlags {
        self.frame.input().modifiers()
    }

    // ── window ─────────────────────────────────────────────────────────────

    /// Window `width / height`.
    pub fn aspect_ratio(&self) -> f32 {
        self.window_target.size().aspect_ratio()
    }

    /// Window size in pixels.
    pub fn window_size(&self) -> ImageSize {
        self.window_target.size()
    }

    pub fn window_sketch_space(&self) -> SketchSpace {
        SketchSpace::new(self.window_target.size())
    }

    pub fn window_is_focused(&self) -> bool {
        self.frame.input().focused()
    }

    pub fn maximize_window(&mut self) {
        self.commands.push(WindowCommand::Maximize);
    }

    /// Stops the loop after the current callback.
    pub fn close_window(&mut self) {
        self.close_requested = true;
        self.commands.push(WindowCommand::Close);
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    // ── time ───────────────────────────────────────────────────────────────

    /// Seconds since the clock started, as of the current `update`.
    pub fn time(&self) -> f64 {
        self.frame.time().time
    }

    /// Seconds since the previous `update`; `0` on the first one.
    pub fn delta_time(&self) -> f64 {
        self.frame.time().delta_time
    }

    /// Measures time with the wall clock. Time restarts at zero.
    pub fn set_time_mode_realtime(&mut self) {
        self.frame.set_time_mode_realtime();
    }

    /// Advances time by exactly `1 / framerate` per `update`, whatever the
    /// real frame duration. Time restarts at zero.
    pub fn set_time_mode_fixedstep(&mut self) {
        if let Err(e) = self.frame.set_time_mode_fixedstep() {
            self.record_error(e);
        }
    }

    pub fn is_fixed_step(&self) -> bool {
        self.frame.is_fixed_step()
    }

    /// Limits the loop to `fps` frames per second. Also the rate of the
    /// fixed-step clock on its next activation.
    pub fn framerate_capped_at(&mut self, fps: f64) {
        if let Err(e) = self.frame.cap_framerate(fps) {
            self.record_error(e);
        }
    }

    /// Runs as fast as presentation allows.
    pub fn framerate_uncapped(&mut self) {
        self.frame.uncap_framerate();
    }

    pub fn framerate_cap(&self) -> Option<f64> {
        self.frame.framerate_cap()
    }

    /// Number of `update` calls so far.
    pub fn frame_count(&self) -> u64 {
        self.frame.frame_count()
    }

    // ── loop control ───────────────────────────────────────────────────────

    /// Resumes calling `update`.
    pub fn start_loop(&mut self) {
        self.frame.set_looping(true);
    }

    /// Stops calling `update`. Input callbacks keep firing and time is frozen
    /// until [`start_loop`](Self::start_loop).
    pub fn no_loop(&mut self) {
        self.frame.set_looping(false);
    }

    pub fn is_looping(&self) -> bool {
        self.frame.is_looping()
    }

    // ── gpu ────────────────────────────────────────────────────────────────

    pub fn gpu(&self) -> &GpuDevice {
        &self.gpu
    }

    // ── driving ────────────────────────────────────────────────────────────

    /// Runs `sketch.setup`.
    pub fn setup<S: Sketch + ?Sized>(&mut self, sketch: &mut S) -> anyhow::Result<()> {
        let result = sketch.setup(self);
        self.finish_callback(sketch, result)?;
        self.gpu.submit();
        Ok(())
    }

    /// Feeds one raw window event, dispatching the callbacks it produces.
    pub fn feed_input<S: Sketch + ?Sized>(
        &mut self,
        sketch: &mut S,
        input: RawInput,
    ) -> anyhow::Result<()> {
        let mut events = Vec::new();
        let space = self.window_sketch_space();
        let translator = self.frame.input_mut();

        match input {
            RawInput::CursorMoved { x, y } => {
                let px = Vec2::new(x, y);
                self.cursor_px = Some(px);
                translator.cursor_moved(space.window_to_relative_coords(px));
            }
            RawInput::CursorEntered => translator.cursor_entered(),
            RawInput::CursorLeft => translator.cursor_left(),
            RawInput::MouseButton { button, pressed } => {
                if pressed {
                    translator.button_down(button, &mut events);
                } else {
                    translator.button_up(button, &mut events);
                }
            }
            RawInput::Scroll { dx, dy } => translator.scroll(dx, dy, &mut events),
            RawInput::Key {
                physical_key,
                logical_key,
                action,
            } => translator.key(physical_key, logical_key, action, &mut events),
            RawInput::ModifiersChanged(modifiers) => translator.modifiers_changed(modifiers),
            RawInput::Focused(focused) => translator.focus_changed(focused, &mut events),
            RawInput::Resized { width, height } => self.resize_window_target(width, height),
        }

        self.dispatch(sketch, events)
    }

    /// Runs one frame: the movement check, then `update` if looping, then
    /// submits the recorded GPU work.
    pub fn advance_frame<S: Sketch + ?Sized>(&mut self, sketch: &mut S) -> anyhow::Result<()> {
        let mut events = Vec::new();
        self.frame.tick_input(&mut events);
        self.dispatch(sketch, events)?;

        if self.frame.tick_clock().is_some() {
            let result = sketch.update(self);
            self.frame.end_update();
            self.finish_callback(sketch, result)?;
        }

        self.gpu.submit();
        Ok(())
    }

    pub(crate) fn take_commands(&mut self) -> Vec<WindowCommand> {
        std::mem::take(&mut self.commands)
    }

    fn resize_window_target(&mut self, width: u32, height: u32) {
        // Minimized: keep the content for when the window comes back.
        if width == 0 || height == 0 {
            return;
        }
        let size = ImageSize::clamped(width, height);
        if let Err(e) = self.window_target.conservative_resize(size) {
            self.record_error(e);
            return;
        }

        let space = self.window_sketch_space();
        if let Some(px) = self.cursor_px {
            self.frame
                .input_mut()
                .rebase(space.window_to_relative_coords(px));
        }
    }

    fn dispatch<S: Sketch + ?Sized>(
        &mut self,
        sketch: &mut S,
        events: Vec<SemanticEvent>,
    ) -> anyhow::Result<()> {
        for event in events {
            let result = match event {
                SemanticEvent::MouseMoved(e) => sketch.mouse_moved(self, e),
                SemanticEvent::MouseDragged(e) => sketch.mouse_dragged(self, e),
                SemanticEvent::MousePressed(e) => sketch.mouse_pressed(self, e),
                SemanticEvent::MouseReleased(e) => sketch.mouse_released(self, e),
                SemanticEvent::MouseScrolled(e) => sketch.mouse_scrolled(self, e),
                SemanticEvent::KeyPressed(e) => sketch.key_pressed(self, e),
                SemanticEvent::KeyReleased(e) => sketch.key_released(self, e),
                SemanticEvent::KeyRepeated(e) => sketch.key_repeated(self, e),
            };
            self.finish_callback(sketch, result)?;
        }
        Ok(())
    }

    // ── errors ─────────────────────────────────────────────────────────────

    fn record_error(&mut self, error: SketchError) {
        log::debug!("recorded: {error}");
        self.errors.push(error);
    }

    fn record_result(&mut self, result: SketchResult<()>) {
        if let Err(e) = result {
            self.record_error(e);
        }
    }

    /// Hands the callback's error and every recorded drawing error to
    /// `on_error`. Returns the first error `on_error` rejects.
    fn finish_callback<S: Sketch + ?Sized>(
        &mut self,
        sketch: &mut S,
        result: anyhow::Result<()>,
    ) -> anyhow::Result<()> {
        let mut pending: Vec<anyhow::Error> = self.errors.drain(..).map(anyhow::Error::new).collect();
        if let Err(e) = result {
            pending.push(e);
        }

        for error in pending {
            log::warn!("sketch error: {error:#}");
            let handled = sketch.on_error(self, error);

            for late in self.errors.drain(..) {
                log::warn!("error raised inside on_error, dropped: {late}");
            }

            if let Err(fatal) = handled {
                log::error!("fatal sketch error: {fatal:#}");
                return Err(fatal);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("fill", &self.fill)
            .field("stroke", &self.stroke)
            .field("stroke_weight", &self.stroke_weight)
            .field("window_size", &self.window_size())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
