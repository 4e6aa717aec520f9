use easel_engine::input::{Key, KeyEvent, MouseButton, MouseDrag, MouseScroll};
use easel_engine::logging::{init_logging, LoggingConfig};
use easel_engine::{Canvas, Color, Context, Shader, Sketch, Vec2, WindowCreationParams};

/// Animated backdrop driven by `param(0).x` (time).
const BACKDROP_WGSL: &str = r#"
fn fragment(in: FragmentInput) -> vec4<f32> {
    let t = param(0).x;
    let uv = in._uv;
    let wave = 0.5 + 0.5 * sin(uv.x * 6.0 + t) * cos(uv.y * 4.0 - t * 0.7);
    return vec4<f32>(0.08 + 0.1 * wave, 0.1, 0.16 + 0.12 * wave, 1.0);
}
"#;

/// Paint on a persistent canvas by dragging; a ring follows the pointer.
///
/// Keys: Space pauses, C clears the canvas, S saves the canvas to
/// `drawing.png`, F switches to fixed-step time, Escape quits.
struct Paint {
    canvas: Option<Canvas>,
    backdrop: Option<Shader>,
    brush: f32,
    hue: f32,
}

impl Paint {
    fn new() -> Self {
        Self {
            canvas: None,
            backdrop: None,
            brush: 0.05,
            hue: 0.0,
        }
    }

    fn brush_color(&self) -> Color {
        let h = self.hue.rem_euclid(1.0) * 6.0;
        let x = 1.0 - (h % 2.0 - 1.0).abs();
        let (r, g, b) = match h as u32 {
            0 => (1.0, x, 0.0),
            1 => (x, 1.0, 0.0),
            2 => (0.0, 1.0, x),
            3 => (0.0, x, 1.0),
            4 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        Color::rgba(r, g, b, 0.8)
    }

    fn stamp(&self, ctx: &mut Context, at: Vec2) {
        let Some(canvas) = &self.canvas else { return };
        let color = self.brush_color();
        let brush = self.brush;
        ctx.with_canvas(canvas, |ctx| {
            ctx.fill = color;
            ctx.stroke_weight = 0.0;
            ctx.circle(at, brush);
        });
    }
}

impl Sketch for Paint {
    fn setup(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
        ctx.framerate_capped_at(60.0);
        self.canvas = Some(Canvas::new(ctx, ctx.window_size())?);
        self.backdrop = Some(Shader::new(ctx, BACKDROP_WGSL)?);
        log::info!("paint ready: drag to draw, scroll to change the brush size");
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
        let (Some(canvas), Some(backdrop)) = (&self.canvas, &self.backdrop) else {
            return Ok(());
        };

        backdrop.set_param_f32(0, ctx.time() as f32)?;
        let full = ctx.full_screen();
        ctx.rectangle_with_shader(backdrop, full);
        ctx.image(canvas.texture(), full);

        ctx.fill = Color::TRANSPARENT;
        ctx.stroke = Color::WHITE;
        ctx.stroke_weight = 0.005;
        ctx.circle(ctx.mouse(), self.brush);

        self.hue += ctx.delta_time() as f32 * 0.1;
        Ok(())
    }

    fn mouse_pressed(&mut self, ctx: &mut Context, event: MouseButton) -> anyhow::Result<()> {
        self.stamp(ctx, event.position);
        Ok(())
    }

    fn mouse_dragged(&mut self, ctx: &mut Context, event: MouseDrag) -> anyhow::Result<()> {
        // Fill the gap between two reports so fast strokes stay continuous.
        let from = event.position - event.delta;
        let steps = ((event.delta.length() / (self.brush * 0.5)).ceil() as usize).max(1);
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            self.stamp(ctx, from + event.delta * t);
        }
        Ok(())
    }

    fn mouse_scrolled(&mut self, _ctx: &mut Context, event: MouseScroll) -> anyhow::Result<()> {
        self.brush = (self.brush * 1.1f32.powf(event.dy)).clamp(0.005, 0.5);
        Ok(())
    }

    fn key_pressed(&mut self, ctx: &mut Context, event: KeyEvent) -> anyhow::Result<()> {
        match event.physical_key {
            Key::Space if ctx.is_looping() => ctx.no_loop(),
            Key::Space => ctx.start_loop(),
            Key::C => {
                if let Some(canvas) = &self.canvas {
                    ctx.with_canvas(canvas, |ctx| ctx.background(Color::TRANSPARENT));
                }
            }
            Key::S => {
                if let Some(canvas) = &self.canvas {
                    canvas.texture().save_png("drawing.png")?;
                    log::info!("saved drawing.png");
                }
            }
            Key::F => ctx.set_time_mode_fixedstep(),
            Key::Escape => ctx.close_window(),
            _ => {}
        }
        Ok(())
    }

    fn on_error(&mut self, _ctx: &mut Context, error: anyhow::Error) -> anyhow::Result<()> {
        log::error!("{error:#}");
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    easel_engine::run(WindowCreationParams::new("easel paint", 1024, 768), Paint::new())
}
