use crate::audio::frame_mean;
use crate::renderer::{Glow, Paint, Path, RectF, Stroke, Surface};

use super::{FrameInput, Visualizer};

const GLOW_MIN_MEAN: f32 = 10.0;
const TICK_STRIDE: usize = 8;
const TICK_MIN: u8 = 20;

/// Oscilloscope trace layered over a smoothed spectrum curve.
///
/// Uses the theme palette for every theme, rainbow included.
pub struct Waves;

impl Visualizer for Waves {
    fn name(&self) -> &'static str {
        "waves"
    }

    fn render(&self, surface: &mut dyn Surface, input: &mut FrameInput) {
        if input.is_degenerate() {
            return;
        }

        let theme = *input.theme;
        let (w, h) = (input.width, input.height);
        let len = input.bin_count();
        let slice = w / len as f32;
        let mean = frame_mean(input.bins);

        // Background glow
        if mean > GLOW_MIN_MEAN {
            let level = mean / 255.0;
            let radius = w.max(h) * 0.6 * level;
            let center = (w / 2.0, h / 2.0);
            let paint = Paint::Radial {
                center,
                r0: 0.0,
                r1: radius,
                stops: vec![
                    (0.0, theme.primary.alpha(0.3 * level)),
                    (1.0, theme.primary.alpha(0.0)),
                ],
            };
            surface.fill_rect(RectF::new(0.0, 0.0, w, h), &paint, None);
        }

        // Sparse tick marks
        let tick = Stroke::solid(theme.accent.alpha(0.3), 1.0);
        for (i, &value) in input.bins.iter().enumerate().step_by(TICK_STRIDE) {
            if value > TICK_MIN {
                let x = i as f32 * slice;
                let mut path = Path::new();
                path.move_to(x, h).line_to(x, h - value as f32 / 255.0 * h * 0.3);
                surface.stroke_path(&path, &tick);
            }
        }

        // Smoothed frequency curve through midpoints
        let point = |i: usize, v: u8| (i as f32 * slice, h - v as f32 / 255.0 * h * 0.8);
        let bins = input.bins;
        let mut curve = Path::new();
        let (x0, y0) = point(0, bins[0]);
        curve.move_to(x0, y0);
        for i in 1..len.saturating_sub(1) {
            let (cx, cy) = point(i, bins[i]);
            let (nx, ny) = point(i + 1, bins[i + 1]);
            curve.quad_to(cx, cy, (cx + nx) / 2.0, (cy + ny) / 2.0);
        }
        let (lx, ly) = point(len - 1, bins[len - 1]);
        curve.line_to(lx, ly);
        surface.stroke_path(&curve, &Stroke::solid(theme.secondary.opaque(), 2.0));

        // Oscilloscope trace
        let mut trace = Path::new();
        for (i, &sample) in input.time_domain().iter().enumerate() {
            let x = i as f32 * slice;
            let y = sample as f32 / 128.0 * h / 2.0;
            if i == 0 {
                trace.move_to(x, y);
            } else {
                trace.line_to(x, y);
            }
        }
        trace.line_to(w, h / 2.0);
        let stroke = Stroke::solid(theme.primary.opaque(), 2.0).with_glow(Glow {
            blur: 10.0,
            color: theme.primary.opaque(),
        });
        surface.stroke_path(&trace, &stroke);
    }
}
