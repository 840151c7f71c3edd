use crate::color::{hsl, Rgba, Theme};
use crate::renderer::{Glow, Paint, RectF, Surface};

use super::{FrameInput, Visualizer, GLOW_THRESHOLD};

/// Columns are this many slot widths wide, so neighbours overlap.
const WIDTH_FACTOR: f32 = 2.5;
/// Gap added after each column on top of its width.
const COLUMN_GAP: f32 = 1.0;
const GLOW_BLUR: f32 = 15.0;

/// Classic bottom-anchored frequency columns.
///
/// Column width is `(width / bins) * 2.5` and columns advance by that width
/// plus one pixel, so with many bins the graph runs off the right edge of the
/// canvas. That overflow is kept as-is.
pub struct Bars;

/// Fill and glow color of column `index` out of `len` with magnitude `value`.
///
/// Rainbow ignores the palette entirely and sweeps hue by index; every other
/// theme uses the primary color with opacity following the magnitude.
pub fn bar_color(index: usize, len: usize, value: u8, theme: &Theme) -> (Rgba, Rgba) {
    if theme.is_rainbow() {
        let hue = index as f32 / len.max(1) as f32 * 360.0;
        let color = hsl(hue, 1.0, 0.5).opaque();
        (color, color)
    } else {
        let intensity = value as f32 / 255.0;
        (
            theme.primary.alpha(0.4 + 0.6 * intensity),
            theme.accent.opaque(),
        )
    }
}

impl Visualizer for Bars {
    fn name(&self) -> &'static str {
        "bars"
    }

    fn render(&self, surface: &mut dyn Surface, input: &mut FrameInput) {
        if input.is_degenerate() {
            return;
        }

        let len = input.bin_count();
        let bar_width = (input.width / len as f32) * WIDTH_FACTOR;
        let mut x = 0.0;

        for (i, &value) in input.bins.iter().enumerate() {
            if value > 0 {
                let bar_height = value as f32;
                let rect = RectF::new(x, input.height - bar_height, bar_width, bar_height);
                let (fill, glow) = bar_color(i, len, value, input.theme);
                let paint = Paint::Solid(fill);

                surface.fill_rect(rect, &paint, None);
                if value > GLOW_THRESHOLD {
                    surface.fill_rect(
                        rect,
                        &paint,
                        Some(Glow {
                            blur: GLOW_BLUR,
                            color: glow,
                        }),
                    );
                }
            }
            x += bar_width + COLUMN_GAP;
        }
    }
}
