use std::f32::consts::TAU;

use crate::color::{hsl, Theme};
use crate::renderer::{Glow, Paint, Path, RectF, Stroke, Surface};

use super::{FrameInput, Visualizer, GLOW_THRESHOLD};

/// Floor line as a fraction of canvas height.
const FLOOR: f32 = 0.75;
const GRID_ROWS: usize = 5;
const GRID_SPACING: f32 = 40.0;
const ORBITERS: usize = 12;

/// Pseudo-3D spectrum: perspective-shrunk bars standing on a floor grid,
/// with reflections below the floor and a ring of orbiting dots.
pub struct Spectrum;

/// Perspective scale of column `index` out of `len`: 1.0 at the front,
/// shrinking towards the back.
pub fn perspective_scale(index: usize, len: usize) -> f32 {
    1.0 - (index as f32 / len as f32 * 0.7) * 0.8
}

/// Hue of column `index`: blue to red, or the full wheel under rainbow.
fn column_hue(index: usize, len: usize, theme: &Theme) -> f32 {
    let position = index as f32 / len as f32;
    if theme.is_rainbow() {
        position * 360.0
    } else {
        240.0 + position * 120.0
    }
}

fn draw_grid(surface: &mut dyn Surface, theme: &Theme, w: f32, h: f32, floor: f32) {
    let stroke = Stroke::solid(theme.primary.alpha(0.1), 1.0);
    let row_gap = (h - floor) / GRID_ROWS as f32;

    for row in 0..GRID_ROWS {
        let y = floor + row as f32 * row_gap;
        let mut path = Path::new();
        path.move_to(0.0, y).line_to(w, y);
        surface.stroke_path(&path, &stroke);
    }

    let columns = (w / GRID_SPACING).ceil() as usize;
    for col in 0..=columns {
        let x = col as f32 * GRID_SPACING;
        let mut path = Path::new();
        path.move_to(x, floor).line_to(x, h);
        surface.stroke_path(&path, &stroke);
    }
}

impl Visualizer for Spectrum {
    fn name(&self) -> &'static str {
        "spectrum"
    }

    fn render(&self, surface: &mut dyn Surface, input: &mut FrameInput) {
        if input.is_degenerate() {
            return;
        }

        let theme = input.theme;
        let (w, h) = (input.width, input.height);
        let floor = h * FLOOR;
        let len = input.bin_count();
        let slot = w / len as f32;

        draw_grid(surface, theme, w, h, floor);

        for (i, &value) in input.bins.iter().enumerate() {
            if value == 0 {
                continue;
            }
            let scale = perspective_scale(i, len);
            let bar_width = slot * scale * 0.9;
            let bar_height = value as f32 / 255.0 * floor * scale;
            let x = i as f32 * slot + (slot - bar_width) / 2.0;
            let top = floor - bar_height;
            let hue = column_hue(i, len, theme);

            let paint = Paint::Linear {
                from: (x, top),
                to: (x, floor),
                stops: vec![
                    (0.0, hsl(hue, 1.0, 0.6).opaque()),
                    (1.0, hsl(hue, 1.0, 0.3).opaque()),
                ],
            };
            let rect = RectF::new(x, top, bar_width, bar_height);
            surface.fill_rect(rect, &paint, None);

            // Reflection under the floor line
            let reflection = RectF::new(x, floor, bar_width, bar_height * 0.3);
            surface.fill_rect(
                reflection,
                &Paint::Solid(hsl(hue, 1.0, 0.5).alpha(0.2)),
                None,
            );

            if value > GLOW_THRESHOLD {
                surface.fill_rect(
                    rect,
                    &paint,
                    Some(Glow {
                        blur: 20.0,
                        color: hsl(hue, 1.0, 0.5).opaque(),
                    }),
                );
            }
        }

        // Orbiting dots
        let t = input.time;
        for k in 0..ORBITERS {
            let phase = k as f32 * TAU / ORBITERS as f32;
            let x = w / 2.0 + (t * 0.8 + phase).cos() * w * 0.35;
            let y = floor * 0.5 + (t * 1.1 + phase).sin() * floor * 0.25;
            let color = hsl(240.0 + k as f32 * 10.0, 1.0, 0.6).alpha(0.8);
            surface.fill_circle(x, y, 2.0, &Paint::Solid(color), None);
        }
    }
}
