//! Background pass, painted before the active mode every frame.

use crate::color::Theme;
use crate::renderer::{Paint, Path, RectF, Stroke, Surface};

const DOT_PITCH: f32 = 30.0;
const BAND_COUNT: usize = 3;
const BAND_SPEED: f32 = 50.0;
const BAND_WIDTH: f32 = 40.0;

/// Solid fill in the theme background color.
pub fn paint_solid(surface: &mut dyn Surface, theme: &Theme) {
    let (w, h) = surface.size();
    if w == 0 || h == 0 {
        return;
    }
    surface.fill_rect(
        RectF::new(0.0, 0.0, w as f32, h as f32),
        &Paint::Solid(theme.background.opaque()),
        None,
    );
}

/// Solid fill plus a pulsing dot grid and diagonal light bands.
///
/// Each grid cell reads one bin (`cell % bins.len()`) to size its dot; the
/// bands sweep across the canvas at a fixed speed.
pub fn paint_pattern(surface: &mut dyn Surface, theme: &Theme, bins: &[u8], time: f32) {
    let (w, h) = surface.size();
    if w == 0 || h == 0 {
        return;
    }
    paint_solid(surface, theme);

    let (w, h) = (w as f32, h as f32);
    let cols = (w / DOT_PITCH).ceil() as usize;
    let rows = (h / DOT_PITCH).ceil() as usize;

    for row in 0..rows {
        for col in 0..cols {
            let cell = row * cols + col;
            let value = if bins.is_empty() {
                0.0
            } else {
                bins[cell % bins.len()] as f32
            };
            let level = value / 255.0;
            let phase = (row + col) as f32 * 0.5;
            let pulse = 0.5 + 0.5 * (time * 2.0 + phase).sin();
            let radius = 1.0 + level * 3.0 * pulse;
            let x = col as f32 * DOT_PITCH + DOT_PITCH / 2.0;
            let y = row as f32 * DOT_PITCH + DOT_PITCH / 2.0;
            let color = theme.primary.alpha(0.15 + level * 0.35);
            surface.fill_circle(x, y, radius, &Paint::Solid(color), None);
        }
    }

    let travel = w + h;
    let stroke = Stroke::solid(theme.primary.alpha(0.05), BAND_WIDTH);
    for band in 0..BAND_COUNT {
        let offset = (time * BAND_SPEED + band as f32 * travel / BAND_COUNT as f32) % travel;
        let mut path = Path::new();
        path.move_to(offset, 0.0).line_to(offset - h, h);
        surface.stroke_path(&path, &stroke);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ThemeRegistry;
    use crate::renderer::{DrawCommand, Recorder};

    #[test]
    fn solid_covers_the_canvas() {
        let theme = ThemeRegistry::default().resolve("retro").unwrap();
        let mut rec = Recorder::new(320, 240);
        paint_solid(&mut rec, &theme);
        let (rect, paint, _) = rec.rects().next().unwrap();
        assert_eq!(*rect, RectF::new(0.0, 0.0, 320.0, 240.0));
        assert_eq!(*paint, Paint::Solid(theme.background.opaque()));
    }

    #[test]
    fn pattern_draws_grid_and_bands() {
        let theme = ThemeRegistry::default().resolve("neon").unwrap();
        let mut rec = Recorder::new(90, 60);
        paint_pattern(&mut rec, &theme, &[255, 0], 0.0);

        assert!(matches!(rec.commands[0], DrawCommand::FillRect { .. }));
        // 3 x 2 cells
        assert_eq!(rec.filled_circles().count(), 6);
        let bands = rec
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::StrokePath { .. }))
            .count();
        assert_eq!(bands, BAND_COUNT);
    }

    #[test]
    fn louder_cells_get_bigger_dots() {
        let theme = ThemeRegistry::default().resolve("neon").unwrap();
        let mut rec = Recorder::new(60, 30);
        // time chosen so sin(2t) = 1 for the first cell
        let t = std::f32::consts::FRAC_PI_4;
        paint_pattern(&mut rec, &theme, &[255, 0], t);
        let radii: Vec<f32> = rec.filled_circles().map(|(r, _)| r).collect();
        assert!((radii[0] - 4.0).abs() < 1e-4);
        assert_eq!(radii[1], 1.0);
    }

    #[test]
    fn pattern_without_bins_still_paints() {
        let theme = ThemeRegistry::default().resolve("minimal").unwrap();
        let mut rec = Recorder::new(30, 30);
        paint_pattern(&mut rec, &theme, &[], 3.0);
        assert_eq!(rec.filled_circles().count(), 1);
    }

    #[test]
    fn zero_sized_surface_is_skipped() {
        let theme = ThemeRegistry::default().resolve("minimal").unwrap();
        let mut rec = Recorder::new(0, 30);
        paint_solid(&mut rec, &theme);
        paint_pattern(&mut rec, &theme, &[1, 2, 3], 0.0);
        assert!(rec.is_empty());
    }
}
