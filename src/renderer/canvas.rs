use crate::color::{Rgb, Rgba};

use super::{Glow, Paint, Path, RectF, Stroke, Surface};

/// Owned RGBA pixel buffer.
///
/// Internal format is 4 bytes per pixel in **RGBA** order, composited with
/// straight-alpha source-over. The buffer is kept opaque by the background
/// pass, so the alpha byte only matters to backends that care about it.
pub struct Canvas {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            data: vec![0u8; width * height * 4],
            width,
            height,
        }
    }

    /// Resize the canvas, reallocating only when the buffer is too small.
    /// Dimensions never drop below 1x1.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width.max(1);
        self.height = height.max(1);
        let needed = self.width * self.height * 4;
        if self.data.len() < needed {
            self.data.resize(needed, 0);
        }
    }

    /// Clear the canvas to fully transparent black.
    #[inline]
    pub fn clear(&mut self) {
        let len = self.width * self.height * 4;
        self.data[..len].fill(0);
    }

    /// Composite `color` over the pixel at (x, y) with an extra coverage factor.
    #[inline]
    pub fn blend_pixel(&mut self, x: usize, y: usize, color: Rgba, coverage: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let a = (color.a * coverage).clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let idx = (y * self.width + x) * 4;
        let inv = 1.0 - a;
        let mix = |dst: u8, src: u8| (src as f32 * a + dst as f32 * inv).round() as u8;
        self.data[idx] = mix(self.data[idx], color.r);
        self.data[idx + 1] = mix(self.data[idx + 1], color.g);
        self.data[idx + 2] = mix(self.data[idx + 2], color.b);
        let dst_a = self.data[idx + 3] as f32 / 255.0;
        self.data[idx + 3] = ((a + dst_a * inv) * 255.0).round() as u8;
    }

    /// Read the RGB values at (x, y).
    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> Rgb {
        if x >= self.width || y >= self.height {
            return Rgb::BLACK;
        }
        let idx = (y * self.width + x) * 4;
        if idx + 3 < self.data.len() {
            Rgb::new(self.data[idx], self.data[idx + 1], self.data[idx + 2])
        } else {
            Rgb::BLACK
        }
    }

    /// Clip a float span to pixel indices whose centers fall inside it.
    fn span(lo: f32, hi: f32, limit: usize) -> Option<(usize, usize)> {
        if !lo.is_finite() || !hi.is_finite() || hi <= lo {
            return None;
        }
        let start = (lo - 0.5).ceil().max(0.0) as usize;
        let end = ((hi - 0.5).floor() + 1.0).min(limit as f32);
        if end <= 0.0 {
            return None;
        }
        let end = end as usize;
        (start < end).then_some((start, end))
    }

    /// Soft halo around a rectangle, falling off over `glow.blur` pixels.
    fn rect_glow(&mut self, rect: RectF, glow: Glow) {
        let blur = glow.blur.max(0.0);
        if blur <= 0.0 {
            return;
        }
        let Some((x0, x1)) = Self::span(rect.x - blur, rect.right() + blur, self.width) else {
            return;
        };
        let Some((y0, y1)) = Self::span(rect.y - blur, rect.bottom() + blur, self.height) else {
            return;
        };
        for y in y0..y1 {
            let py = y as f32 + 0.5;
            let dy = (rect.y - py).max(py - rect.bottom()).max(0.0);
            for x in x0..x1 {
                let px = x as f32 + 0.5;
                let dx = (rect.x - px).max(px - rect.right()).max(0.0);
                let d = (dx * dx + dy * dy).sqrt();
                if d > 0.0 && d < blur {
                    let falloff = 1.0 - d / blur;
                    self.blend_pixel(x, y, glow.color, falloff * falloff * 0.6);
                }
            }
        }
    }

    /// Soft halo around a disc or ring edge at distance `radius`.
    fn ring_glow(&mut self, cx: f32, cy: f32, inner: f32, outer: f32, glow: Glow) {
        let blur = glow.blur.max(0.0);
        if blur <= 0.0 {
            return;
        }
        let reach = outer + blur;
        let Some((x0, x1)) = Self::span(cx - reach, cx + reach, self.width) else {
            return;
        };
        let Some((y0, y1)) = Self::span(cy - reach, cy + reach, self.height) else {
            return;
        };
        for y in y0..y1 {
            let py = y as f32 + 0.5 - cy;
            for x in x0..x1 {
                let px = x as f32 + 0.5 - cx;
                let d = (px * px + py * py).sqrt();
                let gap = if d > outer {
                    d - outer
                } else if d < inner {
                    inner - d
                } else {
                    continue;
                };
                if gap < blur {
                    let falloff = 1.0 - gap / blur;
                    self.blend_pixel(x, y, glow.color, falloff * falloff * 0.6);
                }
            }
        }
    }

    /// Anti-aliased thick segment.
    fn segment(&mut self, a: (f32, f32), b: (f32, f32), half_width: f32, paint: &Paint) {
        let pad = half_width + 1.0;
        let Some((x0, x1)) = Self::span(a.0.min(b.0) - pad, a.0.max(b.0) + pad, self.width) else {
            return;
        };
        let Some((y0, y1)) = Self::span(a.1.min(b.1) - pad, a.1.max(b.1) + pad, self.height) else {
            return;
        };
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len2 = dx * dx + dy * dy;

        for y in y0..y1 {
            let py = y as f32 + 0.5;
            for x in x0..x1 {
                let px = x as f32 + 0.5;
                let t = if len2 <= f32::EPSILON {
                    0.0
                } else {
                    (((px - a.0) * dx + (py - a.1) * dy) / len2).clamp(0.0, 1.0)
                };
                let (qx, qy) = (a.0 + t * dx, a.1 + t * dy);
                let d = ((px - qx).powi(2) + (py - qy).powi(2)).sqrt();
                let coverage = (half_width - d + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_pixel(x, y, paint.color_at(px, py), coverage);
                }
            }
        }
    }
}

impl Surface for Canvas {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: RectF, paint: &Paint, glow: Option<Glow>) {
        // Negative heights come from bars anchored at the floor; normalize.
        let rect = RectF {
            x: rect.x.min(rect.right()),
            y: rect.y.min(rect.bottom()),
            w: rect.w.abs(),
            h: rect.h.abs(),
        };
        if let Some(glow) = glow {
            self.rect_glow(rect, glow);
        }
        let Some((x0, x1)) = Self::span(rect.x, rect.right(), self.width) else {
            return;
        };
        let Some((y0, y1)) = Self::span(rect.y, rect.bottom(), self.height) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let color = paint.color_at(x as f32 + 0.5, y as f32 + 0.5);
                self.blend_pixel(x, y, color, 1.0);
            }
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, paint: &Paint, glow: Option<Glow>) {
        if !(radius > 0.0) {
            return;
        }
        if let Some(glow) = glow {
            self.ring_glow(cx, cy, 0.0, radius, glow);
        }
        let Some((x0, x1)) = Self::span(cx - radius - 1.0, cx + radius + 1.0, self.width) else {
            return;
        };
        let Some((y0, y1)) = Self::span(cy - radius - 1.0, cy + radius + 1.0, self.height) else {
            return;
        };
        for y in y0..y1 {
            let py = y as f32 + 0.5;
            for x in x0..x1 {
                let px = x as f32 + 0.5;
                let d = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
                let coverage = (radius - d + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_pixel(x, y, paint.color_at(px, py), coverage);
                }
            }
        }
    }

    fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, stroke: &Stroke) {
        if !(radius > 0.0) || !(stroke.width > 0.0) {
            return;
        }
        let half = stroke.width / 2.0;
        if let Some(glow) = stroke.glow {
            self.ring_glow(cx, cy, (radius - half).max(0.0), radius + half, glow);
        }
        let reach = radius + half + 1.0;
        let Some((x0, x1)) = Self::span(cx - reach, cx + reach, self.width) else {
            return;
        };
        let Some((y0, y1)) = Self::span(cy - reach, cy + reach, self.height) else {
            return;
        };
        for y in y0..y1 {
            let py = y as f32 + 0.5;
            for x in x0..x1 {
                let px = x as f32 + 0.5;
                let d = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
                let coverage = (half - (d - radius).abs() + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_pixel(x, y, stroke.paint.color_at(px, py), coverage);
                }
            }
        }
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke) {
        if !(stroke.width > 0.0) {
            return;
        }
        let half = stroke.width / 2.0;
        for polyline in path.flatten() {
            if let Some(glow) = stroke.glow {
                let halo = Paint::Solid(glow.color.fade(0.35));
                for pair in polyline.windows(2) {
                    self.segment(pair[0], pair[1], half + glow.blur / 2.0, &halo);
                }
            }
            for pair in polyline.windows(2) {
                self.segment(pair[0], pair[1], half, &stroke.paint);
            }
        }
    }
}
