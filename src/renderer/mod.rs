//! Immediate-mode drawing surface
//!
//! Render modes never touch pixels directly: they issue shape operations on a
//! [`Surface`]. Two surfaces ship with the crate. [`Canvas`] rasterizes into an
//! owned RGBA buffer that output backends (the terminal half-block presenter)
//! convert at submission time. [`Recorder`] keeps the operations as a
//! [`DrawCommand`] list so tests can inspect exactly what a mode drew.

mod canvas;
mod record;

pub use canvas::Canvas;
pub use record::{DrawCommand, Recorder};

use crate::color::{lerp_color, Rgba};

/// Axis-aligned rectangle in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl RectF {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

/// A gradient color stop: offset in [0, 1] and color.
pub type ColorStop = (f32, Rgba);

/// How a filled or stroked shape is colored.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    /// Linear gradient along the segment `from` -> `to`.
    Linear {
        from: (f32, f32),
        to: (f32, f32),
        stops: Vec<ColorStop>,
    },
    /// Radial gradient between the circles (center, r0) and (center, r1).
    Radial {
        center: (f32, f32),
        r0: f32,
        r1: f32,
        stops: Vec<ColorStop>,
    },
}

impl Paint {
    /// Evaluate the paint at a point.
    pub fn color_at(&self, x: f32, y: f32) -> Rgba {
        match self {
            Paint::Solid(c) => *c,
            Paint::Linear { from, to, stops } => {
                let (dx, dy) = (to.0 - from.0, to.1 - from.1);
                let len2 = dx * dx + dy * dy;
                let t = if len2 <= f32::EPSILON {
                    0.0
                } else {
                    ((x - from.0) * dx + (y - from.1) * dy) / len2
                };
                sample_stops(stops, t)
            }
            Paint::Radial {
                center,
                r0,
                r1,
                stops,
            } => {
                let d = ((x - center.0).powi(2) + (y - center.1).powi(2)).sqrt();
                let span = r1 - r0;
                let t = if span.abs() <= f32::EPSILON {
                    0.0
                } else {
                    (d - r0) / span
                };
                sample_stops(stops, t)
            }
        }
    }
}

fn sample_stops(stops: &[ColorStop], t: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    match stops {
        [] => Rgba::TRANSPARENT,
        [only] => only.1,
        _ => {
            let mut prev = stops[0];
            if t <= prev.0 {
                return prev.1;
            }
            for &stop in &stops[1..] {
                if t <= stop.0 {
                    let span = stop.0 - prev.0;
                    let local = if span <= f32::EPSILON {
                        1.0
                    } else {
                        (t - prev.0) / span
                    };
                    return lerp_color(prev.1, stop.1, local);
                }
                prev = stop;
            }
            prev.1
        }
    }
}

/// Shadow-blur style halo drawn behind a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub blur: f32,
    pub color: Rgba,
}

/// Stroke settings for outlines and paths.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub paint: Paint,
    pub width: f32,
    pub glow: Option<Glow>,
}

impl Stroke {
    pub fn solid(color: Rgba, width: f32) -> Self {
        Self {
            paint: Paint::Solid(color),
            width,
            glow: None,
        }
    }

    pub fn with_glow(mut self, glow: Glow) -> Self {
        self.glow = Some(glow);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    /// Quadratic curve: control point, then end point.
    QuadTo(f32, f32, f32, f32),
}

/// Open polyline/curve path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    pub segments: Vec<PathSegment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.segments.push(PathSegment::MoveTo(x, y));
        self
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.segments.push(PathSegment::LineTo(x, y));
        self
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        self.segments.push(PathSegment::QuadTo(cx, cy, x, y));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Flatten into polylines, one per sub-path.
    /// Quadratic curves are subdivided into `QUAD_STEPS` line segments.
    pub fn flatten(&self) -> Vec<Vec<(f32, f32)>> {
        const QUAD_STEPS: usize = 8;

        let mut polylines: Vec<Vec<(f32, f32)>> = Vec::new();
        let mut current: Vec<(f32, f32)> = Vec::new();

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(x, y) => {
                    if current.len() > 1 {
                        polylines.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push((x, y));
                }
                PathSegment::LineTo(x, y) => current.push((x, y)),
                PathSegment::QuadTo(cx, cy, x, y) => {
                    let (x0, y0) = current.last().copied().unwrap_or((cx, cy));
                    if current.is_empty() {
                        current.push((x0, y0));
                    }
                    for step in 1..=QUAD_STEPS {
                        let t = step as f32 / QUAD_STEPS as f32;
                        let mt = 1.0 - t;
                        let px = mt * mt * x0 + 2.0 * mt * t * cx + t * t * x;
                        let py = mt * mt * y0 + 2.0 * mt * t * cy + t * t * y;
                        current.push((px, py));
                    }
                }
            }
        }

        if current.len() > 1 {
            polylines.push(current);
        }
        polylines
    }
}

/// 2D immediate-mode drawing target.
///
/// Dimensions belong to the surface and may change between frames (terminal
/// resize); callers must re-read [`Surface::size`] every frame.
pub trait Surface {
    /// Current pixel dimensions (width, height).
    fn size(&self) -> (usize, usize);

    fn fill_rect(&mut self, rect: RectF, paint: &Paint, glow: Option<Glow>);

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, paint: &Paint, glow: Option<Glow>);

    fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, stroke: &Stroke);

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke);
}
