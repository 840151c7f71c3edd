use super::{Glow, Paint, Path, RectF, Stroke, Surface};

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect {
        rect: RectF,
        paint: Paint,
        glow: Option<Glow>,
    },
    FillCircle {
        cx: f32,
        cy: f32,
        radius: f32,
        paint: Paint,
        glow: Option<Glow>,
    },
    StrokeCircle {
        cx: f32,
        cy: f32,
        radius: f32,
        stroke: Stroke,
    },
    StrokePath {
        path: Path,
        stroke: Stroke,
    },
}

/// Surface that keeps every operation instead of rasterizing it.
#[derive(Debug, Clone)]
pub struct Recorder {
    width: usize,
    height: usize,
    pub commands: Vec<DrawCommand>,
}

impl Recorder {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Simulate an external resize.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every `FillRect` in draw order.
    pub fn rects(&self) -> impl Iterator<Item = (&RectF, &Paint, Option<&Glow>)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::FillRect { rect, paint, glow } => Some((rect, paint, glow.as_ref())),
            _ => None,
        })
    }

    /// Every `StrokeCircle` in draw order as (radius, stroke).
    pub fn stroked_circles(&self) -> impl Iterator<Item = (f32, &Stroke)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::StrokeCircle { radius, stroke, .. } => Some((*radius, stroke)),
            _ => None,
        })
    }

    /// Every `FillCircle` in draw order as (radius, paint).
    pub fn filled_circles(&self) -> impl Iterator<Item = (f32, &Paint)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::FillCircle { radius, paint, .. } => Some((*radius, paint)),
            _ => None,
        })
    }
}

impl Surface for Recorder {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, rect: RectF, paint: &Paint, glow: Option<Glow>) {
        self.commands.push(DrawCommand::FillRect {
            rect,
            paint: paint.clone(),
            glow,
        });
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, paint: &Paint, glow: Option<Glow>) {
        self.commands.push(DrawCommand::FillCircle {
            cx,
            cy,
            radius,
            paint: paint.clone(),
            glow,
        });
    }

    fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokeCircle {
            cx,
            cy,
            radius,
            stroke: stroke.clone(),
        });
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokePath {
            path: path.clone(),
            stroke: stroke.clone(),
        });
    }
}
