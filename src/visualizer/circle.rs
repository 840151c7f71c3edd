use crate::audio::{band_mean, frame_mean};
use crate::color::{hsl, Rgba, Theme};
use crate::renderer::{Paint, Stroke, Surface};

use super::{FrameInput, Visualizer};

pub const RING_COUNT: usize = 8;

const BASS: (usize, usize) = (0, 8);
const MID: (usize, usize) = (8, 32);
const TREBLE: (usize, usize) = (32, 64);

/// Extra radius a ring gains at full amplitude.
const PULSE_RANGE: f32 = 20.0;
const CORE_BASE: f32 = 15.0;
const CORE_RANGE: f32 = 25.0;
const EMPHASIS_MIN_MEAN: f32 = 80.0;

/// Concentric rings pulsing with bass, mid and treble energy.
pub struct Circle;

#[derive(Clone, Copy)]
enum Band {
    Bass,
    Mid,
    Treble,
}

fn ring_band(ring: usize) -> Band {
    match ring {
        0..=2 => Band::Bass,
        3..=5 => Band::Mid,
        _ => Band::Treble,
    }
}

/// Band amplitude (0-255) driving each of the eight rings.
pub fn ring_amplitudes(bins: &[u8]) -> [f32; RING_COUNT] {
    let bass = band_mean(bins, BASS.0, BASS.1);
    let mid = band_mean(bins, MID.0, MID.1);
    let treble = band_mean(bins, TREBLE.0, TREBLE.1);

    std::array::from_fn(|ring| match ring_band(ring) {
        Band::Bass => bass,
        Band::Mid => mid,
        Band::Treble => treble,
    })
}

/// Radius of the center disc for a frame with overall mean `mean`.
pub fn core_radius(mean: f32) -> f32 {
    CORE_BASE + mean / 255.0 * CORE_RANGE
}

fn ring_color(ring: usize, amplitude: f32, theme: &Theme) -> Rgba {
    if theme.is_rainbow() {
        return hsl(ring as f32 / RING_COUNT as f32 * 360.0, 1.0, 0.5).opaque();
    }
    let base = match ring_band(ring) {
        Band::Bass => theme.primary,
        Band::Mid => theme.secondary,
        Band::Treble => theme.accent,
    };
    base.alpha(0.3 + 0.7 * amplitude / 255.0)
}

impl Visualizer for Circle {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn render(&self, surface: &mut dyn Surface, input: &mut FrameInput) {
        if input.is_degenerate() {
            return;
        }

        let theme = input.theme;
        let (cx, cy) = (input.width / 2.0, input.height / 2.0);
        let max_radius = input.width.min(input.height) / 2.0 * 0.9;
        let mean = frame_mean(input.bins);

        for (ring, amplitude) in ring_amplitudes(input.bins).into_iter().enumerate() {
            let level = amplitude / 255.0;
            let radius = max_radius / RING_COUNT as f32 * (ring + 1) as f32 + level * PULSE_RANGE;
            let stroke = Stroke::solid(ring_color(ring, amplitude, theme), 2.0 + level * 4.0);
            surface.stroke_circle(cx, cy, radius, &stroke);
        }

        let core = core_radius(mean);
        let stops = if theme.is_rainbow() {
            let color = hsl(mean / 255.0 * 360.0, 1.0, 0.5);
            vec![(0.0, color.opaque()), (1.0, color.alpha(0.0))]
        } else {
            vec![
                (0.0, theme.accent.opaque()),
                (0.6, theme.primary.alpha(0.8)),
                (1.0, theme.primary.alpha(0.0)),
            ]
        };
        let paint = Paint::Radial {
            center: (cx, cy),
            r0: 0.0,
            r1: core,
            stops,
        };
        surface.fill_circle(cx, cy, core, &paint, None);

        if mean > EMPHASIS_MIN_MEAN {
            let color = if theme.is_rainbow() {
                hsl(mean / 255.0 * 360.0, 1.0, 0.7).opaque()
            } else {
                theme.accent.opaque()
            };
            let radius = max_radius + mean / 255.0 * 10.0;
            surface.stroke_circle(cx, cy, radius, &Stroke::solid(color, 3.0));
        }
    }
}
