pub mod background;
mod bars;
mod circle;
pub mod particles;
mod spectrum;
mod waves;

pub use bars::{bar_color, Bars};
pub use circle::{core_radius, ring_amplitudes, Circle};
pub use particles::{Particle, ParticleSystem};
pub use spectrum::Spectrum;
pub use waves::Waves;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::audio::{Sampler, TIME_DOMAIN_CENTER};
use crate::color::Theme;
use crate::error::VizError;
use crate::renderer::Surface;

/// Magnitude above which bars and spectrum columns get a glow pass.
pub const GLOW_THRESHOLD: u8 = 128;

/// Everything a render mode may read during one frame.
///
/// The frequency bins are borrowed for the duration of the call only. The
/// time-domain snapshot is fetched lazily, at most once per frame, the first
/// time a mode asks for it.
pub struct FrameInput<'a> {
    pub bins: &'a [u8],
    pub theme: &'a Theme,
    pub width: f32,
    pub height: f32,
    /// Seconds since the scheduler started running
    pub time: f32,
    sampler: Option<&'a mut dyn Sampler>,
    waveform: &'a mut [u8],
    waveform_ready: bool,
}

impl<'a> FrameInput<'a> {
    pub fn new(
        bins: &'a [u8],
        theme: &'a Theme,
        size: (usize, usize),
        time: f32,
        waveform: &'a mut [u8],
        sampler: Option<&'a mut dyn Sampler>,
    ) -> Self {
        Self {
            bins,
            theme,
            width: size.0 as f32,
            height: size.1 as f32,
            time,
            sampler,
            waveform,
            waveform_ready: false,
        }
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// No bins or no pixels: nothing sensible can be drawn.
    pub fn is_degenerate(&self) -> bool {
        self.bins.is_empty() || self.width < 1.0 || self.height < 1.0
    }

    /// Time-domain snapshot for this frame, same length as `bins`.
    pub fn time_domain(&mut self) -> &[u8] {
        if !self.waveform_ready {
            match self.sampler.as_deref_mut() {
                Some(sampler) => sampler.time_domain_snapshot(self.waveform),
                None => self.waveform.fill(TIME_DOMAIN_CENTER),
            }
            self.waveform_ready = true;
        }
        &*self.waveform
    }
}

/// Trait for different visualizer rendering styles
pub trait Visualizer {
    fn name(&self) -> &'static str;

    /// Draw one frame. Must be a no-op when `input.is_degenerate()`.
    fn render(&self, surface: &mut dyn Surface, input: &mut FrameInput);
}

/// Selectable rendering mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Bars,
    Waves,
    Circle,
    Spectrum,
}

impl RenderMode {
    pub fn all() -> &'static [RenderMode] {
        &[
            RenderMode::Bars,
            RenderMode::Waves,
            RenderMode::Circle,
            RenderMode::Spectrum,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            RenderMode::Bars => "bars",
            RenderMode::Waves => "waves",
            RenderMode::Circle => "circle",
            RenderMode::Spectrum => "spectrum",
        }
    }

    pub fn next(&self) -> Self {
        let all = Self::all();
        let current = all.iter().position(|m| m == self).unwrap_or(0);
        all[(current + 1) % all.len()]
    }

    pub fn visualizer(&self) -> &'static dyn Visualizer {
        match self {
            RenderMode::Bars => &Bars,
            RenderMode::Waves => &Waves,
            RenderMode::Circle => &Circle,
            RenderMode::Spectrum => &Spectrum,
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RenderMode {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bars" => Ok(Self::Bars),
            "waves" | "wave" => Ok(Self::Waves),
            "circle" => Ok(Self::Circle),
            "spectrum" => Ok(Self::Spectrum),
            _ => Err(VizError::UnknownMode(s.to_string())),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::renderer::Recorder;

    /// Render one frame of `mode` into a fresh recorder.
    pub fn record(
        visualizer: &dyn Visualizer,
        bins: &[u8],
        theme: &Theme,
        size: (usize, usize),
    ) -> Recorder {
        let mut recorder = Recorder::new(size.0, size.1);
        let mut waveform = vec![0u8; bins.len()];
        let mut input = FrameInput::new(bins, theme, size, 1.5, &mut waveform, None);
        visualizer.render(&mut recorder, &mut input);
        recorder
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;
    use crate::audio::SilentSampler;
    use crate::color::ThemeRegistry;

    #[test]
    fn mode_names_round_trip() {
        for mode in RenderMode::all() {
            assert_eq!(mode.name().parse::<RenderMode>().unwrap(), *mode);
            assert_eq!(mode.visualizer().name(), mode.name());
        }
        assert_eq!(
            "disco".parse::<RenderMode>(),
            Err(VizError::UnknownMode("disco".to_string()))
        );
    }

    #[test]
    fn next_cycles_through_all_modes() {
        let mut mode = RenderMode::Bars;
        for _ in 0..RenderMode::all().len() {
            mode = mode.next();
        }
        assert_eq!(mode, RenderMode::Bars);
    }

    #[test]
    fn every_mode_handles_awkward_lengths() {
        let theme = ThemeRegistry::default().resolve("neon").unwrap();
        for mode in RenderMode::all() {
            for len in [1usize, 128, 1024] {
                let bins: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
                let rec = record(mode.visualizer(), &bins, &theme, (320, 200));
                assert!(rec.len() < 8 * len + 200, "{} drew {} ops", mode, rec.len());
            }
        }
    }

    #[test]
    fn every_mode_is_a_no_op_without_bins() {
        let registry = ThemeRegistry::default();
        for theme in registry.all() {
            for mode in RenderMode::all() {
                let rec = record(mode.visualizer(), &[], theme, (320, 200));
                assert!(rec.is_empty(), "{} drew with zero bins", mode);
            }
        }
    }

    #[test]
    fn every_mode_is_a_no_op_on_empty_canvas() {
        let theme = ThemeRegistry::default().resolve("retro").unwrap();
        let bins = vec![200u8; 128];
        for mode in RenderMode::all() {
            assert!(record(mode.visualizer(), &bins, &theme, (0, 200)).is_empty());
            assert!(record(mode.visualizer(), &bins, &theme, (320, 0)).is_empty());
        }
    }

    #[test]
    fn time_domain_is_fetched_once() {
        struct Counting(usize);
        impl Sampler for Counting {
            fn bin_count(&self) -> usize {
                4
            }
            fn frequency_snapshot(&mut self, out: &mut [u8]) {
                out.fill(0);
            }
            fn time_domain_snapshot(&mut self, out: &mut [u8]) {
                self.0 += 1;
                out.fill(200);
            }
        }

        let theme = ThemeRegistry::default().resolve("minimal").unwrap();
        let bins = [0u8; 4];
        let mut waveform = [0u8; 4];
        let mut sampler = Counting(0);
        {
            let mut input = FrameInput::new(
                &bins,
                &theme,
                (10, 10),
                0.0,
                &mut waveform,
                Some(&mut sampler as &mut dyn Sampler),
            );
            assert_eq!(input.time_domain(), &[200, 200, 200, 200]);
            assert_eq!(input.time_domain(), &[200, 200, 200, 200]);
        }
        assert_eq!(sampler.0, 1);

        let mut silent = SilentSampler::new(4);
        let mut input = FrameInput::new(
            &bins,
            &theme,
            (10, 10),
            0.0,
            &mut waveform,
            Some(&mut silent as &mut dyn Sampler),
        );
        assert_eq!(input.time_domain(), &[128, 128, 128, 128]);
    }
}
