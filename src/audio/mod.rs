pub mod analyser;
pub mod playback;

pub use analyser::{AnalyserNode, AnalyserSettings};
pub use playback::{Playback, Track};

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::VizError;

/// Byte value of a silent time-domain sample.
pub const TIME_DOMAIN_CENTER: u8 = 128;

/// Window of the most recent mono samples published by the player.
pub type SampleWindow = Arc<Vec<f32>>;

/// One analysis snapshot: `fft_size / 2` unsigned byte magnitudes.
///
/// The scheduler owns one of these and refills it in place every frame;
/// render modes only ever see it as `&[u8]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyFrame {
    bins: Vec<u8>,
}

impl FrequencyFrame {
    pub fn new(len: usize) -> Self {
        Self { bins: vec![0; len] }
    }
}

impl From<Vec<u8>> for FrequencyFrame {
    fn from(bins: Vec<u8>) -> Self {
        Self { bins }
    }
}

impl Deref for FrequencyFrame {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bins
    }
}

impl DerefMut for FrequencyFrame {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bins
    }
}

/// Mean of `bins[start..end]`, clipped to the frame. Empty ranges average 0.
pub fn band_mean(bins: &[u8], start: usize, end: usize) -> f32 {
    let end = end.min(bins.len());
    if start >= end {
        return 0.0;
    }
    let sum: u32 = bins[start..end].iter().map(|&b| b as u32).sum();
    sum as f32 / (end - start) as f32
}

/// Mean over the whole frame.
pub fn frame_mean(bins: &[u8]) -> f32 {
    band_mean(bins, 0, bins.len())
}

/// Source of per-frame analysis snapshots.
///
/// Both snapshot calls are synchronous, never block and never fail: with no
/// audio connected they report silence.
pub trait Sampler {
    /// Length of every snapshot this sampler produces.
    fn bin_count(&self) -> usize;

    fn frequency_snapshot(&mut self, out: &mut [u8]);

    /// Instantaneous waveform as bytes centered at 128.
    fn time_domain_snapshot(&mut self, out: &mut [u8]);
}

/// Sampler with nothing attached.
#[derive(Debug, Clone, Copy)]
pub struct SilentSampler {
    bins: usize,
}

impl SilentSampler {
    pub fn new(bins: usize) -> Self {
        Self { bins }
    }
}

impl Sampler for SilentSampler {
    fn bin_count(&self) -> usize {
        self.bins
    }

    fn frequency_snapshot(&mut self, out: &mut [u8]) {
        out.fill(0);
    }

    fn time_domain_snapshot(&mut self, out: &mut [u8]) {
        out.fill(TIME_DOMAIN_CENTER);
    }
}

/// Sampler that replays one fixed frame forever.
#[derive(Debug, Clone)]
pub struct FixedSampler {
    frequency: Vec<u8>,
    waveform: u8,
}

impl FixedSampler {
    pub fn new(frequency: Vec<u8>) -> Self {
        Self {
            frequency,
            waveform: TIME_DOMAIN_CENTER,
        }
    }

    /// Flat frame of `bins` copies of `value`.
    pub fn flat(bins: usize, value: u8) -> Self {
        Self::new(vec![value; bins])
    }

    pub fn with_waveform(mut self, value: u8) -> Self {
        self.waveform = value;
        self
    }
}

impl Sampler for FixedSampler {
    fn bin_count(&self) -> usize {
        self.frequency.len()
    }

    fn frequency_snapshot(&mut self, out: &mut [u8]) {
        let n = out.len().min(self.frequency.len());
        out[..n].copy_from_slice(&self.frequency[..n]);
        out[n..].fill(0);
    }

    fn time_domain_snapshot(&mut self, out: &mut [u8]) {
        out.fill(self.waveform);
    }
}

/// Analyser tapped onto the playback window channel.
pub struct AnalyserSampler {
    node: AnalyserNode,
    source: Option<watch::Receiver<SampleWindow>>,
}

impl AnalyserSampler {
    pub fn new(settings: AnalyserSettings) -> Result<Self, VizError> {
        Ok(Self {
            node: AnalyserNode::new(settings)?,
            source: None,
        })
    }

    /// Attach the tap. Replaces any previous source.
    pub fn connect(&mut self, source: watch::Receiver<SampleWindow>) {
        self.source = Some(source);
    }

    pub fn disconnect(&mut self) {
        self.source = None;
    }

    #[cfg(test)]
    fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    fn latest_window(&self) -> Option<SampleWindow> {
        self.source.as_ref().map(|rx| rx.borrow().clone())
    }
}

impl Sampler for AnalyserSampler {
    fn bin_count(&self) -> usize {
        self.node.bin_count()
    }

    fn frequency_snapshot(&mut self, out: &mut [u8]) {
        match self.latest_window() {
            Some(window) => self.node.byte_frequency_data(&window, out),
            None => out.fill(0),
        }
    }

    fn time_domain_snapshot(&mut self, out: &mut [u8]) {
        match self.latest_window() {
            Some(window) => self.node.byte_time_domain_data(&window, out),
            None => out.fill(TIME_DOMAIN_CENTER),
        }
    }
}

/// Create the analysis tap and the channel the player publishes into.
pub fn create_audio_pipeline(
    settings: AnalyserSettings,
) -> Result<(watch::Sender<SampleWindow>, AnalyserSampler), VizError> {
    let (tx, rx) = watch::channel(Arc::new(Vec::new()));
    let mut sampler = AnalyserSampler::new(settings)?;
    sampler.connect(rx);
    Ok((tx, sampler))
}
