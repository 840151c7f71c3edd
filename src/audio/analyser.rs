use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::error::VizError;

pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32768;

/// Tuning knobs of an [`AnalyserNode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyserSettings {
    pub fft_size: usize,
    /// Time smoothing constant (0.0 = none, close to 1.0 = very sluggish)
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyserSettings {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserSettings {
    pub fn validate(&self) -> Result<(), VizError> {
        if !self.fft_size.is_power_of_two()
            || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(VizError::InvalidFftSize(self.fft_size));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(VizError::Config(format!(
                "smoothing must be within 0.0..=1.0, got {}",
                self.smoothing
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(VizError::Config(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

/// Spectral analysis of the most recent `fft_size` samples.
///
/// Produces byte magnitudes the way a browser analyser node does: Blackman
/// window, FFT, per-bin exponential smoothing across calls, then decibels
/// mapped linearly from `[min_decibels, max_decibels]` onto `0..=255`.
pub struct AnalyserNode {
    settings: AnalyserSettings,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
}

impl AnalyserNode {
    pub fn new(settings: AnalyserSettings) -> Result<Self, VizError> {
        settings.validate()?;
        let fft_size = settings.fft_size;
        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / fft_size as f32;
                0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
            })
            .collect();

        Ok(Self {
            settings,
            fft,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            window,
            smoothed: vec![0.0; fft_size / 2],
        })
    }

    /// Number of usable frequency bins, half the FFT size.
    pub fn bin_count(&self) -> usize {
        self.settings.fft_size / 2
    }

    /// Fill `out` with byte frequency magnitudes for the tail of `samples`.
    ///
    /// Missing history is treated as silence, so a short or empty slice just
    /// decays the smoothed spectrum.
    pub fn byte_frequency_data(&mut self, samples: &[f32], out: &mut [u8]) {
        let fft_size = self.settings.fft_size;
        let tail = &samples[samples.len().saturating_sub(fft_size)..];
        let pad = fft_size - tail.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let tau = self.settings.smoothing;
        let scale = 1.0 / fft_size as f32;
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.buffer[k].norm() * scale;
            let value = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if value.is_finite() { value } else { 0.0 };
        }

        let min_db = self.settings.min_decibels;
        let range = self.settings.max_decibels - min_db;
        for (k, byte) in out.iter_mut().enumerate() {
            let Some(&magnitude) = self.smoothed.get(k) else {
                *byte = 0;
                continue;
            };
            if magnitude <= 0.0 {
                *byte = 0;
                continue;
            }
            let db = 20.0 * magnitude.log10();
            let scaled = 255.0 * (db - min_db) / range;
            *byte = scaled.clamp(0.0, 255.0) as u8;
        }
    }

    /// Fill `out` with the most recent samples as bytes centered at 128.
    pub fn byte_time_domain_data(&self, samples: &[f32], out: &mut [u8]) {
        let tail = &samples[samples.len().saturating_sub(out.len())..];
        let pad = out.len() - tail.len();
        for (i, byte) in out.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            *byte = (128.0 * (1.0 + sample)).clamp(0.0, 255.0) as u8;
        }
    }
}
