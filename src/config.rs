use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::audio::AnalyserSettings;
use crate::cli::Args;
use crate::color::ThemeRegistry;
use crate::error::VizError;
use crate::scheduler::RenderState;
use crate::visualizer::RenderMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub render: RenderConfig,
    pub display: DisplayConfig,
    pub control: ControlConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub fft_size: usize,
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
    /// Frames handed to the output per write
    pub chunk_frames: usize,
    /// Frequency of the test tone played with `--tone`
    pub tone_hz: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        let analyser = AnalyserSettings::default();
        Self {
            fft_size: analyser.fft_size,
            smoothing: analyser.smoothing,
            min_decibels: analyser.min_decibels,
            max_decibels: analyser.max_decibels,
            chunk_frames: 1024,
            tone_hz: 440.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub mode: RenderMode,
    pub theme: String,
    pub particles: bool,
    pub background_pattern: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::Bars,
            theme: "neon".to_string(),
            particles: false,
            background_pattern: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub fps: u32,
    pub status_bar: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            status_bar: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlConfig {
    pub ipc: bool,
    /// Overrides the default socket location when set
    pub socket_path: Option<PathBuf>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            ipc: true,
            socket_path: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Get the default XDG config path (~/.config/auraviz/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("auraviz").join("config.toml"))
    }

    /// Load config from the default XDG path if it exists.
    /// Returns None if the file is missing; parse errors are logged and ignored.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return None;
        }
        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("{:#}. Using defaults.", e);
                None
            }
        }
    }

    /// Initialize default config file at XDG path, returns the path
    pub fn init_default_config() -> Result<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, Self::generate_config_template())?;

        Ok(path)
    }

    /// Generate a commented TOML config template
    pub fn generate_config_template() -> String {
        r#"# auraviz configuration

[audio]
# FFT size: power of two between 32 and 32768 (bins = fft_size / 2)
fft_size = 256
# Smoothing over time (0.0-1.0, higher = smoother)
smoothing = 0.8
# Decibel range mapped onto 0-255
min_decibels = -100.0
max_decibels = -30.0
# Frames written to the audio output per chunk
chunk_frames = 1024
# Frequency of the test tone (--tone overrides)
tone_hz = 440.0

[render]
# Render mode: bars, waves, circle, spectrum
mode = "bars"
# Theme: minimal, neon, retro, rainbow, ocean, fire
theme = "neon"
# Bass-triggered particle overlay
particles = false
# Animated dot grid and light bands behind the visualization
background_pattern = false

[display]
# Target frames per second
fps = 60
# Show the key help and current state on the top line
status_bar = true

[control]
# Listen for commands on a Unix socket (see --send)
ipc = true
# socket_path = "/tmp/auraviz.sock"
"#
        .to_string()
    }

    /// Merge CLI arguments into config (CLI takes priority)
    pub fn merge_args(&mut self, args: &Args) {
        if let Some(mode) = args.mode {
            self.render.mode = mode;
        }
        if let Some(ref theme) = args.theme {
            self.render.theme = theme.clone();
        }
        if args.particles {
            self.render.particles = true;
        }
        if args.pattern {
            self.render.background_pattern = true;
        }
        if let Some(fps) = args.fps {
            self.display.fps = fps;
        }
        if let Some(size) = args.fft_size {
            self.audio.fft_size = size;
        }
        if let Some(hz) = args.tone {
            self.audio.tone_hz = hz;
        }
        if args.no_ipc {
            self.control.ipc = false;
        }
    }

    pub fn analyser_settings(&self) -> AnalyserSettings {
        AnalyserSettings {
            fft_size: self.audio.fft_size,
            smoothing: self.audio.smoothing,
            min_decibels: self.audio.min_decibels,
            max_decibels: self.audio.max_decibels,
        }
    }

    pub fn validate(&self, themes: &ThemeRegistry) -> Result<(), VizError> {
        self.analyser_settings().validate()?;
        themes.resolve(&self.render.theme)?;
        if self.display.fps == 0 {
            return Err(VizError::Config("fps must be greater than zero".to_string()));
        }
        if self.audio.chunk_frames == 0 {
            return Err(VizError::Config(
                "chunk_frames must be greater than zero".to_string(),
            ));
        }
        if self.audio.tone_hz.is_nan() || self.audio.tone_hz <= 0.0 {
            return Err(VizError::Config(format!(
                "tone_hz must be positive, got {}",
                self.audio.tone_hz
            )));
        }
        Ok(())
    }

    /// Render state the scheduler starts from.
    pub fn initial_state(&self, themes: &ThemeRegistry) -> Result<RenderState, VizError> {
        let theme = themes.resolve(&self.render.theme)?;
        let mut state = RenderState::new(self.render.mode, theme);
        state.particles_enabled = self.render.particles;
        state.background_pattern = self.render.background_pattern;
        Ok(state)
    }
}
