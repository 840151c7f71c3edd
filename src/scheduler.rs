//! Per-frame orchestration: snapshot, background, mode, particles.

use std::fmt;
use tracing::{debug, info};

use crate::audio::{FrequencyFrame, Sampler};
use crate::color::{Theme, ThemeRegistry};
use crate::error::VizError;
use crate::renderer::Surface;
use crate::visualizer::background::{paint_pattern, paint_solid};
use crate::visualizer::{FrameInput, ParticleSystem, RenderMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Skipped,
    Rendered,
}

/// User-visible configuration of the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub mode: RenderMode,
    pub theme: Theme,
    pub particles_enabled: bool,
    pub background_pattern: bool,
    pub width: usize,
    pub height: usize,
}

impl RenderState {
    pub fn new(mode: RenderMode, theme: Theme) -> Self {
        Self {
            mode,
            theme,
            particles_enabled: false,
            background_pattern: false,
            width: 0,
            height: 0,
        }
    }

    /// One-line `key=value` summary used by the status bar and IPC.
    pub fn summary(&self) -> String {
        format!(
            "mode={} theme={} particles={} pattern={}",
            self.mode,
            self.theme.name,
            on_off(self.particles_enabled),
            on_off(self.background_pattern),
        )
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

/// A single mutation of [`RenderState`], from a key press or an IPC line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    SelectMode(RenderMode),
    SelectTheme(Theme),
    ToggleParticles,
    ToggleBackgroundPattern,
    NextMode,
    NextTheme,
}

impl ControlEvent {
    /// Parse a control line such as `mode circle` or `particles`.
    ///
    /// Mode and theme names are validated here; `next` is accepted in place
    /// of a name to cycle.
    pub fn parse(line: &str, themes: &ThemeRegistry) -> Result<Self, VizError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["mode", "next"] => Ok(Self::NextMode),
            ["mode", name] => name.parse().map(Self::SelectMode),
            ["theme", "next"] => Ok(Self::NextTheme),
            ["theme", name] => themes.resolve(name).map(Self::SelectTheme),
            ["particles"] => Ok(Self::ToggleParticles),
            ["pattern"] => Ok(Self::ToggleBackgroundPattern),
            _ => Err(VizError::UnknownCommand(line.trim().to_string())),
        }
    }
}

impl fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectMode(mode) => write!(f, "mode {}", mode),
            Self::SelectTheme(theme) => write!(f, "theme {}", theme.name),
            Self::ToggleParticles => f.write_str("particles"),
            Self::ToggleBackgroundPattern => f.write_str("pattern"),
            Self::NextMode => f.write_str("mode next"),
            Self::NextTheme => f.write_str("theme next"),
        }
    }
}

/// Drives one render pass per tick while running.
///
/// Owns the render state, the particle system and the reusable snapshot
/// buffers. The sampler and theme registry are injected at construction.
pub struct FrameScheduler<S: Sampler> {
    sampler: S,
    themes: ThemeRegistry,
    particles: ParticleSystem,
    state: RenderState,
    phase: SchedulerPhase,
    frame: FrequencyFrame,
    waveform: Vec<u8>,
    frames_rendered: u64,
}

impl<S: Sampler> FrameScheduler<S> {
    pub fn new(
        sampler: S,
        themes: ThemeRegistry,
        particles: ParticleSystem,
        state: RenderState,
    ) -> Self {
        let bins = sampler.bin_count();
        Self {
            sampler,
            themes,
            particles,
            state,
            phase: SchedulerPhase::Idle,
            frame: FrequencyFrame::new(bins),
            waveform: vec![0; bins],
            frames_rendered: 0,
        }
    }

    pub fn start(&mut self) {
        if self.phase == SchedulerPhase::Idle {
            info!("Render loop started ({})", self.state.summary());
        }
        self.phase = SchedulerPhase::Running;
    }

    pub fn stop(&mut self) {
        if self.phase == SchedulerPhase::Running {
            info!("Render loop stopped after {} frames", self.frames_rendered);
        }
        self.phase = SchedulerPhase::Idle;
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn themes(&self) -> &ThemeRegistry {
        &self.themes
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// The frequency frame used by the last rendered frame.
    pub fn last_frame(&self) -> &[u8] {
        &self.frame
    }

    /// Apply one control event. Exactly one state field changes.
    pub fn apply(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::SelectMode(mode) => self.state.mode = mode,
            ControlEvent::NextMode => self.state.mode = self.state.mode.next(),
            ControlEvent::SelectTheme(theme) => self.state.theme = theme,
            ControlEvent::NextTheme => self.state.theme = self.themes.next(&self.state.theme),
            ControlEvent::ToggleParticles => {
                self.state.particles_enabled = !self.state.particles_enabled;
                if !self.state.particles_enabled {
                    self.particles.clear();
                }
            }
            ControlEvent::ToggleBackgroundPattern => {
                self.state.background_pattern = !self.state.background_pattern;
            }
        }
        info!("{} -> {}", event, self.state.summary());
    }

    /// Render one frame onto `surface`. `time` is seconds since start.
    pub fn render_frame(&mut self, surface: &mut dyn Surface, time: f32) -> FrameOutcome {
        if self.phase == SchedulerPhase::Idle {
            return FrameOutcome::Skipped;
        }

        let (width, height) = surface.size();
        if (width, height) != (self.state.width, self.state.height) {
            debug!("Surface resized to {}x{}", width, height);
            self.state.width = width;
            self.state.height = height;
        }

        self.sampler.frequency_snapshot(&mut self.frame);

        let theme = self.state.theme;
        if self.state.background_pattern {
            paint_pattern(surface, &theme, &self.frame, time);
        } else {
            paint_solid(surface, &theme);
        }

        let mut input = FrameInput::new(
            &self.frame,
            &theme,
            (width, height),
            time,
            &mut self.waveform,
            Some(&mut self.sampler as &mut dyn Sampler),
        );
        self.state.mode.visualizer().render(surface, &mut input);

        if self.state.particles_enabled {
            self.particles
                .update(&self.frame, width as f32, height as f32);
            self.particles.draw(surface, &theme);
        }

        self.frames_rendered += 1;
        FrameOutcome::Rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{FixedSampler, SilentSampler};
    use crate::renderer::{DrawCommand, Paint, RectF, Recorder};

    fn scheduler<S: Sampler>(sampler: S, mode: RenderMode) -> FrameScheduler<S> {
        let themes = ThemeRegistry::default();
        let theme = themes.resolve("neon").unwrap();
        FrameScheduler::new(
            sampler,
            themes,
            ParticleSystem::with_seed(11),
            RenderState::new(mode, theme),
        )
    }

    #[test]
    fn idle_scheduler_skips_without_drawing() {
        let mut sched = scheduler(FixedSampler::flat(64, 200), RenderMode::Bars);
        let mut rec = Recorder::new(200, 100);
        assert_eq!(sched.render_frame(&mut rec, 0.0), FrameOutcome::Skipped);
        assert!(rec.is_empty());
        assert_eq!(sched.state().width, 0);

        sched.start();
        assert_eq!(sched.render_frame(&mut rec, 0.0), FrameOutcome::Rendered);
        sched.stop();
        rec.clear();
        assert_eq!(sched.render_frame(&mut rec, 0.1), FrameOutcome::Skipped);
        assert!(rec.is_empty());
        assert_eq!(sched.frames_rendered(), 1);
    }

    #[test]
    fn background_is_painted_before_the_mode() {
        let mut sched = scheduler(FixedSampler::flat(4, 200), RenderMode::Bars);
        sched.start();
        let mut rec = Recorder::new(160, 300);
        sched.render_frame(&mut rec, 0.0);

        let theme = sched.state().theme;
        let (first, paint, _) = rec.rects().next().unwrap();
        assert_eq!(*first, RectF::new(0.0, 0.0, 160.0, 300.0));
        assert_eq!(*paint, Paint::Solid(theme.background.opaque()));
        // background + 4 bars + 4 glows
        assert_eq!(rec.len(), 9);
    }

    #[test]
    fn pattern_toggle_swaps_the_background() {
        let mut sched = scheduler(FixedSampler::flat(4, 10), RenderMode::Bars);
        sched.start();
        sched.apply(ControlEvent::ToggleBackgroundPattern);
        let mut rec = Recorder::new(60, 60);
        sched.render_frame(&mut rec, 0.0);
        assert!(matches!(rec.commands[0], DrawCommand::FillRect { .. }));
        assert!(matches!(rec.commands[1], DrawCommand::FillCircle { .. }));
    }

    #[test]
    fn size_is_reread_every_frame() {
        let mut sched = scheduler(SilentSampler::new(32), RenderMode::Waves);
        sched.start();
        let mut rec = Recorder::new(320, 200);
        sched.render_frame(&mut rec, 0.0);
        assert_eq!((sched.state().width, sched.state().height), (320, 200));

        rec.resize(640, 480);
        sched.render_frame(&mut rec, 0.0);
        assert_eq!((sched.state().width, sched.state().height), (640, 480));
    }

    #[test]
    fn mode_switch_leaves_other_state_untouched() {
        let mut sched = scheduler(SilentSampler::new(16), RenderMode::Bars);
        sched.apply(ControlEvent::ToggleParticles);
        let before = *sched.state();

        for mode in RenderMode::all() {
            sched.apply(ControlEvent::SelectMode(*mode));
            let after = sched.state();
            assert_eq!(after.mode, *mode);
            assert_eq!(after.theme, before.theme);
            assert_eq!(after.particles_enabled, before.particles_enabled);
            assert_eq!(after.background_pattern, before.background_pattern);
        }
    }

    #[test]
    fn next_events_cycle() {
        let mut sched = scheduler(SilentSampler::new(16), RenderMode::Spectrum);
        sched.apply(ControlEvent::NextMode);
        assert_eq!(sched.state().mode, RenderMode::Bars);

        let first = sched.state().theme;
        for _ in 0..sched.themes().all().len() {
            sched.apply(ControlEvent::NextTheme);
        }
        assert_eq!(sched.state().theme, first);
    }

    #[test]
    fn particles_spawn_on_bass_and_clear_when_disabled() {
        let mut sched = scheduler(FixedSampler::flat(64, 255), RenderMode::Circle);
        sched.apply(ControlEvent::ToggleParticles);
        sched.start();
        let mut rec = Recorder::new(200, 200);
        for frame in 0..30 {
            rec.clear();
            sched.render_frame(&mut rec, frame as f32 / 60.0);
        }
        assert!(sched.particle_count() > 0);

        sched.apply(ControlEvent::ToggleParticles);
        assert_eq!(sched.particle_count(), 0);
    }

    #[test]
    fn parse_validates_names() {
        let themes = ThemeRegistry::default();
        assert_eq!(
            ControlEvent::parse("mode circle", &themes),
            Ok(ControlEvent::SelectMode(RenderMode::Circle))
        );
        assert_eq!(
            ControlEvent::parse("theme Retro", &themes),
            Ok(ControlEvent::SelectTheme(themes.resolve("retro").unwrap()))
        );
        assert_eq!(
            ControlEvent::parse("  particles ", &themes),
            Ok(ControlEvent::ToggleParticles)
        );
        assert_eq!(
            ControlEvent::parse("mode next", &themes),
            Ok(ControlEvent::NextMode)
        );
        assert_eq!(
            ControlEvent::parse("mode disco", &themes),
            Err(VizError::UnknownMode("disco".to_string()))
        );
        assert_eq!(
            ControlEvent::parse("theme vapor", &themes),
            Err(VizError::UnknownTheme("vapor".to_string()))
        );
        assert_eq!(
            ControlEvent::parse("dance", &themes),
            Err(VizError::UnknownCommand("dance".to_string()))
        );
    }

    #[test]
    fn summary_lists_every_field() {
        let themes = ThemeRegistry::default();
        let state = RenderState::new(RenderMode::Waves, themes.resolve("fire").unwrap());
        assert_eq!(
            state.summary(),
            "mode=waves theme=fire particles=off pattern=off"
        );
    }
}
