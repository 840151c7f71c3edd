use std::sync::Arc;

use auraviz::audio::{create_audio_pipeline, AnalyserSettings, FixedSampler, Sampler};
use auraviz::color::ThemeRegistry;
use auraviz::renderer::{Canvas, DrawCommand, Recorder};
use auraviz::scheduler::{ControlEvent, FrameOutcome, FrameScheduler, RenderState};
use auraviz::visualizer::{ParticleSystem, RenderMode};

fn scheduler<S: Sampler>(sampler: S, mode: RenderMode, theme: &str) -> FrameScheduler<S> {
    let themes = ThemeRegistry::default();
    let theme = themes.resolve(theme).unwrap();
    let mut sched = FrameScheduler::new(
        sampler,
        themes,
        ParticleSystem::with_seed(99),
        RenderState::new(mode, theme),
    );
    sched.start();
    sched
}

#[test]
fn sixty_frames_of_flat_circle() {
    let mut sched = scheduler(FixedSampler::flat(128, 128), RenderMode::Circle, "minimal");
    let mut surface = Recorder::new(400, 300);
    let step = 300.0 / 2.0 * 0.9 / 8.0;

    for frame in 0..60 {
        surface.clear();
        let outcome = sched.render_frame(&mut surface, frame as f32 / 60.0);
        assert_eq!(outcome, FrameOutcome::Rendered);

        // Background first.
        assert!(matches!(surface.commands[0], DrawCommand::FillRect { .. }));

        let radii: Vec<f32> = surface.stroked_circles().map(|(r, _)| r).collect();
        let pulses: Vec<f32> = radii[..8]
            .iter()
            .enumerate()
            .map(|(ring, r)| r - step * (ring + 1) as f32)
            .collect();
        for pulse in &pulses {
            assert!((pulse - pulses[0]).abs() < 1e-3, "unequal pulses {:?}", pulses);
        }

        let (core, _) = surface.filled_circles().next().unwrap();
        assert!((core - 27.5).abs() < 0.1, "core radius {}", core);
    }
    assert_eq!(sched.frames_rendered(), 60);
}

#[test]
fn zero_bins_paint_only_the_background() {
    let mut sched = scheduler(FixedSampler::new(Vec::new()), RenderMode::Bars, "neon");
    let mut surface = Recorder::new(320, 200);
    for mode in RenderMode::all() {
        sched.apply(ControlEvent::SelectMode(*mode));
        surface.clear();
        sched.render_frame(&mut surface, 0.5);
        assert_eq!(surface.len(), 1, "{} drew with no bins", mode);
    }
}

#[test]
fn analysed_tone_lights_up_the_canvas() {
    let (tx, sampler) = create_audio_pipeline(AnalyserSettings::default()).unwrap();
    let rate = 44_100.0f32;
    let window: Vec<f32> = (0..256)
        .map(|n| 0.5 * (std::f32::consts::TAU * 1000.0 * n as f32 / rate).sin())
        .collect();
    tx.send(Arc::new(window)).unwrap();

    let mut sched = scheduler(sampler, RenderMode::Bars, "neon");
    let mut canvas = Canvas::new(256, 256);
    sched.render_frame(&mut canvas, 0.0);

    let frame = sched.last_frame();
    let peak = frame
        .iter()
        .enumerate()
        .max_by_key(|(_, v)| **v)
        .map(|(i, _)| i)
        .unwrap();
    assert!((4..=8).contains(&peak), "peak at bin {}", peak);

    let background = sched.state().theme.background;
    let bar_x = peak * 6 + 2;
    assert_ne!(canvas.get_pixel(bar_x, 250), background);
    assert_eq!(canvas.get_pixel(250, 2), background);
}

#[test]
fn every_mode_rasterizes_with_all_overlays() {
    let mut sched = scheduler(FixedSampler::flat(128, 220), RenderMode::Bars, "rainbow");
    sched.apply(ControlEvent::ToggleParticles);
    sched.apply(ControlEvent::ToggleBackgroundPattern);
    let mut canvas = Canvas::new(160, 120);
    for mode in RenderMode::all() {
        sched.apply(ControlEvent::SelectMode(*mode));
        for frame in 0..10 {
            sched.render_frame(&mut canvas, frame as f32 / 30.0);
        }
    }
    assert_eq!(sched.frames_rendered(), 40);
    assert!(sched.particle_count() > 0);
}
