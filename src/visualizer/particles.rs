//! Bass-triggered particle overlay.
//!
//! Particles rise from the bottom edge when low-frequency energy is high,
//! fall back under gravity and fade out. The system exclusively owns its live
//! set; callers only update, draw or clear it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::audio::band_mean;
use crate::color::Theme;
use crate::renderer::{Paint, Surface};

/// Downward acceleration per tick, in pixels
pub const GRAVITY: f32 = 0.1;
/// Bins averaged for the spawn trigger
pub const BASS_BINS: usize = 8;
/// Bass level (0-255) that must be exceeded before anything spawns
pub const BASS_THRESHOLD: f32 = 100.0;
/// Chance of a burst on a frame above the threshold
pub const SPAWN_PROBABILITY: f64 = 0.3;
/// Upper bound on the live set
pub const MAX_PARTICLES: usize = 512;

const DECAY_RANGE: (f32, f32) = (0.01, 0.02);
const MAX_SPEED: f32 = 2.0;
/// Absorbs f32 drift so that `n` ticks of `1/n` decay kill a particle exactly.
const LIFE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// 1.0 when spawned, dead at 0.0
    pub life: f32,
    pub decay: f32,
    pub base_size: f32,
}

impl Particle {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, base_size: f32, decay: f32) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            life: 1.0,
            decay,
            base_size,
        }
    }

    /// Integrate one frame.
    pub fn tick(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        self.vy += GRAVITY;
        self.life -= self.decay;
    }

    /// Alive while life is above a small epsilon rather than zero, so that
    /// accumulated f32 error cannot keep a particle around for an extra tick.
    pub fn is_alive(&self) -> bool {
        self.life > LIFE_EPSILON
    }

    pub fn size(&self) -> f32 {
        self.base_size * self.life.max(0.0)
    }
}

/// Number of particles in one burst for a given bass level.
pub fn burst_size(bass: f32) -> usize {
    (bass / 255.0 * 5.0).floor() as usize + 1
}

pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: StdRng,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic system for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            particles: Vec::with_capacity(MAX_PARTICLES),
            rng,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Drop every particle immediately.
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Insert a particle directly, subject to the size cap.
    pub fn push(&mut self, particle: Particle) -> bool {
        if self.particles.len() >= MAX_PARTICLES {
            return false;
        }
        self.particles.push(particle);
        true
    }

    /// One frame: maybe spawn from bass energy, integrate, remove the dead.
    /// Returns the number of particles spawned.
    pub fn update(&mut self, bins: &[u8], width: f32, height: f32) -> usize {
        let bass = band_mean(bins, 0, BASS_BINS);
        let spawned = if bass > BASS_THRESHOLD && self.rng.gen_bool(SPAWN_PROBABILITY) {
            self.spawn_burst(bass, width, height)
        } else {
            0
        };

        for particle in &mut self.particles {
            particle.tick();
        }
        self.particles.retain(Particle::is_alive);
        spawned
    }

    fn spawn_burst(&mut self, bass: f32, width: f32, height: f32) -> usize {
        let count = burst_size(bass).min(MAX_PARTICLES - self.particles.len());
        let base_size = 2.0 + bass / 255.0 * 6.0;

        for _ in 0..count {
            let x = if width > 0.0 {
                self.rng.gen_range(0.0..width)
            } else {
                0.0
            };
            let vx = self.rng.gen_range(-MAX_SPEED..=MAX_SPEED);
            let vy = self.rng.gen_range(-MAX_SPEED..=MAX_SPEED);
            let decay = self.rng.gen_range(DECAY_RANGE.0..DECAY_RANGE.1);
            self.particles
                .push(Particle::new(x, height, vx, vy, base_size, decay));
        }
        count
    }

    /// Glow disc plus solid core in the theme primary, faded by life.
    pub fn draw(&self, surface: &mut dyn Surface, theme: &Theme) {
        for particle in self.particles.iter().filter(|p| p.is_alive()) {
            let size = particle.size();
            if size <= 0.0 {
                continue;
            }
            let glow = Paint::Radial {
                center: (particle.x, particle.y),
                r0: 0.0,
                r1: size * 2.0,
                stops: vec![
                    (0.0, theme.primary.alpha(particle.life * 0.5)),
                    (1.0, theme.primary.alpha(0.0)),
                ],
            };
            surface.fill_circle(particle.x, particle.y, size * 2.0, &glow, None);
            surface.fill_circle(
                particle.x,
                particle.y,
                size,
                &Paint::Solid(theme.primary.alpha(particle.life)),
                None,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ThemeRegistry;
    use crate::renderer::Recorder;

    #[test]
    fn fixed_decay_dies_after_exactly_100_ticks() {
        let mut particle = Particle::new(0.0, 0.0, 0.0, 0.0, 4.0, 0.01);
        let mut last = particle.life;
        for tick in 1..=100 {
            particle.tick();
            assert!(particle.life < last, "life must strictly decrease");
            last = particle.life;
            if tick < 100 {
                assert!(particle.is_alive(), "died early at tick {}", tick);
            }
        }
        assert!(!particle.is_alive());
    }

    #[test]
    fn gravity_bends_the_path() {
        let mut particle = Particle::new(10.0, 100.0, 1.0, -2.0, 4.0, 0.01);
        particle.tick();
        assert_eq!((particle.x, particle.y), (11.0, 98.0));
        assert!((particle.vy - (-1.9)).abs() < 1e-6);
        particle.tick();
        assert!((particle.y - 96.1).abs() < 1e-4);
    }

    #[test]
    fn size_follows_life() {
        let mut particle = Particle::new(0.0, 0.0, 0.0, 0.0, 8.0, 0.25);
        particle.tick();
        assert_eq!(particle.size(), 6.0);
    }

    #[test]
    fn burst_size_scales_with_bass() {
        assert_eq!(burst_size(101.0), 2);
        assert_eq!(burst_size(204.0), 5);
        assert_eq!(burst_size(255.0), 6);
    }

    #[test]
    fn quiet_bass_never_spawns() {
        let mut system = ParticleSystem::with_seed(7);
        let bins = [100u8; 128];
        for _ in 0..500 {
            assert_eq!(system.update(&bins, 640.0, 480.0), 0);
        }
        assert!(system.is_empty());
    }

    #[test]
    fn bursts_start_on_the_bottom_edge_with_bounded_motion() {
        let mut system = ParticleSystem::with_seed(42);
        for _ in 0..40 {
            system.clear();
            assert_eq!(system.spawn_burst(204.0, 640.0, 480.0), 5);
            for p in system.particles() {
                assert_eq!(p.y, 480.0);
                assert!((0.0..640.0).contains(&p.x), "x {}", p.x);
                assert!((-MAX_SPEED..=MAX_SPEED).contains(&p.vx), "vx {}", p.vx);
                assert!((-MAX_SPEED..=MAX_SPEED).contains(&p.vy), "vy {}", p.vy);
                assert!((0.01..0.02).contains(&p.decay), "decay {}", p.decay);
                assert!((p.base_size - 6.8).abs() < 1e-5, "size {}", p.base_size);
                assert_eq!(p.life, 1.0);
            }
        }
    }

    #[test]
    fn loud_bass_spawns_at_the_bottom_edge() {
        let mut system = ParticleSystem::with_seed(42);
        let bins = [255u8; 128];
        let mut spawned = 0;
        for _ in 0..50 {
            spawned = system.update(&bins, 640.0, 480.0);
            if spawned > 0 {
                break;
            }
        }
        assert_eq!(spawned, 6);
        assert_eq!(system.len(), 6);
        // Each particle has been ticked once since it spawned.
        for p in system.particles() {
            let start_vy = p.vy - GRAVITY;
            assert!((p.y - (480.0 + start_vy)).abs() < 1e-3, "y {}", p.y);
            assert!(start_vy.abs() <= MAX_SPEED + 1e-5, "vy {}", start_vy);
            assert!((p.life - (1.0 - p.decay)).abs() < 1e-6);
            assert!((p.base_size - 8.0).abs() < 1e-5);
        }
    }

    #[test]
    fn population_is_capped() {
        let mut system = ParticleSystem::with_seed(1);
        for _ in 0..MAX_PARTICLES {
            assert!(system.push(Particle::new(0.0, 0.0, 0.0, 0.0, 1.0, 0.0001)));
        }
        assert!(!system.push(Particle::new(0.0, 0.0, 0.0, 0.0, 1.0, 0.0001)));
        system.update(&[255u8; 8], 100.0, 100.0);
        assert!(system.len() <= MAX_PARTICLES);
    }

    #[test]
    fn clear_empties_immediately() {
        let mut system = ParticleSystem::with_seed(3);
        system.push(Particle::new(1.0, 1.0, 0.0, 0.0, 2.0, 0.01));
        system.clear();
        assert!(system.is_empty());
    }

    #[test]
    fn draw_uses_primary_with_life_as_alpha() {
        let theme = ThemeRegistry::default().resolve("neon").unwrap();
        let mut system = ParticleSystem::with_seed(3);
        system.push(Particle::new(5.0, 5.0, 0.0, 0.0, 4.0, 0.5));
        system.update(&[], 10.0, 10.0);

        let mut rec = Recorder::new(10, 10);
        system.draw(&mut rec, &theme);
        let circles: Vec<_> = rec.filled_circles().collect();
        assert_eq!(circles.len(), 2);
        assert_eq!(circles[1].0, 2.0);
        assert_eq!(*circles[1].1, Paint::Solid(theme.primary.alpha(0.5)));
    }

    #[test]
    fn dead_particles_are_removed_on_update() {
        let mut system = ParticleSystem::with_seed(3);
        system.push(Particle::new(5.0, 5.0, 0.0, 0.0, 4.0, 1.0));
        system.update(&[], 10.0, 10.0);
        assert!(system.is_empty());
    }
}
