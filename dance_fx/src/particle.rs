//! Particle lifecycle: spawning, per-tick physics, pruning and drawing.
//!
//! All physics constants are per tick, not per second.  The driver is
//! expected to tick at a roughly constant rate (30 fps by default).

use std::collections::VecDeque;
use std::f32::consts::TAU;

use pose_stream::{BodyPoint, KeypointSnapshot, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::color::{Palette, Rgb};
use crate::surface::Surface;

pub const GRAVITY:          f32   = 0.1;   // px / tick²
pub const LIFE_DECAY:       f32   = 0.02;  // life units / tick
pub const OFFSCREEN_MARGIN: f32   = 50.0;  // px below the bottom edge
/// Hard cap on the live population; the oldest particles go first.
pub const MAX_PARTICLES:    usize = 4000;

pub const EXPLOSION_COUNT:  usize = 15;
pub const LINE_COUNT:       usize = 10;
pub const FIREWORKS_COUNT:  usize = 25;
/// Fireworks burst this far above the hip centre.
pub const FIREWORKS_LIFT:   i32   = 100;

// ════════════════════════════════════════════════════════════════════════════
// Particle
// ════════════════════════════════════════════════════════════════════════════

/// A single short-lived point visual.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x:        f32,
    pub y:        f32,
    pub vx:       f32,
    pub vy:       f32,
    /// Current (faded) color.
    pub color:    Rgb,
    /// Remaining life; starts at `max_life`, reaches 0 at death.
    pub life:     f32,
    pub max_life: f32,
    /// Radius in pixels.
    pub size:     f32,
    age:          u32,
}

impl Particle {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, color: Rgb, life: f32, size: f32) -> Self {
        let life = if life.is_finite() { life.max(0.0) } else { 0.0 };
        Particle { x, y, vx, vy, color, life, max_life: life, size, age: 0 }
    }

    /// Advance one tick: move, apply gravity, decay life, fade color.
    ///
    /// Life is recomputed from the tick count so that a particle with life
    /// 1.0 reaches exactly zero on its 50th tick.
    pub fn update(&mut self) {
        self.x  += self.vx;
        self.y  += self.vy;
        self.vy += GRAVITY;
        self.age += 1;
        self.life = self.max_life - self.age as f32 * LIFE_DECAY;
        // Compounding fade; Rgb::scale clamps the ratio so this never brightens.
        let alpha = if self.max_life > 0.0 { self.life / self.max_life } else { 0.0 };
        self.color = self.color.scale(alpha);
    }

    pub fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    /// Past the bottom edge of a canvas `height` pixels tall.
    pub fn is_offscreen(&self, height: f32) -> bool {
        self.y > height + OFFSCREEN_MARGIN
    }

    /// Rounded screen position.
    pub fn position(&self) -> Point {
        Point::new(self.x.round() as i32, self.y.round() as i32)
    }

    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        if self.life > 0.0 {
            surface.fill_circle(self.position(), self.size as i32, self.color);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Radial burst parameters
// ════════════════════════════════════════════════════════════════════════════

/// Uniform ranges for a radial burst.
#[derive(Clone, Copy, Debug)]
struct Burst {
    speed: (f32, f32),
    life:  (f32, f32),
    size:  (f32, f32),
}

const EXPLOSION: Burst = Burst { speed: (3.0, 8.0),  life: (1.0, 2.0), size: (3.0, 6.0) };
const FIREWORKS: Burst = Burst { speed: (5.0, 12.0), life: (1.5, 2.5), size: (4.0, 7.0) };

// ════════════════════════════════════════════════════════════════════════════
// ParticleSystem
// ════════════════════════════════════════════════════════════════════════════

/// Owns the live particle population for a `width × height` canvas.
#[derive(Debug)]
pub struct ParticleSystem {
    particles: VecDeque<Particle>,
    width:     f32,
    height:    f32,
    capacity:  usize,
    rng:       StdRng,
}

impl ParticleSystem {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_rng(width, height, StdRng::from_entropy())
    }

    /// Deterministic spawns, for replays and tests.
    pub fn with_seed(width: usize, height: usize, seed: u64) -> Self {
        Self::with_rng(width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(width: usize, height: usize, rng: StdRng) -> Self {
        ParticleSystem {
            particles: VecDeque::new(),
            width:     width as f32,
            height:    height as f32,
            capacity:  MAX_PARTICLES,
            rng,
        }
    }

    /// Lower the population cap (mainly for tests).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width  = width as f32;
        self.height = height as f32;
    }

    pub fn len(&self) -> usize       { self.particles.len() }
    pub fn is_empty(&self) -> bool   { self.particles.is_empty() }
    pub fn width(&self) -> f32       { self.width }
    pub fn height(&self) -> f32      { self.height }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Insert a particle, evicting the oldest at the cap.
    pub fn push(&mut self, p: Particle) {
        if self.particles.len() >= self.capacity {
            self.particles.pop_front();
        }
        self.particles.push_back(p);
    }

    // ── spawns ────────────────────────────────────────────────────────────

    /// Ambient sparkle around each visible hand.
    ///
    /// Needs `energy >= 1`; each hand then spawns one particle with
    /// probability `energy / 10`.  Returns the number spawned.
    pub fn spawn_ambient(&mut self, keypoints: &KeypointSnapshot, energy: f32, palette: Palette) -> usize {
        if !(energy >= 1.0) {
            return 0;
        }
        let chance = energy / 10.0;
        let mut spawned = 0;
        for hand in BodyPoint::HANDS {
            let Some(p) = keypoints.get(hand) else { continue };
            if self.rng.gen_range(0.0..1.0) >= chance {
                continue;
            }
            let x = p.x + self.rng.gen_range(-10..=10);
            let y = p.y + self.rng.gen_range(-10..=10);
            let color = palette.pick(&mut self.rng);
            let particle = Particle::new(
                x as f32,
                y as f32,
                self.rng.gen_range(-2.0..=2.0),
                self.rng.gen_range(-3.0..=1.0),
                color,
                self.rng.gen_range(0.5..=1.5),
                self.rng.gen_range(2.0..=5.0),
            );
            self.push(particle);
            spawned += 1;
        }
        spawned
    }

    /// Radial explosion from one point (the `hands_up` effect).
    pub fn spawn_explosion(&mut self, at: Point, palette: Palette, count: usize) {
        self.spawn_burst(at, palette, count, EXPLOSION);
    }

    /// Particles strung evenly between two points (the `arms_wide` effect).
    /// Particle `i` sits at `t = i / count`, so the end point itself is not
    /// included.
    pub fn spawn_line(&mut self, from: Point, to: Point, palette: Palette, count: usize) {
        for i in 0..count {
            let t = i as f64 / count as f64;
            let x = (from.x as f64 * (1.0 - t) + to.x as f64 * t) as i32;
            let y = (from.y as f64 * (1.0 - t) + to.y as f64 * t) as i32;
            let color = palette.pick(&mut self.rng);
            let particle = Particle::new(
                x as f32,
                y as f32,
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-2.0..=0.0),
                color,
                self.rng.gen_range(0.8..=1.2),
                self.rng.gen_range(2.0..=4.0),
            );
            self.push(particle);
        }
    }

    /// Fireworks above the hips (the `jump` effect).
    pub fn spawn_fireworks(&mut self, hip_center: Point, palette: Palette, count: usize) {
        let at = Point::new(hip_center.x, hip_center.y - FIREWORKS_LIFT);
        self.spawn_burst(at, palette, count, FIREWORKS);
    }

    fn spawn_burst(&mut self, at: Point, palette: Palette, count: usize, burst: Burst) {
        for _ in 0..count {
            let angle = self.rng.gen_range(0.0..TAU);
            let speed = self.rng.gen_range(burst.speed.0..=burst.speed.1);
            let color = palette.pick(&mut self.rng);
            let particle = Particle::new(
                at.x as f32,
                at.y as f32,
                angle.cos() * speed,
                angle.sin() * speed,
                color,
                self.rng.gen_range(burst.life.0..=burst.life.1),
                self.rng.gen_range(burst.size.0..=burst.size.1),
            );
            self.push(particle);
        }
    }

    // ── per tick ──────────────────────────────────────────────────────────

    /// Advance every particle one tick and drop the dead and the fallen.
    /// Returns how many were removed.
    pub fn update(&mut self) -> usize {
        let before = self.particles.len();
        let height = self.height;
        for p in self.particles.iter_mut() {
            p.update();
        }
        self.particles.retain(|p| !p.is_dead() && !p.is_offscreen(height));
        before - self.particles.len()
    }

    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        for p in &self.particles {
            p.draw(surface);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
