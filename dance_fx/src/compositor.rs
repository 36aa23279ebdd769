//! Per-frame effects: turns a [`PoseAnalysis`] into particles, trails and
//! a pulsing background, then draws them in a fixed layer order.
//!
//! ```text
//! background fill → rings → skeleton → trails → particles
//! ```

use pose_stream::{BodyPoint, GestureLabel, GestureSet, KeypointSnapshot, Point, PoseAnalysis};

use crate::color::{Palette, Rgb};
use crate::config::EffectsConfig;
use crate::particle::{ParticleSystem, EXPLOSION_COUNT, FIREWORKS_COUNT, LINE_COUNT};
use crate::surface::Surface;
use crate::trail::TrailTracker;

// Background
const INTENSITY_PER_ENERGY: f32 = 20.0;
const MAX_INTENSITY:        f32 = 255.0;
const RING_THRESHOLD:       f32 = 30.0;
const RING_COUNT:           i32 = 3;
const RING_SPACING:         i32 = 50;
const RING_FADE:            f32 = 30.0;
const RING_WIDTH:           i32 = 2;

const SKELETON_COLOR:       Rgb = Rgb::new(90, 90, 120);
const SKELETON_WIDTH:       i32 = 2;

/// Bones drawn when the skeleton layer is on.
pub const BONES: [(BodyPoint, BodyPoint); 12] = [
    (BodyPoint::LeftShoulder,  BodyPoint::RightShoulder),
    (BodyPoint::LeftShoulder,  BodyPoint::LeftElbow),
    (BodyPoint::LeftElbow,     BodyPoint::LeftWrist),
    (BodyPoint::RightShoulder, BodyPoint::RightElbow),
    (BodyPoint::RightElbow,    BodyPoint::RightWrist),
    (BodyPoint::LeftShoulder,  BodyPoint::LeftHip),
    (BodyPoint::RightShoulder, BodyPoint::RightHip),
    (BodyPoint::LeftHip,       BodyPoint::RightHip),
    (BodyPoint::LeftHip,       BodyPoint::LeftKnee),
    (BodyPoint::LeftKnee,      BodyPoint::LeftAnkle),
    (BodyPoint::RightHip,      BodyPoint::RightKnee),
    (BodyPoint::RightKnee,     BodyPoint::RightAnkle),
];

/// Owns every effect layer.  Settings are borrowed per call, never stored.
#[derive(Debug)]
pub struct EffectsCompositor {
    particles:  ParticleSystem,
    trails:     TrailTracker,
    intensity:  f32,
    energy:     f32,
    gestures:   GestureSet,
    latest:     KeypointSnapshot,
}

impl EffectsCompositor {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_particles(ParticleSystem::new(width, height))
    }

    pub fn with_seed(width: usize, height: usize, seed: u64) -> Self {
        Self::with_particles(ParticleSystem::with_seed(width, height, seed))
    }

    fn with_particles(particles: ParticleSystem) -> Self {
        EffectsCompositor {
            particles,
            trails:    TrailTracker::default(),
            intensity: 0.0,
            energy:    0.0,
            gestures:  GestureSet::new(),
            latest:    KeypointSnapshot::empty(),
        }
    }

    pub fn particles(&self) -> &ParticleSystem   { &self.particles }
    pub fn trails(&self) -> &TrailTracker        { &self.trails }
    /// Background intensity, 0–255.
    pub fn intensity(&self) -> f32               { self.intensity }
    /// Energy after the sensitivity scale, as of the last update.
    pub fn energy(&self) -> f32                  { self.energy }
    pub fn gestures(&self) -> GestureSet         { self.gestures }

    /// Drop every particle and trail point.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.trails.clear();
        self.intensity = 0.0;
        self.energy    = 0.0;
        self.gestures  = GestureSet::new();
        self.latest    = KeypointSnapshot::empty();
    }

    /// Advance all effects by one tick.
    pub fn update(&mut self, analysis: &PoseAnalysis, cfg: &EffectsConfig) {
        if self.trails.capacity() != cfg.trail_length {
            self.trails.set_capacity(cfg.trail_length);
        }

        let kp = &analysis.keypoints;
        self.energy    = cfg.effective_energy(analysis.movement_energy);
        self.intensity = (self.energy * INTENSITY_PER_ENERGY).min(MAX_INTENSITY);
        self.gestures  = analysis.gestures;

        if cfg.gesture_detection {
            self.spawn_gestures(kp, analysis.gestures, cfg);
        }

        let ambient = cfg.color_scheme.resolve(Palette::for_energy(self.energy));
        self.particles.spawn_ambient(kp, self.energy, ambient);

        self.particles.update();
        self.trails.update(kp);
        self.latest = kp.clone();
    }

    fn spawn_gestures(&mut self, kp: &KeypointSnapshot, gestures: GestureSet, cfg: &EffectsConfig) {
        let scheme = cfg.color_scheme;

        if gestures.contains(GestureLabel::HandsUp) {
            let palette = scheme.resolve(Palette::Energetic);
            for wrist in BodyPoint::HANDS {
                if let Some(p) = kp.get(wrist) {
                    self.particles.spawn_explosion(p, palette, cfg.scaled_count(EXPLOSION_COUNT));
                }
            }
        }

        if gestures.contains(GestureLabel::ArmsWide) {
            if let (Some(l), Some(r)) = (kp.get(BodyPoint::LeftWrist), kp.get(BodyPoint::RightWrist)) {
                let palette = scheme.resolve(Palette::Calm);
                self.particles.spawn_line(l, r, palette, cfg.scaled_count(LINE_COUNT));
            }
        }

        if gestures.contains(GestureLabel::Jump) {
            if let Some(hip) = kp.get(BodyPoint::HipCenter) {
                let palette = scheme.resolve(Palette::Energetic);
                self.particles.spawn_fireworks(hip, palette, cfg.scaled_count(FIREWORKS_COUNT));
            }
        }
    }

    /// Render every layer, bottom to top.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S, cfg: &EffectsConfig) {
        if cfg.background_effects {
            self.draw_background(surface, cfg);
        } else {
            surface.fill(Rgb::BLACK);
        }
        if cfg.show_skeleton {
            self.draw_skeleton(surface);
        }
        self.trails.draw(surface);
        self.particles.draw(surface);
    }

    fn draw_background<S: Surface + ?Sized>(&self, surface: &mut S, cfg: &EffectsConfig) {
        let i = self.intensity;
        surface.fill(Rgb::from_f32(i * 0.1, i * 0.05, i * 0.15));
        if i <= RING_THRESHOLD {
            return;
        }

        let (w, h) = surface.size();
        let center = Point::new(w as i32 / 2, h as i32 / 2);
        let gain = cfg.ring_gain();
        for n in 0..RING_COUNT {
            let alpha = (i - n as f32 * RING_FADE).max(0.0).trunc();
            if alpha <= 0.0 {
                continue;
            }
            let radius = (i * 2.0) as i32 + n * RING_SPACING;
            let color = Rgb::from_f32(
                (alpha / 3.0).trunc() * gain,
                (alpha / 6.0).trunc() * gain,
                (alpha / 2.0).trunc() * gain,
            );
            surface.stroke_circle(center, radius, RING_WIDTH, color);
        }
    }

    fn draw_skeleton<S: Surface + ?Sized>(&self, surface: &mut S) {
        for (a, b) in BONES {
            if let (Some(pa), Some(pb)) = (self.latest.get(a), self.latest.get(b)) {
                surface.draw_line(pa, pb, SKELETON_WIDTH, SKELETON_COLOR);
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
