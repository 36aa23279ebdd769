//! Tunable effect settings, presets, and their JSON file.
//!
//! [`EffectsConfig`] is passed by reference into the compositor every tick,
//! so a change made through [`EffectsConfig::apply`] takes effect on the
//! next frame without a restart.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::color::ColorScheme;

pub const DEFAULT_CONFIG_FILE: &str = "visualizer_config.json";

/// `particle_count` at which burst sizes are exactly their base counts.
pub const BASE_PARTICLE_COUNT: u32 = 50;
/// `sensitivity` at which energy passes through unscaled.
pub const BASE_SENSITIVITY:    f32 = 5.0;
/// `effect_intensity` at which ring brightness is unscaled.
pub const BASE_INTENSITY:      f32 = 0.7;

pub const PARTICLE_COUNT_RANGE:   (u32, u32)     = (10, 200);
pub const TRAIL_LENGTH_RANGE:     (usize, usize) = (2, 60);
pub const SENSITIVITY_RANGE:      (f32, f32)     = (1.0, 10.0);
pub const EFFECT_INTENSITY_RANGE: (f32, f32)     = (0.1, 1.0);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access settings file {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {}: {source}", path.display())]
    Json {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ════════════════════════════════════════════════════════════════════════════
// EffectsConfig
// ════════════════════════════════════════════════════════════════════════════

/// The settings record.  Missing keys take defaults, unknown keys are
/// ignored, out-of-range values are clamped on load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub particle_count:     u32,
    pub trail_length:       usize,
    pub sensitivity:        f32,
    pub color_scheme:       ColorScheme,
    pub background_effects: bool,
    pub gesture_detection:  bool,
    pub show_skeleton:      bool,
    pub effect_intensity:   f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        EffectsConfig {
            particle_count:     BASE_PARTICLE_COUNT,
            trail_length:       15,
            sensitivity:        BASE_SENSITIVITY,
            color_scheme:       ColorScheme::Energetic,
            background_effects: true,
            gesture_detection:  true,
            show_skeleton:      true,
            effect_intensity:   BASE_INTENSITY,
        }
    }
}

fn clamp_f32(v: f32, (lo, hi): (f32, f32), fallback: f32) -> f32 {
    if v.is_finite() { v.clamp(lo, hi) } else { fallback }
}

impl EffectsConfig {
    /// Pull every numeric option into its control range.
    pub fn sanitized(mut self) -> Self {
        let d = EffectsConfig::default();
        self.particle_count   = self.particle_count.clamp(PARTICLE_COUNT_RANGE.0, PARTICLE_COUNT_RANGE.1);
        self.trail_length     = self.trail_length.clamp(TRAIL_LENGTH_RANGE.0, TRAIL_LENGTH_RANGE.1);
        self.sensitivity      = clamp_f32(self.sensitivity, SENSITIVITY_RANGE, d.sensitivity);
        self.effect_intensity = clamp_f32(self.effect_intensity, EFFECT_INTENSITY_RANGE, d.effect_intensity);
        self
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<EffectsConfig>(text).map(EffectsConfig::sanitized)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let cfg = Self::from_json(&text)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
        debug!(path = %path.display(), "settings loaded");
        Ok(cfg)
    }

    /// Load `path`, falling back to defaults when it is missing or corrupt.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(error = %e, "falling back to default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
        fs::write(path, text + "\n")
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Apply one change, clamping it like a loaded value.
    pub fn apply(&mut self, update: ConfigUpdate) {
        match update {
            ConfigUpdate::ParticleCount(n)     => self.particle_count = n,
            ConfigUpdate::TrailLength(n)       => self.trail_length = n,
            ConfigUpdate::Sensitivity(s)       => self.sensitivity = s,
            ConfigUpdate::ColorScheme(c)       => self.color_scheme = c,
            ConfigUpdate::BackgroundEffects(b) => self.background_effects = b,
            ConfigUpdate::GestureDetection(b)  => self.gesture_detection = b,
            ConfigUpdate::ShowSkeleton(b)      => self.show_skeleton = b,
            ConfigUpdate::EffectIntensity(v)   => self.effect_intensity = v,
            ConfigUpdate::ApplyPreset(p)       => p.apply_to(self),
        }
        *self = std::mem::take(self).sanitized();
        debug!(?update, "settings changed");
    }

    /// Burst size multiplier from `particle_count`.
    pub fn count_multiplier(&self) -> f32 {
        self.particle_count as f32 / BASE_PARTICLE_COUNT as f32
    }

    /// `base` particles scaled by [`count_multiplier`](Self::count_multiplier), rounded.
    pub fn scaled_count(&self, base: usize) -> usize {
        (base as f32 * self.count_multiplier()).round() as usize
    }

    /// Energy after the sensitivity scale, capped at 10.
    pub fn effective_energy(&self, energy: f32) -> f32 {
        let e = energy * self.sensitivity / BASE_SENSITIVITY;
        if e.is_finite() { e.clamp(0.0, 10.0) } else { 0.0 }
    }

    /// Ring brightness factor from `effect_intensity`.
    pub fn ring_gain(&self) -> f32 {
        self.effect_intensity / BASE_INTENSITY
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Presets
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    Calm,
    Energetic,
    Party,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Calm, Preset::Energetic, Preset::Party];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Calm      => "calm",
            Preset::Energetic => "energetic",
            Preset::Party     => "party",
        }
    }

    /// Overwrite the five preset-controlled options; the toggles are kept.
    pub fn apply_to(self, cfg: &mut EffectsConfig) {
        let (count, trail, sensitivity, scheme, intensity) = match self {
            Preset::Calm      => (30,  25, 3.0, ColorScheme::Calm,      0.5),
            Preset::Energetic => (80,  12, 7.0, ColorScheme::Energetic, 0.8),
            Preset::Party     => (150, 15, 9.0, ColorScheme::Rainbow,   1.0),
        };
        cfg.particle_count   = count;
        cfg.trail_length     = trail;
        cfg.sensitivity      = sensitivity;
        cfg.color_scheme     = scheme;
        cfg.effect_intensity = intensity;
    }

    pub fn config(self) -> EffectsConfig {
        let mut cfg = EffectsConfig::default();
        self.apply_to(&mut cfg);
        cfg
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown preset '{}'", s))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ConfigUpdate
// ════════════════════════════════════════════════════════════════════════════

/// A single settings change from the control client or the keyboard.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigUpdate {
    ParticleCount(u32),
    TrailLength(usize),
    Sensitivity(f32),
    ColorScheme(ColorScheme),
    BackgroundEffects(bool),
    GestureDetection(bool),
    ShowSkeleton(bool),
    EffectIntensity(f32),
    ApplyPreset(Preset),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = EffectsConfig::default();
        assert_eq!(c.particle_count, 50);
        assert_eq!(c.trail_length, 15);
        assert_eq!(c.sensitivity, 5.0);
        assert_eq!(c.color_scheme, ColorScheme::Energetic);
        assert!(c.background_effects && c.gesture_detection && c.show_skeleton);
        assert_eq!(c.effect_intensity, 0.7);
        assert_eq!(c.scaled_count(15), 15);
        assert_eq!(c.effective_energy(4.0), 4.0);
        assert_eq!(c.ring_gain(), 1.0);
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let mut cfg = Preset::Party.config();
        cfg.show_skeleton = false;
        cfg.save(&path).unwrap();
        assert_eq!(EffectsConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn missing_and_unknown_keys() {
        let cfg = EffectsConfig::from_json(r#"{"particle_count": 80, "mood": "sunny"}"#).unwrap();
        assert_eq!(cfg.particle_count, 80);
        assert_eq!(cfg.trail_length, 15);
    }

    #[test]
    fn out_of_range_values_clamped() {
        let cfg = EffectsConfig::from_json(
            r#"{"particle_count": 5000, "trail_length": 0, "sensitivity": -3, "effect_intensity": 9}"#,
        )
        .unwrap();
        assert_eq!(cfg.particle_count, 200);
        assert_eq!(cfg.trail_length, 2);
        assert_eq!(cfg.sensitivity, 1.0);
        assert_eq!(cfg.effect_intensity, 1.0);
    }

    #[test]
    fn corrupt_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(EffectsConfig::load(&path), Err(ConfigError::Json { .. })));
        assert_eq!(EffectsConfig::load_or_default(&path), EffectsConfig::default());
        assert_eq!(EffectsConfig::load_or_default(&dir.path().join("absent.json")), EffectsConfig::default());
    }

    #[test]
    fn apply_clamps_and_presets_keep_toggles() {
        let mut cfg = EffectsConfig::default();
        cfg.apply(ConfigUpdate::Sensitivity(f32::NAN));
        assert_eq!(cfg.sensitivity, 5.0);
        cfg.apply(ConfigUpdate::ParticleCount(1));
        assert_eq!(cfg.particle_count, 10);
        cfg.apply(ConfigUpdate::BackgroundEffects(false));
        cfg.apply(ConfigUpdate::ApplyPreset(Preset::Calm));
        assert_eq!(cfg.particle_count, 30);
        assert_eq!(cfg.trail_length, 25);
        assert_eq!(cfg.color_scheme, ColorScheme::Calm);
        assert!(!cfg.background_effects);
    }

    #[test]
    fn sensitivity_scales_energy() {
        let mut cfg = EffectsConfig::default();
        cfg.apply(ConfigUpdate::Sensitivity(10.0));
        assert_eq!(cfg.effective_energy(3.0), 6.0);
        assert_eq!(cfg.effective_energy(8.0), 10.0);
        cfg.apply(ConfigUpdate::ParticleCount(150));
        assert_eq!(cfg.scaled_count(15), 45);
    }
}
