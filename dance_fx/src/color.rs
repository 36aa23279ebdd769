//! Colors, palettes and the user-selectable color scheme.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Rgb
// ════════════════════════════════════════════════════════════════════════════

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Multiply every channel by `f` (clamped to 0.0–1.0), truncating.
    pub fn scale(self, f: f32) -> Rgb {
        let f = if f.is_finite() { f.clamp(0.0, 1.0) } else { 0.0 };
        let ch = |c: u8| (c as f32 * f) as u8;
        Rgb::new(ch(self.r), ch(self.g), ch(self.b))
    }

    /// Build from float channels, clamping each into 0–255.
    pub fn from_f32(r: f32, g: f32, b: f32) -> Rgb {
        let ch = |c: f32| if c.is_finite() { c.clamp(0.0, 255.0) as u8 } else { 0 };
        Rgb::new(ch(r), ch(g), ch(b))
    }

    /// Packed 0xAARRGGBB with opaque alpha, as minifb expects.
    pub fn to_argb(self) -> u32 {
        0xFF000000 | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub fn from_argb(c: u32) -> Rgb {
        Rgb::new((c >> 16) as u8, (c >> 8) as u8, c as u8)
    }

    /// Linear blend. `t` = 0.0 → all `self`, `t` = 1.0 → all `other`.
    pub fn blend(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t) as u8;
        Rgb::new(lerp(self.r, other.r), lerp(self.g, other.g), lerp(self.b, other.b))
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb::new(r, g, b)
    }
}

/// Convert HSV (hue in degrees, s/v in 0–1) to RGB.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let h  = h.rem_euclid(360.0);
    let hi = (h / 60.0) as u32;
    let f  = h / 60.0 - hi as f32;
    let p  = v * (1.0 - s);
    let q  = v * (1.0 - s * f);
    let t  = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match hi {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgb::from_f32(r * 255.0, g * 255.0, b * 255.0)
}

// ════════════════════════════════════════════════════════════════════════════
// Palette
// ════════════════════════════════════════════════════════════════════════════

pub const CALM_COLORS: [Rgb; 3] = [
    Rgb::new(100, 150, 255),
    Rgb::new(150, 200, 255),
    Rgb::new(200, 220, 255),
];

pub const ENERGETIC_COLORS: [Rgb; 3] = [
    Rgb::new(255, 100, 100),
    Rgb::new(255, 150, 50),
    Rgb::new(255, 200, 0),
];

pub const NEUTRAL_COLORS: [Rgb; 3] = [
    Rgb::new(150, 150, 150),
    Rgb::new(200, 200, 200),
    Rgb::new(255, 255, 255),
];

pub const NEON_COLORS: [Rgb; 3] = [
    Rgb::new(57, 255, 20),
    Rgb::new(255, 20, 147),
    Rgb::new(0, 255, 255),
];

/// A set of colors that spawned particles draw from uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Palette {
    Calm,
    Energetic,
    Neutral,
    Neon,
    /// Any fully-saturated hue.
    Rainbow,
}

impl Palette {
    /// Energy-reactive choice: calm below 2, energetic above 6, neutral
    /// in between.
    pub fn for_energy(energy: f32) -> Palette {
        if energy < 2.0 {
            Palette::Calm
        } else if energy > 6.0 {
            Palette::Energetic
        } else {
            Palette::Neutral
        }
    }

    /// Fixed colors, or `None` for the continuous rainbow.
    pub fn colors(self) -> Option<&'static [Rgb; 3]> {
        match self {
            Palette::Calm      => Some(&CALM_COLORS),
            Palette::Energetic => Some(&ENERGETIC_COLORS),
            Palette::Neutral   => Some(&NEUTRAL_COLORS),
            Palette::Neon      => Some(&NEON_COLORS),
            Palette::Rainbow   => None,
        }
    }

    pub fn pick<R: Rng + ?Sized>(self, rng: &mut R) -> Rgb {
        match self.colors() {
            Some(colors) => colors[rng.gen_range(0..colors.len())],
            None         => hsv_to_rgb(rng.gen_range(0.0..360.0), 0.85, 1.0),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ColorScheme: user setting
// ════════════════════════════════════════════════════════════════════════════

/// Color scheme setting.
///
/// `Energetic` is the default and keeps the built-in palettes: the ambient
/// palette follows movement energy and each burst keeps its own colors.
/// Every other scheme forces one palette onto all particles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Energetic,
    Calm,
    Neutral,
    Rainbow,
    Neon,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 5] = [
        ColorScheme::Energetic,
        ColorScheme::Calm,
        ColorScheme::Neutral,
        ColorScheme::Rainbow,
        ColorScheme::Neon,
    ];

    /// The palette to spawn with, given the one the effect would use by
    /// default.
    pub fn resolve(self, builtin: Palette) -> Palette {
        match self {
            ColorScheme::Energetic => builtin,
            ColorScheme::Calm      => Palette::Calm,
            ColorScheme::Neutral   => Palette::Neutral,
            ColorScheme::Rainbow   => Palette::Rainbow,
            ColorScheme::Neon      => Palette::Neon,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorScheme::Energetic => "energetic",
            ColorScheme::Calm      => "calm",
            ColorScheme::Neutral   => "neutral",
            ColorScheme::Rainbow   => "rainbow",
            ColorScheme::Neon      => "neon",
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorScheme::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown color scheme '{}'", s))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn palette_energy_bands() {
        assert_eq!(Palette::for_energy(0.0), Palette::Calm);
        assert_eq!(Palette::for_energy(1.99), Palette::Calm);
        assert_eq!(Palette::for_energy(2.0), Palette::Neutral);
        assert_eq!(Palette::for_energy(6.0), Palette::Neutral);
        assert_eq!(Palette::for_energy(6.01), Palette::Energetic);
    }

    #[test]
    fn pick_stays_in_palette() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let c = Palette::Calm.pick(&mut rng);
            assert!(CALM_COLORS.contains(&c));
        }
    }

    #[test]
    fn scale_fades_toward_black() {
        let c = Rgb::new(200, 100, 50);
        assert_eq!(c.scale(0.5), Rgb::new(100, 50, 25));
        assert_eq!(c.scale(-1.0), Rgb::BLACK);
        assert_eq!(c.scale(f32::NAN), Rgb::BLACK);
        assert_eq!(c.scale(2.0), c);
    }

    #[test]
    fn argb_roundtrip_and_opaque() {
        let c = Rgb::new(1, 2, 3);
        assert_eq!(c.to_argb() >> 24, 0xFF);
        assert_eq!(Rgb::from_argb(c.to_argb()), c);
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Rgb::new(255, 0, 0));
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), Rgb::new(0, 255, 0));
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), Rgb::new(0, 0, 255));
    }

    #[test]
    fn scheme_resolution() {
        assert_eq!(ColorScheme::Energetic.resolve(Palette::Calm), Palette::Calm);
        assert_eq!(ColorScheme::Neon.resolve(Palette::Calm), Palette::Neon);
        assert_eq!("Rainbow".parse::<ColorScheme>(), Ok(ColorScheme::Rainbow));
        assert!("plaid".parse::<ColorScheme>().is_err());
    }
}
