//! Window, keyboard and debug overlay, using `minifb`.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ ENERGY 4.2  ▮▮▮▮▮▯▯▯▯▯                                         │
//! │ GESTURES HANDS_UP                                            │
//! │ PARTICLES 214  SCHEME ENERGETIC                              │
//! │                                                              │
//! │                    (effects canvas)                          │
//! │                                                              │
//! │ key legend                                                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The overlay is only drawn when toggled on (O).

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use pose_stream::{GestureSet, Point, MAX_ENERGY};
use tracing::debug;

use crate::color::{ColorScheme, Rgb};
use crate::config::{ConfigUpdate, EffectsConfig};
use crate::control::ControlCommand;
use crate::error::FxError;
use crate::source::SimMove;
use crate::surface::{Canvas, Surface};

pub const DEFAULT_WIDTH:  usize = 1280;
pub const DEFAULT_HEIGHT: usize = 720;
pub const DEFAULT_FPS:    u32   = 30;

const PARTICLE_STEP: u32   = 10;
const TRAIL_STEP:    usize = 1;

const HUD_TEXT:   Rgb = Rgb::new(0xEE, 0xEE, 0xEE);
const HUD_DIM:    Rgb = Rgb::new(0x88, 0x88, 0x88);
const HUD_ACCENT: Rgb = Rgb::new(0xFF, 0xD7, 0x00);
const HUD_SCALE:  i32 = 2;
const LINE_H:     i32 = 14;

// ════════════════════════════════════════════════════════════════════════════
// Key mapping
// ════════════════════════════════════════════════════════════════════════════

/// Keys that fire once per press.
const ONE_SHOT_KEYS: [Key; 17] = [
    Key::Q, Key::Escape, Key::O, Key::B, Key::G, Key::K, Key::P, Key::S,
    Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5,
    Key::H, Key::W, Key::J, Key::Space,
];

/// Keys that repeat while held.
const HELD_KEYS: [Key; 6] = [
    Key::Equal, Key::NumPadPlus, Key::Minus, Key::NumPadMinus,
    Key::LeftBracket, Key::RightBracket,
];

/// Translate a key press into a control command, given the current
/// settings (for toggles and steps) and whether effects are running.
pub fn key_command(key: Key, cfg: &EffectsConfig, running: bool) -> Option<ControlCommand> {
    use ControlCommand::Configure;
    let cmd = match key {
        Key::Q | Key::Escape => ControlCommand::Quit,
        Key::O => ControlCommand::ToggleOverlay,
        Key::S => ControlCommand::Save,
        Key::P => if running { ControlCommand::Stop } else { ControlCommand::Start },
        Key::B => Configure(ConfigUpdate::BackgroundEffects(!cfg.background_effects)),
        Key::G => Configure(ConfigUpdate::GestureDetection(!cfg.gesture_detection)),
        Key::K => Configure(ConfigUpdate::ShowSkeleton(!cfg.show_skeleton)),
        Key::Key1 => Configure(ConfigUpdate::ColorScheme(ColorScheme::ALL[0])),
        Key::Key2 => Configure(ConfigUpdate::ColorScheme(ColorScheme::ALL[1])),
        Key::Key3 => Configure(ConfigUpdate::ColorScheme(ColorScheme::ALL[2])),
        Key::Key4 => Configure(ConfigUpdate::ColorScheme(ColorScheme::ALL[3])),
        Key::Key5 => Configure(ConfigUpdate::ColorScheme(ColorScheme::ALL[4])),
        Key::Equal | Key::NumPadPlus =>
            Configure(ConfigUpdate::ParticleCount(cfg.particle_count.saturating_add(PARTICLE_STEP))),
        Key::Minus | Key::NumPadMinus =>
            Configure(ConfigUpdate::ParticleCount(cfg.particle_count.saturating_sub(PARTICLE_STEP))),
        Key::RightBracket => Configure(ConfigUpdate::TrailLength(cfg.trail_length + TRAIL_STEP)),
        Key::LeftBracket  => Configure(ConfigUpdate::TrailLength(cfg.trail_length.saturating_sub(TRAIL_STEP))),
        _ => return None,
    };
    Some(cmd)
}

/// Simulated-dancer moves.
pub fn key_move(key: Key) -> Option<SimMove> {
    match key {
        Key::H     => Some(SimMove::HandsUp),
        Key::W     => Some(SimMove::ArmsWide),
        Key::J     => Some(SimMove::Jump),
        Key::Space => Some(SimMove::Flourish),
        _ => None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay
// ════════════════════════════════════════════════════════════════════════════

/// What the debug overlay shows.
#[derive(Clone, Copy, Debug)]
pub struct Hud {
    pub energy:    f32,
    pub gestures:  GestureSet,
    pub particles: usize,
    pub scheme:    ColorScheme,
    pub running:   bool,
    /// Show the dancer-move keys too.
    pub simulated: bool,
}

pub fn draw_overlay<S: Surface + ?Sized>(surface: &mut S, hud: &Hud) {
    let (_, h) = surface.size();
    let x = 10;
    let mut y = 10;

    surface.draw_text(&format!("ENERGY {:.1}", hud.energy), x, y, HUD_SCALE, HUD_TEXT);
    // energy bar
    let bar_x = x + 120;
    let bar_w = 200;
    let fill  = (hud.energy / MAX_ENERGY).clamp(0.0, 1.0);
    surface.draw_line(Point::new(bar_x, y + 4), Point::new(bar_x + bar_w, y + 4), 6, HUD_DIM.scale(0.4));
    if fill > 0.0 {
        let end = bar_x + (bar_w as f32 * fill) as i32;
        surface.draw_line(Point::new(bar_x, y + 4), Point::new(end, y + 4), 6, HUD_ACCENT);
    }
    y += LINE_H;

    let gestures = if hud.gestures.is_empty() { "-".to_string() } else { hud.gestures.to_string() };
    surface.draw_text(&format!("GESTURES {}", gestures), x, y, HUD_SCALE, HUD_TEXT);
    y += LINE_H;

    let state = if hud.running { "" } else { "  PAUSED" };
    surface.draw_text(
        &format!("PARTICLES {}  SCHEME {}{}", hud.particles, hud.scheme, state),
        x, y, HUD_SCALE, HUD_TEXT,
    );

    let bottom = h as i32 - 2 * LINE_H;
    surface.draw_text(
        "Q QUIT  O OVERLAY  B BG  G GESTURES  K SKELETON  1-5 SCHEME  +/- COUNT  [ ] TRAIL  P PAUSE  S SAVE",
        x, bottom, 1, HUD_DIM,
    );
    if hud.simulated {
        surface.draw_text("H HANDS UP  W ARMS WIDE  J JUMP  SPACE FLOURISH", x, bottom + LINE_H / 2 + 2, 1, HUD_DIM);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    sim_tx: Option<Sender<SimMove>>,
}

impl Visualizer {
    /// Open a fixed-size window.  `sim_tx` receives dancer moves when the
    /// simulated source is in use.
    pub fn new(width: usize, height: usize, fps: u32, sim_tx: Option<Sender<SimMove>>) -> Result<Self, FxError> {
        let mut window = Window::new(
            "dance_fx - pose-driven particles",
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;
        window.set_target_fps(fps.max(1) as usize);

        Ok(Visualizer {
            window,
            canvas: Canvas::new(width, height),
            sim_tx,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    pub fn is_simulated(&self) -> bool { self.sim_tx.is_some() }

    pub fn canvas_mut(&mut self) -> &mut Canvas { &mut self.canvas }

    /// Poll the keyboard.  Dancer moves go straight to the simulated
    /// source; every other key comes back, in press order, for
    /// [`key_command`] to map against the settings as they stand when that
    /// key is handled.
    pub fn poll_keys(&mut self) -> Vec<Key> {
        let pressed = ONE_SHOT_KEYS.iter().filter(|&&k| self.window.is_key_pressed(k, KeyRepeat::No));
        let held    = HELD_KEYS.iter().filter(|&&k| self.window.is_key_pressed(k, KeyRepeat::Yes));
        let keys: Vec<Key> = pressed.chain(held).copied().collect();

        let mut rest = Vec::with_capacity(keys.len());
        for key in keys {
            match key_move(key) {
                Some(mv) => {
                    if let Some(tx) = &self.sim_tx {
                        debug!(?mv, "dancer move");
                        let _ = tx.send(mv);
                    }
                }
                None => rest.push(key),
            }
        }
        rest
    }

    /// Push the canvas to the screen.
    pub fn present(&mut self) -> Result<(), FxError> {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        self.window.update_with_buffer(self.canvas.pixels(), w, h)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_flip_current_value() {
        let mut cfg = EffectsConfig::default();
        assert_eq!(
            key_command(Key::B, &cfg, true),
            Some(ControlCommand::Configure(ConfigUpdate::BackgroundEffects(false)))
        );
        cfg.apply(ConfigUpdate::ShowSkeleton(false));
        assert_eq!(
            key_command(Key::K, &cfg, true),
            Some(ControlCommand::Configure(ConfigUpdate::ShowSkeleton(true)))
        );
    }

    #[test]
    fn pause_key_depends_on_state() {
        let cfg = EffectsConfig::default();
        assert_eq!(key_command(Key::P, &cfg, true), Some(ControlCommand::Stop));
        assert_eq!(key_command(Key::P, &cfg, false), Some(ControlCommand::Start));
    }

    #[test]
    fn steps_and_schemes() {
        let cfg = EffectsConfig::default();
        assert_eq!(
            key_command(Key::Equal, &cfg, true),
            Some(ControlCommand::Configure(ConfigUpdate::ParticleCount(60)))
        );
        assert_eq!(
            key_command(Key::LeftBracket, &cfg, true),
            Some(ControlCommand::Configure(ConfigUpdate::TrailLength(14)))
        );
        assert_eq!(
            key_command(Key::Key5, &cfg, true),
            Some(ControlCommand::Configure(ConfigUpdate::ColorScheme(ColorScheme::Neon)))
        );
        assert_eq!(key_command(Key::Z, &cfg, true), None);
    }

    #[test]
    fn dancer_keys_are_moves_not_commands() {
        let cfg = EffectsConfig::default();
        for key in [Key::H, Key::W, Key::J, Key::Space] {
            assert!(key_move(key).is_some());
            assert_eq!(key_command(key, &cfg, true), None);
        }
    }

    #[test]
    fn overlay_draws_something() {
        let mut canvas = Canvas::new(640, 360);
        let hud = Hud {
            energy:    5.0,
            gestures:  GestureSet::new(),
            particles: 12,
            scheme:    ColorScheme::Energetic,
            running:   false,
            simulated: true,
        };
        draw_overlay(&mut canvas, &hud);
        assert!(canvas.pixels().iter().any(|&p| p == HUD_ACCENT.to_argb()));
        assert!(canvas.pixels().iter().any(|&p| p == HUD_TEXT.to_argb()));
    }
}
