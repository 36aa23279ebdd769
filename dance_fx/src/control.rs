//! Text control client.
//!
//! Settings changes and start/stop arrive as one command per line, e.g.
//!
//! ```text
//! set particle_count 120
//! set color_scheme neon
//! preset party
//! stop
//! start
//! save
//! overlay
//! quit
//! ```
//!
//! A reader thread parses lines into [`ControlCommand`]s and forwards them
//! over a channel; the render loop drains it once per tick.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use thiserror::Error;
use tracing::{debug, warn};

use crate::color::ColorScheme;
use crate::config::{ConfigUpdate, Preset};

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCommand {
    Configure(ConfigUpdate),
    /// Resume effect updates.
    Start,
    /// Freeze effects on the last frame; poses are still classified.
    Stop,
    Save,
    ToggleOverlay,
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("unknown setting '{0}'")]
    UnknownKey(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("bad value '{value}' for {key}")]
    BadValue { key: String, value: String },
}

const SETTING_KEYS: [&str; 8] = [
    "particle_count",
    "trail_length",
    "sensitivity",
    "color_scheme",
    "background_effects",
    "gesture_detection",
    "show_skeleton",
    "effect_intensity",
];

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1"  => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Build a settings change from a key and its textual value.
pub fn parse_setting(key: &str, value: &str) -> Result<ConfigUpdate, ControlError> {
    let bad = || ControlError::BadValue { key: key.to_string(), value: value.to_string() };
    let update = match key {
        "particle_count"     => ConfigUpdate::ParticleCount(value.parse().map_err(|_| bad())?),
        "trail_length"       => ConfigUpdate::TrailLength(value.parse().map_err(|_| bad())?),
        "sensitivity"        => ConfigUpdate::Sensitivity(value.parse().map_err(|_| bad())?),
        "effect_intensity"   => ConfigUpdate::EffectIntensity(value.parse().map_err(|_| bad())?),
        "color_scheme"       => ConfigUpdate::ColorScheme(value.parse::<ColorScheme>().map_err(|_| bad())?),
        "background_effects" => ConfigUpdate::BackgroundEffects(parse_bool(value).ok_or_else(bad)?),
        "gesture_detection"  => ConfigUpdate::GestureDetection(parse_bool(value).ok_or_else(bad)?),
        "show_skeleton"      => ConfigUpdate::ShowSkeleton(parse_bool(value).ok_or_else(bad)?),
        _ => return Err(ControlError::UnknownKey(key.to_string())),
    };
    Ok(update)
}

/// Parse one command line.  Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ControlCommand>, ControlError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_ascii_lowercase();
    let cmd = match verb.as_str() {
        "set" => {
            let key = words.next().ok_or(ControlError::MissingArgument("set"))?;
            let value = words.next().ok_or(ControlError::MissingArgument("set"))?;
            ControlCommand::Configure(parse_setting(key, value)?)
        }
        "preset" => {
            let name = words.next().ok_or(ControlError::MissingArgument("preset"))?;
            let preset = name.parse::<Preset>().map_err(|_| ControlError::BadValue {
                key:   "preset".to_string(),
                value: name.to_string(),
            })?;
            ControlCommand::Configure(ConfigUpdate::ApplyPreset(preset))
        }
        "start" | "resume"   => ControlCommand::Start,
        "stop" | "pause"     => ControlCommand::Stop,
        "save"               => ControlCommand::Save,
        "overlay"            => ControlCommand::ToggleOverlay,
        "quit" | "exit"      => ControlCommand::Quit,
        _ => return Err(ControlError::UnknownCommand(verb)),
    };
    Ok(Some(cmd))
}

/// One-line help for the control client.
pub fn usage() -> String {
    format!(
        "commands: set <key> <value> | preset <{}> | start | stop | save | overlay | quit\n  keys: {}",
        Preset::ALL.map(Preset::name).join("|"),
        SETTING_KEYS.join(", "),
    )
}

/// Read commands from `reader` on a background thread.
///
/// Bad lines are logged and skipped.  The channel closes at end of input or
/// after `quit`.
pub fn spawn_control_reader<R>(reader: R) -> Receiver<ControlCommand>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in reader.lines() {
            let line = match line {
                Ok(l)  => l,
                Err(e) => { warn!(error = %e, "control input closed"); return; }
            };
            match parse_command(&line) {
                Ok(Some(cmd)) => {
                    debug!(?cmd, "control command");
                    let quit = cmd == ControlCommand::Quit;
                    if tx.send(cmd).is_err() || quit { return; }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "{}", usage()),
            }
        }
    });
    rx
}

/// Control client on the process's stdin.
pub fn spawn_stdin_control() -> Receiver<ControlCommand> {
    spawn_control_reader(io::BufReader::new(io::stdin()))
}
