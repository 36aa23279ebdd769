//! Top-level application state and the frame loop.
//!
//! `AppState` owns the gesture classifier, the effects compositor and the
//! live settings.  Each tick it classifies every snapshot that arrived
//! since the last tick, oldest first, advances the effects with each one
//! unless stopped, and redraws.
//!
//! ```text
//!  pose source ──▶ snapshot ──▶ classify ──▶ update effects ──▶ draw ──▶ window
//!  keyboard / stdin ──▶ ControlCommand ──▶ settings, start/stop, save, quit
//! ```

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use minifb::Key;
use pose_stream::{GestureClassifier, KeypointSnapshot, PoseAnalysis};
use tracing::{debug, info, trace, warn};

use crate::compositor::EffectsCompositor;
use crate::config::{ConfigUpdate, EffectsConfig, Preset, DEFAULT_CONFIG_FILE};
use crate::control::{spawn_stdin_control, ControlCommand};
use crate::error::FxError;
use crate::source::{spawn_pose_source, ReplaySource, SimDancer};
use crate::surface::Surface;
use crate::visualizer::{
    draw_overlay, key_command, Hud, Visualizer, DEFAULT_FPS, DEFAULT_HEIGHT, DEFAULT_WIDTH,
};

// ════════════════════════════════════════════════════════════════════════════
// RunOptions
// ════════════════════════════════════════════════════════════════════════════

/// Everything `run` needs, normally filled from the command line.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub width:         usize,
    pub height:        usize,
    pub fps:           u32,
    pub config_path:   PathBuf,
    /// Play a JSON Lines recording instead of the simulated dancer.
    pub replay:        Option<PathBuf>,
    pub looping:       bool,
    pub mirror:        bool,
    /// Fixed RNG seed for reproducible particle spawns.
    pub seed:          Option<u64>,
    pub preset:        Option<Preset>,
    pub stdin_control: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            width:         DEFAULT_WIDTH,
            height:        DEFAULT_HEIGHT,
            fps:           DEFAULT_FPS,
            config_path:   PathBuf::from(DEFAULT_CONFIG_FILE),
            replay:        None,
            looping:       false,
            mirror:        false,
            seed:          None,
            preset:        None,
            stdin_control: true,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    classifier:  GestureClassifier,
    effects:     EffectsCompositor,
    config:      EffectsConfig,
    config_path: PathBuf,

    running:     bool,
    overlay:     bool,
    simulated:   bool,
    quit:        bool,
    frames:      u64,
}

impl AppState {
    pub fn new(width: usize, height: usize, config: EffectsConfig, config_path: PathBuf, seed: Option<u64>) -> Self {
        let effects = match seed {
            Some(s) => EffectsCompositor::with_seed(width, height, s),
            None    => EffectsCompositor::new(width, height),
        };
        AppState {
            classifier: GestureClassifier::new(),
            effects,
            config,
            config_path,
            running:    true,
            overlay:    false,
            simulated:  false,
            quit:       false,
            frames:     0,
        }
    }

    /// Show the dancer keys in the overlay legend.
    pub fn with_simulated(mut self, simulated: bool) -> Self {
        self.simulated = simulated;
        self
    }

    // ── commands ──────────────────────────────────────────────────────────

    pub fn handle_command(&mut self, cmd: ControlCommand) {
        match cmd {
            ControlCommand::Configure(update) => self.config.apply(update),
            ControlCommand::Start => {
                if !self.running {
                    info!("effects resumed");
                }
                self.running = true;
            }
            ControlCommand::Stop => {
                if self.running {
                    info!("effects stopped");
                }
                self.running = false;
            }
            ControlCommand::Save => match self.config.save(&self.config_path) {
                Ok(())  => info!(path = %self.config_path.display(), "settings saved"),
                Err(e)  => warn!(error = %e, "could not save settings"),
            },
            ControlCommand::ToggleOverlay => {
                self.overlay = !self.overlay;
                debug!(overlay = self.overlay, "overlay toggled");
            }
            ControlCommand::Quit => self.quit = true,
        }
    }

    /// Map a key against the current settings and apply it at once, so
    /// several keys in one poll build on each other.
    pub fn handle_key(&mut self, key: Key) {
        if let Some(cmd) = key_command(key, &self.config, self.running) {
            debug!(?key, ?cmd, "key");
            self.handle_command(cmd);
        }
    }

    // ── per tick ──────────────────────────────────────────────────────────

    /// Classify a newly arrived snapshot and, unless stopped, advance the
    /// effects with it.  With no new snapshot nothing changes.
    ///
    /// Effects physics runs on the snapshot clock: one update per snapshot.
    pub fn tick(&mut self, snapshot: Option<KeypointSnapshot>) -> Option<PoseAnalysis> {
        let snapshot = snapshot?;
        let analysis = self.classifier.classify(snapshot);
        if self.running {
            self.effects.update(&analysis, &self.config);
        }
        self.frames += 1;
        Some(analysis)
    }

    /// Run every queued snapshot through [`tick`](Self::tick), oldest first,
    /// so the classifier history has no gaps.  Returns how many were taken.
    pub fn ingest<I>(&mut self, snapshots: I) -> usize
    where
        I: IntoIterator<Item = KeypointSnapshot>,
    {
        let mut taken = 0;
        for snap in snapshots {
            self.tick(Some(snap));
            taken += 1;
        }
        taken
    }

    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
        self.effects.draw(surface, &self.config);
        if self.overlay {
            draw_overlay(surface, &self.hud());
        }
    }

    pub fn hud(&self) -> Hud {
        Hud {
            energy:    self.effects.energy(),
            gestures:  self.effects.gestures(),
            particles: self.effects.particles().len(),
            scheme:    self.config.color_scheme,
            running:   self.running,
            simulated: self.simulated,
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn config(&self)      -> &EffectsConfig     { &self.config }
    pub fn effects(&self)     -> &EffectsCompositor { &self.effects }
    pub fn classifier(&self)  -> &GestureClassifier { &self.classifier }
    pub fn is_running(&self)  -> bool               { self.running }
    pub fn overlay(&self)     -> bool               { self.overlay }
    pub fn should_quit(&self) -> bool               { self.quit }
    pub fn frames(&self)      -> u64                { self.frames }
}

/// Drain `rx` in arrival order.  Clears `open` once the source has hung up.
pub fn drain_snapshots(rx: &Receiver<KeypointSnapshot>, open: &mut bool) -> Vec<KeypointSnapshot> {
    let mut queued = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(snap) => queued.push(snap),
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                *open = false;
                break;
            }
        }
    }
    queued
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Open the window and run until it closes or a quit command arrives.
pub fn run(opts: RunOptions) -> Result<(), FxError> {
    let mut config = EffectsConfig::load_or_default(&opts.config_path);
    if let Some(preset) = opts.preset {
        config.apply(ConfigUpdate::ApplyPreset(preset));
    }

    // ── pose source ───────────────────────────────────────────────────────
    let (sim_tx, pose_rx) = match &opts.replay {
        Some(path) => {
            let src = ReplaySource::open(path, opts.width as u32, opts.height as u32, opts.mirror)?
                .with_fps(opts.fps)
                .looping(opts.looping);
            (None, spawn_pose_source(src))
        }
        None => {
            let (tx, rx) = mpsc::channel();
            (Some(tx), spawn_pose_source(SimDancer::new(rx, opts.width, opts.height, opts.fps)))
        }
    };

    let control_rx = if opts.stdin_control { Some(spawn_stdin_control()) } else { None };

    let mut vis = Visualizer::new(opts.width, opts.height, opts.fps, sim_tx)?;
    let mut app = AppState::new(opts.width, opts.height, config, opts.config_path.clone(), opts.seed)
        .with_simulated(vis.is_simulated());

    info!(width = opts.width, height = opts.height, fps = opts.fps, "window open");

    let mut source_open = true;
    while vis.is_open() && !app.should_quit() {
        for key in vis.poll_keys() {
            app.handle_key(key);
        }
        if let Some(rx) = &control_rx {
            while let Ok(cmd) = rx.try_recv() {
                app.handle_command(cmd);
            }
        }

        if source_open {
            let queued = drain_snapshots(&pose_rx, &mut source_open);
            if app.ingest(queued) > 1 {
                trace!("caught up on queued snapshots");
            }
            if !source_open {
                info!("pose source ended, holding last frame");
            }
        }

        app.render(vis.canvas_mut());
        vis.present()?;
    }

    info!(frames = app.frames(), "visualizer closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
