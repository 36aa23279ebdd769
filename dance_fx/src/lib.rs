//! # dance_fx
//!
//! Pose-driven particle visualizer.  Body keypoints come in from a pose
//! source, [`pose_stream`] turns them into gestures and a movement-energy
//! signal, and this crate turns those into particles, hand trails and a
//! pulsing background in a software framebuffer.
//!
//! ## Gesture → effect mapping
//!
//! | Gesture | Needs | Effect |
//! |---|---|---|
//! | `hands_up`  | each visible wrist | 15-particle explosion per wrist |
//! | `arms_wide` | both wrists | 10 particles strung between the wrists |
//! | `jump`      | hip centre | 25 fireworks 100 px above the hips |
//! | (energy)    | each visible wrist | ambient sparkle, probability energy / 10 |
//!
//! Burst sizes scale with the `particle_count` setting; 50 gives the counts
//! above.
//!
//! ## Layers
//!
//! Background fill and rings, then skeleton, trails, particles.  The debug
//! overlay (O) goes on top.
//!
//! ## Pose sources
//!
//! * (default) **Simulated dancer**: a stick figure driven from the window.
//! * `--replay FILE` **Recording**: one [`pose_stream::PoseFrame`] JSON object
//!   per line.
//!
//! ### Window keys
//!
//! | Key | Action |
//! |---|---|
//! | `H` / `W` / `J` / `Space` | Dancer: hands up / arms wide / jump / flourish |
//! | `O` | Toggle debug overlay |
//! | `B` / `G` / `K` | Toggle background / gesture bursts / skeleton |
//! | `1`–`5` | Color scheme |
//! | `+` / `-` | Particle count |
//! | `[` / `]` | Trail length |
//! | `P` | Pause / resume effects |
//! | `S` | Save settings |
//! | `Q` / `Esc` | Quit |

pub mod color;
pub mod font;
pub mod surface;
pub mod particle;
pub mod trail;
pub mod config;
pub mod control;
pub mod source;
pub mod compositor;
pub mod visualizer;
pub mod error;
pub mod app;

pub use color::{ColorScheme, Palette, Rgb};
pub use compositor::EffectsCompositor;
pub use config::{ConfigError, ConfigUpdate, EffectsConfig, Preset};
pub use control::{parse_command, ControlCommand, ControlError};
pub use error::FxError;
pub use particle::{Particle, ParticleSystem};
pub use source::{spawn_pose_source, PoseSource, ReplayError, ReplaySource, SimDancer, SimMove};
pub use surface::{Canvas, Surface};
pub use trail::{Hand, Trail, TrailTracker};
