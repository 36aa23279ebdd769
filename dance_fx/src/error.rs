//! Errors that can stop the visualizer.

use thiserror::Error;

use crate::config::ConfigError;
use crate::source::ReplayError;

#[derive(Debug, Error)]
pub enum FxError {
    #[error("window error: {0}")]
    Window(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

impl From<minifb::Error> for FxError {
    fn from(e: minifb::Error) -> Self {
        FxError::Window(e.to_string())
    }
}
