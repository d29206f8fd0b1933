//! Console error type.

use sale_screen::ScreenError;
use sale_store::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// Anything that stops the console before it can render a view.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Screen(#[from] ScreenError),

    #[error("Cannot encode view: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
