//! Error types for the console.

use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::persistence::PersistenceError;
use marketdesk_client::AuthError;
use marketdesk_core::ConsoleError;

#[derive(Debug, thiserror::Error)]
pub enum TuiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Api(#[from] ConsoleError),
}
