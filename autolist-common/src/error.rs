//! Common error types for autolist

use thiserror::Error;

/// Common result type for autolist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading shared configuration
#[derive(Error, Debug)]
pub enum Error {
    /// Config file unreadable, malformed, or failing validation
    #[error("Configuration error: {0}")]
    Config(String),
}
