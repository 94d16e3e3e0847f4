//! Error types for the timelane runtime
//!
//! The crate distinguishes its own failures (configuration validation)
//! from failures inside user jobs. Job failures are carried as
//! [`anyhow::Error`] and delivered through the rejected
//! [`JobHandle`](crate::scheduling::JobHandle); they never surface as a
//! `TimelaneError`.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type TimelaneResult<T> = Result<T, TimelaneError>;

/// Errors raised by the scheduler itself.
#[derive(Error, Debug)]
pub enum TimelaneError {
    /// A configuration value is out of bounds. Raised synchronously by
    /// `configure`; the previous configuration stays in effect.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TimelaneError {
    /// Create a configuration error from any message.
    pub fn config(msg: impl Into<String>) -> Self {
        TimelaneError::Config(msg.into())
    }
}
