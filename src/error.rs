//! Unified error handling for the opendecks crate
//!
//! Domain errors from the night engine ([`NightError`]) are wrapped together
//! with configuration and I/O failures in a single [`Error`] enum.
//!
//! # Usage
//!
//! ```rust,ignore
//! use opendecks::error::{Error, ErrorCategory};
//!
//! fn report(err: &Error) {
//!     if err.is_recoverable() {
//!         println!("{}", err.status_message());
//!     } else {
//!         eprintln!("Fatal error: {err}");
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::scheduler::error::NightError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Rejected user intent (validation, throttle, cap, PIN)
    Night,
    /// Configuration and validation errors
    Config,
    /// File and terminal I/O errors
    Io,
    /// Serialization errors
    Serialization,
    /// Other/unknown errors
    Other,
}

/// Unified error type for the opendecks crate
#[derive(Error, Debug)]
pub enum Error {
    /// Night engine errors
    #[error("{0}")]
    Night(#[from] NightError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Night(_) => ErrorCategory::Night,
            Self::Config(_) => ErrorCategory::Config,
            Self::Io(_) => ErrorCategory::Io,
            Self::Json(_) => ErrorCategory::Serialization,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }

    /// Check if the session can carry on after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Night(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Config(_) | Self::Json(_) | Self::Other { .. } => false,
        }
    }

    /// Message suitable for the kiosk status line
    pub fn status_message(&self) -> String {
        match self {
            Self::Night(e) => e.status_message(),
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
