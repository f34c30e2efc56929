//! Error types for Disk Model (diskmodel)

use std::io;
use thiserror::Error;

/// Result type alias for diskmodel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the disk enumerator
///
/// Every variant raised by the management service carries the raw status
/// code it returned (an `HRESULT` on Windows).
#[derive(Error, Debug)]
pub enum Error {
    /// Process-wide runtime initialization failed
    #[error("Failed to initialize the management runtime")]
    RuntimeInit { code: i32 },

    /// Process-wide security initialization failed
    #[error("Failed to initialize security for the management service")]
    SecurityInit { code: i32 },

    /// Locator object could not be created
    #[error("Failed to create locator object")]
    Locator { code: i32 },

    /// Namespace connection was refused
    #[error("Could not connect to management namespace {namespace}")]
    Connect { namespace: String, code: i32 },

    /// Proxy security negotiation failed
    #[error("Could not set proxy blanket")]
    ProxyBlanket { code: i32 },

    /// Query execution failed
    #[error("Query for disk information failed")]
    Query { code: i32 },

    /// Cursor advance failed mid-iteration
    #[error("Failed to read the next disk record")]
    Advance { code: i32 },

    /// Field access failed on a record
    #[error("Failed to read field {name}")]
    Field { name: String, code: i32 },

    /// Operation called in a state that does not allow it
    #[error("Invalid state: cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// Unsupported platform
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Status code reported by the management service, if any
    pub fn status_code(&self) -> Option<i32> {
        match self {
            Error::RuntimeInit { code }
            | Error::SecurityInit { code }
            | Error::Locator { code }
            | Error::Connect { code, .. }
            | Error::ProxyBlanket { code }
            | Error::Query { code }
            | Error::Advance { code }
            | Error::Field { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether this error tears down the session it was raised in
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            Error::RuntimeInit { .. }
                | Error::Locator { .. }
                | Error::Connect { .. }
                | Error::ProxyBlanket { .. }
                | Error::NotSupported(_)
        )
    }
}
