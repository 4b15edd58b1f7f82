//! # Error Handling
//!
//! Error type for the command synchronization layer.
//!
//! Bus errors are deliberately absent: they are reported through the
//! bus-error hook installed with [`SyncConfig`](crate::SyncConfig), never as
//! a return value.

use core::fmt;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// Result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// Command layer error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Invalid parameter (null slot value, command address overflow)
    InvalidArgument,
    /// A blocking wait reached its deadline without a completion
    Timeout,
    /// The layer was shut down
    NotInitialized,
    /// The scheduler port could not create a wake signal
    OutOfMemory,
}

impl Error {
    /// Short machine-friendly name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::Timeout => "timeout",
            Self::NotInitialized => "not_initialized",
            Self::OutOfMemory => "out_of_memory",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::Timeout => write!(f, "wait timed out"),
            Self::NotInitialized => write!(f, "command layer not initialized"),
            Self::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
