//! Error types and handling for shmcanvas

use crate::connection::ProtocolError;

/// Result type alias for shmcanvas operations
pub type Result<T> = std::result::Result<T, ShmError>;

/// Construction errors for a shared-memory canvas.
///
/// Every variant is fatal: a canvas is either fully built or not built at all,
/// and anything acquired before the failure has already been released by the
/// time the caller sees the error.
#[derive(Debug, thiserror::Error)]
pub enum ShmError {
    /// Could not create the anonymous backing file
    #[error("Backing allocation failed after {attempts} attempt(s)")]
    BackingAllocationFailed {
        attempts: u32,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Resizing or mapping the backing file failed
    #[error("Backing map failed: {message}")]
    BackingMapFailed {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// The connection refused to create the shared-memory pool
    #[error("Pool registration failed for {size} bytes")]
    PoolRegistrationFailed {
        size: usize,
        #[source]
        source: ProtocolError,
    },

    /// The pool refused to create the buffer for a slot
    #[error("Buffer slice failed for slot {slot}")]
    BufferSliceFailed {
        slot: usize,
        #[source]
        source: ProtocolError,
    },

    /// Invalid geometry or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },
}

impl ShmError {
    /// Create a backing allocation error
    pub fn backing_allocation(attempts: u32, source: Option<std::io::Error>) -> Self {
        Self::BackingAllocationFailed { attempts, source }
    }

    /// Create a backing map error from the failed system call
    pub fn backing_map(source: std::io::Error, context: &str) -> Self {
        Self::BackingMapFailed {
            message: format!("{}: {}", context, source),
            source,
        }
    }

    /// Create a pool registration error
    pub fn pool_registration(size: usize, source: ProtocolError) -> Self {
        Self::PoolRegistrationFailed { size, source }
    }

    /// Create a buffer slice error
    pub fn buffer_slice(slot: usize, source: ProtocolError) -> Self {
        Self::BufferSliceFailed { slot, source }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}
