//! Error types for wave3ctl core.

use thiserror::Error;
use wave3ctl_transfer::TransferError;

/// Core error type for Wave:3 control operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Cannot communicate with Wave:3: {0}")]
    DeviceUnreachable(#[source] TransferError),

    #[error("Short response: expected {expected} bytes, got {actual}")]
    ShortResponse { expected: usize, actual: usize },

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl Error {
    /// Whether the device was unplugged while the controller was open.
    #[must_use]
    pub fn is_device_gone(&self) -> bool {
        matches!(self, Self::Transfer(e) if e.is_device_gone())
    }
}

/// Result type alias for wave3ctl core operations.
pub type Result<T> = std::result::Result<T, Error>;
