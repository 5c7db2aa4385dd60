//! Transfer error types.

use std::path::PathBuf;

use thiserror::Error;

/// Transfer channel error type.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{} not found - is the wave3ctl kernel module loaded?", .path.display())]
    DeviceNotFound { path: PathBuf },

    #[error("{}: permission denied - check the node's mode or udev rules", .path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Wave:3 disconnected")]
    DeviceGone,

    #[error("Payload of {0} bytes exceeds the 64 byte transfer limit")]
    PayloadTooLarge(usize),

    #[error("Control transfer failed: {0}")]
    TransferFailed(#[source] std::io::Error),
}

impl TransferError {
    /// Whether the device went away underneath an open channel.
    #[must_use]
    pub fn is_device_gone(&self) -> bool {
        matches!(self, Self::DeviceGone)
    }
}

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;
