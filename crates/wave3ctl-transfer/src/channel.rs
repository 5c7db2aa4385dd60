//! Control transfers through the `/dev/wave3ctl` misc device.
//!
//! The kernel module keeps `snd-usb-audio` bound to the Wave:3 and forwards
//! each record to `usb_control_msg()` on endpoint 0, so audio keeps flowing
//! while controls are read and written.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use tracing::{debug, info};

use crate::error::{TransferError, TransferResult};
use crate::record::{ControlRequest, DataStage, TransferRecord};

/// Default device node created by the kernel module.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/wave3ctl";

/// ioctl magic shared with the kernel module.
pub const WAVE3_IOC_MAGIC: u8 = b'W';
/// ioctl number of the single control operation.
pub const WAVE3_IOC_CTL: u8 = 0;

nix::ioctl_readwrite!(
    /// `_IOWR('W', 0, struct wave3_xfer)`
    ///
    /// # Safety
    /// `data` must point to a valid, writable `TransferRecord`.
    wave3_ctl,
    WAVE3_IOC_MAGIC,
    WAVE3_IOC_CTL,
    TransferRecord
);

/// Something that can carry USB control transfers to the Wave:3.
pub trait ControlTransport {
    /// Issue one control request and return the response payload.
    ///
    /// For OUT requests the returned payload is empty.
    ///
    /// # Errors
    /// Returns `PayloadTooLarge` before any I/O if the request does not fit
    /// a transfer record, `DeviceGone` if the device was unplugged, and
    /// `TransferFailed` for any other failure.
    fn transfer(&self, request: &ControlRequest) -> TransferResult<Vec<u8>>;
}

/// Transfer channel backed by the kernel module's device node.
#[derive(Debug)]
pub struct DeviceChannel {
    file: File,
    path: PathBuf,
}

impl DeviceChannel {
    /// Open the control device node.
    ///
    /// # Errors
    /// Returns `DeviceNotFound` if the node does not exist,
    /// `PermissionDenied` if it cannot be opened read/write, and `Open`
    /// for anything else.
    pub fn open(path: impl AsRef<Path>) -> TransferResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| open_error(e, path.clone()))?;

        info!(path = %path.display(), "Opened control device");
        Ok(Self { file, path })
    }

    /// Path of the opened node.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ControlTransport for DeviceChannel {
    fn transfer(&self, request: &ControlRequest) -> TransferResult<Vec<u8>> {
        let mut record = TransferRecord::encode(request)?;

        // SAFETY: `record` is a live, exclusively borrowed `repr(C, packed)`
        // value with the exact size encoded in the ioctl number; the driver
        // reads and writes at most that many bytes.
        #[allow(unsafe_code)]
        let result = unsafe { wave3_ctl(self.file.as_raw_fd(), &mut record) };

        match result {
            Ok(_) => {
                let payload = if matches!(request.data, DataStage::Read(_)) {
                    record.payload()
                } else {
                    Vec::new()
                };
                debug!(
                    request = request.request,
                    value = request.value,
                    index = request.index,
                    returned = payload.len(),
                    "Control transfer"
                );
                Ok(payload)
            }
            Err(errno) => {
                debug!(?record, %errno, "Control transfer failed");
                Err(transfer_error(errno))
            }
        }
    }
}

fn open_error(error: io::Error, path: PathBuf) -> TransferError {
    match error.kind() {
        ErrorKind::NotFound => TransferError::DeviceNotFound { path },
        ErrorKind::PermissionDenied => TransferError::PermissionDenied { path },
        _ => TransferError::Open { path, source: error },
    }
}

/// ENODEV means the Wave:3 was unplugged; everything else is a failed transfer.
fn transfer_error(errno: Errno) -> TransferError {
    match errno {
        Errno::ENODEV => TransferError::DeviceGone,
        errno => TransferError::TransferFailed(errno.into()),
    }
}
