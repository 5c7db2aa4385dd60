//! wave3ctl transfer - USB control transfers through the wave3ctl kernel module.
//!
//! `snd-usb-audio` keeps the Wave:3's AudioControl interface claimed, so
//! usbdevfs control transfers are refused. The companion kernel module
//! exposes `/dev/wave3ctl` and replays fixed-size transfer records with
//! `usb_control_msg()`. This crate owns that record format and the single
//! ioctl that carries it; it knows nothing about what the requests mean.

pub mod channel;
pub mod error;
pub mod record;

pub use channel::{ControlTransport, DEFAULT_DEVICE_PATH, DeviceChannel};
pub use error::{TransferError, TransferResult};
pub use record::{ControlRequest, DataStage, PAYLOAD_CAPACITY, TransferRecord};
