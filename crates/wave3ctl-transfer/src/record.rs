//! Control requests and the fixed-size record exchanged with the driver.
//!
//! The kernel module copies a packed 72 byte `wave3_xfer` structure in and
//! out of user space for every request:
//!
//! ```text
//! offset  size  field
//!      0     1  request_type  (bmRequestType)
//!      1     1  request       (bRequest)
//!      2     2  value         (wValue, little-endian)
//!      4     2  index         (wIndex, little-endian)
//!      6     2  length        (in: bytes wanted/sent, out: bytes returned)
//!      8    64  data
//! ```

use crate::error::{TransferError, TransferResult};

/// Capacity of the record's data area.
pub const PAYLOAD_CAPACITY: usize = 64;
/// Size of the packed record.
pub const TRANSFER_RECORD_SIZE: usize = 8 + PAYLOAD_CAPACITY;

/// Device-to-host, class request, interface recipient.
pub const REQUEST_TYPE_CLASS_IN: u8 = 0xA1;
/// Host-to-device, class request, interface recipient.
pub const REQUEST_TYPE_CLASS_OUT: u8 = 0x21;

/// Data stage of a control request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataStage {
    /// Device-to-host: number of bytes the caller expects back
    Read(usize),
    /// Host-to-device: bytes to send
    Write(Vec<u8>),
}

/// One logical USB control request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    /// `bmRequestType`
    pub request_type: u8,
    /// `bRequest`
    pub request: u8,
    /// `wValue`
    pub value: u16,
    /// `wIndex`
    pub index: u16,
    /// Expected length or outgoing bytes
    pub data: DataStage,
}

impl ControlRequest {
    /// Build a class/interface IN request expecting `length` bytes.
    #[must_use]
    pub fn get(request: u8, value: u16, index: u16, length: usize) -> Self {
        Self {
            request_type: REQUEST_TYPE_CLASS_IN,
            request,
            value,
            index,
            data: DataStage::Read(length),
        }
    }

    /// Build a class/interface OUT request carrying `data`.
    #[must_use]
    pub fn set(request: u8, value: u16, index: u16, data: Vec<u8>) -> Self {
        Self {
            request_type: REQUEST_TYPE_CLASS_OUT,
            request,
            value,
            index,
            data: DataStage::Write(data),
        }
    }

    /// Number of bytes carried by the data stage.
    #[must_use]
    pub fn length(&self) -> usize {
        match &self.data {
            DataStage::Read(len) => *len,
            DataStage::Write(bytes) => bytes.len(),
        }
    }
}

/// Packed transfer record, identical in layout to the driver's `wave3_xfer`.
///
/// Multi-byte fields are stored little-endian regardless of host order.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct TransferRecord {
    request_type: u8,
    request: u8,
    value: u16,
    index: u16,
    length: u16,
    data: [u8; PAYLOAD_CAPACITY],
}

const _: () = assert!(std::mem::size_of::<TransferRecord>() == TRANSFER_RECORD_SIZE);

impl TransferRecord {
    /// Encode a request into a record.
    ///
    /// # Errors
    /// Returns `PayloadTooLarge` if the request's data stage exceeds the
    /// 64 byte data area.
    pub fn encode(request: &ControlRequest) -> TransferResult<Self> {
        let length = request.length();
        if length > PAYLOAD_CAPACITY {
            return Err(TransferError::PayloadTooLarge(length));
        }

        let mut data = [0u8; PAYLOAD_CAPACITY];
        if let DataStage::Write(bytes) = &request.data {
            data[..bytes.len()].copy_from_slice(bytes);
        }

        #[allow(clippy::cast_possible_truncation)]
        let length = length as u16;

        Ok(Self {
            request_type: request.request_type,
            request: request.request,
            value: request.value.to_le(),
            index: request.index.to_le(),
            length: length.to_le(),
            data,
        })
    }

    /// Byte count reported by the driver.
    #[must_use]
    pub fn length(&self) -> usize {
        usize::from(u16::from_le(self.length))
    }

    /// Response payload, truncated to the returned length.
    #[must_use]
    pub fn payload(&self) -> Vec<u8> {
        let data = self.data;
        data[..self.length().min(PAYLOAD_CAPACITY)].to_vec()
    }

    /// The record exactly as the driver sees it.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; TRANSFER_RECORD_SIZE] {
        let mut out = [0u8; TRANSFER_RECORD_SIZE];
        out[0] = self.request_type;
        out[1] = self.request;
        out[2..4].copy_from_slice(&{ self.value }.to_ne_bytes());
        out[4..6].copy_from_slice(&{ self.index }.to_ne_bytes());
        out[6..8].copy_from_slice(&{ self.length }.to_ne_bytes());
        out[8..].copy_from_slice(&{ self.data });
        out
    }

    /// Rebuild a record from the driver's byte layout.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; TRANSFER_RECORD_SIZE]) -> Self {
        let mut data = [0u8; PAYLOAD_CAPACITY];
        data.copy_from_slice(&bytes[8..]);
        Self {
            request_type: bytes[0],
            request: bytes[1],
            value: u16::from_ne_bytes([bytes[2], bytes[3]]),
            index: u16::from_ne_bytes([bytes[4], bytes[5]]),
            length: u16::from_ne_bytes([bytes[6], bytes[7]]),
            data,
        }
    }
}

impl std::fmt::Debug for TransferRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferRecord")
            .field("request_type", &format_args!("{:#04x}", self.request_type))
            .field("request", &format_args!("{:#04x}", self.request))
            .field("value", &format_args!("{:#06x}", u16::from_le(self.value)))
            .field("index", &format_args!("{:#06x}", u16::from_le(self.index)))
            .field("length", &self.length())
            .finish_non_exhaustive()
    }
}
