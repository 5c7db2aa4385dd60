//! USB Audio Class 1.0 feature unit addressing for the Wave:3.

use serde::Serialize;
use wave3ctl_transfer::ControlRequest;

/// `SET_CUR`
pub const SET_CUR: u8 = 0x01;
/// `GET_CUR`
pub const GET_CUR: u8 = 0x81;
/// `GET_MIN`
pub const GET_MIN: u8 = 0x82;
/// `GET_MAX`
pub const GET_MAX: u8 = 0x83;
/// `GET_RES`
pub const GET_RES: u8 = 0x84;

/// AudioControl interface number.
pub const AUDIO_CONTROL_INTERFACE: u8 = 0;

/// Master channel of a feature unit.
pub const MASTER_CHANNEL: u8 = 0;

/// Feature unit control selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    /// `MUTE_CONTROL`, one byte
    Mute,
    /// `VOLUME_CONTROL`, signed 16-bit in 1/256 dB
    Volume,
}

impl Selector {
    /// Selector code used in `wValue`.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Mute => 0x01,
            Self::Volume => 0x02,
        }
    }

    /// Width of the control's `CUR` attribute in bytes.
    #[must_use]
    pub fn width(self) -> usize {
        match self {
            Self::Mute => 1,
            Self::Volume => 2,
        }
    }
}

/// Feature units exposed by the Wave:3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    /// Headphone output path
    Headphone,
    /// Microphone input path
    Microphone,
}

impl Entity {
    /// Both feature units, headphone first.
    pub const ALL: [Self; 2] = [Self::Headphone, Self::Microphone];

    /// Feature unit ID.
    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            Self::Headphone => 5,
            Self::Microphone => 6,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Headphone => "Headphone",
            Self::Microphone => "Microphone",
        }
    }
}

/// Address of one control on one channel of a feature unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlAddress {
    pub entity: Entity,
    pub selector: Selector,
    pub channel: u8,
}

impl ControlAddress {
    /// Address a control on the master channel.
    #[must_use]
    pub fn master(entity: Entity, selector: Selector) -> Self {
        Self { entity, selector, channel: MASTER_CHANNEL }
    }

    /// `wValue`: control selector in the high byte, channel in the low byte.
    #[must_use]
    pub fn value(&self) -> u16 {
        (u16::from(self.selector.code()) << 8) | u16::from(self.channel)
    }

    /// `wIndex`: entity ID in the high byte, interface in the low byte.
    #[must_use]
    pub fn index(&self) -> u16 {
        (u16::from(self.entity.id()) << 8) | u16::from(AUDIO_CONTROL_INTERFACE)
    }

    /// A GET request of the given kind (`GET_CUR`, `GET_MIN`, ...).
    #[must_use]
    pub fn get(&self, request: u8) -> ControlRequest {
        ControlRequest::get(request, self.value(), self.index(), self.selector.width())
    }

    /// A `SET_CUR` request carrying `data`.
    #[must_use]
    pub fn set_cur(&self, data: Vec<u8>) -> ControlRequest {
        ControlRequest::set(SET_CUR, self.value(), self.index(), data)
    }
}
