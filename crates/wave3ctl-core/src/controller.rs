//! Wave:3 feature unit controller.
//!
//! The Wave:3 exposes two UAC 1.0 feature units: entity 5 on the headphone
//! output and entity 6 on the microphone input. Both carry a mute and a
//! volume control on the master channel; the microphone's volume control is
//! what Elgato calls gain.

use serde::Serialize;
use tracing::{debug, info, warn};
use wave3ctl_transfer::{ControlTransport, DeviceChannel};

use crate::error::{Error, Result};
use crate::range::{Level, Range};
use crate::uac::{ControlAddress, Entity, GET_CUR, GET_MAX, GET_MIN, GET_RES, Selector};

/// Controller for one Wave:3, owning its transfer channel.
pub struct Wave3<T = DeviceChannel> {
    transport: T,
    headphone_range: Range,
    mic_range: Range,
}

impl<T> std::fmt::Debug for Wave3<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wave3")
            .field("headphone_range", &self.headphone_range)
            .field("mic_range", &self.mic_range)
            .finish_non_exhaustive()
    }
}

impl Wave3<DeviceChannel> {
    /// Open the control device node and initialize a controller on it.
    ///
    /// # Errors
    /// Returns the channel's open error if the node is missing or not
    /// accessible, or `DeviceUnreachable` if the device does not answer.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let channel = DeviceChannel::open(path)?;
        Self::with_transport(channel)
    }
}

impl<T: ControlTransport> Wave3<T> {
    /// Initialize a controller over an already opened transport.
    ///
    /// Reads the microphone mute control, then caches the headphone and
    /// microphone volume ranges. A range that cannot be read degrades to
    /// [`Range::UNAVAILABLE`].
    ///
    /// # Errors
    /// Returns `DeviceUnreachable` if that first read fails.
    pub fn with_transport(transport: T) -> Result<Self> {
        let check = ControlAddress::master(Entity::Microphone, Selector::Mute).get(GET_CUR);
        transport.transfer(&check).map_err(Error::DeviceUnreachable)?;

        let headphone_range = Self::discover_range(&transport, Entity::Headphone);
        let mic_range = Self::discover_range(&transport, Entity::Microphone);

        info!(?headphone_range, ?mic_range, "Wave:3 controller ready");
        Ok(Self { transport, headphone_range, mic_range })
    }

    fn discover_range(transport: &T, entity: Entity) -> Range {
        match Self::query_range(transport, entity) {
            Ok(range) => range,
            Err(e) => {
                warn!(entity = entity.label(), error = %e, "Volume range unavailable");
                Range::UNAVAILABLE
            }
        }
    }

    fn query_range(transport: &T, entity: Entity) -> Result<Range> {
        let addr = ControlAddress::master(entity, Selector::Volume);
        let min = decode_i16(&transport.transfer(&addr.get(GET_MIN))?)?;
        let max = decode_i16(&transport.transfer(&addr.get(GET_MAX))?)?;
        let res = decode_i16(&transport.transfer(&addr.get(GET_RES))?)?;
        Ok(Range::new(min, max, res))
    }

    /// Cached volume range of a feature unit.
    #[must_use]
    pub fn range(&self, entity: Entity) -> Range {
        match entity {
            Entity::Headphone => self.headphone_range,
            Entity::Microphone => self.mic_range,
        }
    }

    /// Read a feature unit's mute state.
    ///
    /// # Errors
    /// Returns the transfer error, or `ShortResponse` if no byte came back.
    pub fn mute(&self, entity: Entity) -> Result<bool> {
        let addr = ControlAddress::master(entity, Selector::Mute);
        let data = self.transport.transfer(&addr.get(GET_CUR))?;
        match data.first() {
            Some(&byte) => Ok(byte != 0),
            None => Err(Error::ShortResponse { expected: 1, actual: 0 }),
        }
    }

    /// Read a feature unit's volume.
    ///
    /// # Errors
    /// Returns the transfer error, or `ShortResponse` if fewer than two
    /// bytes came back.
    pub fn level(&self, entity: Entity) -> Result<Level> {
        let addr = ControlAddress::master(entity, Selector::Volume);
        let raw = decode_i16(&self.transport.transfer(&addr.get(GET_CUR))?)?;
        Ok(self.range(entity).level(raw))
    }

    /// Write a feature unit's mute state.
    ///
    /// # Errors
    /// Returns the transfer error.
    pub fn write_mute(&self, entity: Entity, muted: bool) -> Result<()> {
        let addr = ControlAddress::master(entity, Selector::Mute);
        self.transport.transfer(&addr.set_cur(vec![u8::from(muted)]))?;
        debug!(entity = entity.label(), muted, "Mute written");
        Ok(())
    }

    /// Write a feature unit's volume as a percentage of its cached range.
    ///
    /// Returns the raw value that was sent.
    ///
    /// # Errors
    /// Returns the transfer error.
    pub fn write_level_percent(&self, entity: Entity, percent: u8) -> Result<i16> {
        let raw = self.range(entity).percent_to_raw(percent);
        let addr = ControlAddress::master(entity, Selector::Volume);
        self.transport.transfer(&addr.set_cur(raw.to_le_bytes().to_vec()))?;
        debug!(entity = entity.label(), percent, raw, "Volume written");
        Ok(raw)
    }

    /// Microphone mute, or `None` if it could not be read.
    #[must_use]
    pub fn get_mic_mute(&self) -> Option<bool> {
        read_or_none("mic mute", self.mute(Entity::Microphone))
    }

    /// Headphone mute, or `None` if it could not be read.
    #[must_use]
    pub fn get_hp_mute(&self) -> Option<bool> {
        read_or_none("headphone mute", self.mute(Entity::Headphone))
    }

    /// Headphone volume, or `None` if it could not be read.
    #[must_use]
    pub fn get_volume(&self) -> Option<Level> {
        read_or_none("headphone volume", self.level(Entity::Headphone))
    }

    /// Microphone gain, or `None` if it could not be read.
    #[must_use]
    pub fn get_mic_gain(&self) -> Option<Level> {
        read_or_none("mic gain", self.level(Entity::Microphone))
    }

    /// Set microphone mute. Returns whether the write went through.
    pub fn set_mic_mute(&self, muted: bool) -> bool {
        write_ok("mic mute", self.write_mute(Entity::Microphone, muted))
    }

    /// Set headphone mute. Returns whether the write went through.
    pub fn set_hp_mute(&self, muted: bool) -> bool {
        write_ok("headphone mute", self.write_mute(Entity::Headphone, muted))
    }

    /// Set headphone volume in percent. Returns whether the write went through.
    pub fn set_volume_percent(&self, percent: u8) -> bool {
        let result = self.write_level_percent(Entity::Headphone, percent).map(|_| ());
        write_ok("headphone volume", result)
    }

    /// Set microphone gain in percent. Returns whether the write went through.
    pub fn set_mic_gain_percent(&self, percent: u8) -> bool {
        let result = self.write_level_percent(Entity::Microphone, percent).map(|_| ());
        write_ok("mic gain", result)
    }

    /// Flip the microphone mute state.
    ///
    /// Returns the new state, or `None` if the current state could not be
    /// read or the write failed. Nothing is written when the read fails.
    pub fn toggle_mic_mute(&self) -> Option<bool> {
        let muted = !self.get_mic_mute()?;
        self.set_mic_mute(muted).then_some(muted)
    }

    /// Current state and cached range of every feature unit.
    #[must_use]
    pub fn discover(&self) -> Vec<FeatureUnitReport> {
        Entity::ALL
            .into_iter()
            .map(|entity| FeatureUnitReport {
                entity,
                id: entity.id(),
                muted: read_or_none("mute", self.mute(entity)),
                level: read_or_none("volume", self.level(entity)),
                range: self.range(entity),
            })
            .collect()
    }
}

/// Snapshot of one feature unit, as shown by `discover`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureUnitReport {
    pub entity: Entity,
    /// Feature unit ID
    pub id: u8,
    pub muted: Option<bool>,
    pub level: Option<Level>,
    pub range: Range,
}

fn read_or_none<V>(control: &str, result: Result<V>) -> Option<V> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(control, error = %e, "Read failed");
            None
        }
    }
}

fn write_ok(control: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(control, error = %e, "Write failed");
            false
        }
    }
}

fn decode_i16(data: &[u8]) -> Result<i16> {
    match data {
        [lo, hi, ..] => Ok(i16::from_le_bytes([*lo, *hi])),
        _ => Err(Error::ShortResponse { expected: 2, actual: data.len() }),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use mockall::mock;
    use wave3ctl_transfer::{ControlRequest, DataStage, TransferError, TransferResult};

    use super::*;
    use crate::uac::SET_CUR;

    mock! {
        pub Transport {}
        impl ControlTransport for Transport {
            fn transfer(&self, request: &ControlRequest) -> TransferResult<Vec<u8>>;
        }
    }

    const HP_MUTE: (u16, u16) = (0x0100, 0x0500);
    const HP_VOLUME: (u16, u16) = (0x0200, 0x0500);
    const MIC_MUTE: (u16, u16) = (0x0100, 0x0600);
    const MIC_VOLUME: (u16, u16) = (0x0200, 0x0600);

    fn is_get(request: &ControlRequest) -> bool {
        matches!(request.data, DataStage::Read(_))
    }

    fn is_set(request: &ControlRequest) -> bool {
        matches!(request.data, DataStage::Write(_))
    }

    fn failed() -> TransferError {
        TransferError::TransferFailed(std::io::Error::from_raw_os_error(71))
    }

    /// A Wave:3 with mic live, headphones muted, headphone volume at 50%
    /// of -64..0 dB and mic gain at 3072 within 0..6144.
    fn wave3_answer(request: &ControlRequest) -> TransferResult<Vec<u8>> {
        let word = |v: i16| Ok(v.to_le_bytes().to_vec());
        match (request.request, (request.value, request.index)) {
            (GET_CUR, MIC_MUTE) => Ok(vec![0]),
            (GET_CUR, HP_MUTE) => Ok(vec![1]),
            (GET_CUR, HP_VOLUME) => word(-8192),
            (GET_MIN, HP_VOLUME) => word(-16384),
            (GET_MAX, HP_VOLUME) => word(0),
            (GET_RES, HP_VOLUME) => word(256),
            (GET_CUR, MIC_VOLUME) => word(3072),
            (GET_MIN, MIC_VOLUME) => word(0),
            (GET_MAX, MIC_VOLUME) => word(6144),
            (GET_RES, MIC_VOLUME) => word(0),
            _ => Err(failed()),
        }
    }

    fn wave3_mock() -> MockTransport {
        let mut mock = MockTransport::new();
        mock.expect_transfer().withf(is_get).returning(wave3_answer);
        mock
    }

    fn expect_set(mock: &mut MockTransport, target: (u16, u16), data: Vec<u8>) {
        mock.expect_transfer()
            .withf(move |r| {
                r.request == SET_CUR
                    && (r.value, r.index) == target
                    && r.data == DataStage::Write(data.clone())
            })
            .times(1)
            .returning(|_| Ok(Vec::new()));
    }

    #[test]
    fn test_init_caches_ranges() {
        let wave3 = Wave3::with_transport(wave3_mock()).unwrap();

        assert_eq!(wave3.range(Entity::Headphone), Range::new(-16384, 0, 256));
        // GET_RES of 0 is clamped
        assert_eq!(wave3.range(Entity::Microphone), Range::new(0, 6144, 1));
    }

    #[test]
    fn test_init_unreadable_mic_mute_is_fatal() {
        let mut mock = MockTransport::new();
        mock.expect_transfer().times(1).returning(|_| Err(TransferError::DeviceGone));

        assert_matches!(
            Wave3::with_transport(mock),
            Err(Error::DeviceUnreachable(TransferError::DeviceGone))
        );
    }

    #[test]
    fn test_debug_shows_ranges_without_transport() {
        let wave3 = Wave3::with_transport(wave3_mock()).unwrap();
        let shown = format!("{wave3:?}");

        assert!(shown.starts_with("Wave3 {"));
        assert!(shown.contains("headphone_range: Range { min: -16384, max: 0, resolution: 256 }"));
        assert!(shown.contains("mic_range"));
        assert!(!shown.contains("transport"));
    }

    #[test]
    fn test_init_range_failure_degrades() {
        let mut mock = MockTransport::new();
        mock.expect_transfer().returning(|r| match (r.request, (r.value, r.index)) {
            (GET_MIN | GET_MAX | GET_RES, HP_VOLUME) => Err(failed()),
            // Truncated answer to GET_MAX
            (GET_MAX, MIC_VOLUME) => Ok(vec![0x10]),
            _ => wave3_answer(r),
        });
        let wave3 = Wave3::with_transport(mock).unwrap();

        assert_eq!(wave3.range(Entity::Headphone), Range::UNAVAILABLE);
        assert_eq!(wave3.range(Entity::Microphone), Range::UNAVAILABLE);

        // Mute control still works, percentages collapse to zero
        assert_eq!(wave3.get_hp_mute(), Some(true));
        assert_eq!(wave3.get_volume().map(|l| l.percent), Some(0));
        assert_eq!(wave3.range(Entity::Headphone).percent_to_raw(80), 0);
    }

    #[test]
    fn test_reads() {
        let wave3 = Wave3::with_transport(wave3_mock()).unwrap();

        assert_eq!(wave3.get_mic_mute(), Some(false));
        assert_eq!(wave3.get_hp_mute(), Some(true));

        let volume = wave3.get_volume().unwrap();
        assert_eq!(volume.raw, -8192);
        assert_eq!(volume.percent, 50);
        assert!((volume.decibels + 32.0).abs() < f64::EPSILON);

        let gain = wave3.get_mic_gain().unwrap();
        assert_eq!(gain.raw, 3072);
        assert_eq!(gain.percent, 50);
        assert!((gain.decibels - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failed_reads_are_unknown() {
        let mut mock = MockTransport::new();
        let mut answered_first = false;
        mock.expect_transfer().returning(move |r| {
            if r.request == GET_CUR && !std::mem::replace(&mut answered_first, true) {
                return Ok(vec![0]);
            }
            match r.request {
                GET_CUR => Err(TransferError::DeviceGone),
                _ => wave3_answer(r),
            }
        });
        let wave3 = Wave3::with_transport(mock).unwrap();

        assert_eq!(wave3.get_mic_mute(), None);
        assert_eq!(wave3.get_hp_mute(), None);
        assert_eq!(wave3.get_volume(), None);
        assert_eq!(wave3.get_mic_gain(), None);
        assert!(wave3.mute(Entity::Microphone).unwrap_err().is_device_gone());
    }

    #[test]
    fn test_short_mute_response() {
        let mut mock = MockTransport::new();
        let mut gain_read = false;
        mock.expect_transfer().returning(move |r| match (r.request, (r.value, r.index)) {
            (GET_CUR, HP_MUTE) => Ok(Vec::new()),
            // Second gain read comes back one byte short
            (GET_CUR, MIC_VOLUME) if std::mem::replace(&mut gain_read, true) => Ok(vec![1]),
            _ => wave3_answer(r),
        });
        let wave3 = Wave3::with_transport(mock).unwrap();

        assert_matches!(
            wave3.mute(Entity::Headphone),
            Err(Error::ShortResponse { expected: 1, actual: 0 })
        );
        assert_eq!(wave3.get_mic_gain().map(|l| l.raw), Some(3072));
        assert_matches!(
            wave3.level(Entity::Microphone),
            Err(Error::ShortResponse { expected: 2, actual: 1 })
        );
    }

    #[test]
    fn test_set_mute_sends_one_byte() {
        let mut mock = wave3_mock();
        expect_set(&mut mock, MIC_MUTE, vec![1]);
        expect_set(&mut mock, HP_MUTE, vec![0]);
        let wave3 = Wave3::with_transport(mock).unwrap();

        assert!(wave3.set_mic_mute(true));
        assert!(wave3.set_hp_mute(false));
    }

    #[test]
    fn test_set_volume_percent_sends_le_word() {
        let mut mock = wave3_mock();
        // 25% of -16384..0
        expect_set(&mut mock, HP_VOLUME, (-12288i16).to_le_bytes().to_vec());
        // 100% of 0..6144
        expect_set(&mut mock, MIC_VOLUME, 6144i16.to_le_bytes().to_vec());
        let wave3 = Wave3::with_transport(mock).unwrap();

        assert!(wave3.set_volume_percent(25));
        assert!(wave3.set_mic_gain_percent(100));
    }

    #[test]
    fn test_write_level_percent_reports_raw() {
        let mut mock = wave3_mock();
        expect_set(&mut mock, MIC_VOLUME, 0i16.to_le_bytes().to_vec());
        let wave3 = Wave3::with_transport(mock).unwrap();

        assert_eq!(wave3.write_level_percent(Entity::Microphone, 0).unwrap(), 0);
    }

    #[test]
    fn test_failed_write_returns_false() {
        let mut mock = wave3_mock();
        mock.expect_transfer().withf(is_set).returning(|_| Err(failed()));
        let wave3 = Wave3::with_transport(mock).unwrap();

        assert!(!wave3.set_mic_mute(true));
        assert!(!wave3.set_volume_percent(10));
    }

    #[test]
    fn test_toggle_unmuted_mic() {
        let mut mock = wave3_mock();
        expect_set(&mut mock, MIC_MUTE, vec![1]);
        let wave3 = Wave3::with_transport(mock).unwrap();

        assert_eq!(wave3.toggle_mic_mute(), Some(true));
    }

    #[test]
    fn test_toggle_unreadable_does_not_write() {
        let mut mock = MockTransport::new();
        let mut answered_first = false;
        mock.expect_transfer().withf(is_get).returning(move |r| {
            if (r.value, r.index) == MIC_MUTE && std::mem::replace(&mut answered_first, true) {
                return Err(failed());
            }
            wave3_answer(r)
        });
        mock.expect_transfer().withf(is_set).never();
        let wave3 = Wave3::with_transport(mock).unwrap();

        assert_eq!(wave3.toggle_mic_mute(), None);
    }

    #[test]
    fn test_toggle_failed_write_is_unknown() {
        let mut mock = wave3_mock();
        mock.expect_transfer().withf(is_set).times(1).returning(|_| Err(failed()));
        let wave3 = Wave3::with_transport(mock).unwrap();

        assert_eq!(wave3.toggle_mic_mute(), None);
    }

    #[test]
    fn test_discover() {
        let wave3 = Wave3::with_transport(wave3_mock()).unwrap();
        let report = wave3.discover();

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].entity, Entity::Headphone);
        assert_eq!(report[0].id, 5);
        assert_eq!(report[0].muted, Some(true));
        assert_eq!(report[0].level.map(|l| l.percent), Some(50));
        assert_eq!(report[1].id, 6);
        assert_eq!(report[1].range, Range::new(0, 6144, 1));
    }
}
