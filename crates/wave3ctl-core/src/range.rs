//! Volume ranges and unit conversion.
//!
//! UAC 1.0 volume controls report signed 16-bit values in 1/256 dB steps.
//! Percentages are relative to the range the device reports with
//! `GET_MIN`/`GET_MAX`, which is fetched once and cached.

use serde::Serialize;

/// Raw units per decibel.
const RAW_PER_DB: f64 = 256.0;

/// Legal raw range of a volume control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    /// `GET_MIN`
    pub min: i16,
    /// `GET_MAX`
    pub max: i16,
    /// `GET_RES`, never below 1
    pub resolution: i16,
}

impl Range {
    /// Range used when discovery fails. Every percentage maps to 0.
    pub const UNAVAILABLE: Self = Self { min: 0, max: 0, resolution: 1 };

    /// Create a range, clamping the resolution to at least 1.
    #[must_use]
    pub fn new(min: i16, max: i16, resolution: i16) -> Self {
        Self { min, max, resolution: resolution.max(1) }
    }

    fn span(&self) -> i32 {
        i32::from(self.max) - i32::from(self.min)
    }

    /// Whether the range is empty or inverted.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.span() <= 0
    }

    /// Position of `raw` within the range as a rounded 0-100 percentage.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn raw_to_percent(&self, raw: i16) -> u8 {
        if self.is_degenerate() {
            return 0;
        }
        let offset = i32::from(raw) - i32::from(self.min);
        let percent = (f64::from(offset) / f64::from(self.span()) * 100.0).round_ties_even();
        percent.clamp(0.0, 100.0) as u8
    }

    /// Raw value for a percentage, truncated toward zero.
    ///
    /// Percentages above 100 are treated as 100. The result is not
    /// quantized to `resolution`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn percent_to_raw(&self, percent: u8) -> i16 {
        if self.is_degenerate() {
            return self.min;
        }
        let percent = f64::from(percent.min(100));
        let raw = f64::from(self.min) + f64::from(self.span()) * percent / 100.0;
        raw.trunc() as i16
    }

    /// Full reading for a raw value.
    #[must_use]
    pub fn level(&self, raw: i16) -> Level {
        Level { raw, percent: self.raw_to_percent(raw), decibels: decibels(raw) }
    }
}

/// Convert a raw volume value to decibels.
#[must_use]
pub fn decibels(raw: i16) -> f64 {
    f64::from(raw) / RAW_PER_DB
}

/// A volume or gain reading.
///
/// Only `raw` comes from the device; the rest is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Level {
    /// Device value in 1/256 dB
    pub raw: i16,
    /// Position within the cached range (0 - 100)
    pub percent: u8,
    /// `raw / 256`
    pub decibels: f64,
}
