//! wave3ctl core - Elgato Wave:3 feature unit control.
//!
//! Translates mute, volume and gain operations into UAC 1.0 class requests
//! on the Wave:3's two feature units, caches their volume ranges, converts
//! between raw 1/256 dB values and percentages, and detects changes made
//! on the device itself by polling.

pub mod controller;
pub mod error;
pub mod monitor;
pub mod range;
pub mod uac;

pub use controller::{FeatureUnitReport, Wave3};
pub use error::{Error, Result};
pub use monitor::{Change, DEFAULT_POLL_INTERVAL, Monitor, Snapshot};
pub use range::{Level, Range, decibels};
pub use uac::{ControlAddress, Entity, Selector};
