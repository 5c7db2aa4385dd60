//! Knob and button change detection.
//!
//! The kernel module has no notification path, so the monitor polls the
//! four readable controls on a fixed interval and reports what moved since
//! the last successful read. A control that cannot be read in a cycle keeps
//! its last known value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace};
use wave3ctl_transfer::ControlTransport;

use crate::controller::Wave3;
use crate::range::Level;

/// Polling interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Last known values of the readable controls. `None` means never read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub mic_muted: Option<bool>,
    pub headphone_muted: Option<bool>,
    pub volume: Option<Level>,
    pub gain: Option<Level>,
}

impl Snapshot {
    /// Read every control once.
    #[must_use]
    pub fn read<T: ControlTransport>(wave3: &Wave3<T>) -> Self {
        Self {
            mic_muted: wave3.get_mic_mute(),
            headphone_muted: wave3.get_hp_mute(),
            volume: wave3.get_volume(),
            gain: wave3.get_mic_gain(),
        }
    }
}

/// A control that changed, carrying its new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "control", content = "value")]
pub enum Change {
    MicMute(bool),
    HeadphoneMute(bool),
    Volume(Level),
    Gain(Level),
}

/// Polling change detector.
#[derive(Debug)]
pub struct Monitor {
    last: Snapshot,
    interval: Duration,
}

impl Monitor {
    /// Take the initial snapshot.
    #[must_use]
    pub fn seed<T: ControlTransport>(wave3: &Wave3<T>) -> Self {
        Self::from_snapshot(Snapshot::read(wave3))
    }

    /// Start from a known snapshot.
    #[must_use]
    pub fn from_snapshot(last: Snapshot) -> Self {
        Self { last, interval: DEFAULT_POLL_INTERVAL }
    }

    /// Set the polling interval used by [`Monitor::run`].
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Last known values.
    #[must_use]
    pub fn last_known(&self) -> &Snapshot {
        &self.last
    }

    /// Run one polling cycle.
    pub fn poll<T: ControlTransport>(&mut self, wave3: &Wave3<T>) -> Vec<Change> {
        self.update(Snapshot::read(wave3))
    }

    /// Fold a fresh snapshot into the last known state.
    ///
    /// Volume and gain compare by raw value only.
    pub fn update(&mut self, current: Snapshot) -> Vec<Change> {
        let mut changes = Vec::new();

        if let Some(muted) = track(&mut self.last.mic_muted, current.mic_muted, |a, b| a == b) {
            changes.push(Change::MicMute(muted));
        }
        if let Some(muted) =
            track(&mut self.last.headphone_muted, current.headphone_muted, |a, b| a == b)
        {
            changes.push(Change::HeadphoneMute(muted));
        }
        if let Some(level) = track(&mut self.last.volume, current.volume, |a, b| a.raw == b.raw) {
            changes.push(Change::Volume(level));
        }
        if let Some(level) = track(&mut self.last.gain, current.gain, |a, b| a.raw == b.raw) {
            changes.push(Change::Gain(level));
        }

        changes
    }

    /// Poll until `stop` is set, reporting each change to `on_change`.
    ///
    /// `stop` is checked around every sleep, so a cycle that has started
    /// always finishes its transfers.
    pub fn run<T, F>(&mut self, wave3: &Wave3<T>, stop: &AtomicBool, mut on_change: F)
    where
        T: ControlTransport,
        F: FnMut(&Change),
    {
        debug!(interval = ?self.interval, "Monitor started");
        let mut cycles: u64 = 0;

        while !stop.load(Ordering::Relaxed) {
            thread::sleep(self.interval);
            if stop.load(Ordering::Relaxed) {
                break;
            }

            cycles += 1;
            let changes = self.poll(wave3);
            trace!(cycle = cycles, changes = changes.len(), "Poll cycle");
            for change in &changes {
                on_change(change);
            }
        }

        debug!(cycles, "Monitor stopped");
    }
}

/// Adopt `current` if it is known and differs from `last`.
fn track<V: Copy>(
    last: &mut Option<V>,
    current: Option<V>,
    same: impl Fn(&V, &V) -> bool,
) -> Option<V> {
    let value = current?;
    if last.as_ref().is_some_and(|old| same(old, &value)) {
        return None;
    }
    *last = Some(value);
    Some(value)
}
