//! Command implementations and rendering.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::{Context, Result};
use wave3ctl_core::{Change, Entity, Level, Monitor, Snapshot, Wave3, decibels};
use wave3ctl_transfer::ControlTransport;

/// Open the controller on `device`.
pub fn open(device: &Path) -> Result<Wave3> {
    Wave3::open(device).map_err(|e| describe(e, "Failed to initialize Wave:3"))
}

/// Turn a core error into a diagnostic, keeping disconnects distinct.
///
/// A disconnect is reported as is ("Wave:3 disconnected"), without the
/// operation context.
fn describe(error: wave3ctl_core::Error, context: &str) -> anyhow::Error {
    if error.is_device_gone() {
        anyhow::Error::new(error)
    } else {
        anyhow::Error::new(error).context(context.to_string())
    }
}

fn mic_label(muted: bool) -> &'static str {
    if muted { "MUTED" } else { "LIVE" }
}

fn headphone_label(muted: bool) -> &'static str {
    if muted { "MUTED" } else { "ON" }
}

fn level_label(level: &Level) -> String {
    format!("{}% ({:+.1} dB)", level.percent, level.decibels)
}

pub fn status(wave3: &Wave3, json: bool) -> Result<()> {
    let snapshot = Snapshot::read(wave3);

    if json {
        let out = serde_json::to_string_pretty(&snapshot).context("Failed to serialize status")?;
        println!("{out}");
        return Ok(());
    }

    println!("Elgato Wave:3 Status");
    println!("{}", "=".repeat(40));
    print_snapshot(&snapshot);
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    if let Some(muted) = snapshot.mic_muted {
        println!("  Mic:       {}", mic_label(muted));
    }
    if let Some(gain) = &snapshot.gain {
        println!("  Mic Gain:  {}", level_label(gain));
    }
    if let Some(muted) = snapshot.headphone_muted {
        println!("  Headphone: {}", headphone_label(muted));
    }
    if let Some(volume) = &snapshot.volume {
        println!("  HP Volume: {}", level_label(volume));
    }
}

pub fn set_mic_mute(wave3: &Wave3, muted: bool) -> Result<()> {
    wave3
        .write_mute(Entity::Microphone, muted)
        .map_err(|e| describe(e, "Failed to set mic mute"))?;
    println!("Mic {}", if muted { "muted" } else { "unmuted" });
    Ok(())
}

pub fn toggle_mic_mute(wave3: &Wave3) -> Result<()> {
    let muted = flip_mic_mute(wave3)?;
    println!("Mic {}", if muted { "muted" } else { "unmuted" });
    Ok(())
}

/// Invert the mic mute state and return the applied state.
fn flip_mic_mute<T: ControlTransport>(wave3: &Wave3<T>) -> Result<bool> {
    let muted = wave3
        .mute(Entity::Microphone)
        .map_err(|e| describe(e, "Cannot read mic mute state"))?;
    wave3
        .write_mute(Entity::Microphone, !muted)
        .map_err(|e| describe(e, "Failed to set mic mute"))?;
    Ok(!muted)
}

pub fn show_hp_mute(wave3: &Wave3) -> Result<()> {
    let muted = wave3
        .mute(Entity::Headphone)
        .map_err(|e| describe(e, "Cannot read headphone mute"))?;
    println!("Headphone: {}", headphone_label(muted));
    Ok(())
}

pub fn set_hp_mute(wave3: &Wave3, muted: bool) -> Result<()> {
    wave3
        .write_mute(Entity::Headphone, muted)
        .map_err(|e| describe(e, "Failed to set headphone mute"))?;
    println!("Headphone {}", if muted { "muted" } else { "unmuted" });
    Ok(())
}

pub fn show_volume(wave3: &Wave3) -> Result<()> {
    let level = wave3
        .level(Entity::Headphone)
        .map_err(|e| describe(e, "Cannot read volume"))?;
    println!("Volume: {}", level_label(&level));
    Ok(())
}

pub fn set_volume(wave3: &Wave3, percent: u8) -> Result<()> {
    wave3
        .write_level_percent(Entity::Headphone, percent)
        .map_err(|e| describe(e, "Failed to set volume"))?;
    println!("Volume -> {percent}%");
    Ok(())
}

pub fn show_gain(wave3: &Wave3) -> Result<()> {
    let level = wave3
        .level(Entity::Microphone)
        .map_err(|e| describe(e, "Cannot read gain"))?;
    println!("Gain: {}", level_label(&level));
    Ok(())
}

pub fn set_gain(wave3: &Wave3, percent: u8) -> Result<()> {
    wave3
        .write_level_percent(Entity::Microphone, percent)
        .map_err(|e| describe(e, "Failed to set gain"))?;
    println!("Gain -> {percent}%");
    Ok(())
}

pub fn monitor(wave3: &Wave3, interval: Duration, stop: &AtomicBool) {
    println!("Monitoring Wave:3 - Ctrl-C to stop\n");

    let mut monitor = Monitor::seed(wave3).with_interval(interval);
    println!("Current state:");
    print_snapshot(monitor.last_known());
    println!();

    monitor.run(wave3, stop, |change| match change {
        Change::MicMute(muted) => println!("  Mic       -> {}", mic_label(*muted)),
        Change::HeadphoneMute(muted) => println!("  Headphone -> {}", headphone_label(*muted)),
        Change::Volume(level) => println!("  Volume    -> {}", level_label(level)),
        Change::Gain(level) => println!("  Gain      -> {}", level_label(level)),
    });

    println!("\nStopped.");
}

pub fn discover(wave3: &Wave3) {
    println!("Elgato Wave:3 - USB Audio Class Feature Units\n");

    for unit in wave3.discover() {
        println!("  {} (Entity {}):", unit.entity.label(), unit.id);
        match unit.muted {
            Some(muted) => println!("    Mute:   {}", if muted { "ON" } else { "OFF" }),
            None => println!("    Mute:   (unavailable)"),
        }
        match &unit.level {
            Some(level) => {
                let range = unit.range;
                println!("    Volume: {}", level_label(level));
                println!(
                    "    Range:  {:.1} .. {:.1} dB  (step {:.2} dB)",
                    decibels(range.min),
                    decibels(range.max),
                    decibels(range.resolution)
                );
            }
            None => println!("    Volume: (unavailable)"),
        }
        println!();
    }
}
