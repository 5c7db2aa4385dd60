//! wave3ctl - Elgato Wave:3 control for Linux.
//!
//! Reads and changes microphone mute and gain and headphone mute and volume
//! through the wave3ctl kernel module, leaving `snd-usb-audio` bound so audio
//! keeps working.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod signals;

#[derive(Parser)]
#[command(name = "wave3ctl")]
#[command(about = "Elgato Wave:3 control for Linux", long_about = None)]
#[command(version)]
struct Cli {
    /// Control device node (default: /dev/wave3ctl)
    #[arg(long, global = true)]
    device: Option<PathBuf>,
    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current device state
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set microphone mute, or toggle it when no state is given
    Mute { state: Option<Switch> },
    /// Show or set headphone mute
    HpMute { state: Option<Switch> },
    /// Show or set headphone volume (0-100)
    Volume {
        #[arg(allow_hyphen_values = true)]
        percent: Option<i64>,
    },
    /// Show or set microphone gain (0-100)
    Gain {
        #[arg(allow_hyphen_values = true)]
        percent: Option<i64>,
    },
    /// Watch for knob and button changes
    Monitor,
    /// List feature unit controls and ranges
    Discover,
}

/// On/off argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Switch {
    #[value(alias = "true", alias = "1")]
    On,
    #[value(alias = "false", alias = "0")]
    Off,
}

impl Switch {
    fn is_on(self) -> bool {
        self == Self::On
    }
}

/// Clamp a user-supplied percentage into 0-100.
fn clamp_percent(value: i64) -> u8 {
    u8::try_from(value.clamp(0, 100)).unwrap_or(100)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;

    // Initialize logging; stdout is reserved for command output
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))?;
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let device = cli.device.unwrap_or_else(|| config.device.path.clone());
    debug!(version = env!("CARGO_PKG_VERSION"), device = %device.display(), "Starting wave3ctl");

    let wave3 = commands::open(&device)?;

    match cli.command {
        Commands::Status { json } => commands::status(&wave3, json),
        Commands::Mute { state: Some(state) } => commands::set_mic_mute(&wave3, state.is_on()),
        Commands::Mute { state: None } => commands::toggle_mic_mute(&wave3),
        Commands::HpMute { state: Some(state) } => commands::set_hp_mute(&wave3, state.is_on()),
        Commands::HpMute { state: None } => commands::show_hp_mute(&wave3),
        Commands::Volume { percent: Some(p) } => commands::set_volume(&wave3, clamp_percent(p)),
        Commands::Volume { percent: None } => commands::show_volume(&wave3),
        Commands::Gain { percent: Some(p) } => commands::set_gain(&wave3, clamp_percent(p)),
        Commands::Gain { percent: None } => commands::show_gain(&wave3),
        Commands::Monitor => {
            let stop = signals::setup_signal_handlers()?;
            commands::monitor(&wave3, config.monitor.interval(), &stop);
            Ok(())
        }
        Commands::Discover => {
            commands::discover(&wave3);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(-5), 0);
        assert_eq!(clamp_percent(0), 0);
        assert_eq!(clamp_percent(42), 42);
        assert_eq!(clamp_percent(100), 100);
        assert_eq!(clamp_percent(1000), 100);
    }

    #[test]
    fn test_parse_mute_aliases() {
        let cli = Cli::try_parse_from(["wave3ctl", "mute", "1"]).unwrap();
        assert!(matches!(cli.command, Commands::Mute { state: Some(Switch::On) }));

        let cli = Cli::try_parse_from(["wave3ctl", "mute", "false"]).unwrap();
        assert!(matches!(cli.command, Commands::Mute { state: Some(Switch::Off) }));

        let cli = Cli::try_parse_from(["wave3ctl", "mute"]).unwrap();
        assert!(matches!(cli.command, Commands::Mute { state: None }));

        assert!(Cli::try_parse_from(["wave3ctl", "mute", "maybe"]).is_err());
    }

    #[test]
    fn test_parse_negative_percent() {
        let cli = Cli::try_parse_from(["wave3ctl", "volume", "-20"]).unwrap();
        assert!(matches!(cli.command, Commands::Volume { percent: Some(-20) }));
    }

    #[test]
    fn test_parse_global_device() {
        let cli =
            Cli::try_parse_from(["wave3ctl", "status", "--json", "--device", "/tmp/w3"]).unwrap();

        assert_eq!(cli.device, Some(PathBuf::from("/tmp/w3")));
        assert!(matches!(cli.command, Commands::Status { json: true }));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
