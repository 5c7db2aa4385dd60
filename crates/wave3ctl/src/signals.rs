//! Signal handling for stopping the monitor loop.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::debug;

/// Set up signal handlers for a graceful stop.
///
/// Returns a flag that is raised when SIGINT (Ctrl+C) or SIGTERM arrives.
/// Once registered, those signals no longer terminate the process.
pub fn setup_signal_handlers() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));

    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&stop))
            .with_context(|| format!("Failed to register handler for signal {signal}"))?;
    }

    debug!("Signal handlers installed");
    Ok(stop)
}
