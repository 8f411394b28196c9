//! dragscroll daemon entry point

use anyhow::{Context, Result};
use dragscroll::{Daemon, EvdevAccess, InputDirEnumerator, Settings, StartupError, UdevMonitor};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = run() {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    if unsafe { libc::geteuid() } != 0 {
        return Err(StartupError::NotRoot.into());
    }

    let settings = Settings::from_env();
    info!("dragscroll starting (input dir {:?})", settings.input_dir);

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = stop.clone();
    ctrlc::set_handler(move || stop_handler.store(true, Ordering::Relaxed))
        .map_err(StartupError::from)?;

    let enumerator = InputDirEnumerator::new(&settings.input_dir);
    let monitor = UdevMonitor::new().context("Failed to initialize udev")?;

    let mut daemon = Daemon::new(EvdevAccess::new(), monitor, settings);
    let registered = daemon
        .register_existing(&enumerator)
        .context("Failed to scan input devices")?;
    info!("Registered {registered} mouse device(s) at startup");

    daemon.run(&stop);

    info!("dragscroll shutting down");
    Ok(())
}
