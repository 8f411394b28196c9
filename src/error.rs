//! Error types shared by the daemon components

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single candidate device could not be taken over.
///
/// These never stop the daemon: the device is skipped and the loop goes on.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("Failed to open device {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("Failed to create uinput from device {}: {source}", path.display())]
    VirtualDevice { path: PathBuf, source: io::Error },

    #[error("Failed to grab device {}: {source}", path.display())]
    Grab { path: PathBuf, source: io::Error },

    #[error("Device {} is already registered", .0.display())]
    AlreadyRegistered(PathBuf),
}

impl RegisterError {
    pub fn path(&self) -> &PathBuf {
        match self {
            RegisterError::Open { path, .. }
            | RegisterError::VirtualDevice { path, .. }
            | RegisterError::Grab { path, .. }
            | RegisterError::AlreadyRegistered(path) => path,
        }
    }
}

/// Unrecoverable failures while bringing the daemon up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Program must run as root")]
    NotRoot,

    #[error("Could not access {}: {source}", path.display())]
    InputDir { path: PathBuf, source: io::Error },

    #[error("Failed to start udev monitor: {0}")]
    Hotplug(#[source] io::Error),

    #[error("Failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
