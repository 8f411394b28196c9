//! Runtime settings
//!
//! There is no configuration file. The defaults match a stock Linux system and
//! a couple of environment variables can override them for testing or unusual
//! setups.

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Environment variable overriding [`Settings::input_dir`]
pub const ENV_INPUT_DIR: &str = "DRAGSCROLL_INPUT_DIR";
/// Environment variable overriding [`Settings::idle_sleep`], in milliseconds
pub const ENV_IDLE_MS: &str = "DRAGSCROLL_IDLE_MS";

const DEFAULT_INPUT_DIR: &str = "/dev/input";
const DEFAULT_DEVICE_PREFIX: &str = "event";
const DEFAULT_IDLE_SLEEP: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding the evdev nodes
    pub input_dir: PathBuf,

    /// File name prefix of the nodes worth looking at
    pub device_prefix: String,

    /// How long to sleep after a pass that moved no events
    pub idle_sleep: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            device_prefix: DEFAULT_DEVICE_PREFIX.to_string(),
            idle_sleep: DEFAULT_IDLE_SLEEP,
        }
    }
}

impl Settings {
    /// Defaults, overridden by the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] but with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(dir) = lookup(ENV_INPUT_DIR) {
            if dir.trim().is_empty() {
                warn!("{ENV_INPUT_DIR} is empty, keeping {:?}", settings.input_dir);
            } else {
                settings.input_dir = PathBuf::from(dir);
            }
        }

        if let Some(ms) = lookup(ENV_IDLE_MS) {
            match ms.trim().parse::<u64>() {
                Ok(ms) => settings.idle_sleep = Duration::from_millis(ms),
                Err(e) => warn!(
                    "Ignoring {ENV_IDLE_MS}={ms:?} ({e}), keeping {:?}",
                    settings.idle_sleep
                ),
            }
        }

        settings
    }
}
