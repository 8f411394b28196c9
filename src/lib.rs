//! dragscroll - hold the middle mouse button and drag to scroll
//!
//! Every mouse found under `/dev/input` (at startup or when plugged in later)
//! is grabbed exclusively and mirrored by a uinput device. Events flow through
//! unchanged except while the middle button is held: then vertical motion is
//! re-emitted as high-resolution wheel scrolling and everything else is
//! swallowed.

pub mod classifier;
pub mod daemon;
pub mod device;
pub mod error;
pub mod evdev_access;
pub mod handle;
pub mod hotplug;
pub mod registry;
pub mod remap;
pub mod settings;

#[cfg(test)]
mod testing;

pub use daemon::{Daemon, PassReport};
pub use device::{DeviceAccess, DeviceEnumerator, DeviceInfo, InputSource, OutputSink, RawEvent};
pub use error::{RegisterError, StartupError};
pub use evdev_access::{EvdevAccess, InputDirEnumerator};
pub use hotplug::{HotplugAction, HotplugEvent, HotplugMonitor, UdevMonitor};
pub use remap::{Mode, ScrollRemapper};
pub use settings::Settings;
