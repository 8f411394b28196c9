//! Device hotplug monitoring via udev

use crate::classifier::{self, Registration};
use crate::device::DeviceAccess;
use crate::error::StartupError;
use crate::registry::Registry;
use crate::settings::Settings;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotplugAction {
    Add,
    Remove,
    Other,
}

/// One notification from the hotplug channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotplugEvent {
    pub action: HotplugAction,
    pub devnode: Option<PathBuf>,
}

/// Source of hotplug notifications.
pub trait HotplugMonitor {
    /// Next pending notification, or `None` if nothing is pending. Never blocks.
    fn next_event(&mut self) -> Option<HotplugEvent>;
}

/// Watches the `input` subsystem over the udev netlink socket
pub struct UdevMonitor {
    socket: udev::MonitorSocket,
}

impl UdevMonitor {
    pub fn new() -> Result<Self, StartupError> {
        let socket = udev::MonitorBuilder::new()
            .and_then(|builder| builder.match_subsystem("input"))
            .and_then(|builder| builder.listen())
            .map_err(StartupError::Hotplug)?;

        crate::device::set_nonblocking(socket.as_raw_fd()).map_err(StartupError::Hotplug)?;

        Ok(Self { socket })
    }
}

impl HotplugMonitor for UdevMonitor {
    fn next_event(&mut self) -> Option<HotplugEvent> {
        let event = self.socket.iter().next()?;
        let action = match event.event_type() {
            udev::EventType::Add => HotplugAction::Add,
            udev::EventType::Remove => HotplugAction::Remove,
            _ => HotplugAction::Other,
        };

        Some(HotplugEvent {
            action,
            devnode: event.devnode().map(Path::to_path_buf),
        })
    }
}

/// Apply every pending hotplug notification. Returns how many devices were
/// registered.
///
/// Only additions matter here. A removed device is noticed when its next read
/// fails, which takes the same path as any other fatal read error.
pub fn drain_hotplug<A, M>(
    monitor: &mut M,
    access: &mut A,
    registry: &mut Registry<A::Source, A::Sink>,
    settings: &Settings,
) -> usize
where
    A: DeviceAccess,
    M: HotplugMonitor,
{
    let mut added = 0;

    while let Some(event) = monitor.next_event() {
        let Some(devnode) = event.devnode else {
            continue;
        };

        match event.action {
            HotplugAction::Add => {
                match classifier::register_device(access, registry, &devnode, settings) {
                    Ok(Registration::Registered) => added += 1,
                    Ok(_) => {}
                    Err(e) => warn!("{e}"),
                }
            }
            HotplugAction::Remove => {
                debug!("Hotplug remove for {}", devnode.display());
            }
            HotplugAction::Other => {}
        }
    }

    added
}
