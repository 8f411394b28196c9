//! The scheduling loop and the context object it owns

use crate::classifier::{self, Registration};
use crate::device::{DeviceAccess, DeviceEnumerator};
use crate::error::StartupError;
use crate::hotplug::{self, HotplugMonitor};
use crate::registry::Registry;
use crate::settings::Settings;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{info, warn};

/// What one scheduling pass did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub added: usize,
    pub events_read: usize,
    pub events_emitted: usize,
    pub reaped: usize,
}

impl PassReport {
    pub fn is_idle(&self) -> bool {
        self.added == 0 && self.events_read == 0 && self.reaped == 0
    }
}

/// Everything the daemon owns for its whole lifetime.
pub struct Daemon<A: DeviceAccess, M: HotplugMonitor> {
    access: A,
    monitor: M,
    registry: Registry<A::Source, A::Sink>,
    settings: Settings,
}

impl<A: DeviceAccess, M: HotplugMonitor> Daemon<A, M> {
    pub fn new(access: A, monitor: M, settings: Settings) -> Self {
        Self {
            access,
            monitor,
            registry: Registry::new(),
            settings,
        }
    }

    pub fn registry(&self) -> &Registry<A::Source, A::Sink> {
        &self.registry
    }

    /// Register every mouse already present. Nodes that cannot be taken over
    /// are logged and skipped; only an unreadable directory is fatal.
    pub fn register_existing<E: DeviceEnumerator>(
        &mut self,
        enumerator: &E,
    ) -> Result<usize, StartupError> {
        let mut registered = 0;
        for path in enumerator.list()? {
            match classifier::register_device(
                &mut self.access,
                &mut self.registry,
                &path,
                &self.settings,
            ) {
                Ok(Registration::Registered) => registered += 1,
                Ok(_) => {}
                Err(e) => warn!("{e}"),
            }
        }
        Ok(registered)
    }

    /// One scheduling pass: hotplug, then every alive device, then reaping.
    pub fn poll_once(&mut self) -> PassReport {
        let mut report = PassReport {
            added: hotplug::drain_hotplug(
                &mut self.monitor,
                &mut self.access,
                &mut self.registry,
                &self.settings,
            ),
            ..PassReport::default()
        };

        self.registry.for_each_alive(|handle| {
            let stats = handle.drain();
            report.events_read += stats.read;
            report.events_emitted += stats.emitted;
        });

        report.reaped = self.registry.drain_dead();
        report
    }

    /// Run passes until `stop` is set, then release every device.
    ///
    /// `stop` is only looked at between passes, never inside a drain.
    pub fn run(&mut self, stop: &AtomicBool) {
        info!("Watching {} mouse device(s)", self.registry.len());

        while !stop.load(Ordering::Relaxed) {
            let report = self.poll_once();
            if report.is_idle() {
                thread::sleep(self.settings.idle_sleep);
            }
        }

        self.shutdown();
    }

    /// Mark every device dead and reap them all.
    pub fn shutdown(&mut self) {
        self.registry.mark_all_dead();
        let released = self.registry.drain_dead();
        info!("Shut down, released {released} device(s)");
    }
}

impl<A: DeviceAccess, M: HotplugMonitor> Drop for Daemon<A, M> {
    fn drop(&mut self) {
        self.registry.teardown_all();
    }
}
