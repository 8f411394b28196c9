//! Device capabilities the daemon core relies on
//!
//! The core never talks to the kernel directly. Opening nodes, grabbing them,
//! creating uinput twins and listing `/dev/input` all go through the traits in
//! this module; [`crate::evdev_access`] provides the real implementations.

use crate::error::StartupError;
use evdev::{EventType, InputEvent, Synchronization};
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One input event as read from or written to a device (timestamp dropped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub event_type: EventType,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub const fn new(event_type: EventType, code: u16, value: i32) -> Self {
        Self {
            event_type,
            code,
            value,
        }
    }

    /// SYN_REPORT, the end of one hardware frame.
    pub fn is_report(&self) -> bool {
        self.event_type == EventType::SYNCHRONIZATION && self.code == Synchronization::SYN_REPORT.0
    }
}

impl From<InputEvent> for RawEvent {
    fn from(ev: InputEvent) -> Self {
        Self::new(ev.event_type(), ev.code(), ev.value())
    }
}

impl From<RawEvent> for InputEvent {
    fn from(ev: RawEvent) -> Self {
        InputEvent::new(ev.event_type, ev.code, ev.value)
    }
}

/// What the classifier needs to know about an opened device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub has_relative_axis: bool,
    pub has_middle_button: bool,
}

impl DeviceInfo {
    /// A device worth remapping: something that moves and has a middle button.
    pub fn is_candidate_mouse(&self) -> bool {
        self.has_relative_axis && self.has_middle_button
    }
}

/// Read side of a physical device.
///
/// Dropping the source closes the device node.
pub trait InputSource {
    fn info(&self) -> &DeviceInfo;

    fn grab(&mut self) -> io::Result<()>;

    fn ungrab(&mut self) -> io::Result<()>;

    /// Read whatever the kernel has ready and append it to `out`.
    ///
    /// Must not block. `ErrorKind::WouldBlock` means nothing is pending.
    fn fetch_events(&mut self, out: &mut Vec<RawEvent>) -> io::Result<()>;
}

/// Write side: a virtual device that re-injects events.
///
/// Dropping the sink destroys the virtual device.
pub trait OutputSink {
    /// Write `events` as one frame. The sink appends the closing SYN_REPORT
    /// itself, so `events` must not end with one.
    fn emit(&mut self, events: &[RawEvent]) -> io::Result<()>;
}

/// Opens physical devices and creates their virtual twins.
pub trait DeviceAccess {
    type Source: InputSource;
    type Sink: OutputSink;

    /// Open `path` for non-blocking reads and query its capabilities.
    fn open(&mut self, path: &Path) -> io::Result<Self::Source>;

    /// Create a virtual device mirroring every capability of `source`.
    fn create_sink(&mut self, source: &Self::Source) -> io::Result<Self::Sink>;
}

/// Lists the device nodes present right now.
pub trait DeviceEnumerator {
    fn list(&self) -> Result<Vec<PathBuf>, StartupError>;
}

/// A source that holds the exclusive grab for as long as it lives.
///
/// The grab is released exactly once, when the guard is dropped, on every
/// exit path.
pub struct Grabbed<S: InputSource> {
    source: S,
}

impl<S: InputSource> Grabbed<S> {
    /// Grab `source`. On failure the source is dropped, closing it.
    pub fn acquire(mut source: S) -> io::Result<Self> {
        source.grab()?;
        Ok(Self { source })
    }
}

impl<S: InputSource> Deref for Grabbed<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.source
    }
}

impl<S: InputSource> DerefMut for Grabbed<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: InputSource> Drop for Grabbed<S> {
    fn drop(&mut self) {
        // A vanished device fails the ungrab; closing the fd releases it anyway.
        if let Err(e) = self.source.ungrab() {
            debug!("Ungrab of '{}' failed: {e}", self.source.info().name);
        }
    }
}

/// Put an open fd into non-blocking mode, keeping its other flags.
pub(crate) fn set_nonblocking(raw_fd: std::os::unix::io::RawFd) -> io::Result<()> {
    let current = unsafe { libc::fcntl(raw_fd, libc::F_GETFL) };
    if current < 0 {
        return Err(io::Error::last_os_error());
    }

    let rc = unsafe { libc::fcntl(raw_fd, libc::F_SETFL, current | libc::O_NONBLOCK) };
    if rc < 0 {
        let err = io::Error::last_os_error();
        warn!("fcntl(F_SETFL, O_NONBLOCK) failed: {err}");
        return Err(err);
    }
    Ok(())
}
