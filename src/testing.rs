//! In-memory stand-ins for the kernel side, used by the unit tests.
//!
//! Everything observable (open/grab/sink state, written events) lives in a
//! shared [`World`] so a test can keep inspecting it after the mocks have been
//! moved into the daemon.

use crate::device::{
    DeviceAccess, DeviceEnumerator, DeviceInfo, InputSource, OutputSink, RawEvent,
};
use crate::error::StartupError;
use crate::hotplug::{HotplugAction, HotplugEvent, HotplugMonitor};
use evdev::{EventType, Synchronization};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub type SharedWorld = Rc<RefCell<World>>;

#[derive(Debug, Clone)]
pub struct MockDevice {
    pub path: PathBuf,
    pub info: DeviceInfo,
    fail_open: bool,
    fail_sink: bool,
    fail_grab: bool,
}

impl MockDevice {
    pub fn mouse(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            info: DeviceInfo {
                name: "Mock Mouse".to_string(),
                has_relative_axis: true,
                has_middle_button: true,
            },
            fail_open: false,
            fail_sink: false,
            fail_grab: false,
        }
    }

    pub fn keyboard(path: &str) -> Self {
        let mut dev = Self::mouse(path);
        dev.info.name = "Mock Keyboard".to_string();
        dev.info.has_relative_axis = false;
        dev.info.has_middle_button = false;
        dev
    }

    pub fn named(mut self, name: &str) -> Self {
        self.info.name = name.to_string();
        self
    }

    pub fn fail_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn fail_sink(mut self) -> Self {
        self.fail_sink = true;
        self
    }

    pub fn fail_grab(mut self) -> Self {
        self.fail_grab = true;
        self
    }
}

#[derive(Debug)]
enum Pending {
    Events(Vec<RawEvent>),
    Error(i32),
}

#[derive(Debug, Default)]
pub struct DeviceState {
    pub open_calls: usize,
    pub source_open: bool,
    pub grabbed: bool,
    pub ungrab_calls: usize,
    pub sinks_created: usize,
    pub sink_open: bool,
    pub emit_calls: usize,
    pub fail_emit: bool,
    pub written: Vec<RawEvent>,
    pending: VecDeque<Pending>,
}

impl DeviceState {
    /// Fully released: nothing open, nothing grabbed.
    pub fn released(&self) -> bool {
        !self.source_open && !self.grabbed && !self.sink_open
    }
}

#[derive(Debug, Default)]
pub struct World {
    templates: HashMap<PathBuf, MockDevice>,
    states: HashMap<PathBuf, DeviceState>,
}

impl World {
    pub fn add_device(&mut self, device: MockDevice) {
        self.states.entry(device.path.clone()).or_default();
        self.templates.insert(device.path.clone(), device);
    }

    pub fn state(&self, path: &str) -> &DeviceState {
        self.states
            .get(Path::new(path))
            .unwrap_or_else(|| panic!("unknown mock device {path}"))
    }

    pub fn state_mut(&mut self, path: &str) -> &mut DeviceState {
        self.states
            .get_mut(Path::new(path))
            .unwrap_or_else(|| panic!("unknown mock device {path}"))
    }

    /// Queue one read batch for the device.
    pub fn push_events(&mut self, path: &str, events: &[RawEvent]) {
        self.state_mut(path)
            .pending
            .push_back(Pending::Events(events.to_vec()));
    }

    /// Queue a read failure with the given errno.
    pub fn push_error(&mut self, path: &str, errno: i32) {
        self.state_mut(path).pending.push_back(Pending::Error(errno));
    }
}

pub struct MockAccess {
    world: SharedWorld,
}

impl MockAccess {
    pub fn new() -> Self {
        Self {
            world: Rc::new(RefCell::new(World::default())),
        }
    }

    pub fn add_device(&mut self, device: MockDevice) {
        self.world.borrow_mut().add_device(device);
    }

    pub fn world(&self) -> SharedWorld {
        self.world.clone()
    }
}

impl DeviceAccess for MockAccess {
    type Source = MockSource;
    type Sink = MockSink;

    fn open(&mut self, path: &Path) -> io::Result<MockSource> {
        let mut world = self.world.borrow_mut();
        let template = match world.templates.get(path) {
            Some(template) => template.clone(),
            None => return Err(io::Error::from_raw_os_error(libc::ENOENT)),
        };

        let state = world.states.entry(path.to_path_buf()).or_default();
        state.open_calls += 1;
        if template.fail_open {
            return Err(io::Error::from_raw_os_error(libc::EACCES));
        }
        state.source_open = true;

        Ok(MockSource {
            path: template.path,
            info: template.info,
            fail_grab: template.fail_grab,
            fail_sink: template.fail_sink,
            world: self.world.clone(),
        })
    }

    fn create_sink(&mut self, source: &MockSource) -> io::Result<MockSink> {
        if source.fail_sink {
            return Err(io::Error::from_raw_os_error(libc::ENODEV));
        }

        let mut world = self.world.borrow_mut();
        let state = world.states.entry(source.path.clone()).or_default();
        state.sinks_created += 1;
        state.sink_open = true;

        Ok(MockSink {
            path: source.path.clone(),
            world: self.world.clone(),
        })
    }
}

pub struct MockSource {
    path: PathBuf,
    info: DeviceInfo,
    fail_grab: bool,
    fail_sink: bool,
    world: SharedWorld,
}

impl MockSource {
    fn with_state<R>(&self, f: impl FnOnce(&mut DeviceState) -> R) -> R {
        let mut world = self.world.borrow_mut();
        let state = world.states.entry(self.path.clone()).or_default();
        f(state)
    }
}

impl InputSource for MockSource {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn grab(&mut self) -> io::Result<()> {
        if self.fail_grab {
            return Err(io::Error::from_raw_os_error(libc::EBUSY));
        }
        self.with_state(|state| state.grabbed = true);
        Ok(())
    }

    fn ungrab(&mut self) -> io::Result<()> {
        self.with_state(|state| {
            state.grabbed = false;
            state.ungrab_calls += 1;
        });
        Ok(())
    }

    fn fetch_events(&mut self, out: &mut Vec<RawEvent>) -> io::Result<()> {
        match self.with_state(|state| state.pending.pop_front()) {
            None => Err(io::Error::from(io::ErrorKind::WouldBlock)),
            Some(Pending::Events(events)) => {
                out.extend(events);
                Ok(())
            }
            Some(Pending::Error(errno)) => Err(io::Error::from_raw_os_error(errno)),
        }
    }
}

impl Drop for MockSource {
    fn drop(&mut self) {
        self.with_state(|state| state.source_open = false);
    }
}

pub struct MockSink {
    path: PathBuf,
    world: SharedWorld,
}

impl OutputSink for MockSink {
    fn emit(&mut self, events: &[RawEvent]) -> io::Result<()> {
        let mut world = self.world.borrow_mut();
        let state = world.states.entry(self.path.clone()).or_default();
        state.emit_calls += 1;
        if state.fail_emit {
            return Err(io::Error::from_raw_os_error(libc::EIO));
        }
        // like a uinput device, every emit closes the frame with a report
        state.written.extend_from_slice(events);
        state
            .written
            .push(RawEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_REPORT.0, 0));
        Ok(())
    }
}

impl Drop for MockSink {
    fn drop(&mut self) {
        let mut world = self.world.borrow_mut();
        if let Some(state) = world.states.get_mut(&self.path) {
            state.sink_open = false;
        }
    }
}

/// Hotplug queue the test can keep feeding after handing the monitor over.
#[derive(Clone, Default)]
pub struct MockMonitor {
    queue: Rc<RefCell<VecDeque<HotplugEvent>>>,
}

impl MockMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, action: HotplugAction, devnode: Option<&str>) {
        self.queue.borrow_mut().push_back(HotplugEvent {
            action,
            devnode: devnode.map(PathBuf::from),
        });
    }

    pub fn push_add(&self, devnode: &str) {
        self.push(HotplugAction::Add, Some(devnode));
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl HotplugMonitor for MockMonitor {
    fn next_event(&mut self) -> Option<HotplugEvent> {
        self.queue.borrow_mut().pop_front()
    }
}

pub struct MockEnumerator {
    pub paths: Vec<PathBuf>,
    pub fail: bool,
}

impl MockEnumerator {
    pub fn new(paths: &[&str]) -> Self {
        Self {
            paths: paths.iter().map(PathBuf::from).collect(),
            fail: false,
        }
    }
}

impl DeviceEnumerator for MockEnumerator {
    fn list(&self) -> Result<Vec<PathBuf>, StartupError> {
        if self.fail {
            return Err(StartupError::InputDir {
                path: PathBuf::from("/dev/input"),
                source: io::Error::from_raw_os_error(libc::EACCES),
            });
        }
        Ok(self.paths.clone())
    }
}
