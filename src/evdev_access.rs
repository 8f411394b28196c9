//! evdev/uinput backed implementations of the device capabilities

use crate::classifier::virtual_device_name;
use crate::device::{
    DeviceAccess, DeviceEnumerator, DeviceInfo, InputSource, OutputSink, RawEvent, set_nonblocking,
};
use crate::error::StartupError;
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AttributeSet, Device, EventType, InputEvent, Key, RelativeAxisType, UinputAbsSetup,
};
use std::fs;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Opens real `/dev/input/event*` nodes and creates `/dev/uinput` twins.
#[derive(Debug, Default)]
pub struct EvdevAccess;

impl EvdevAccess {
    pub fn new() -> Self {
        Self
    }
}

pub struct EvdevSource {
    device: Device,
    info: DeviceInfo,
}

impl EvdevSource {
    fn open(path: &Path) -> io::Result<Self> {
        let device = Device::open(path)?;
        set_nonblocking(device.as_raw_fd())?;

        let has_relative_axis = device.supported_events().contains(EventType::RELATIVE);
        let has_middle_button = device
            .supported_keys()
            .map(|keys| keys.contains(Key::BTN_MIDDLE))
            .unwrap_or(false);

        let info = DeviceInfo {
            name: device.name().unwrap_or_default().to_string(),
            has_relative_axis,
            has_middle_button,
        };

        Ok(Self { device, info })
    }
}

impl InputSource for EvdevSource {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn grab(&mut self) -> io::Result<()> {
        self.device.grab()
    }

    fn ungrab(&mut self) -> io::Result<()> {
        self.device.ungrab()
    }

    fn fetch_events(&mut self, out: &mut Vec<RawEvent>) -> io::Result<()> {
        let events = self.device.fetch_events()?;
        out.extend(events.map(RawEvent::from));
        Ok(())
    }
}

pub struct EvdevSink {
    device: VirtualDevice,
    buf: Vec<InputEvent>,
}

impl OutputSink for EvdevSink {
    fn emit(&mut self, events: &[RawEvent]) -> io::Result<()> {
        self.buf.clear();
        self.buf.extend(events.iter().map(|&ev| InputEvent::from(ev)));
        // emit() terminates the frame with its own SYN_REPORT.
        self.device.emit(&self.buf)
    }
}

impl DeviceAccess for EvdevAccess {
    type Source = EvdevSource;
    type Sink = EvdevSink;

    fn open(&mut self, path: &Path) -> io::Result<EvdevSource> {
        EvdevSource::open(path)
    }

    fn create_sink(&mut self, source: &EvdevSource) -> io::Result<EvdevSink> {
        let dev = &source.device;
        let name = virtual_device_name(&source.info.name);

        let mut builder = VirtualDeviceBuilder::new()?
            .name(&name)
            .input_id(dev.input_id());

        if let Some(keys) = dev.supported_keys() {
            builder = builder.with_keys(keys)?;
        }
        if let Some(misc) = dev.misc_properties() {
            builder = builder.with_msc(misc)?;
        }
        if let Some(switches) = dev.supported_switches() {
            builder = builder.with_switches(switches)?;
        }
        builder = builder.with_properties(dev.properties())?;

        let mut rel = AttributeSet::<RelativeAxisType>::new();
        if let Some(axes) = dev.supported_relative_axes() {
            for axis in axes.iter() {
                rel.insert(axis);
            }
        }
        // Scroll output goes out on this axis even if the mouse lacks it.
        rel.insert(RelativeAxisType::REL_WHEEL_HI_RES);
        builder = builder.with_relative_axes(&rel)?;

        if let Some(axes) = dev.supported_absolute_axes() {
            let state = dev.get_abs_state()?;
            for axis in axes.iter() {
                let abs = &state[axis.0 as usize];
                let setup = UinputAbsSetup::new(
                    axis,
                    AbsInfo::new(
                        abs.value,
                        abs.minimum,
                        abs.maximum,
                        abs.fuzz,
                        abs.flat,
                        abs.resolution,
                    ),
                );
                builder = builder.with_absolute_axis(&setup)?;
            }
        }

        let device = builder.build()?;
        debug!("Created virtual device '{name}'");

        Ok(EvdevSink {
            device,
            buf: Vec::with_capacity(64),
        })
    }
}

/// Lists the entries of the input device directory.
pub struct InputDirEnumerator {
    dir: PathBuf,
}

impl InputDirEnumerator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DeviceEnumerator for InputDirEnumerator {
    fn list(&self) -> Result<Vec<PathBuf>, StartupError> {
        let input_dir_error = |source| StartupError::InputDir {
            path: self.dir.clone(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(input_dir_error)? {
            paths.push(entry.map_err(input_dir_error)?.path());
        }
        paths.sort();
        Ok(paths)
    }
}
