//! Deciding which device nodes to take over, and taking them over

use crate::device::{DeviceAccess, Grabbed, InputSource};
use crate::error::RegisterError;
use crate::handle::DeviceHandle;
use crate::registry::Registry;
use crate::settings::Settings;
use std::path::Path;
use tracing::{debug, info};

/// Appended to the name of every virtual device we create, so our own output
/// devices are recognised when hotplug announces them.
pub const VIRTUAL_NAME_SUFFIX: &str = " (dragscroll)";

/// Outcome of looking at one device node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    /// Not an event node under the input directory
    Ignored,
    AlreadyRegistered,
    NotAMouse,
    /// One of our own virtual devices
    OwnOutput,
}

/// Name for the virtual twin of a device called `name`.
///
/// uinput names hold at most `UINPUT_MAX_NAME_SIZE - 1` bytes, so long source
/// names are cut at a char boundary to keep the suffix intact.
pub fn virtual_device_name(name: &str) -> String {
    let max_base = libc::UINPUT_MAX_NAME_SIZE - 1 - VIRTUAL_NAME_SUFFIX.len();
    let mut end = name.len().min(max_base);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{VIRTUAL_NAME_SUFFIX}", &name[..end])
}

/// Only `<input_dir>/<prefix>*` nodes are considered.
pub fn is_candidate_path(path: &Path, settings: &Settings) -> bool {
    if path.parent() != Some(settings.input_dir.as_path()) {
        return false;
    }

    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(&settings.device_prefix))
        .unwrap_or(false)
}

/// Look at `path` and, if it is a mouse, grab it and add it to `registry`.
///
/// Every sub-resource acquired here is released again if a later step fails:
/// the source closes when dropped, the sink is destroyed when dropped and the
/// grab only exists inside [`Grabbed`].
pub fn register_device<A: DeviceAccess>(
    access: &mut A,
    registry: &mut Registry<A::Source, A::Sink>,
    path: &Path,
    settings: &Settings,
) -> Result<Registration, RegisterError> {
    if !is_candidate_path(path, settings) {
        return Ok(Registration::Ignored);
    }

    if registry.contains(path) {
        return Ok(Registration::AlreadyRegistered);
    }

    let source = access.open(path).map_err(|source| RegisterError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let info = source.info();
    if info.name.ends_with(VIRTUAL_NAME_SUFFIX) {
        debug!("Skipping our own virtual device {} ({})", info.name, path.display());
        return Ok(Registration::OwnOutput);
    }
    if !info.is_candidate_mouse() {
        debug!("Skipping {} ({}): not a mouse", info.name, path.display());
        return Ok(Registration::NotAMouse);
    }

    let sink = access
        .create_sink(&source)
        .map_err(|source| RegisterError::VirtualDevice {
            path: path.to_path_buf(),
            source,
        })?;

    let source = Grabbed::acquire(source).map_err(|source| RegisterError::Grab {
        path: path.to_path_buf(),
        source,
    })?;

    let handle = DeviceHandle::new(path.to_path_buf(), source, sink);
    let name = handle.name().to_string();
    registry.insert(handle)?;

    info!("Registered mouse {} ({})", name, path.display());
    Ok(Registration::Registered)
}
