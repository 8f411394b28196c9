//! The set of devices currently managed, keyed by device path

use crate::device::{InputSource, OutputSink};
use crate::error::RegisterError;
use crate::handle::DeviceHandle;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Owns every live [`DeviceHandle`].
///
/// Iteration follows path order, so a pass always visits devices in the same
/// sequence.
pub struct Registry<S: InputSource, K: OutputSink> {
    handles: BTreeMap<PathBuf, DeviceHandle<S, K>>,
}

impl<S: InputSource, K: OutputSink> Default for Registry<S, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: InputSource, K: OutputSink> Registry<S, K> {
    pub fn new() -> Self {
        Self {
            handles: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.handles.contains_key(path)
    }

    /// Add a handle. A second handle for a path that is already present is
    /// torn down and rejected.
    pub fn insert(&mut self, handle: DeviceHandle<S, K>) -> Result<(), RegisterError> {
        if self.handles.contains_key(handle.path()) {
            let path = handle.path().to_path_buf();
            handle.teardown();
            return Err(RegisterError::AlreadyRegistered(path));
        }

        self.handles.insert(handle.path().to_path_buf(), handle);
        Ok(())
    }

    /// Detach and tear down the handle for `path`. Returns false if absent.
    pub fn remove(&mut self, path: &Path) -> bool {
        match self.handles.remove(path) {
            Some(handle) => {
                handle.teardown();
                true
            }
            None => false,
        }
    }

    /// Tear down every dead handle. Returns how many were reaped.
    pub fn drain_dead(&mut self) -> usize {
        let dead: Vec<PathBuf> = self
            .handles
            .iter()
            .filter(|(_, handle)| !handle.is_alive())
            .map(|(path, _)| path.clone())
            .collect();

        for path in &dead {
            self.remove(path);
        }
        dead.len()
    }

    /// Run `f` on every alive handle.
    pub fn for_each_alive<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut DeviceHandle<S, K>),
    {
        for handle in self.handles.values_mut().filter(|h| h.is_alive()) {
            f(handle);
        }
    }

    pub fn mark_all_dead(&mut self) {
        for handle in self.handles.values_mut() {
            handle.mark_dead();
        }
    }

    /// Tear down every handle, dead or alive.
    pub fn teardown_all(&mut self) -> usize {
        let handles = std::mem::take(&mut self.handles);
        let count = handles.len();
        for (_, handle) in handles {
            handle.teardown();
        }
        count
    }
}
