//! One managed mouse: its grabbed source, its virtual twin and its scroll state

use crate::device::{Grabbed, InputSource, OutputSink, RawEvent};
use crate::remap::{Mode, ScrollRemapper};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Dead,
}

/// Counters for one drain of a device
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    pub read: usize,
    /// Events written to the virtual device, closing reports included
    pub emitted: usize,
}

/// A registered device.
///
/// `source` is declared before `sink` so that dropping the handle ungrabs and
/// closes the physical device before the virtual one goes away.
pub struct DeviceHandle<S: InputSource, K: OutputSink> {
    path: PathBuf,
    source: Grabbed<S>,
    sink: K,
    remapper: ScrollRemapper,
    liveness: Liveness,
    read_buf: Vec<RawEvent>,
    /// Translated output of the frame still waiting for its SYN_REPORT
    frame: Vec<RawEvent>,
}

impl<S: InputSource, K: OutputSink> DeviceHandle<S, K> {
    /// Both halves must already be acquired; the handle starts alive in
    /// [`Mode::Normal`].
    pub fn new(path: PathBuf, source: Grabbed<S>, sink: K) -> Self {
        Self {
            path,
            source,
            sink,
            remapper: ScrollRemapper::new(),
            liveness: Liveness::Alive,
            read_buf: Vec::with_capacity(64),
            frame: Vec::with_capacity(64),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.source.info().name
    }

    pub fn mode(&self) -> Mode {
        self.remapper.mode()
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    pub fn is_alive(&self) -> bool {
        self.liveness == Liveness::Alive
    }

    pub fn mark_dead(&mut self) {
        self.liveness = Liveness::Dead;
    }

    /// Read every pending event, translate it and write the result out.
    ///
    /// Output goes to the sink one frame at a time, when the source's
    /// SYN_REPORT for that frame has been read. A frame split across reads is
    /// held until its report arrives.
    ///
    /// "Would block" ends the drain normally. Any other read error marks the
    /// handle dead; a dead handle is never read again.
    pub fn drain(&mut self) -> DrainStats {
        let mut stats = DrainStats::default();
        if !self.is_alive() {
            return stats;
        }

        loop {
            self.read_buf.clear();
            match self.source.fetch_events(&mut self.read_buf) {
                Ok(()) if self.read_buf.is_empty() => break,
                Ok(()) => {
                    stats.read += self.read_buf.len();
                    for chunk in self.read_buf.split_inclusive(RawEvent::is_report) {
                        self.remapper.translate_into(chunk, &mut self.frame);
                        if chunk.last().is_some_and(RawEvent::is_report) {
                            stats.emitted +=
                                flush_frame(&mut self.sink, &mut self.frame, &self.path);
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!(
                        "Reading {} ({}) failed: {e}, dropping...",
                        self.path.display(),
                        self.name()
                    );
                    self.mark_dead();
                    break;
                }
            }
        }

        stats
    }

    /// Release the grab, close the source and destroy the virtual device.
    ///
    /// Output of an unfinished frame is written first. Consumes the handle,
    /// so it can only happen once.
    pub fn teardown(mut self) {
        flush_frame(&mut self.sink, &mut self.frame, &self.path);
        info!("Released mouse {} ({})", self.name(), self.path.display());
        drop(self);
    }
}

/// Write one frame of translated output and clear it. Returns how many events
/// reached the virtual device.
fn flush_frame<K: OutputSink>(sink: &mut K, frame: &mut Vec<RawEvent>, path: &Path) -> usize {
    if frame.is_empty() {
        return 0;
    }

    // The sink closes the frame with its own report.
    if frame.last().is_some_and(RawEvent::is_report) {
        frame.pop();
    }
    let written = frame.len() + 1;
    let result = sink.emit(frame);
    frame.clear();

    match result {
        Ok(()) => written,
        Err(e) => {
            warn!("uinput emit failed for {}: {e}", path.display());
            0
        }
    }
}
