//! Middle-button drag to high-resolution scroll translation
//!
//! Holding the middle button turns vertical pointer motion into
//! `REL_WHEEL_HI_RES` events. The button itself never reaches the virtual
//! device, and nothing else leaks through while the drag is in progress.

use crate::device::RawEvent;
use evdev::{EventType, Key, RelativeAxisType};

/// Hi-res wheel units emitted per unit of vertical motion. Negative on output:
/// dragging down scrolls the content up, like a touchpad with natural scrolling.
pub const SCROLL_FACTOR: i32 = 2;

const BTN_MIDDLE: u16 = Key::BTN_MIDDLE.0;
const REL_Y: u16 = RelativeAxisType::REL_Y.0;
const REL_WHEEL_HI_RES: u16 = RelativeAxisType::REL_WHEEL_HI_RES.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Scrolling,
}

/// Per-device translation state.
#[derive(Debug, Default)]
pub struct ScrollRemapper {
    mode: Mode,
}

impl ScrollRemapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Feed one input event, in arrival order.
    ///
    /// Returns the event to write to the virtual device, if any.
    pub fn translate(&mut self, ev: RawEvent) -> Option<RawEvent> {
        if is_middle_button(&ev) {
            self.mode = if ev.value != 0 {
                Mode::Scrolling
            } else {
                Mode::Normal
            };
            return None;
        }

        match self.mode {
            Mode::Normal => Some(ev),
            Mode::Scrolling if is_vertical_motion(&ev) => Some(RawEvent::new(
                EventType::RELATIVE,
                REL_WHEEL_HI_RES,
                ev.value.saturating_mul(-SCROLL_FACTOR),
            )),
            Mode::Scrolling => None,
        }
    }

    /// Translate a whole batch, appending the survivors to `out`.
    pub fn translate_into(&mut self, events: &[RawEvent], out: &mut Vec<RawEvent>) {
        out.extend(events.iter().filter_map(|&ev| self.translate(ev)));
    }
}

fn is_middle_button(ev: &RawEvent) -> bool {
    ev.event_type == EventType::KEY && ev.code == BTN_MIDDLE
}

fn is_vertical_motion(ev: &RawEvent) -> bool {
    ev.event_type == EventType::RELATIVE && ev.code == REL_Y
}
