//! Round-robin status projection.
//!
//! One call to [`step`] per display tick: emit a line for the current
//! position, return the next position. Order is each multiplexer's
//! mounted TMP275 followed by its port sensors in gapless order, then the
//! next multiplexer, wrapping to mux 0. The function is pure so the
//! traversal can be tested without a display.

use core::fmt::Write as _;

use heapless::String;

use crate::readings::Temperature;
use crate::topology::{SlotId, Topology};

pub const STATUS_LINE_LEN: usize = 32;
pub type StatusLine = String<STATUS_LINE_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCursor {
    /// Mounted temperature of multiplexer `mux`.
    Mounted { mux: u8 },
    /// A port sensor.
    Slot(SlotId),
}

impl Default for StatusCursor {
    fn default() -> Self {
        Self::Mounted { mux: 0 }
    }
}

/// Render the line for `cursor` and return the following cursor.
///
/// A cursor that no longer names a populated entry restarts at mux 0.
pub fn step(cursor: StatusCursor, topology: &Topology) -> (StatusCursor, StatusLine) {
    let mut line = StatusLine::new();
    let Some(first) = topology.mux(0) else {
        let _ = line.push_str("mux[0] missing");
        return (StatusCursor::default(), line);
    };

    match cursor {
        StatusCursor::Mounted { mux: m } => {
            let (m, mux) = match topology.mux(m as usize) {
                Some(mux) => (m, mux),
                None => (0, first),
            };
            match mux.mounted_tmp275() {
                Some(reading) => {
                    let _ = write!(line, "m[{m}] ");
                    push_temperature(&mut line, reading.value());
                }
                None => {
                    let _ = write!(line, "m[{m}] no TMP275");
                }
            }
            let next = if mux.has_sensors() {
                StatusCursor::Slot(SlotId::new(m, 0, 0))
            } else {
                StatusCursor::Mounted {
                    mux: next_mux(topology, m),
                }
            };
            (next, line)
        }
        StatusCursor::Slot(id) => {
            let Some(sensor) = topology.port_sensor(id) else {
                return step(StatusCursor::default(), topology);
            };
            let _ = write!(line, "m[{}].p[{}].s[{}] ", id.mux, id.port, id.slot);
            push_temperature(&mut line, sensor.reading().value());
            (next_after_slot(topology, id), line)
        }
    }
}

fn push_temperature(line: &mut StatusLine, value: Option<Temperature>) {
    let _ = match value {
        Some(t) => write!(line, "{:.4}°F", t.fahrenheit),
        None => write!(line, "--"),
    };
}

fn next_mux(topology: &Topology, m: u8) -> u8 {
    if topology.mux_exists(m as usize + 1) {
        m + 1
    } else {
        0
    }
}

fn next_after_slot(topology: &Topology, id: SlotId) -> StatusCursor {
    let next_slot = SlotId::new(id.mux, id.port, id.slot + 1);
    if topology.port_sensor(next_slot).is_some() {
        return StatusCursor::Slot(next_slot);
    }
    let next_port = SlotId::new(id.mux, id.port + 1, 0);
    if topology.port_sensor(next_port).is_some() {
        return StatusCursor::Slot(next_port);
    }
    StatusCursor::Mounted {
        mux: next_mux(topology, id.mux),
    }
}
