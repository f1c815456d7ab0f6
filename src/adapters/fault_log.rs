//! Deduplicating fault reporter.
//!
//! [`FaultLog`] keeps one active bit per [`FaultKind`] and a bounded
//! history of the reports that opened an episode. A raise of a kind that
//! is already active is counted and dropped. The kind stays active until
//! [`FaultSink::clear`] or [`FaultLog::acknowledge`].
//!
//! [`SharedFaultLog`] wraps the same log in a critical-section mutex so
//! engines on separate tasks can share one reporter.

use core::cell::RefCell;
use core::fmt::{self, Write as _};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::{Deque, String};
use log::{debug, error, info};

use crate::app::ports::FaultSink;
use crate::error::FaultKind;

pub const FAULT_HISTORY: usize = 16;
pub const FAULT_DETAIL_LEN: usize = 48;

pub type FaultDetail = String<FAULT_DETAIL_LEN>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    pub kind: FaultKind,
    pub detail: FaultDetail,
    /// Monotonic count of episodes opened, starting at 1.
    pub sequence: u32,
}

#[derive(Debug)]
pub struct FaultLog {
    active: u16,
    history: Deque<FaultRecord, FAULT_HISTORY>,
    raised: u32,
    suppressed: u32,
}

impl Default for FaultLog {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultLog {
    pub const fn new() -> Self {
        Self {
            active: 0,
            history: Deque::new(),
            raised: 0,
            suppressed: 0,
        }
    }

    /// Bitmask of active kinds (see [`FaultKind::mask`]).
    pub fn active_mask(&self) -> u16 {
        self.active
    }

    pub fn active(&self) -> impl Iterator<Item = FaultKind> + '_ {
        FaultKind::ALL
            .into_iter()
            .filter(|k| self.active & k.mask() != 0)
    }

    /// Episodes opened since boot.
    pub fn raised_count(&self) -> u32 {
        self.raised
    }

    /// Raises dropped because their kind was already active.
    pub fn suppressed_count(&self) -> u32 {
        self.suppressed
    }

    /// Most recent reports, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &FaultRecord> {
        self.history.iter()
    }

    /// Latest report of `kind`, if still in the history.
    pub fn last(&self, kind: FaultKind) -> Option<&FaultRecord> {
        self.history.iter().rev().find(|r| r.kind == kind)
    }

    /// Operator acknowledgement: end the episode of `kind`.
    pub fn acknowledge(&mut self, kind: FaultKind) {
        if self.active & kind.mask() != 0 {
            self.active &= !kind.mask();
            info!("FAULT | {kind} acknowledged");
        }
    }

    pub fn acknowledge_all(&mut self) {
        for kind in FaultKind::ALL {
            self.acknowledge(kind);
        }
    }
}

impl FaultSink for FaultLog {
    fn raise(&mut self, kind: FaultKind, detail: fmt::Arguments<'_>) -> bool {
        if self.active & kind.mask() != 0 {
            self.suppressed = self.suppressed.saturating_add(1);
            debug!("FAULT | {kind} already active: {detail}");
            return false;
        }

        self.active |= kind.mask();
        self.raised = self.raised.saturating_add(1);

        let mut text = FaultDetail::new();
        let _ = Truncating(&mut text).write_fmt(detail);
        error!("FAULT | {kind}: {text}");

        if self.history.is_full() {
            let _ = self.history.pop_front();
        }
        let _ = self.history.push_back(FaultRecord {
            kind,
            detail: text,
            sequence: self.raised,
        });
        true
    }

    fn is_active(&self, kind: FaultKind) -> bool {
        self.active & kind.mask() != 0
    }

    fn clear(&mut self, kind: FaultKind) {
        self.active &= !kind.mask();
    }
}

/// Writer that keeps as much of the text as fits.
struct Truncating<'a>(&'a mut FaultDetail);

impl fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Shared variant
// ───────────────────────────────────────────────────────────────

/// A [`FaultLog`] behind a critical-section mutex, usable from a `static`.
pub struct SharedFaultLog {
    inner: Mutex<CriticalSectionRawMutex, RefCell<FaultLog>>,
}

impl Default for SharedFaultLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedFaultLog {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(FaultLog::new())),
        }
    }

    /// Run `f` with exclusive access to the log.
    pub fn with<R>(&self, f: impl FnOnce(&mut FaultLog) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

impl FaultSink for &SharedFaultLog {
    fn raise(&mut self, kind: FaultKind, detail: fmt::Arguments<'_>) -> bool {
        self.with(|log| log.raise(kind, detail))
    }

    fn is_active(&self, kind: FaultKind) -> bool {
        self.with(|log| log.is_active(kind))
    }

    fn clear(&mut self, kind: FaultKind) {
        self.with(|log| log.clear(kind));
    }
}
