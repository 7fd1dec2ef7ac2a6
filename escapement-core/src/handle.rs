//! Opaque handles for scheduled calls
//!
//! A handle identifies one scheduled-but-not-yet-dispatched call and is only
//! good for cancellation. Handles are never reused within the life of a
//! queue, so a stale handle stays a harmless no-op.

use core::num::NonZeroU64;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier for a scheduled call
///
/// Non-zero by construction. Comparing handles from different queues is
/// meaningless but safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Handle(NonZeroU64);

impl Handle {
    /// Get the raw id value
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// Monotonically increasing handle source, one per queue
#[derive(Debug, Clone)]
pub(crate) struct HandleGenerator {
    next: NonZeroU64,
}

impl HandleGenerator {
    pub(crate) const fn new() -> Self {
        Self {
            next: NonZeroU64::MIN,
        }
    }

    /// Allocate a fresh handle
    pub(crate) fn allocate(&mut self) -> Handle {
        let handle = Handle(self.next);
        // u64 wraparound is out of practical reach
        self.next = self.next.checked_add(1).unwrap_or(NonZeroU64::MIN);
        handle
    }
}
