//! Stored records for scheduled calls
//!
//! Each record pairs the owned callable with the tick it becomes due at and
//! the handle issued to the caller. Ownership of the callable transfers into
//! the queue at schedule time and is consumed at dispatch (or dropped at
//! cancellation); nothing outside the queue can reach it again.

use alloc::boxed::Box;

use crate::handle::Handle;
use crate::queue::EventQueue;

/// One-shot deferred call
///
/// The running callable is lent the queue it was scheduled on, which is how
/// it may schedule or cancel further work re-entrantly.
pub type DeferredCall = Box<dyn FnOnce(&mut EventQueue)>;

/// Periodic deferred call, re-armed after every run until cancelled
pub type PeriodicCall = Box<dyn FnMut(&mut EventQueue)>;

/// The work stored in a pending record
pub(crate) enum Work {
    /// Runs once, then the record is gone
    Once(DeferredCall),
    /// Runs every `period_ticks`, keeping its handle across runs
    Every {
        call: PeriodicCall,
        period_ticks: u64,
    },
}

/// One scheduled deferred invocation
pub(crate) struct PendingCall {
    /// Handle issued to the scheduling caller
    pub handle: Handle,
    /// Tick at which the call becomes eligible (immutable once scheduled)
    pub target_tick: u64,
    /// The owned callable
    pub work: Work,
}

impl PendingCall {
    /// Whether this record is due at or before the given tick
    pub(crate) fn due_at(&self, now_tick: u64) -> bool {
        self.target_tick <= now_tick
    }
}
