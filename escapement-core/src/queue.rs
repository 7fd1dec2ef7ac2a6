//! Time-ordered dispatch of deferred calls
//!
//! The queue is driven synchronously by whoever owns it: schedule operations
//! insert records, [`EventQueue::advance_and_dispatch`] moves virtual time
//! forward one tick at a time and runs everything that has become due. All
//! callables run to completion on the calling thread, in non-decreasing tick
//! order. Calls due at the same tick run in one batch; their relative order
//! within the batch is unspecified and callers must not depend on it.
//!
//! A call inserted while its own tick's batch is running never joins that
//! batch: the sweep re-scans for the earliest due tick after every batch, so
//! zero-delay work scheduled from inside a callable still runs before
//! [`EventQueue::dispatch_due`] returns, just in a later batch of the same
//! sweep.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::call::{PendingCall, Work};
use crate::handle::{Handle, HandleGenerator};

/// Record of the callable currently executing
///
/// Lives only for the duration of one invocation; nested dispatch saves and
/// restores the outer record.
struct InFlight {
    handle: Handle,
    periodic: bool,
    cancelled: bool,
}

/// Cooperative deferred-call dispatch queue
///
/// Single-threaded by contract: the queue itself creates no concurrency and
/// must not be shared across threads without external synchronization.
pub struct EventQueue {
    /// Current virtual time in ticks
    now_tick: u64,
    /// Pending records, scanned linearly (small sets expected)
    pending: Vec<PendingCall>,
    /// Handle source for this queue
    handles: HandleGenerator,
    /// Set by `stop_dispatch`, consumed by the current top-level dispatch
    stop_requested: bool,
    /// The callable currently being invoked, if any
    in_flight: Option<InFlight>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    /// Create an empty queue at tick 0
    pub fn new() -> Self {
        Self {
            now_tick: 0,
            pending: Vec::new(),
            handles: HandleGenerator::new(),
            stop_requested: false,
            in_flight: None,
        }
    }

    /// Get the current virtual time in ticks
    pub fn now_tick(&self) -> u64 {
        self.now_tick
    }

    /// Number of scheduled calls not yet dispatched
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Check if no calls are pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedule a call for the next dispatch pass
    ///
    /// Equivalent to `schedule_after(0, call)`.
    pub fn schedule_now(&mut self, call: impl FnOnce(&mut EventQueue) + 'static) -> Handle {
        self.schedule_after(0, call)
    }

    /// Schedule a call to run once `delay_ticks` have elapsed
    ///
    /// A delay of 0 makes the call eligible on the next dispatch pass.
    /// Nothing is invoked here; the call runs when dispatch reaches its
    /// target tick. Returns the handle to cancel it with.
    pub fn schedule_after(
        &mut self,
        delay_ticks: u64,
        call: impl FnOnce(&mut EventQueue) + 'static,
    ) -> Handle {
        let handle = self.handles.allocate();
        self.pending.push(PendingCall {
            handle,
            target_tick: self.now_tick.saturating_add(delay_ticks),
            work: Work::Once(Box::new(call)),
        });
        handle
    }

    /// Schedule a call to run every `period_ticks`
    ///
    /// The first run happens one period from now; after each run the call is
    /// re-armed one period after its previous target, keeping its handle,
    /// until cancelled. A period of 0 is clamped to 1 so dispatch always
    /// makes forward progress.
    pub fn schedule_every(
        &mut self,
        period_ticks: u64,
        call: impl FnMut(&mut EventQueue) + 'static,
    ) -> Handle {
        let period_ticks = period_ticks.max(1);
        let handle = self.handles.allocate();
        self.pending.push(PendingCall {
            handle,
            target_tick: self.now_tick.saturating_add(period_ticks),
            work: Work::Every {
                call: Box::new(call),
                period_ticks,
            },
        });
        handle
    }

    /// Cancel a scheduled call
    ///
    /// Returns true if a pending record was found and removed; once this
    /// returns true the callable is guaranteed never to run again. A stale,
    /// unknown, or already-dispatched handle is a no-op returning false.
    ///
    /// Cancelling the call that is currently executing (only reachable from
    /// inside the callable itself) returns false for a one-shot call, which
    /// is already running, and true for a periodic call, which is then not
    /// re-armed.
    pub fn cancel(&mut self, handle: Handle) -> bool {
        if let Some(running) = self.in_flight.as_mut() {
            if running.handle == handle {
                if running.periodic && !running.cancelled {
                    running.cancelled = true;
                    return true;
                }
                return false;
            }
        }

        match self.pending.iter().position(|call| call.handle == handle) {
            Some(index) => {
                self.pending.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Ticks until a pending call becomes due
    ///
    /// Returns 0 for a call that is already due, or None if the handle is
    /// unknown or the call has been dispatched or cancelled.
    pub fn time_left(&self, handle: Handle) -> Option<u64> {
        self.pending
            .iter()
            .find(|call| call.handle == handle)
            .map(|call| call.target_tick.saturating_sub(self.now_tick))
    }

    /// Request the current dispatch entry to return early
    ///
    /// Intended to be called from inside a callable. The dispatch loop stops
    /// after the running callable returns; due calls that have not run stay
    /// pending. The request only covers the current top-level
    /// `dispatch_due`/`advance_and_dispatch` entry and is discarded when the
    /// next one begins.
    pub fn stop_dispatch(&mut self) {
        self.stop_requested = true;
    }

    /// Run every pending call that is due at the current tick
    ///
    /// Repeats: find the single earliest target tick at or before now, run
    /// the batch of calls due at exactly that tick, re-scan. Returns once no
    /// pending call is due or a stop was requested. A no-op on an empty
    /// queue. Does not advance the clock.
    pub fn dispatch_due(&mut self) {
        if self.in_flight.is_none() {
            // Top-level entry: a stop request from an earlier entry is stale
            self.stop_requested = false;
        }

        while !self.stop_requested {
            let batch_tick = match self.earliest_due_tick() {
                Some(tick) => tick,
                None => break,
            };

            // Snapshot the batch up-front: calls inserted by the batch's own
            // callables get fresh handles and wait for the next re-scan
            let batch: Vec<Handle> = self
                .pending
                .iter()
                .filter(|call| call.target_tick == batch_tick)
                .map(|call| call.handle)
                .collect();

            for handle in batch {
                if self.stop_requested {
                    break;
                }
                self.run_one(handle);
            }
        }
    }

    /// Advance the clock by `duration_ticks`, dispatching as it moves
    ///
    /// Each unit tick increments now by one and runs a full `dispatch_due`
    /// sweep, so a callback scheduled with zero delay during tick N runs
    /// within tick N's sweep rather than jumping ahead of calls due at N.
    /// One final sweep after the loop catches zero-delay work scheduled
    /// during the last tick's callbacks. `advance_and_dispatch(0)` is a
    /// single `dispatch_due` sweep.
    pub fn advance_and_dispatch(&mut self, duration_ticks: u64) {
        if self.in_flight.is_none() {
            self.stop_requested = false;
        }

        for _ in 0..duration_ticks {
            if self.stop_requested {
                break;
            }
            self.now_tick = self.now_tick.saturating_add(1);
            self.dispatch_due();
        }

        if !self.stop_requested {
            self.dispatch_due();
        }
    }

    /// Earliest target tick among pending calls that is at or before now
    fn earliest_due_tick(&self) -> Option<u64> {
        self.pending
            .iter()
            .filter(|call| call.due_at(self.now_tick))
            .map(|call| call.target_tick)
            .min()
    }

    /// Remove one record and invoke it
    ///
    /// The record leaves the pending set before the callable runs, so a
    /// `cancel` from inside any callable can never race a dispatched call.
    /// Skips handles that an earlier callable in the same batch cancelled.
    fn run_one(&mut self, handle: Handle) {
        let index = match self.pending.iter().position(|call| call.handle == handle) {
            Some(index) => index,
            None => return,
        };
        let record = self.pending.swap_remove(index);
        let target_tick = record.target_tick;

        match record.work {
            Work::Once(call) => {
                let outer = self.in_flight.replace(InFlight {
                    handle,
                    periodic: false,
                    cancelled: false,
                });
                call(self);
                self.in_flight = outer;
            }
            Work::Every {
                call: mut call_fn,
                period_ticks,
            } => {
                let outer = self.in_flight.replace(InFlight {
                    handle,
                    periodic: true,
                    cancelled: false,
                });
                call_fn(self);
                let cancelled = self
                    .in_flight
                    .as_ref()
                    .map(|running| running.cancelled)
                    .unwrap_or(false);
                self.in_flight = outer;

                if !cancelled {
                    // Fixed cadence: re-arm relative to the previous target
                    self.pending.push(PendingCall {
                        handle,
                        target_tick: target_tick.saturating_add(period_ticks),
                        work: Work::Every {
                            call: call_fn,
                            period_ticks,
                        },
                    });
                }
            }
        }
    }
}
