//! Cooperative deferred-call dispatch queue
//!
//! This crate contains the software event queue used to serialize callback
//! execution in cooperative firmware stacks, with no dependency on a
//! preemptive scheduler or a hardware timer:
//!
//! - Time-ordered dispatch in discrete tick batches
//! - Cancellation by opaque handle
//! - Re-entrant scheduling from inside a running callable
//! - Bounded, tick-driven advancement with early stop from inside a callable
//!
//! The queue owns the deferred work outright; callers keep only a [`Handle`]
//! for cancellation. Virtual time advances only when the driving layer calls
//! [`EventQueue::advance_and_dispatch`] - the mapping from ticks to real time
//! belongs to whatever timer or ISR drives the queue.

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod call;
pub mod handle;
pub mod queue;

pub use call::{DeferredCall, PeriodicCall};
pub use handle::Handle;
pub use queue::EventQueue;
