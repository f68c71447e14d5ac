//! # Kernel synchronization primitives
//!
//! The kernel runs on one CPU with two execution contexts: the normal flow
//! (the shell loop) and interrupt handlers. Data crossing that boundary goes
//! through the lock-free primitives here, since a handler must never spin on
//! a lock held by the code it interrupted.
//!
//! * [`LossySlot`]: single-value mailbox; the producer overwrites, the
//!   consumer takes-and-clears.
//! * [`SyncOnceCell`]: write-once storage for tables that handlers read.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod lossy_slot;
mod sync_once_cell;

pub use lossy_slot::LossySlot;
pub use sync_once_cell::SyncOnceCell;
