//! # Hardware Abstraction Layer
//!
//! The narrow set of privileged operations the loader and the kernel perform,
//! each behind an explicit `unsafe` boundary:
//!
//! * [`port`]: I/O port access ([`read_port`], [`write_port`]) and the
//!   [`PortIo`] capability trait that drivers are written against.
//! * [`tables`]: loading descriptor tables ([`load_descriptor_table`],
//!   [`load_interrupt_table`]).
//! * [`cpu`]: interrupt flag control and halting.
//!
//! Drivers (PIC, keyboard, A20 gate) never issue `in`/`out` themselves; they
//! take a `&mut impl PortIo`. On hardware that is [`Ports`], a zero-sized
//! capability that can only be minted through an `unsafe` constructor. In
//! host tests it is a [`testing::ScriptedPorts`] (feature `testing`).
//!
//! ## Platform
//! The instruction wrappers compile for `x86` (the 16-bit loader is built as
//! `x86`) and `x86_64`. The traits and [`DescriptorTablePointer`] are portable.

#![cfg_attr(not(any(test, doctest, feature = "testing")), no_std)]
#![allow(unsafe_code)]

pub mod cpu;
pub mod port;
pub mod tables;

#[cfg(feature = "testing")]
pub mod testing;

pub use port::{PortIo, Ports};
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use port::{read_port, write_port};
pub use tables::DescriptorTablePointer;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use tables::{load_descriptor_table, load_interrupt_table};
