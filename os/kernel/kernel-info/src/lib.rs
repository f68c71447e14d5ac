//! # Boot Layout and Handoff Interface
//!
//! This crate is the single source of truth shared by the two loader stages
//! and the kernel:
//!
//! * [`disk`]: which sectors hold which stage.
//! * [`memory`]: where everything lives in physical memory during and
//!   after boot.
//! * [`selectors`]: the descriptor-table layout the loader builds and the
//!   kernel relies on.
//! * [`boot`]: the kernel entry calling convention.
//! * [`handoff`]: the Handoff Descriptor Block (HDB): a little-endian TLV
//!   record the loader fills with discovered machine facts and the kernel
//!   parses at entry.
//!
//! ## Boot flow
//!
//! ```text
//!  BIOS ──▶ Stage-1 (LBA 0 @ 0x7C00)
//!              │ reads STAGE2_SECTORS from STAGE2_LBA
//!              ▼
//!           Stage-2 (@ 0x7E00, real mode)
//!              │ A20, kernel load, GDT, page tables, HDB
//!              ▼ PE ─▶ far jump ─▶ [PAE, CR3, LME, PG ─▶ far jump]
//!           Kernel (@ 0x10000, long mode), RDI = HDB address
//! ```
//!
//! ## Physical Memory Layout
//!
//! ```text
//! 0x0000_0500  boot drive byte (written by Stage-1)
//! 0x0000_1000  PML4 ─┐
//! 0x0000_2000  PDPT  ├ identity map, long-mode path only
//! 0x0000_3000  PD   ─┘
//! 0x0000_4000  Handoff Descriptor Block (HANDOFF_CAPACITY bytes)
//! 0x0000_7C00  Stage-1 (real-mode stack grows down from here)
//! 0x0000_7E00  Stage-2
//! 0x0001_0000  kernel image, entry at its first byte
//! 0x0009_F000  kernel stack top
//! 0x000B_8000  VGA text buffer (80×25 cells)
//! ```
//!
//! All constants are checked against each other at compile time.
//!
//! ## Build Integration
//! ```rust
//! // In build.rs
//! use kernel_info::memory::{KERNEL_LOAD_ADDR, KERNEL_STACK_TOP};
//!
//! println!("cargo:rustc-link-arg-bins=--defsym=KERNEL_LOAD={KERNEL_LOAD_ADDR:#x}");
//! println!("cargo:rustc-link-arg-bins=--defsym=KERNEL_STACK_TOP={KERNEL_STACK_TOP:#x}");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod disk;
pub mod handoff;
pub mod memory;
pub mod selectors;
