//! RV32IM + Zicond emulator core.
//!
//! This crate provides the device that drives a bare-metal guest program:
//! - [`address_space::AddressSpace`]: the unified RAM/ROM/PERIPH memory
//! - [`device::Device`]: register file, PC, cycle counter, and `step`
//! - [`executor::execute`]: applies one decoded instruction
//! - [`ilp`]: the optional instruction-level-parallelism replay path
//! - [`error::CoreError`]: everything that can make a `step` fail
//!
//! ELF loading and ILP schedule file parsing live in `rv32-elf` (this
//! crate is `#![no_std]` and has no filesystem access); `rv32-cli` wires
//! the two together.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod address_space;
pub mod device;
pub mod error;
pub mod executor;
pub mod ilp;

pub use device::{Device, StepOutcome};
pub use error::CoreError;
pub use executor::ExecOutcome;
