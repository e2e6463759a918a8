//! ELF32 program loading and ILP schedule file parsing for the RV32IM +
//! Zicond emulator core.
//!
//! `rv32-emu` is `#![no_std]` and has no filesystem access; this crate
//! does the `std::fs` work and hands the core already-constructed values:
//! loaded sections (written directly through
//! [`rv32_emu::Device::address_space_mut`]), the decoded-instruction
//! cache watermark, and a parsed
//! [`rv32_emu::ilp::IlpSchedule`].

mod error;
mod header;
mod ilp;
mod loader;

pub use error::{IlpError, LoaderError};
pub use ilp::load_ilp_schedule;
pub use loader::{LoadedImage, load_elf};
