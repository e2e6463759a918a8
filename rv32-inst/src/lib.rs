//! RV32IM + Zicond instruction encoding and decoding.
//!
//! This crate provides the pure, stateless pieces of the instruction set:
//! - [`OpId`] / [`DecodedInst`]: the tagged decoded form of a 32-bit word
//! - [`decode`]: maps a word to a `DecodedInst`, never mutating anything
//! - [`encode`]: builds words for the handful of instruction forms the test
//!   suites need (no assembler is available in this workspace)
//! - [`Gpr`]: the 32 general-purpose register names (ABI mnemonics)
//! - [`format`]: a one-line disassembly helper

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod decode;
pub mod encode;
pub mod format;
pub mod regs;

pub use decode::{DecodedInst, OpId, decode};
pub use regs::Gpr;
