//! Instruction decoder for RISC-V 32-bit instructions.
//!
//! This module re-exports the decoder from lpc-codegen to maintain
//! backward compatibility.
//!
//! Note: `decode_instruction` is re-exported from `lp_riscv_inst` in `lib.rs`.
