//! Error taxonomy for the emulator core.

use core::fmt;

/// Everything that can make a `step` fail.
///
/// A failing step leaves PC at the faulting instruction and registers
/// unchanged by that instruction; the caller must not call `step` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// The fetched word did not decode to a recognised opcode/funct
    /// combination.
    DecodeError { pc: u32, word: u32 },
    /// PC did not map to any region at fetch time.
    FetchFault { pc: u32 },
    /// A load or store's address range was not fully inside one region.
    MemoryFault { addr: u32, len: u32 },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::DecodeError { pc, word } => {
                write!(f, "decode error at pc={pc:#010x}: word {word:#010x} is not a valid instruction")
            }
            CoreError::FetchFault { pc } => {
                write!(f, "fetch fault: pc={pc:#010x} does not map to any region")
            }
            CoreError::MemoryFault { addr, len } => {
                write!(
                    f,
                    "memory fault: access of {len} byte(s) at {addr:#010x} is not fully inside one region"
                )
            }
        }
    }
}

impl core::error::Error for CoreError {}
