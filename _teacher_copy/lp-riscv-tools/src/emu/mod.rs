pub mod abi_helper;
mod decoder;
pub mod emulator;
pub mod error;
mod executor;
pub mod logging;
mod memory;

pub use emulator::{DEFAULT_RAM_START, PanicInfo, Riscv32Emulator, StepResult, SyscallInfo};
pub use error::{EmulatorError, MemoryAccessKind};
pub use logging::{InstLog, LogLevel};
