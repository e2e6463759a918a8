//! SYSTEM execution: ECALL/EBREAK are no-ops at this layer.
//!
//! The engine has no trap vector; a guest implements system services by
//! memory-mapped I/O through the PERIPH region instead of a syscall ABI.
//! `rv32-cli` watches for `_exit` being reached, not for ECALL/EBREAK.

use rv32_inst::DecodedInst;

use super::ExecOutcome;
use crate::error::CoreError;

pub(super) fn execute_system(_dec: DecodedInst) -> Result<ExecOutcome, CoreError> {
    Ok(ExecOutcome { next_pc: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32_inst::{decode, encode};

    #[test]
    fn ecall_and_ebreak_are_no_ops() {
        assert_eq!(
            execute_system(decode(encode::ecall())).unwrap().next_pc,
            None
        );
        assert_eq!(
            execute_system(decode(encode::ebreak())).unwrap().next_pc,
            None
        );
    }
}
