//! Instruction executor: applies a decoded instruction to the register
//! file and address space.

mod arithmetic;
mod branch;
mod immediate;
mod jump;
mod load_store;
mod system;

use rv32_inst::{DecodedInst, OpId};

use crate::address_space::AddressSpace;
use crate::error::CoreError;

/// Outcome of executing one instruction. `next_pc: None` means "advance
/// by 4"; `Some(target)` means the instruction already computed the next
/// PC (branch taken, jump, or an ILP-slice member whose own `pc_ro` is
/// not the core PC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub next_pc: Option<u32>,
}

impl ExecOutcome {
    fn fallthrough() -> Self {
        ExecOutcome { next_pc: None }
    }
}

/// Read a register, with `x0` hardwired to zero.
#[inline]
fn read_reg(regs: &[u32; 32], index: u8) -> u32 {
    if index == 0 { 0 } else { regs[index as usize] }
}

/// Write a register; writes to `x0` are a no-op.
#[inline]
fn write_reg(regs: &mut [u32; 32], index: u8, value: u32) {
    if index != 0 {
        regs[index as usize] = value;
    }
}

/// Apply `dec` (fetched from guest address `pc_ro`) to `regs` and `mem`.
///
/// `pc_ro` is the address the instruction was fetched from, used for
/// PC-relative computation (`JAL`, `AUIPC`, branches) — it is the decoded
/// instruction's own address, which for an ILP slice member is not
/// necessarily the core's current `pc`.
pub fn execute(
    dec: DecodedInst,
    pc_ro: u32,
    regs: &mut [u32; 32],
    mem: &mut AddressSpace,
) -> Result<ExecOutcome, CoreError> {
    if log::log_enabled!(log::Level::Trace) {
        log::trace!("execute pc={pc_ro:#010x} {}", rv32_inst::format::format_inst(dec));
    }
    match dec.op {
        OpId::Nop => Ok(ExecOutcome::fallthrough()),

        OpId::Add
        | OpId::Sub
        | OpId::Sll
        | OpId::Slt
        | OpId::Sltu
        | OpId::Xor
        | OpId::Srl
        | OpId::Sra
        | OpId::Or
        | OpId::And
        | OpId::Mul
        | OpId::Mulh
        | OpId::Mulhsu
        | OpId::Mulhu
        | OpId::Div
        | OpId::Divu
        | OpId::Rem
        | OpId::Remu
        | OpId::CzeroEqz
        | OpId::CzeroNez => arithmetic::execute_rtype(dec, regs),

        OpId::Addi
        | OpId::Slti
        | OpId::Sltiu
        | OpId::Xori
        | OpId::Ori
        | OpId::Andi
        | OpId::Slli
        | OpId::Srli
        | OpId::Srai => immediate::execute_itype_alu(dec, regs),

        OpId::Lb | OpId::Lh | OpId::Lw | OpId::Lbu | OpId::Lhu => {
            load_store::execute_load(dec, regs, mem)
        }
        OpId::Sb | OpId::Sh | OpId::Sw => load_store::execute_store(dec, regs, mem),

        OpId::Beq | OpId::Bne | OpId::Blt | OpId::Bge | OpId::Bltu | OpId::Bgeu => {
            branch::execute_branch(dec, pc_ro, regs)
        }

        OpId::Jal => jump::execute_jal(dec, pc_ro, regs),
        OpId::Jalr => jump::execute_jalr(dec, pc_ro, regs),
        OpId::Lui => jump::execute_lui(dec, regs),
        OpId::Auipc => jump::execute_auipc(dec, pc_ro, regs),

        OpId::Ecall | OpId::Ebreak => system::execute_system(dec),

        // `Device::step` checks for `OpId::Invalid` right after decode,
        // where the original fetched word is still at hand, and reports
        // `CoreError::DecodeError` with that word. This arm only exists
        // so the match stays exhaustive for direct callers of `execute`.
        OpId::Invalid => Err(CoreError::DecodeError { pc: pc_ro, word: 0 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32_inst::encode;

    fn fresh_space() -> AddressSpace {
        use crate::address_space::Region;
        AddressSpace::new(
            Region::new(0x0800_0000, 0x1000),
            Region::new(0x2000_0000, 0x1000),
            Region::new(0x0100_0000, 0x1000),
        )
    }

    #[test]
    fn invalid_op_fails_the_step() {
        let dec = rv32_inst::decode(0x7);
        let mut regs = [0u32; 32];
        let mut mem = fresh_space();
        let result = execute(dec, 0x0800_0000, &mut regs, &mut mem);
        assert!(result.is_err());
    }

    #[test]
    fn add_does_not_advance_pc_explicitly() {
        let dec = rv32_inst::decode(encode::rtype(0x33, 0, 0x00, 1, 2, 3));
        let mut regs = [0u32; 32];
        let mut mem = fresh_space();
        let outcome = execute(dec, 0x0800_0000, &mut regs, &mut mem).unwrap();
        assert_eq!(outcome.next_pc, None);
    }
}
