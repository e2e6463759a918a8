//! B-type execution: BEQ/BNE/BLT/BGE/BLTU/BGEU.

use rv32_inst::{DecodedInst, OpId};

use super::{ExecOutcome, read_reg};
use crate::error::CoreError;

pub(super) fn execute_branch(
    dec: DecodedInst,
    pc_ro: u32,
    regs: &[u32; 32],
) -> Result<ExecOutcome, CoreError> {
    let a = read_reg(regs, dec.rs1);
    let b = read_reg(regs, dec.rs2);
    let (a_s, b_s) = (a as i32, b as i32);

    let taken = match dec.op {
        OpId::Beq => a == b,
        OpId::Bne => a != b,
        OpId::Blt => a_s < b_s,
        OpId::Bge => a_s >= b_s,
        OpId::Bltu => a < b,
        OpId::Bgeu => a >= b,
        _ => unreachable!("execute_branch called with non-branch op {:?}", dec.op),
    };

    let next_pc = if taken {
        Some(pc_ro.wrapping_add(dec.imm as u32))
    } else {
        None
    };
    Ok(ExecOutcome { next_pc })
}
