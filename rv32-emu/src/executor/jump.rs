//! JAL/JALR/LUI/AUIPC execution.

use rv32_inst::DecodedInst;

use super::{ExecOutcome, read_reg, write_reg};
use crate::error::CoreError;

pub(super) fn execute_jal(
    dec: DecodedInst,
    pc_ro: u32,
    regs: &mut [u32; 32],
) -> Result<ExecOutcome, CoreError> {
    write_reg(regs, dec.rd, pc_ro.wrapping_add(4));
    Ok(ExecOutcome {
        next_pc: Some(pc_ro.wrapping_add(dec.imm as u32)),
    })
}

/// JALR. The low bit of the target is intentionally **not** masked, a
/// deliberate fidelity decision (the guest toolchain's existing binaries
/// rely on it); see the project design notes before changing this.
pub(super) fn execute_jalr(
    dec: DecodedInst,
    pc_ro: u32,
    regs: &mut [u32; 32],
) -> Result<ExecOutcome, CoreError> {
    let base = read_reg(regs, dec.rs1);
    let target = base.wrapping_add(dec.imm as u32);
    write_reg(regs, dec.rd, pc_ro.wrapping_add(4));
    Ok(ExecOutcome {
        next_pc: Some(target),
    })
}

pub(super) fn execute_lui(
    dec: DecodedInst,
    regs: &mut [u32; 32],
) -> Result<ExecOutcome, CoreError> {
    write_reg(regs, dec.rd, (dec.imm << 12) as u32);
    Ok(ExecOutcome { next_pc: None })
}

pub(super) fn execute_auipc(
    dec: DecodedInst,
    pc_ro: u32,
    regs: &mut [u32; 32],
) -> Result<ExecOutcome, CoreError> {
    write_reg(regs, dec.rd, pc_ro.wrapping_add((dec.imm << 12) as u32));
    Ok(ExecOutcome { next_pc: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32_inst::decode;
    use rv32_inst::encode;

    #[test]
    fn jal_links_pc_plus_4_and_targets_pc_plus_imm() {
        let dec = decode(encode::jtype(1, 16));
        let mut regs = [0u32; 32];
        let outcome = execute_jal(dec, 0x0800_0000, &mut regs).unwrap();
        assert_eq!(regs[1], 0x0800_0004);
        assert_eq!(outcome.next_pc, Some(0x0800_0010));
    }

    #[test]
    fn jalr_does_not_mask_the_low_target_bit() {
        let dec = decode(encode::itype(0x67, 0, 1, 2, 4));
        let mut regs = [0u32; 32];
        regs[2] = 0x0800_1001; // odd base
        let outcome = execute_jalr(dec, 0x0800_0000, &mut regs).unwrap();
        assert_eq!(outcome.next_pc, Some(0x0800_1005));
        assert_eq!(regs[1], 0x0800_0004);
    }

    #[test]
    fn lui_shifts_immediate_into_upper_bits() {
        let dec = decode(encode::utype(0x37, 1, 0x12345));
        let mut regs = [0u32; 32];
        execute_lui(dec, &mut regs).unwrap();
        assert_eq!(regs[1], 0x12345000);
    }

    #[test]
    fn auipc_adds_pc_to_the_shifted_immediate() {
        let dec = decode(encode::utype(0x17, 1, 0x1));
        let mut regs = [0u32; 32];
        let outcome = execute_auipc(dec, 0x0800_0000, &mut regs).unwrap();
        assert_eq!(regs[1], 0x0800_1000);
        assert_eq!(outcome.next_pc, None);
    }
}
