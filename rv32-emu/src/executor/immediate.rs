//! I-type ALU execution: ADDI/SLTI/SLTIU/XORI/ORI/ANDI/SLLI/SRLI/SRAI.

use rv32_inst::{DecodedInst, OpId};

use super::{ExecOutcome, read_reg, write_reg};
use crate::error::CoreError;

pub(super) fn execute_itype_alu(
    dec: DecodedInst,
    regs: &mut [u32; 32],
) -> Result<ExecOutcome, CoreError> {
    let a = read_reg(regs, dec.rs1);
    let imm = dec.imm;
    let shamt = (imm as u32) & 0x1f;

    let result = match dec.op {
        OpId::Addi => a.wrapping_add(imm as u32),
        OpId::Slti => ((a as i32) < imm) as u32,
        OpId::Sltiu => (a < imm as u32) as u32,
        OpId::Xori => a ^ imm as u32,
        OpId::Ori => a | imm as u32,
        OpId::Andi => a & imm as u32,
        OpId::Slli => a.wrapping_shl(shamt),
        OpId::Srli => a.wrapping_shr(shamt),
        OpId::Srai => (a as i32).wrapping_shr(shamt) as u32,
        _ => unreachable!("execute_itype_alu called with non-I-ALU op {:?}", dec.op),
    };

    write_reg(regs, dec.rd, result);
    Ok(ExecOutcome { next_pc: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32_inst::decode;
    use rv32_inst::encode;

    #[test]
    fn addi_sign_extends_negative_immediate() {
        let dec = decode(encode::itype(0x13, 0, 1, 2, -1));
        let mut regs = [0u32; 32];
        regs[2] = 0;
        execute_itype_alu(dec, &mut regs).unwrap();
        assert_eq!(regs[1], u32::MAX);
    }

    #[test]
    fn srai_preserves_sign_bit() {
        let dec = decode(0x40000013 | (2 << 15) | (1 << 7) | (5 << 12) | (4 << 20));
        let mut regs = [0u32; 32];
        regs[2] = (-16i32) as u32;
        execute_itype_alu(dec, &mut regs).unwrap();
        assert_eq!(regs[1] as i32, -1);
    }

    #[test]
    fn slli_shifts_by_the_encoded_amount() {
        // opcode=0x13, funct3=1 (SLLI), rd=1, rs1=2, shamt=3, top7=0
        let dec = decode(0x00000013 | (2 << 15) | (1 << 7) | (1 << 12) | (3 << 20));
        let mut regs = [0u32; 32];
        regs[2] = 1;
        execute_itype_alu(dec, &mut regs).unwrap();
        assert_eq!(regs[1], 1 << 3);
    }
}
