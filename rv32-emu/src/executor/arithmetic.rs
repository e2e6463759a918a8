//! R-type execution: base ALU, the M extension, and Zicond.

use rv32_inst::{DecodedInst, OpId};

use super::{ExecOutcome, read_reg, write_reg};
use crate::error::CoreError;

pub(super) fn execute_rtype(
    dec: DecodedInst,
    regs: &mut [u32; 32],
) -> Result<ExecOutcome, CoreError> {
    let a = read_reg(regs, dec.rs1);
    let b = read_reg(regs, dec.rs2);
    let (a_s, b_s) = (a as i32, b as i32);

    let result = match dec.op {
        OpId::Add => a.wrapping_add(b),
        OpId::Sub => a.wrapping_sub(b),
        OpId::Sll => a.wrapping_shl(b & 0x1f),
        OpId::Slt => (a_s < b_s) as u32,
        OpId::Sltu => (a < b) as u32,
        OpId::Xor => a ^ b,
        OpId::Srl => a.wrapping_shr(b & 0x1f),
        OpId::Sra => a_s.wrapping_shr(b & 0x1f) as u32,
        OpId::Or => a | b,
        OpId::And => a & b,

        OpId::Mul => a.wrapping_mul(b),
        OpId::Mulh => (((a_s as i64).wrapping_mul(b_s as i64)) >> 32) as u32,
        OpId::Mulhsu => (((a_s as i64).wrapping_mul(b as i64)) >> 32) as u32,
        OpId::Mulhu => (((a as u64).wrapping_mul(b as u64)) >> 32) as u32,

        // RISC-V-conforming div/rem policy (see rv32-emu::ilp module doc
        // and the project design notes for why this departs from raw
        // host-native `/`/`%`): division by zero and the INT_MIN/-1
        // overflow case have defined results instead of a panic or UB.
        OpId::Div => {
            if b_s == 0 {
                u32::MAX
            } else if a_s == i32::MIN && b_s == -1 {
                i32::MIN as u32
            } else {
                a_s.wrapping_div(b_s) as u32
            }
        }
        OpId::Divu => {
            if b == 0 {
                u32::MAX
            } else {
                a / b
            }
        }
        OpId::Rem => {
            if b_s == 0 {
                a
            } else if a_s == i32::MIN && b_s == -1 {
                0
            } else {
                a_s.wrapping_rem(b_s) as u32
            }
        }
        OpId::Remu => {
            if b == 0 {
                a
            } else {
                a % b
            }
        }

        OpId::CzeroEqz => {
            if b == 0 {
                0
            } else {
                a
            }
        }
        OpId::CzeroNez => {
            if b != 0 {
                0
            } else {
                a
            }
        }

        _ => unreachable!("execute_rtype called with non-R-type op {:?}", dec.op),
    };

    write_reg(regs, dec.rd, result);
    Ok(ExecOutcome { next_pc: None })
}
