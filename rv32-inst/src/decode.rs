//! Instruction decoder.
//!
//! [`decode`] never mutates anything and never fails: an unrecognised
//! opcode or funct-field combination simply produces [`OpId::Invalid`].

/// Tag identifying which operation a decoded instruction performs.
///
/// Unused operand fields for a given tag are don't-care (e.g. `LUI` ignores
/// `rs1`/`rs2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpId {
    Nop,

    // RV32I R-type
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,

    // M extension
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,

    // Zicond
    CzeroEqz,
    CzeroNez,

    // I-type ALU
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,

    // Stores
    Sb,
    Sh,
    Sw,

    // Loads
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,

    // Branches
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,

    Jal,
    Jalr,
    Lui,
    Auipc,
    Ecall,
    Ebreak,

    Invalid,
}

/// A decoded instruction word: an [`OpId`] plus the operand fields the RV32
/// formats can carry. Fields that don't apply to `op` are don't-care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInst {
    pub op: OpId,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm: i32,
}

impl DecodedInst {
    const fn invalid() -> Self {
        DecodedInst {
            op: OpId::Invalid,
            rd: 0,
            rs1: 0,
            rs2: 0,
            imm: 0,
        }
    }
}

#[inline]
fn bits(word: u32, hi: u32, lo: u32) -> u32 {
    (word >> lo) & ((1u32 << (hi - lo + 1)) - 1)
}

/// Sign-extend the low `bits` bits of `value` to a full `i32`.
#[inline]
fn sext(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

fn rd(word: u32) -> u8 {
    bits(word, 11, 7) as u8
}
fn rs1(word: u32) -> u8 {
    bits(word, 19, 15) as u8
}
fn rs2(word: u32) -> u8 {
    bits(word, 24, 20) as u8
}
fn funct3(word: u32) -> u32 {
    bits(word, 14, 12)
}
fn funct7(word: u32) -> u32 {
    bits(word, 31, 25)
}

fn imm_i(word: u32) -> i32 {
    sext(bits(word, 31, 20), 12)
}

fn imm_s(word: u32) -> i32 {
    let raw = (bits(word, 31, 25) << 5) | bits(word, 11, 7);
    sext(raw, 12)
}

fn imm_b(word: u32) -> i32 {
    let raw = (bits(word, 31, 31) << 12)
        | (bits(word, 7, 7) << 11)
        | (bits(word, 30, 25) << 5)
        | (bits(word, 11, 8) << 1);
    sext(raw, 13)
}

fn imm_j(word: u32) -> i32 {
    let raw = (bits(word, 31, 31) << 20)
        | (bits(word, 19, 12) << 12)
        | (bits(word, 20, 20) << 11)
        | (bits(word, 30, 21) << 1);
    sext(raw, 21)
}

fn imm_u(word: u32) -> i32 {
    sext(bits(word, 31, 12), 20)
}

/// Decode a 32-bit instruction word. Always returns a [`DecodedInst`];
/// unrecognised encodings carry `op: OpId::Invalid`.
pub fn decode(word: u32) -> DecodedInst {
    let opcode = bits(word, 6, 0);
    match opcode {
        0x33 => decode_rtype(word),
        0x13 => decode_itype_alu(word),
        0x03 => decode_load(word),
        0x23 => decode_store(word),
        0x63 => decode_branch(word),
        0x6f => DecodedInst {
            op: OpId::Jal,
            rd: rd(word),
            rs1: 0,
            rs2: 0,
            imm: imm_j(word),
        },
        0x67 if funct3(word) == 0 => DecodedInst {
            op: OpId::Jalr,
            rd: rd(word),
            rs1: rs1(word),
            rs2: 0,
            imm: imm_i(word),
        },
        0x37 => DecodedInst {
            op: OpId::Lui,
            rd: rd(word),
            rs1: 0,
            rs2: 0,
            imm: imm_u(word),
        },
        0x17 => DecodedInst {
            op: OpId::Auipc,
            rd: rd(word),
            rs1: 0,
            rs2: 0,
            imm: imm_u(word),
        },
        0x73 => decode_system(word),
        _ => DecodedInst::invalid(),
    }
}

fn decode_rtype(word: u32) -> DecodedInst {
    let f3 = funct3(word);
    let f7 = funct7(word);
    let op = match (f3, f7) {
        (0, 0x00) => OpId::Add,
        (0, 0x20) => OpId::Sub,
        (0, 0x01) => OpId::Mul,
        (1, 0x00) => OpId::Sll,
        (1, 0x01) => OpId::Mulh,
        (2, 0x00) => OpId::Slt,
        (2, 0x01) => OpId::Mulhsu,
        (3, 0x00) => OpId::Sltu,
        (3, 0x01) => OpId::Mulhu,
        (4, 0x00) => OpId::Xor,
        (4, 0x01) => OpId::Div,
        (5, 0x00) => OpId::Srl,
        (5, 0x20) => OpId::Sra,
        (5, 0x01) => OpId::Divu,
        (5, 0x07) => OpId::CzeroEqz,
        (6, 0x00) => OpId::Or,
        (6, 0x01) => OpId::Rem,
        (7, 0x00) => OpId::And,
        (7, 0x01) => OpId::Remu,
        (7, 0x07) => OpId::CzeroNez,
        _ => OpId::Invalid,
    };
    if op == OpId::Invalid {
        return DecodedInst::invalid();
    }
    DecodedInst {
        op,
        rd: rd(word),
        rs1: rs1(word),
        rs2: rs2(word),
        imm: 0,
    }
}

fn decode_itype_alu(word: u32) -> DecodedInst {
    let f3 = funct3(word);
    match f3 {
        0x0 => DecodedInst {
            op: OpId::Addi,
            rd: rd(word),
            rs1: rs1(word),
            rs2: 0,
            imm: imm_i(word),
        },
        0x2 => DecodedInst {
            op: OpId::Slti,
            rd: rd(word),
            rs1: rs1(word),
            rs2: 0,
            imm: imm_i(word),
        },
        0x3 => DecodedInst {
            op: OpId::Sltiu,
            rd: rd(word),
            rs1: rs1(word),
            rs2: 0,
            imm: imm_i(word),
        },
        0x4 => DecodedInst {
            op: OpId::Xori,
            rd: rd(word),
            rs1: rs1(word),
            rs2: 0,
            imm: imm_i(word),
        },
        0x6 => DecodedInst {
            op: OpId::Ori,
            rd: rd(word),
            rs1: rs1(word),
            rs2: 0,
            imm: imm_i(word),
        },
        0x7 => DecodedInst {
            op: OpId::Andi,
            rd: rd(word),
            rs1: rs1(word),
            rs2: 0,
            imm: imm_i(word),
        },
        0x1 => {
            let shamt = bits(word, 24, 20) as i32;
            let top7 = funct7(word);
            if top7 == 0x00 {
                DecodedInst {
                    op: OpId::Slli,
                    rd: rd(word),
                    rs1: rs1(word),
                    rs2: 0,
                    imm: shamt & 0x1f,
                }
            } else {
                DecodedInst::invalid()
            }
        }
        0x5 => {
            let shamt = bits(word, 24, 20) as i32;
            let top7 = funct7(word);
            match top7 {
                0x00 => DecodedInst {
                    op: OpId::Srli,
                    rd: rd(word),
                    rs1: rs1(word),
                    rs2: 0,
                    imm: shamt & 0x1f,
                },
                0x20 => DecodedInst {
                    op: OpId::Srai,
                    rd: rd(word),
                    rs1: rs1(word),
                    rs2: 0,
                    imm: shamt & 0x1f,
                },
                _ => DecodedInst::invalid(),
            }
        }
        _ => DecodedInst::invalid(),
    }
}

fn decode_load(word: u32) -> DecodedInst {
    let op = match funct3(word) {
        0x0 => OpId::Lb,
        0x1 => OpId::Lh,
        0x2 => OpId::Lw,
        0x4 => OpId::Lbu,
        0x5 => OpId::Lhu,
        _ => OpId::Invalid,
    };
    if op == OpId::Invalid {
        return DecodedInst::invalid();
    }
    DecodedInst {
        op,
        rd: rd(word),
        rs1: rs1(word),
        rs2: 0,
        imm: imm_i(word),
    }
}

fn decode_store(word: u32) -> DecodedInst {
    let op = match funct3(word) {
        0x0 => OpId::Sb,
        0x1 => OpId::Sh,
        0x2 => OpId::Sw,
        _ => OpId::Invalid,
    };
    if op == OpId::Invalid {
        return DecodedInst::invalid();
    }
    DecodedInst {
        op,
        rd: 0,
        rs1: rs1(word),
        rs2: rs2(word),
        imm: imm_s(word),
    }
}

fn decode_branch(word: u32) -> DecodedInst {
    let op = match funct3(word) {
        0x0 => OpId::Beq,
        0x1 => OpId::Bne,
        0x4 => OpId::Blt,
        0x5 => OpId::Bge,
        0x6 => OpId::Bltu,
        0x7 => OpId::Bgeu,
        _ => OpId::Invalid,
    };
    if op == OpId::Invalid {
        return DecodedInst::invalid();
    }
    DecodedInst {
        op,
        rd: 0,
        rs1: rs1(word),
        rs2: rs2(word),
        imm: imm_b(word),
    }
}

fn decode_system(word: u32) -> DecodedInst {
    if rd(word) != 0 || rs1(word) != 0 || funct3(word) != 0 {
        return DecodedInst::invalid();
    }
    let funct12 = bits(word, 31, 20);
    match funct12 {
        0 => DecodedInst {
            op: OpId::Ecall,
            rd: 0,
            rs1: 0,
            rs2: 0,
            imm: 0,
        },
        1 => DecodedInst {
            op: OpId::Ebreak,
            rd: 0,
            rs1: 0,
            rs2: 0,
            imm: 0,
        },
        _ => DecodedInst::invalid(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode;

    #[test]
    fn decodes_add() {
        let d = decode(encode::rtype(0x33, 0, 0x00, 1, 2, 3));
        assert_eq!(d.op, OpId::Add);
        assert_eq!((d.rd, d.rs1, d.rs2), (1, 2, 3));
    }

    #[test]
    fn decodes_every_m_extension_op() {
        let cases = [
            (0, 0x01, OpId::Mul),
            (1, 0x01, OpId::Mulh),
            (2, 0x01, OpId::Mulhsu),
            (3, 0x01, OpId::Mulhu),
            (4, 0x01, OpId::Div),
            (5, 0x01, OpId::Divu),
            (6, 0x01, OpId::Rem),
            (7, 0x01, OpId::Remu),
        ];
        for (f3, f7, expected) in cases {
            let d = decode(encode::rtype(0x33, f3, f7, 1, 2, 3));
            assert_eq!(d.op, expected, "funct3={f3} funct7={f7:#x}");
        }
    }

    #[test]
    fn decodes_zicond() {
        let eqz = decode(encode::rtype(0x33, 5, 0x07, 1, 2, 3));
        assert_eq!(eqz.op, OpId::CzeroEqz);
        let nez = decode(encode::rtype(0x33, 7, 0x07, 1, 2, 3));
        assert_eq!(nez.op, OpId::CzeroNez);
    }

    #[test]
    fn rejects_unknown_rtype_combo() {
        let d = decode(encode::rtype(0x33, 2, 0x20, 1, 2, 3));
        assert_eq!(d.op, OpId::Invalid);
    }

    #[test]
    fn decodes_i_type_alu_and_masks_shift_amount() {
        let addi = decode(encode::itype(0x13, 0, 1, 2, -1));
        assert_eq!(addi.op, OpId::Addi);
        assert_eq!(addi.imm, -1);

        // shift amount encoded in imm[4:0]; top bits select logical vs arithmetic
        let srai = decode(0x40000013 | (5 << 15) | (1 << 7) | (5 << 12) | (3 << 20));
        assert_eq!(srai.op, OpId::Srai);
        assert_eq!(srai.imm, 3);
    }

    #[test]
    fn decodes_loads_and_stores_with_sign_extended_imm() {
        let lw = decode(encode::itype(0x03, 2, 1, 2, -4));
        assert_eq!(lw.op, OpId::Lw);
        assert_eq!(lw.imm, -4);

        let sw = decode(encode::stype(2, 1, 2, -4));
        assert_eq!(sw.op, OpId::Sw);
        assert_eq!(sw.imm, -4);
    }

    #[test]
    fn decodes_branch_even_immediate() {
        let beq = decode(encode::btype(0, 1, 2, 8));
        assert_eq!(beq.op, OpId::Beq);
        assert_eq!(beq.imm, 8);

        let bge_neg = decode(encode::btype(5, 1, 2, -4096));
        assert_eq!(bge_neg.op, OpId::Bge);
        assert_eq!(bge_neg.imm, -4096);
    }

    #[test]
    fn decodes_jal_and_jalr() {
        let jal = decode(encode::jtype(1, 1 << 20));
        assert_eq!(jal.op, OpId::Jal);
        assert_eq!(jal.rd, 1);
        assert_eq!(jal.imm, 1 << 20);

        let jalr = decode(encode::itype(0x67, 0, 1, 2, 4));
        assert_eq!(jalr.op, OpId::Jalr);
        assert_eq!(jalr.imm, 4);
    }

    #[test]
    fn decodes_lui_and_auipc() {
        let lui = decode(encode::utype(0x37, 1, 0x12345));
        assert_eq!(lui.op, OpId::Lui);
        assert_eq!(lui.imm, 0x12345);

        let auipc = decode(encode::utype(0x17, 1, 0x1));
        assert_eq!(auipc.op, OpId::Auipc);
        assert_eq!(auipc.imm, 1);
    }

    #[test]
    fn decodes_ecall_ebreak() {
        assert_eq!(decode(encode::ecall()).op, OpId::Ecall);
        assert_eq!(decode(encode::ebreak()).op, OpId::Ebreak);
    }

    #[test]
    fn unrecognised_opcode_is_invalid() {
        assert_eq!(decode(0x0000_0007).op, OpId::Invalid);
    }
}
