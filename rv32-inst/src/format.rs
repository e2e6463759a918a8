//! One-line disassembly, used by `rv32-emu`'s `trace`-level step logging.

use core::fmt::Write as _;

use crate::decode::{DecodedInst, OpId};
use crate::regs::Gpr;

/// Render a decoded instruction as a single line, e.g. `addi a0, a0, 1` or
/// `beq a1, a2, -8`.
pub fn format_inst(dec: DecodedInst) -> alloc::string::String {
    let mut out = alloc::string::String::new();
    let rd = Gpr::new(dec.rd);
    let rs1 = Gpr::new(dec.rs1);
    let rs2 = Gpr::new(dec.rs2);

    let _ = match dec.op {
        OpId::Nop => write!(out, "nop"),

        OpId::Add => write!(out, "add {rd}, {rs1}, {rs2}"),
        OpId::Sub => write!(out, "sub {rd}, {rs1}, {rs2}"),
        OpId::Sll => write!(out, "sll {rd}, {rs1}, {rs2}"),
        OpId::Slt => write!(out, "slt {rd}, {rs1}, {rs2}"),
        OpId::Sltu => write!(out, "sltu {rd}, {rs1}, {rs2}"),
        OpId::Xor => write!(out, "xor {rd}, {rs1}, {rs2}"),
        OpId::Srl => write!(out, "srl {rd}, {rs1}, {rs2}"),
        OpId::Sra => write!(out, "sra {rd}, {rs1}, {rs2}"),
        OpId::Or => write!(out, "or {rd}, {rs1}, {rs2}"),
        OpId::And => write!(out, "and {rd}, {rs1}, {rs2}"),

        OpId::Mul => write!(out, "mul {rd}, {rs1}, {rs2}"),
        OpId::Mulh => write!(out, "mulh {rd}, {rs1}, {rs2}"),
        OpId::Mulhsu => write!(out, "mulhsu {rd}, {rs1}, {rs2}"),
        OpId::Mulhu => write!(out, "mulhu {rd}, {rs1}, {rs2}"),
        OpId::Div => write!(out, "div {rd}, {rs1}, {rs2}"),
        OpId::Divu => write!(out, "divu {rd}, {rs1}, {rs2}"),
        OpId::Rem => write!(out, "rem {rd}, {rs1}, {rs2}"),
        OpId::Remu => write!(out, "remu {rd}, {rs1}, {rs2}"),

        OpId::CzeroEqz => write!(out, "czero.eqz {rd}, {rs1}, {rs2}"),
        OpId::CzeroNez => write!(out, "czero.nez {rd}, {rs1}, {rs2}"),

        OpId::Addi => write!(out, "addi {rd}, {rs1}, {}", dec.imm),
        OpId::Slti => write!(out, "slti {rd}, {rs1}, {}", dec.imm),
        OpId::Sltiu => write!(out, "sltiu {rd}, {rs1}, {}", dec.imm),
        OpId::Xori => write!(out, "xori {rd}, {rs1}, {}", dec.imm),
        OpId::Ori => write!(out, "ori {rd}, {rs1}, {}", dec.imm),
        OpId::Andi => write!(out, "andi {rd}, {rs1}, {}", dec.imm),
        OpId::Slli => write!(out, "slli {rd}, {rs1}, {}", dec.imm),
        OpId::Srli => write!(out, "srli {rd}, {rs1}, {}", dec.imm),
        OpId::Srai => write!(out, "srai {rd}, {rs1}, {}", dec.imm),

        OpId::Sb => write!(out, "sb {rs2}, {}({rs1})", dec.imm),
        OpId::Sh => write!(out, "sh {rs2}, {}({rs1})", dec.imm),
        OpId::Sw => write!(out, "sw {rs2}, {}({rs1})", dec.imm),

        OpId::Lb => write!(out, "lb {rd}, {}({rs1})", dec.imm),
        OpId::Lh => write!(out, "lh {rd}, {}({rs1})", dec.imm),
        OpId::Lw => write!(out, "lw {rd}, {}({rs1})", dec.imm),
        OpId::Lbu => write!(out, "lbu {rd}, {}({rs1})", dec.imm),
        OpId::Lhu => write!(out, "lhu {rd}, {}({rs1})", dec.imm),

        OpId::Beq => write!(out, "beq {rs1}, {rs2}, {}", dec.imm),
        OpId::Bne => write!(out, "bne {rs1}, {rs2}, {}", dec.imm),
        OpId::Blt => write!(out, "blt {rs1}, {rs2}, {}", dec.imm),
        OpId::Bge => write!(out, "bge {rs1}, {rs2}, {}", dec.imm),
        OpId::Bltu => write!(out, "bltu {rs1}, {rs2}, {}", dec.imm),
        OpId::Bgeu => write!(out, "bgeu {rs1}, {rs2}, {}", dec.imm),

        OpId::Jal => write!(out, "jal {rd}, {}", dec.imm),
        OpId::Jalr => write!(out, "jalr {rd}, {}({rs1})", dec.imm),
        OpId::Lui => write!(out, "lui {rd}, {:#x}", dec.imm),
        OpId::Auipc => write!(out, "auipc {rd}, {:#x}", dec.imm),
        OpId::Ecall => write!(out, "ecall"),
        OpId::Ebreak => write!(out, "ebreak"),

        OpId::Invalid => write!(out, "invalid"),
    };
    out
}
