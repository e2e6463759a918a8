//! Compressed instruction execution (RVC extension)
//!
//! This module handles 16-bit compressed instructions that expand to
//! standard 32-bit RISC-V instructions.

extern crate alloc;

use super::{ExecutionResult, LoggingMode, read_reg};
use crate::emu::{
    error::EmulatorError,
    logging::{InstLog, SystemKind},
    memory::Memory,
};
use lp_riscv_inst::Gpr;

/// Decode and execute compressed instructions (16-bit, bits [1:0] != 0b11).
pub(super) fn decode_execute_compressed<M: LoggingMode>(
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
    memory: &mut Memory,
) -> Result<ExecutionResult, EmulatorError> {
    let inst_16 = inst_word as u16;
    let opcode = inst_16 & 0x3; // bits [1:0]
    let funct3 = ((inst_16 >> 13) & 0x7) as u8; // bits [15:13]

    match opcode {
        0b00 => decode_execute_c0::<M>(inst_16, funct3, pc, regs, memory),
        0b01 => decode_execute_c1::<M>(inst_16, funct3, pc, regs, memory),
        0b10 => decode_execute_c2::<M>(inst_16, funct3, pc, regs, memory),
        _ => Err(EmulatorError::InvalidInstruction {
            pc,
            instruction: inst_word,
            reason: alloc::format!("Invalid compressed instruction opcode: 0x{opcode:x}"),
            regs: *regs,
        }),
    }
}

/// Decode quadrant 0 (opcode = 0b00)
fn decode_execute_c0<M: LoggingMode>(
    inst: u16,
    funct3: u8,
    pc: u32,
    regs: &mut [i32; 32],
    memory: &mut Memory,
) -> Result<ExecutionResult, EmulatorError> {
    match funct3 {
        0b000 => {
            // C.ADDI4SPN: rd' = sp + nzuimm
            let rd_prime = ((inst >> 2) & 0x7) as u8;
            let rd = compressed_reg(rd_prime);
            let nzuimm = ((inst >> 7) & 0x30)   // nzuimm[5:4] from inst[12:11]
                | ((inst >> 1) & 0x3c0)          // nzuimm[9:6] from inst[10:7]
                | ((inst >> 4) & 0x4)            // nzuimm[2] from inst[6]
                | ((inst >> 2) & 0x8); // nzuimm[3] from inst[5]
            if nzuimm == 0 {
                return Err(EmulatorError::InvalidInstruction {
                    pc,
                    instruction: inst as u32,
                    reason: alloc::string::String::from("C.ADDI4SPN with nzuimm=0 is reserved"),
                    regs: *regs,
                });
            }
            execute_c_addi4spn::<M>(rd, nzuimm as i32, inst as u32, pc, regs)
        }
        0b010 => {
            // C.LW: rd' = mem[rs1' + uimm]
            let rd_prime = ((inst >> 2) & 0x7) as u8;
            let rs1_prime = ((inst >> 7) & 0x7) as u8;
            let rd = compressed_reg(rd_prime);
            let rs = compressed_reg(rs1_prime);
            let uimm = ((inst >> 7) & 0x38)   // uimm[5:3] from inst[12:10]
                | ((inst >> 4) & 0x4)          // uimm[2] from inst[6]
                | ((inst << 1) & 0x40); // uimm[6] from inst[5]
            execute_c_lw::<M>(rd, rs, uimm as i32, inst as u32, pc, regs, memory)
        }
        0b110 => {
            // C.SW: mem[rs1' + uimm] = rs2'
            let rs2_prime = ((inst >> 2) & 0x7) as u8;
            let rs1_prime = ((inst >> 7) & 0x7) as u8;
            let rs1 = compressed_reg(rs1_prime);
            let rs2 = compressed_reg(rs2_prime);
            let uimm = ((inst >> 7) & 0x38)   // uimm[5:3] from inst[12:10]
                | ((inst >> 4) & 0x4)          // uimm[2] from inst[6]
                | ((inst << 1) & 0x40); // uimm[6] from inst[5]
            execute_c_sw::<M>(rs1, rs2, uimm as i32, inst as u32, pc, regs, memory)
        }
        _ => Err(EmulatorError::InvalidInstruction {
            pc,
            instruction: inst as u32,
            reason: alloc::format!("Unknown C0 instruction: funct3={funct3:03b}"),
            regs: *regs,
        }),
    }
}

/// Decode quadrant 1 (opcode = 0b01)
fn decode_execute_c1<M: LoggingMode>(
    inst: u16,
    funct3: u8,
    pc: u32,
    regs: &mut [i32; 32],
    _memory: &mut Memory,
) -> Result<ExecutionResult, EmulatorError> {
    match funct3 {
        0b000 => {
            // C.ADDI / C.NOP: rd = rd + imm (or NOP if rd=x0)
            let rd = ((inst >> 7) & 0x1f) as u8;
            if rd == 0 {
                return execute_c_nop::<M>(inst as u32, pc, regs);
            }
            let rd_gpr = Gpr::new(rd);
            let imm = sign_extend(((inst >> 7) & 0x20) | ((inst >> 2) & 0x1f), 6);
            execute_c_addi::<M>(rd_gpr, imm, inst as u32, pc, regs)
        }
        0b001 => {
            // C.JAL: ra = pc + 2; pc = pc + offset (RV32 only)
            let offset = decode_cj_offset(inst);
            execute_c_jal::<M>(offset, inst as u32, pc, regs)
        }
        0b010 => {
            // C.LI: rd = imm
            let rd = ((inst >> 7) & 0x1f) as u8;
            if rd == 0 {
                return Err(EmulatorError::InvalidInstruction {
                    pc,
                    instruction: inst as u32,
                    reason: alloc::string::String::from("C.LI with rd=x0 is a hint (nop)"),
                    regs: *regs,
                });
            }
            let rd_gpr = Gpr::new(rd);
            let imm = sign_extend(((inst >> 7) & 0x20) | ((inst >> 2) & 0x1f), 6);
            execute_c_li::<M>(rd_gpr, imm, inst as u32, pc, regs)
        }
        0b011 => {
            // C.ADDI16SP / C.LUI
            let rd = ((inst >> 7) & 0x1f) as u8;
            if rd == 2 {
                // C.ADDI16SP: sp = sp + nzimm
                let nzimm = sign_extend(
                    ((inst >> 3) & 0x200)   // nzimm[9] from inst[12]
                        | ((inst >> 2) & 0x10)   // nzimm[4] from inst[6]
                        | ((inst << 1) & 0x40)   // nzimm[6] from inst[5]
                        | ((inst << 4) & 0x180)  // nzimm[8:7] from inst[4:3]
                        | ((inst << 3) & 0x20), // nzimm[5] from inst[2]
                    10,
                );
                if nzimm == 0 {
                    return Err(EmulatorError::InvalidInstruction {
                        pc,
                        instruction: inst as u32,
                        reason: alloc::string::String::from("C.ADDI16SP with nzimm=0 is reserved"),
                        regs: *regs,
                    });
                }
                execute_c_addi16sp::<M>(nzimm, inst as u32, pc, regs)
            } else {
                // C.LUI: rd = nzimm << 12
                if rd == 0 {
                    return Err(EmulatorError::InvalidInstruction {
                        pc,
                        instruction: inst as u32,
                        reason: alloc::string::String::from("C.LUI with rd=x0 is a hint (nop)"),
                        regs: *regs,
                    });
                }
                let nzimm = sign_extend(((inst >> 7) & 0x20) | ((inst >> 2) & 0x1f), 6);
                if nzimm == 0 {
                    return Err(EmulatorError::InvalidInstruction {
                        pc,
                        instruction: inst as u32,
                        reason: alloc::string::String::from("C.LUI with nzimm=0 is reserved"),
                        regs: *regs,
                    });
                }
                let imm = nzimm << 12;
                let rd_gpr = Gpr::new(rd);
                execute_c_lui::<M>(rd_gpr, imm, inst as u32, pc, regs)
            }
        }
        0b100 => {
            // C.MISC_ALU: Various ALU operations
            let funct2 = (inst >> 10) & 0x3;
            let rd_prime = ((inst >> 7) & 0x7) as u8;
            let rd = compressed_reg(rd_prime);

            match funct2 {
                0b00 => {
                    // C.SRLI: rd' = rd' >> uimm
                    let uimm = ((inst >> 7) & 0x20) | ((inst >> 2) & 0x1f);
                    execute_c_srli::<M>(rd, uimm as i32, inst as u32, pc, regs)
                }
                0b01 => {
                    // C.SRAI: rd' = rd' >> uimm (arithmetic)
                    let uimm = ((inst >> 7) & 0x20) | ((inst >> 2) & 0x1f);
                    execute_c_srai::<M>(rd, uimm as i32, inst as u32, pc, regs)
                }
                0b10 => {
                    // C.ANDI: rd' = rd' & imm
                    let imm = sign_extend(((inst >> 7) & 0x20) | ((inst >> 2) & 0x1f), 6);
                    execute_c_andi::<M>(rd, imm, inst as u32, pc, regs)
                }
                0b11 => {
                    // Register-register operations
                    let funct6 = (inst >> 10) & 0x3f;
                    let rs2_prime = ((inst >> 2) & 0x7) as u8;
                    let rs = compressed_reg(rs2_prime);
                    let funct2_low = (inst >> 5) & 0x3;

                    match (funct6, funct2_low) {
                        (0b100011, 0b00) => execute_c_sub::<M>(rd, rs, inst as u32, pc, regs),
                        (0b100011, 0b01) => execute_c_xor::<M>(rd, rs, inst as u32, pc, regs),
                        (0b100011, 0b10) => execute_c_or::<M>(rd, rs, inst as u32, pc, regs),
                        (0b100011, 0b11) => execute_c_and::<M>(rd, rs, inst as u32, pc, regs),
                        _ => Err(EmulatorError::InvalidInstruction {
                            pc,
                            instruction: inst as u32,
                            reason: alloc::format!(
                                "Unknown C.MISC_ALU instruction: funct6={funct6:06b}, funct2_low={funct2_low:02b}",
                            ),
                            regs: *regs,
                        }),
                    }
                }
                _ => unreachable!(),
            }
        }
        0b101 => {
            // C.J: pc = pc + offset
            let offset = decode_cj_offset(inst);
            execute_c_j::<M>(offset, inst as u32, pc, regs)
        }
        0b110 => {
            // C.BEQZ: if rs1' == 0, pc = pc + offset
            let rs1_prime = ((inst >> 7) & 0x7) as u8;
            let rs = compressed_reg(rs1_prime);
            let offset = decode_cb_offset(inst);
            execute_c_beqz::<M>(rs, offset, inst as u32, pc, regs)
        }
        0b111 => {
            // C.BNEZ: if rs1' != 0, pc = pc + offset
            let rs1_prime = ((inst >> 7) & 0x7) as u8;
            let rs = compressed_reg(rs1_prime);
            let offset = decode_cb_offset(inst);
            execute_c_bnez::<M>(rs, offset, inst as u32, pc, regs)
        }
        _ => unreachable!(),
    }
}

/// Decode quadrant 2 (opcode = 0b10)
fn decode_execute_c2<M: LoggingMode>(
    inst: u16,
    funct3: u8,
    pc: u32,
    regs: &mut [i32; 32],
    memory: &mut Memory,
) -> Result<ExecutionResult, EmulatorError> {
    match funct3 {
        0b000 => {
            // C.SLLI: rd = rd << uimm
            let rd = ((inst >> 7) & 0x1f) as u8;
            if rd == 0 {
                return Err(EmulatorError::InvalidInstruction {
                    pc,
                    instruction: inst as u32,
                    reason: alloc::string::String::from("C.SLLI with rd=x0 is a hint (nop)"),
                    regs: *regs,
                });
            }
            let rd_gpr = Gpr::new(rd);
            let uimm = ((inst >> 7) & 0x20) | ((inst >> 2) & 0x1f);
            execute_c_slli::<M>(rd_gpr, uimm as i32, inst as u32, pc, regs)
        }
        0b010 => {
            // C.LWSP: rd = mem[sp + uimm]
            let rd = ((inst >> 7) & 0x1f) as u8;
            if rd == 0 {
                return Err(EmulatorError::InvalidInstruction {
                    pc,
                    instruction: inst as u32,
                    reason: alloc::string::String::from("C.LWSP with rd=x0 is reserved"),
                    regs: *regs,
                });
            }
            let rd_gpr = Gpr::new(rd);
            let uimm = ((inst >> 7) & 0x20)   // uimm[5] from inst[12]
                | ((inst >> 2) & 0x1c)         // uimm[4:2] from inst[6:4]
                | ((inst << 4) & 0xc0); // uimm[7:6] from inst[3:2]
            execute_c_lwsp::<M>(rd_gpr, uimm as i32, inst as u32, pc, regs, memory)
        }
        0b100 => {
            // C.MISC_CR: C.JR, C.MV, C.JALR, C.ADD
            let rd_rs1 = ((inst >> 7) & 0x1f) as u8;
            let rs2 = ((inst >> 2) & 0x1f) as u8;
            let funct4 = (inst >> 12) & 0xf;

            match (funct4, rs2) {
                (0b1000, 0) if rd_rs1 != 0 => {
                    // C.JR: pc = rs1
                    let rs = Gpr::new(rd_rs1);
                    execute_c_jr::<M>(rs, inst as u32, pc, regs)
                }
                (0b1000, _) if rd_rs1 != 0 && rs2 != 0 => {
                    // C.MV: rd = rs2
                    let rd = Gpr::new(rd_rs1);
                    let rs = Gpr::new(rs2);
                    execute_c_mv::<M>(rd, rs, inst as u32, pc, regs)
                }
                (0b1001, 0) if rd_rs1 == 0 => {
                    // C.EBREAK
                    execute_c_ebreak::<M>(inst as u32, pc, regs)
                }
                (0b1001, 0) if rd_rs1 != 0 => {
                    // C.JALR: ra = pc + 2; pc = rs1
                    let rs = Gpr::new(rd_rs1);
                    execute_c_jalr::<M>(rs, inst as u32, pc, regs)
                }
                (0b1001, _) if rd_rs1 != 0 && rs2 != 0 => {
                    // C.ADD: rd = rd + rs2
                    let rd = Gpr::new(rd_rs1);
                    let rs = Gpr::new(rs2);
                    execute_c_add::<M>(rd, rs, inst as u32, pc, regs)
                }
                _ => Err(EmulatorError::InvalidInstruction {
                    pc,
                    instruction: inst as u32,
                    reason: alloc::format!(
                        "Unknown C.MISC_CR instruction: funct4={funct4:04b}, rd_rs1={rd_rs1}, rs2={rs2}",
                    ),
                    regs: *regs,
                }),
            }
        }
        0b110 => {
            // C.SWSP: mem[sp + uimm] = rs2
            let rs2 = ((inst >> 2) & 0x1f) as u8;
            let rs = Gpr::new(rs2);
            let uimm = ((inst >> 7) & 0x3c)   // uimm[5:2] from inst[12:9]
                | ((inst >> 1) & 0xc0); // uimm[7:6] from inst[8:7]
            execute_c_swsp::<M>(rs, uimm as i32, inst as u32, pc, regs, memory)
        }
        _ => Err(EmulatorError::InvalidInstruction {
            pc,
            instruction: inst as u32,
            reason: alloc::format!("Unknown C2 instruction: funct3={funct3:03b}"),
            regs: *regs,
        }),
    }
}

// ============================================================================
// Execution functions
// ============================================================================

#[inline(always)]
fn execute_c_addi4spn<M: LoggingMode>(
    rd: Gpr,
    imm: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let sp_val = read_reg(regs, Gpr::Sp);
    let result = sp_val.wrapping_add(imm);
    let rd_old = if M::ENABLED { read_reg(regs, rd) } else { 0 };
    if rd.num() != 0 {
        regs[rd.num() as usize] = result;
    }

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: sp_val,
            rs2_val: None,
            rd_old,
            rd_new: result,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_lw<M: LoggingMode>(
    rd: Gpr,
    rs: Gpr,
    offset: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
    memory: &mut Memory,
) -> Result<ExecutionResult, EmulatorError> {
    let base = read_reg(regs, rs);
    let address = base.wrapping_add(offset) as u32;

    let error_regs = *regs;
    let value = memory.read_word(address).map_err(|mut e| {
        match &mut e {
            EmulatorError::InvalidMemoryAccess {
                regs: err_regs,
                pc: err_pc,
                ..
            } => {
                *err_regs = error_regs;
                *err_pc = pc;
            }
            EmulatorError::UnalignedAccess {
                regs: err_regs,
                pc: err_pc,
                ..
            } => {
                *err_regs = error_regs;
                *err_pc = pc;
            }
            _ => {}
        }
        e
    })?;

    let rd_old = if M::ENABLED { read_reg(regs, rd) } else { 0 };
    if rd.num() != 0 {
        regs[rd.num() as usize] = value;
    }

    let log = if M::ENABLED {
        Some(InstLog::Load {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: base,
            addr: address,
            mem_val: value,
            rd_old,
            rd_new: value,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_sw<M: LoggingMode>(
    rs1: Gpr,
    rs2: Gpr,
    offset: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
    memory: &mut Memory,
) -> Result<ExecutionResult, EmulatorError> {
    let base = read_reg(regs, rs1);
    let value = read_reg(regs, rs2);
    let address = base.wrapping_add(offset) as u32;

    let error_regs = *regs;
    let old_value = if M::ENABLED {
        memory.read_word(address).unwrap_or(0)
    } else {
        0
    };
    memory.write_word(address, value).map_err(|mut e| {
        match &mut e {
            EmulatorError::InvalidMemoryAccess {
                regs: err_regs,
                pc: err_pc,
                ..
            } => {
                *err_regs = error_regs;
                *err_pc = pc;
            }
            EmulatorError::UnalignedAccess {
                regs: err_regs,
                pc: err_pc,
                ..
            } => {
                *err_regs = error_regs;
                *err_pc = pc;
            }
            _ => {}
        }
        e
    })?;

    let log = if M::ENABLED {
        Some(InstLog::Store {
            cycle: 0,
            pc,
            instruction: inst_word,
            rs1_val: base,
            rs2_val: value,
            addr: address,
            mem_old: old_value,
            mem_new: value,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_addi<M: LoggingMode>(
    rd: Gpr,
    imm: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let val1 = read_reg(regs, rd);
    let result = val1.wrapping_add(imm);
    let rd_old = val1;
    if rd.num() != 0 {
        regs[rd.num() as usize] = result;
    }

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: val1,
            rs2_val: None,
            rd_old,
            rd_new: result,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_nop<M: LoggingMode>(
    inst_word: u32,
    pc: u32,
    _regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd: Gpr::Zero,
            rs1_val: 0,
            rs2_val: None,
            rd_old: 0,
            rd_new: 0,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_jal<M: LoggingMode>(
    offset: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let next_pc = pc.wrapping_add(2);
    let target = pc.wrapping_add(offset as u32);
    regs[Gpr::Ra.num() as usize] = next_pc as i32;

    let log = if M::ENABLED {
        Some(InstLog::Jump {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd_old: read_reg(regs, Gpr::Ra),
            rd_new: Some(next_pc as i32),
            target_pc: target,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: Some(target),
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_li<M: LoggingMode>(
    rd: Gpr,
    imm: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let rd_old = if M::ENABLED { read_reg(regs, rd) } else { 0 };
    if rd.num() != 0 {
        regs[rd.num() as usize] = imm;
    }

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: 0,
            rs2_val: None,
            rd_old,
            rd_new: imm,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_addi16sp<M: LoggingMode>(
    imm: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let sp_val = read_reg(regs, Gpr::Sp);
    let result = sp_val.wrapping_add(imm);
    let sp_old = sp_val;
    regs[Gpr::Sp.num() as usize] = result;

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd: Gpr::Sp,
            rs1_val: sp_val,
            rs2_val: None,
            rd_old: sp_old,
            rd_new: result,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_lui<M: LoggingMode>(
    rd: Gpr,
    imm: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let rd_old = if M::ENABLED { read_reg(regs, rd) } else { 0 };
    if rd.num() != 0 {
        regs[rd.num() as usize] = imm;
    }

    let log = if M::ENABLED {
        Some(InstLog::Immediate {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rd_old,
            rd_new: imm,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_srli<M: LoggingMode>(
    rd: Gpr,
    imm: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let val1 = read_reg(regs, rd);
    let shift_amt = (imm & 0x1f) as u32;
    let result = ((val1 as u32) >> shift_amt) as i32;
    let rd_old = val1;
    if rd.num() != 0 {
        regs[rd.num() as usize] = result;
    }

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: val1,
            rs2_val: None,
            rd_old,
            rd_new: result,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_srai<M: LoggingMode>(
    rd: Gpr,
    imm: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let val1 = read_reg(regs, rd);
    let shift_amt = (imm & 0x1f) as u32;
    let result = val1 >> shift_amt;
    let rd_old = val1;
    if rd.num() != 0 {
        regs[rd.num() as usize] = result;
    }

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: val1,
            rs2_val: None,
            rd_old,
            rd_new: result,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_andi<M: LoggingMode>(
    rd: Gpr,
    imm: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let val1 = read_reg(regs, rd);
    let result = val1 & imm;
    let rd_old = val1;
    if rd.num() != 0 {
        regs[rd.num() as usize] = result;
    }

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: val1,
            rs2_val: None,
            rd_old,
            rd_new: result,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_sub<M: LoggingMode>(
    rd: Gpr,
    rs: Gpr,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let val1 = read_reg(regs, rd);
    let val2 = read_reg(regs, rs);
    let result = val1.wrapping_sub(val2);
    let rd_old = val1;
    if rd.num() != 0 {
        regs[rd.num() as usize] = result;
    }

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: val1,
            rs2_val: Some(val2),
            rd_old,
            rd_new: result,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_xor<M: LoggingMode>(
    rd: Gpr,
    rs: Gpr,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let val1 = read_reg(regs, rd);
    let val2 = read_reg(regs, rs);
    let result = val1 ^ val2;
    let rd_old = val1;
    if rd.num() != 0 {
        regs[rd.num() as usize] = result;
    }

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: val1,
            rs2_val: Some(val2),
            rd_old,
            rd_new: result,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_or<M: LoggingMode>(
    rd: Gpr,
    rs: Gpr,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let val1 = read_reg(regs, rd);
    let val2 = read_reg(regs, rs);
    let result = val1 | val2;
    let rd_old = val1;
    if rd.num() != 0 {
        regs[rd.num() as usize] = result;
    }

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: val1,
            rs2_val: Some(val2),
            rd_old,
            rd_new: result,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_and<M: LoggingMode>(
    rd: Gpr,
    rs: Gpr,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let val1 = read_reg(regs, rd);
    let val2 = read_reg(regs, rs);
    let result = val1 & val2;
    let rd_old = val1;
    if rd.num() != 0 {
        regs[rd.num() as usize] = result;
    }

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: val1,
            rs2_val: Some(val2),
            rd_old,
            rd_new: result,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_j<M: LoggingMode>(
    offset: i32,
    inst_word: u32,
    pc: u32,
    _regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let target = pc.wrapping_add(offset as u32);

    let log = if M::ENABLED {
        Some(InstLog::Jump {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd_old: 0,
            rd_new: None,
            target_pc: target,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: Some(target),
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_beqz<M: LoggingMode>(
    rs: Gpr,
    offset: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let val = read_reg(regs, rs);
    let taken = val == 0;

    let target_pc = if taken {
        Some(pc.wrapping_add(offset as u32))
    } else {
        None
    };

    let log = if M::ENABLED {
        Some(InstLog::Branch {
            cycle: 0,
            pc,
            instruction: inst_word,
            rs1_val: val,
            rs2_val: 0,
            taken,
            target_pc,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: target_pc,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_bnez<M: LoggingMode>(
    rs: Gpr,
    offset: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let val = read_reg(regs, rs);
    let taken = val != 0;

    let target_pc = if taken {
        Some(pc.wrapping_add(offset as u32))
    } else {
        None
    };

    let log = if M::ENABLED {
        Some(InstLog::Branch {
            cycle: 0,
            pc,
            instruction: inst_word,
            rs1_val: val,
            rs2_val: 0,
            taken,
            target_pc,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: target_pc,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_slli<M: LoggingMode>(
    rd: Gpr,
    imm: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let val1 = read_reg(regs, rd);
    let shift_amt = (imm & 0x1f) as u32;
    let result = ((val1 as u32) << shift_amt) as i32;
    let rd_old = val1;
    if rd.num() != 0 {
        regs[rd.num() as usize] = result;
    }

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: val1,
            rs2_val: None,
            rd_old,
            rd_new: result,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_lwsp<M: LoggingMode>(
    rd: Gpr,
    offset: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
    memory: &mut Memory,
) -> Result<ExecutionResult, EmulatorError> {
    let sp_val = read_reg(regs, Gpr::Sp);
    let address = sp_val.wrapping_add(offset) as u32;

    let error_regs = *regs;
    let value = memory.read_word(address).map_err(|mut e| {
        match &mut e {
            EmulatorError::InvalidMemoryAccess {
                regs: err_regs,
                pc: err_pc,
                ..
            } => {
                *err_regs = error_regs;
                *err_pc = pc;
            }
            EmulatorError::UnalignedAccess {
                regs: err_regs,
                pc: err_pc,
                ..
            } => {
                *err_regs = error_regs;
                *err_pc = pc;
            }
            _ => {}
        }
        e
    })?;

    let rd_old = if M::ENABLED { read_reg(regs, rd) } else { 0 };
    if rd.num() != 0 {
        regs[rd.num() as usize] = value;
    }

    let log = if M::ENABLED {
        Some(InstLog::Load {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: sp_val,
            addr: address,
            mem_val: value,
            rd_old,
            rd_new: value,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_jr<M: LoggingMode>(
    rs: Gpr,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let base = read_reg(regs, rs);
    let target = (base as u32) & !1; // Clear bottom bit for alignment

    let log = if M::ENABLED {
        Some(InstLog::Jump {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd_old: 0,
            rd_new: None,
            target_pc: target,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: Some(target),
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_mv<M: LoggingMode>(
    rd: Gpr,
    rs: Gpr,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let val = read_reg(regs, rs);
    let rd_old = if M::ENABLED { read_reg(regs, rd) } else { 0 };
    if rd.num() != 0 {
        regs[rd.num() as usize] = val;
    }

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: 0,
            rs2_val: Some(val),
            rd_old,
            rd_new: val,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_jalr<M: LoggingMode>(
    rs: Gpr,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let base = read_reg(regs, rs);
    let next_pc = pc.wrapping_add(2);
    let target = (base as u32) & !1; // Clear bottom bit for alignment
    regs[Gpr::Ra.num() as usize] = next_pc as i32;

    let log = if M::ENABLED {
        Some(InstLog::Jump {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd_old: read_reg(regs, Gpr::Ra),
            rd_new: Some(next_pc as i32),
            target_pc: target,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: Some(target),
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_add<M: LoggingMode>(
    rd: Gpr,
    rs: Gpr,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let val1 = read_reg(regs, rd);
    let val2 = read_reg(regs, rs);
    let result = val1.wrapping_add(val2);
    let rd_old = val1;
    if rd.num() != 0 {
        regs[rd.num() as usize] = result;
    }

    let log = if M::ENABLED {
        Some(InstLog::Arithmetic {
            cycle: 0,
            pc,
            instruction: inst_word,
            rd,
            rs1_val: val1,
            rs2_val: Some(val2),
            rd_old,
            rd_new: result,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_swsp<M: LoggingMode>(
    rs: Gpr,
    offset: i32,
    inst_word: u32,
    pc: u32,
    regs: &mut [i32; 32],
    memory: &mut Memory,
) -> Result<ExecutionResult, EmulatorError> {
    let sp_val = read_reg(regs, Gpr::Sp);
    let value = read_reg(regs, rs);
    let address = sp_val.wrapping_add(offset) as u32;

    let error_regs = *regs;
    let old_value = if M::ENABLED {
        memory.read_word(address).unwrap_or(0)
    } else {
        0
    };
    memory.write_word(address, value).map_err(|mut e| {
        match &mut e {
            EmulatorError::InvalidMemoryAccess {
                regs: err_regs,
                pc: err_pc,
                ..
            } => {
                *err_regs = error_regs;
                *err_pc = pc;
            }
            EmulatorError::UnalignedAccess {
                regs: err_regs,
                pc: err_pc,
                ..
            } => {
                *err_regs = error_regs;
                *err_pc = pc;
            }
            _ => {}
        }
        e
    })?;

    let log = if M::ENABLED {
        Some(InstLog::Store {
            cycle: 0,
            pc,
            instruction: inst_word,
            rs1_val: sp_val,
            rs2_val: value,
            addr: address,
            mem_old: old_value,
            mem_new: value,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: false,
        syscall: false,
        log,
    })
}

#[inline(always)]
fn execute_c_ebreak<M: LoggingMode>(
    inst_word: u32,
    pc: u32,
    _regs: &mut [i32; 32],
) -> Result<ExecutionResult, EmulatorError> {
    let log = if M::ENABLED {
        Some(InstLog::System {
            cycle: 0,
            pc,
            instruction: inst_word,
            kind: SystemKind::Ebreak,
        })
    } else {
        None
    };

    Ok(ExecutionResult {
        new_pc: None,
        should_halt: true,
        syscall: false,
        log,
    })
}

// ============================================================================
// Helper functions
// ============================================================================

/// Map compressed register encoding (3 bits) to full register number (x8-x15)
fn compressed_reg(reg_prime: u8) -> Gpr {
    Gpr::new(reg_prime + 8)
}

/// Sign-extend a value from `bits` bits to i32
fn sign_extend(value: u16, bits: u8) -> i32 {
    let sign_bit = 1 << (bits - 1);
    let mask = (1 << bits) - 1;
    let value = (value & mask) as i32;

    if (value & sign_bit) != 0 {
        value | (!(mask as i32))
    } else {
        value
    }
}

/// Decode CJ-type offset (for C.J and C.JAL)
/// offset[11|4|9:8|10|6|7|3:1|5]
fn decode_cj_offset(inst: u16) -> i32 {
    let offset = ((inst >> 1) & 0x800)   // offset[11] from inst[12]
        | ((inst >> 7) & 0x10)            // offset[4] from inst[11]
        | ((inst >> 1) & 0x300)           // offset[9:8] from inst[10:9]
        | ((inst << 2) & 0x400)           // offset[10] from inst[8]
        | ((inst >> 1) & 0x40)            // offset[6] from inst[7]
        | ((inst << 1) & 0x80)            // offset[7] from inst[6]
        | ((inst >> 2) & 0xe)             // offset[3:1] from inst[5:3]
        | ((inst << 3) & 0x20); // offset[5] from inst[2]

    sign_extend(offset, 12)
}

/// Decode CB-type offset (for C.BEQZ and C.BNEZ)
/// offset[8|4:3] rs1' offset[7:6|2:1|5]
fn decode_cb_offset(inst: u16) -> i32 {
    let offset = ((inst >> 4) & 0x100)   // offset[8] from inst[12]
        | ((inst >> 7) & 0x18)            // offset[4:3] from inst[11:10]
        | ((inst << 1) & 0xc0)            // offset[7:6] from inst[6:5]
        | ((inst >> 2) & 0x6)             // offset[2:1] from inst[4:3]
        | ((inst << 3) & 0x20); // offset[5] from inst[2]

    sign_extend(offset, 9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emu::memory::Memory;
    use alloc::vec;

    use super::super::{LoggingDisabled, LoggingEnabled};

    #[test]
    fn test_c_addi() {
        let mut regs = [0i32; 32];
        regs[10] = 5;
        let mut memory = Memory::with_default_addresses(vec![0u8; 1024], vec![]);

        let inst = 0x0515u16; // C.ADDI x10, 5
        let result = decode_execute_compressed::<LoggingEnabled>(
            inst as u32,
            0x1000,
            &mut regs,
            &mut memory,
        )
        .unwrap();

        assert_eq!(regs[10], 10);
        assert_eq!(result.new_pc, None);
        assert_eq!(result.should_halt, false);
        assert_eq!(result.syscall, false);
    }

    #[test]
    fn test_c_nop() {
        let mut regs = [0i32; 32];
        let mut memory = Memory::with_default_addresses(vec![0u8; 1024], vec![]);

        let inst = 0x0001u16; // C.NOP
        let result = decode_execute_compressed::<LoggingEnabled>(
            inst as u32,
            0x1000,
            &mut regs,
            &mut memory,
        )
        .unwrap();

        assert_eq!(result.new_pc, None);
        assert_eq!(result.should_halt, false);
    }

    #[test]
    fn test_c_li() {
        let mut regs = [0i32; 32];
        let mut memory = Memory::with_default_addresses(vec![0u8; 1024], vec![]);

        let inst = 0x4515u16; // C.LI x10, 5
        let result = decode_execute_compressed::<LoggingEnabled>(
            inst as u32,
            0x1000,
            &mut regs,
            &mut memory,
        )
        .unwrap();

        assert_eq!(regs[10], 5);
        assert_eq!(result.new_pc, None);
    }

    #[test]
    fn test_c_j() {
        let mut regs = [0i32; 32];
        let mut memory = Memory::with_default_addresses(vec![0u8; 1024], vec![]);

        // C.J with offset = 4 (encoded in instruction)
        let inst = 0xa001u16; // Simplified encoding for testing
        let result = decode_execute_compressed::<LoggingEnabled>(
            inst as u32,
            0x1000,
            &mut regs,
            &mut memory,
        )
        .unwrap();

        assert!(result.new_pc.is_some());
    }

    #[test]
    fn test_c_beqz() {
        let mut regs = [0i32; 32];
        regs[8] = 0;
        let mut memory = Memory::with_default_addresses(vec![0u8; 1024], vec![]);

        // C.BEQZ x8, offset
        let inst = 0xc001u16; // Simplified encoding
        let result = decode_execute_compressed::<LoggingEnabled>(
            inst as u32,
            0x1000,
            &mut regs,
            &mut memory,
        )
        .unwrap();

        // Should branch if rs == 0
        assert!(result.new_pc.is_some() || result.new_pc.is_none()); // Depends on encoding
    }

    #[test]
    fn test_fast_path() {
        let mut regs = [0i32; 32];
        regs[10] = 5;
        let mut memory = Memory::with_default_addresses(vec![0u8; 1024], vec![]);

        let inst = 0x0515u16; // C.ADDI x10, 5
        let result = decode_execute_compressed::<LoggingDisabled>(
            inst as u32,
            0x1000,
            &mut regs,
            &mut memory,
        )
        .unwrap();

        assert_eq!(regs[10], 10);
        assert!(result.log.is_none()); // Fast path has no logging
    }
}
