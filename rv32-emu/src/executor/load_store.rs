//! Load/store execution: `{1,2,4}`-byte little-endian accesses.

use rv32_inst::{DecodedInst, OpId};

use super::{ExecOutcome, read_reg, write_reg};
use crate::address_space::AddressSpace;
use crate::error::CoreError;

pub(super) fn execute_load(
    dec: DecodedInst,
    regs: &mut [u32; 32],
    mem: &AddressSpace,
) -> Result<ExecOutcome, CoreError> {
    let addr = read_reg(regs, dec.rs1).wrapping_add(dec.imm as u32);
    let (len, sign_extend, width_bits) = match dec.op {
        OpId::Lb => (1, true, 8),
        OpId::Lbu => (1, false, 8),
        OpId::Lh => (2, true, 16),
        OpId::Lhu => (2, false, 16),
        OpId::Lw => (4, false, 32),
        _ => unreachable!("execute_load called with non-load op {:?}", dec.op),
    };

    let raw = mem.read(addr, len)?;
    let value = u32::from_le_bytes(raw);
    let result = if sign_extend && width_bits < 32 {
        let shift = 32 - width_bits;
        (((value << shift) as i32) >> shift) as u32
    } else {
        value
    };

    write_reg(regs, dec.rd, result);
    Ok(ExecOutcome { next_pc: None })
}

pub(super) fn execute_store(
    dec: DecodedInst,
    regs: &[u32; 32],
    mem: &mut AddressSpace,
) -> Result<ExecOutcome, CoreError> {
    let addr = read_reg(regs, dec.rs1).wrapping_add(dec.imm as u32);
    let value = read_reg(regs, dec.rs2);
    let len = match dec.op {
        OpId::Sb => 1,
        OpId::Sh => 2,
        OpId::Sw => 4,
        _ => unreachable!("execute_store called with non-store op {:?}", dec.op),
    };

    mem.write(addr, len, value.to_le_bytes())?;
    Ok(ExecOutcome { next_pc: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_space::Region;
    use rv32_inst::decode;
    use rv32_inst::encode;

    fn space() -> AddressSpace {
        AddressSpace::new(
            Region::new(0x0800_0000, 0x1000),
            Region::new(0x2000_0000, 0x1000),
            Region::new(0x0100_0000, 0x1000),
        )
    }

    #[test]
    fn store_byte_then_load_byte_round_trips() {
        let mut regs = [0u32; 32];
        let mut mem = space();
        regs[2] = 0x2000_0000; // base
        regs[1] = 0x01; // value

        let sb = decode(encode::stype(0, 2, 1, 0));
        execute_store(sb, &regs, &mut mem).unwrap();

        let lbu = decode(encode::itype(0x03, 4, 3, 2, 0));
        execute_load(lbu, &mut regs, &mem).unwrap();
        assert_eq!(regs[3], 0x01);
    }

    #[test]
    fn signed_byte_load_sign_extends() {
        let mut regs = [0u32; 32];
        let mut mem = space();
        regs[2] = 0x2000_0000;
        regs[1] = 0xff;

        let sb = decode(encode::stype(0, 2, 1, 0));
        execute_store(sb, &regs, &mut mem).unwrap();

        let lb = decode(encode::itype(0x03, 0, 3, 2, 0));
        execute_load(lb, &mut regs, &mem).unwrap();
        assert_eq!(regs[3], u32::MAX);
    }

    #[test]
    fn unsigned_byte_load_zero_extends() {
        let mut regs = [0u32; 32];
        let mut mem = space();
        regs[2] = 0x2000_0000;
        regs[1] = 0xff;

        let sb = decode(encode::stype(0, 2, 1, 0));
        execute_store(sb, &regs, &mut mem).unwrap();

        let lbu = decode(encode::itype(0x03, 4, 3, 2, 0));
        execute_load(lbu, &mut regs, &mem).unwrap();
        assert_eq!(regs[3], 0xff);
    }

    #[test]
    fn store_out_of_range_fails() {
        let mut regs = [0u32; 32];
        let mut mem = space();
        regs[2] = 0x0000_0000;
        let sw = decode(encode::stype(2, 2, 1, 0));
        assert!(execute_store(sw, &regs, &mut mem).is_err());
    }
}
