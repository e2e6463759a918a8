//! The emulator device: address space, register file, PC, cycle counter,
//! the optional decoded-instruction cache, and the optional ILP schedule,
//! all owned by one value.
//!
//! There is no global singleton and no explicit teardown call — `Device`
//! is dropped like any other owned value once the caller (`rv32-cli`)
//! lets it go out of scope.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use rv32_inst::{DecodedInst, OpId, decode};

use crate::address_space::{AddressSpace, Region};
use crate::error::CoreError;
use crate::executor::{self, ExecOutcome};
use crate::ilp::{InProgressBlock, IlpSchedule, next_slice};

/// What a successful `step` just did, beyond "it succeeded". A caller
/// that only cares about the pass/fail contract can ignore this and
/// treat `Err` as a terminal `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// An ordinary fetch-decode-execute cycle.
    Continue,
    /// An ILP slice was drained this call; `executed` is how many
    /// addresses in the slice were non-zero and actually run.
    IlpBlock { executed: u32 },
}

pub struct Device {
    regs: [u32; 32],
    pc: u32,
    cycle: u64,
    mem: AddressSpace,
    decoded_cache: Option<Vec<DecodedInst>>,
    cache_base: u32,
    ilp: Option<IlpSchedule>,
    ilp_in_progress: Option<InProgressBlock>,
}

impl Device {
    pub fn new(
        rom_size: u32,
        rom_origin: u32,
        ram_size: u32,
        ram_origin: u32,
        periph_size: u32,
        periph_origin: u32,
    ) -> Self {
        Device {
            regs: [0u32; 32],
            pc: rom_origin,
            cycle: 0,
            mem: AddressSpace::new(
                Region::new(rom_origin, rom_size),
                Region::new(ram_origin, ram_size),
                Region::new(periph_origin, periph_size),
            ),
            decoded_cache: None,
            cache_base: rom_origin,
            ilp: None,
            ilp_in_progress: None,
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Set the program counter, e.g. to an ELF entry point that differs
    /// from `rom_origin`. `Device::new` starts PC at `rom_origin`.
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn reg(&self, index: u8) -> u32 {
        if index == 0 { 0 } else { self.regs[index as usize] }
    }

    /// `write(0, _)` is a no-op, matching the hard-zero invariant on `x0`.
    pub fn set_reg(&mut self, index: u8, value: u32) {
        if index != 0 {
            self.regs[(index & 0x1f) as usize] = value;
        }
    }

    pub fn read(&self, addr: u32, n: u32) -> Result<Vec<u8>, CoreError> {
        let raw = self.mem.read(addr, n)?;
        Ok(raw[..n as usize].to_vec())
    }

    pub fn write(&mut self, addr: u32, bytes: &[u8]) -> Result<(), CoreError> {
        let mut buf = [0u8; 4];
        buf[..bytes.len()].copy_from_slice(bytes);
        self.mem.write(addr, bytes.len() as u32, buf)
    }

    /// Exposed so `rv32-elf` can write loaded ELF sections directly
    /// through the same routing the executor uses.
    pub fn address_space_mut(&mut self) -> &mut AddressSpace {
        &mut self.mem
    }

    pub fn rom_origin(&self) -> u32 {
        self.mem.rom.origin
    }

    /// Pre-decode `[rom.origin, prog_end)` into the decoded-instruction
    /// cache. Called by the ELF loader once `prog_end` (the watermark
    /// derived from `SHF_EXECINSTR` sections) is known. Addresses outside
    /// this range always fall back to on-demand decode.
    pub fn build_decoded_cache(&mut self, prog_end: u32) {
        let base = self.mem.rom.origin;
        let word_count = ((prog_end.saturating_sub(base)) / 4) as usize;
        let mut cache = Vec::with_capacity(word_count);
        for i in 0..word_count {
            let addr = base + (i as u32) * 4;
            let word = self.mem.read_u32(addr).unwrap_or(0);
            cache.push(decode(word));
        }
        self.cache_base = base;
        self.decoded_cache = Some(cache);
    }

    pub fn load_ilp_schedule(&mut self, schedule: IlpSchedule) {
        self.ilp = Some(schedule);
        self.ilp_in_progress = None;
    }

    fn cached_decode(&self, pc: u32) -> Option<DecodedInst> {
        let cache = self.decoded_cache.as_ref()?;
        let index = pc.checked_sub(self.cache_base)? / 4;
        cache.get(index as usize).copied()
    }

    fn fetch_decode(&self, pc: u32) -> Result<DecodedInst, CoreError> {
        if let Some(dec) = self.cached_decode(pc) {
            return Ok(dec);
        }
        let word = self
            .mem
            .read_u32(pc)
            .map_err(|_| CoreError::FetchFault { pc })?;
        let dec = decode(word);
        if dec.op == OpId::Invalid {
            return Err(CoreError::DecodeError { pc, word });
        }
        Ok(dec)
    }

    /// Run one step: either an ordinary fetch-decode-execute cycle, or —
    /// if an ILP schedule is loaded and this PC is scheduled — drain the
    /// next slice of independent instructions. The cycle counter always
    /// increments by exactly 1 per successful call, regardless of how
    /// many instructions an ILP slice executed.
    pub fn step(&mut self) -> Result<StepOutcome, CoreError> {
        // The slice is copied out of the schedule before `run_ilp_slice`
        // takes `&mut self` — the schedule borrow and the slice it
        // produces cannot outlive the lookup that created them.
        let slice: Option<Vec<u32>> = self.ilp.as_ref().and_then(|schedule| {
            let rom_origin = self.mem.rom.origin;
            next_slice(schedule, &mut self.ilp_in_progress, self.pc, rom_origin)
                .map(|s| s.to_vec())
        });

        let outcome = match slice {
            Some(addrs) => self.run_ilp_slice(&addrs)?,
            None => self.run_sequential()?,
        };

        self.regs[0] = 0;
        self.cycle += 1;
        Ok(outcome)
    }

    fn run_sequential(&mut self) -> Result<StepOutcome, CoreError> {
        let pc = self.pc;
        let dec = self.fetch_decode(pc)?;
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("step pc={pc:#010x} {}", rv32_inst::format::format_inst(dec));
        }
        let ExecOutcome { next_pc } = executor::execute(dec, pc, &mut self.regs, &mut self.mem)?;
        self.pc = next_pc.unwrap_or_else(|| pc.wrapping_add(4));
        Ok(StepOutcome::Continue)
    }

    fn run_ilp_slice(&mut self, addrs: &[u32]) -> Result<StepOutcome, CoreError> {
        let mut executed = 0u32;
        for &addr in addrs {
            if addr == 0 {
                break;
            }
            let word = self
                .mem
                .read_u32(addr)
                .map_err(|_| CoreError::FetchFault { pc: addr })?;
            let dec = decode(word);
            if dec.op == OpId::Invalid {
                return Err(CoreError::DecodeError { pc: addr, word });
            }
            let ExecOutcome { next_pc } =
                executor::execute(dec, addr, &mut self.regs, &mut self.mem)?;
            if let Some(target) = next_pc {
                self.pc = target;
            }
            executed += 1;
        }
        Ok(StepOutcome::IlpBlock { executed })
    }
}
