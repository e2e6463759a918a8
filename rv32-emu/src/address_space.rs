//! The unified RAM/ROM/PERIPH address space.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::error::CoreError;

/// A single contiguous memory region: `size` bytes of backing storage
/// starting at guest address `origin`.
pub struct Region {
    pub origin: u32,
    pub size: u32,
    pub data: Vec<u8>,
}

impl Region {
    pub fn new(origin: u32, size: u32) -> Self {
        Region {
            origin,
            size,
            data: vec![0u8; size as usize],
        }
    }

    /// Whether the byte range `[addr, addr + len)` lies entirely inside
    /// this region.
    fn contains(&self, addr: u32, len: u32) -> bool {
        let Some(end) = addr.checked_add(len) else {
            return false;
        };
        addr >= self.origin && end <= self.origin + self.size
    }

    fn offset(&self, addr: u32) -> usize {
        (addr - self.origin) as usize
    }
}

/// Three fixed, non-overlapping regions, scanned RAM → ROM → PERIPH on
/// every access. The order and the fact that there are exactly three
/// regions are part of the guest toolchain's contract, not a configurable
/// policy, so this is a fixed struct rather than a `Vec<Region>`.
pub struct AddressSpace {
    pub ram: Region,
    pub rom: Region,
    pub periph: Region,
}

impl AddressSpace {
    pub fn new(rom: Region, ram: Region, periph: Region) -> Self {
        AddressSpace { ram, rom, periph }
    }

    fn region_for_mut(&mut self, addr: u32, len: u32) -> Option<&mut Region> {
        if self.ram.contains(addr, len) {
            Some(&mut self.ram)
        } else if self.rom.contains(addr, len) {
            Some(&mut self.rom)
        } else if self.periph.contains(addr, len) {
            Some(&mut self.periph)
        } else {
            None
        }
    }

    fn region_for(&self, addr: u32, len: u32) -> Option<&Region> {
        if self.ram.contains(addr, len) {
            Some(&self.ram)
        } else if self.rom.contains(addr, len) {
            Some(&self.rom)
        } else if self.periph.contains(addr, len) {
            Some(&self.periph)
        } else {
            None
        }
    }

    /// Read `n` bytes at `addr`, little-endian, into a fixed 4-byte buffer
    /// (only the low `n` bytes are meaningful).
    pub fn read(&self, addr: u32, n: u32) -> Result<[u8; 4], CoreError> {
        let region = self
            .region_for(addr, n)
            .ok_or(CoreError::MemoryFault { addr, len: n })?;
        let off = region.offset(addr);
        let mut out = [0u8; 4];
        out[..n as usize].copy_from_slice(&region.data[off..off + n as usize]);
        Ok(out)
    }

    /// Write the low `n` bytes of `bytes` to `addr`, little-endian.
    pub fn write(&mut self, addr: u32, n: u32, bytes: [u8; 4]) -> Result<(), CoreError> {
        let region = self
            .region_for_mut(addr, n)
            .ok_or(CoreError::MemoryFault { addr, len: n })?;
        let off = region.offset(addr);
        region.data[off..off + n as usize].copy_from_slice(&bytes[..n as usize]);
        Ok(())
    }

    /// Write an arbitrary-length byte slice starting at `addr`, atomically
    /// (the whole range must fit in one region). Used by the ELF loader to
    /// place whole sections, unlike `write`'s `{1,2,4}`-byte executor path.
    pub fn write_bytes(&mut self, addr: u32, bytes: &[u8]) -> Result<(), CoreError> {
        let len = bytes.len() as u32;
        let region = self
            .region_for_mut(addr, len)
            .ok_or(CoreError::MemoryFault { addr, len })?;
        let off = region.offset(addr);
        region.data[off..off + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Convenience: read a little-endian `u32` word (used by instruction
    /// fetch and `LW`/`SW`).
    pub fn read_u32(&self, addr: u32) -> Result<u32, CoreError> {
        let bytes = self.read(addr, 4)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), CoreError> {
        self.write(addr, 4, value.to_le_bytes())
    }
}
