//! Parser for the `"ILP\0"`-tagged instruction-level-parallelism schedule
//! file. Produces an already-validated [`rv32_emu::ilp::IlpSchedule`];
//! replay semantics live entirely in `rv32-emu`.

use std::fs;
use std::path::Path;

use rv32_emu::ilp::{BlockEntry, IlpSchedule};

use crate::error::IlpError;

const MAGIC: [u8; 4] = *b"ILP\0";

pub fn load_ilp_schedule(path: impl AsRef<Path>, rom_origin: u32) -> Result<IlpSchedule, IlpError> {
    let data = fs::read(path)?;
    parse_ilp_schedule(&data, rom_origin)
}

fn u32_le(data: &[u8], off: usize) -> Result<u32, IlpError> {
    let bytes = data
        .get(off..off + 4)
        .ok_or(IlpError::Truncated { wanted: off + 4, have: data.len() })?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn parse_ilp_schedule(data: &[u8], rom_origin: u32) -> Result<IlpSchedule, IlpError> {
    log::debug!("parsing ILP schedule ({} bytes)", data.len());
    if data.len() < 4 || data[0..4] != MAGIC {
        return Err(IlpError::BadMagic);
    }
    let n_blocks = u32_le(data, 4)?;
    let n_threads = u32_le(data, 8)?;
    log::debug!("n_blocks={n_blocks} n_threads={n_threads}");

    let mut blocks = Vec::with_capacity(n_blocks as usize);
    let mut off = 12;
    for _ in 0..n_blocks {
        let addr = u32_le(data, off)?;
        let offset = u32_le(data, off + 4)?;
        let size = u32_le(data, off + 8)?;
        log::trace!("block addr={addr:#010x} offset={offset} size={size}");
        blocks.push(BlockEntry {
            index: addr.saturating_sub(rom_origin) / 4,
            addr,
            offset,
            size,
        });
        off += 12;
    }

    let pool_bytes = data
        .get(off..)
        .ok_or(IlpError::Truncated { wanted: off, have: data.len() })?;
    let pool: Vec<u32> = pool_bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    log::debug!("address pool contains {} entries", pool.len());

    Ok(IlpSchedule::new(n_threads, blocks, pool))
}
