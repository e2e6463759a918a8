//! Instruction-level-parallelism replay: consuming a precomputed schedule
//! that groups independent instructions within basic blocks.
//!
//! This module implements only the **sequential** realisation described
//! by the project design notes: each `step` drains up to `n_threads`
//! addresses from the schedule and executes them one after another on
//! this thread. The schedule's contract — that the instructions within
//! one slice are mutually independent — would also allow a multi-threaded
//! realisation (a fixed worker pool rendezvousing at two barriers per
//! slice, one to publish the decoded batch and one to collect results),
//! but that path is not built here: this crate cannot verify the
//! schedule's independence claim, and the sequential replay is
//! functionally equivalent for every caller that doesn't care about wall
//! clock parallelism. `rv32-elf` parses the `"ILP\0"`-tagged schedule
//! file and hands this crate an already-validated [`IlpSchedule`]; this
//! module only knows how to replay one.

extern crate alloc;

use alloc::vec::Vec;

/// One basic block's entry in the schedule's block map.
#[derive(Debug, Clone, Copy)]
pub struct BlockEntry {
    /// `(addr - ROM.origin) / 4`: the block's first-instruction index.
    pub index: u32,
    /// The block's first guest instruction address (informational; the
    /// index above is what `Device::step` actually matches against).
    pub addr: u32,
    /// Offset into the schedule's address pool where this block's
    /// sequence begins.
    pub offset: u32,
    /// Number of `u32` pool entries belonging to this block.
    pub size: u32,
}

/// A parsed ILP schedule: a block map plus the dense address pool it
/// indexes into. Built by `rv32-elf` from the on-disk `"ILP\0"` format
/// and handed to [`crate::device::Device::load_ilp_schedule`].
pub struct IlpSchedule {
    pub n_threads: u32,
    blocks: Vec<BlockEntry>,
    pool: Vec<u32>,
}

impl IlpSchedule {
    /// Build a schedule from an already-parsed block map and address
    /// pool. `blocks` need not be pre-sorted; construction sorts it by
    /// index so lookups can binary-search.
    pub fn new(n_threads: u32, mut blocks: Vec<BlockEntry>, pool: Vec<u32>) -> Self {
        blocks.sort_by_key(|b| b.index);
        IlpSchedule {
            n_threads,
            blocks,
            pool,
        }
    }

    fn block_at(&self, index: u32) -> Option<&BlockEntry> {
        self.blocks
            .binary_search_by_key(&index, |b| b.index)
            .ok()
            .map(|i| &self.blocks[i])
    }

    fn slice(&self, offset: u32, len: u32) -> &[u32] {
        let start = offset as usize;
        let end = start + len as usize;
        &self.pool[start..end]
    }
}

/// In-flight progress through a block's address sequence, tracked across
/// `step` calls.
pub(crate) struct InProgressBlock {
    cursor: u32,
    remaining: u32,
}

/// Given the current core PC and ILP state, decide whether this step
/// should run through the ILP path, and if so resolve the addresses to
/// execute this call along with the updated in-progress state.
///
/// Returns `None` when there is nothing scheduled for this PC (the
/// caller should fall back to ordinary sequential fetch-decode-execute).
pub(crate) fn next_slice<'a>(
    schedule: &'a IlpSchedule,
    in_progress: &mut Option<InProgressBlock>,
    pc: u32,
    rom_origin: u32,
) -> Option<&'a [u32]> {
    if in_progress.is_none() {
        if pc < rom_origin {
            return None;
        }
        let index = (pc - rom_origin) / 4;
        let block = schedule.block_at(index)?;
        *in_progress = Some(InProgressBlock {
            cursor: block.offset,
            remaining: block.size,
        });
    }

    let state = in_progress.as_mut().expect("just populated above");
    let take = state.remaining.min(schedule.n_threads);
    let slice = schedule.slice(state.cursor, take);
    state.cursor += take;
    state.remaining -= take;
    if state.remaining == 0 {
        *in_progress = None;
    }
    Some(slice)
}
