use std::collections::BTreeMap;

use crate::chain::BlockRecord;

/// Blocks fetched ahead of the cursor, keyed by number.
///
/// Entries leave only through [`PendingBuffer::pop_next`], i.e. when they are
/// contiguous with the cursor.
#[derive(Debug, Default)]
pub struct PendingBuffer {
    blocks: BTreeMap<u64, BlockRecord>,
}

impl PendingBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, block: BlockRecord) {
        self.blocks.insert(block.number, block);
    }

    #[must_use]
    pub fn contains(&self, number: u64) -> bool {
        self.blocks.contains_key(&number)
    }

    /// Removes and returns the block at `cursor`, if buffered.
    pub fn pop_next(&mut self, cursor: u64) -> Option<BlockRecord> {
        self.blocks.remove(&cursor)
    }

    /// Drops entries below `cursor`; they can no longer be emitted.
    pub fn discard_below(&mut self, cursor: u64) {
        self.blocks = self.blocks.split_off(&cursor);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Lowest buffered block number.
    #[must_use]
    pub fn first(&self) -> Option<u64> {
        self.blocks.keys().next().copied()
    }
}
