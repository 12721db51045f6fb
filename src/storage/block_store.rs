use log::{debug, warn};

use crate::error::{FsError, Resource, Result};
use crate::format::block::{DataBlock, BLOCK_SIZE};
use crate::fs::BlockNumber;

/// An arena of data blocks indexed by block number.
///
/// Block numbers are handed out from a counter that only moves forward, so freed numbers are not
/// reused until [`BlockStore::compact`] renumbers everything.
#[derive(Debug)]
pub struct BlockStore {
    /// `blocks[n]` holds block number `n`; `None` marks a freed block.
    blocks: Vec<Option<DataBlock>>,
    /// The number of `Some` entries in `blocks`.
    len: usize,
    max_blocks: usize,
}

impl BlockStore {
    pub fn new(max_blocks: usize) -> Self {
        Self {
            blocks: vec![],
            len: 0,
            max_blocks,
        }
    }

    /// The next block number [`BlockStore::store`] would hand out.
    pub fn next_block_number(&self) -> BlockNumber {
        self.blocks.len()
    }

    /// The number of blocks currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, block_number: BlockNumber) -> bool {
        self.get(block_number).is_some()
    }

    pub fn get(&self, block_number: BlockNumber) -> Option<&DataBlock> {
        self.blocks.get(block_number)?.as_ref()
    }

    pub fn get_mut(&mut self, block_number: BlockNumber) -> Option<&mut DataBlock> {
        self.blocks.get_mut(block_number)?.as_mut()
    }

    /// Allocates a zero-filled block under the next block number and copies `data` into it.
    /// Anything past [`BLOCK_SIZE`] bytes is ignored.
    pub fn store(&mut self, data: &[u8]) -> Result<BlockNumber> {
        let block_number = self.next_block_number();
        if block_number >= self.max_blocks {
            return Err(FsError::ResourceExhausted(Resource::Blocks));
        }

        let mut block = DataBlock::new();
        block.write(data);
        self.blocks.push(Some(block));
        self.len += 1;

        debug!("allocated block {block_number}");
        Ok(block_number)
    }

    /// Removes a block from the store, returning it if it was present.
    pub fn free(&mut self, block_number: BlockNumber) -> Option<DataBlock> {
        let block = self.blocks.get_mut(block_number)?.take()?;
        self.len -= 1;

        debug!("freed block {block_number}");
        Some(block)
    }

    /// Concatenates the payloads of `block_numbers`, in order, up to `size` bytes.
    ///
    /// Missing blocks are skipped: the blocks after them move forward and the output is
    /// zero-filled up to `size`.
    pub fn read(&self, block_numbers: &[BlockNumber], size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);

        for &block_number in block_numbers {
            let Some(block) = self.get(block_number) else {
                warn!("skipping missing block {block_number}");
                continue;
            };

            let remaining = size.saturating_sub(data.len());
            data.extend_from_slice(block.read(remaining.min(BLOCK_SIZE)));
        }

        data.resize(size, 0);
        data
    }

    /// Clears the dirty flag of every stored block. Returns the number of blocks that were dirty.
    pub fn sync(&mut self) -> usize {
        let mut synced = 0;
        for block in self.blocks.iter_mut().flatten() {
            if block.is_dirty() {
                block.sync();
                synced += 1;
            }
        }

        synced
    }

    /// Renumbers blocks contiguously from zero, in the order they appear across `block_lists`,
    /// and rewrites each list to the new numbers.
    ///
    /// Blocks that no list references are dropped, as are list entries naming missing blocks.
    /// Returns the number of blocks after compaction.
    pub fn compact<'a, I>(&mut self, block_lists: I) -> usize
    where
        I: IntoIterator<Item = &'a mut Vec<BlockNumber>>,
    {
        let mut old_blocks = std::mem::take(&mut self.blocks);
        let mut compacted = vec![];

        for block_list in block_lists {
            let mut renumbered = Vec::with_capacity(block_list.len());

            for &old_number in block_list.iter() {
                let Some(block) = old_blocks.get_mut(old_number).and_then(Option::take) else {
                    warn!("dropping reference to missing block {old_number}");
                    continue;
                };

                debug!("block {old_number} -> {}", compacted.len());
                renumbered.push(compacted.len());
                compacted.push(Some(block));
            }

            *block_list = renumbered;
        }

        let orphans = old_blocks.iter().flatten().count();
        if orphans > 0 {
            warn!("dropped {orphans} unreferenced blocks during compaction");
        }

        self.len = compacted.len();
        self.blocks = compacted;

        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_sequential_numbers() {
        let mut store = BlockStore::new(4);

        assert_eq!(store.store(&[]), Ok(0));
        assert_eq!(store.store(&[]), Ok(1));
        assert_eq!(store.len(), 2);
        assert_eq!(store.next_block_number(), 2);
    }

    #[test]
    fn test_allocate_exhausted() {
        let mut store = BlockStore::new(1);
        store.store(&[]).unwrap();

        assert_eq!(
            store.store(&[]),
            Err(FsError::ResourceExhausted(Resource::Blocks))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_freed_numbers_are_not_reused() {
        let mut store = BlockStore::new(4);
        let first = store.store(&[]).unwrap();
        assert!(store.free(first).is_some());
        assert!(store.free(first).is_none());

        assert_eq!(store.store(&[]), Ok(1));
        assert!(!store.contains(first));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_counter_exhaustion_despite_free_blocks() {
        let mut store = BlockStore::new(2);
        let a = store.store(&[]).unwrap();
        store.store(&[]).unwrap();
        store.free(a);

        assert!(store.store(&[]).is_err());
    }

    #[test]
    fn test_read_concatenates_up_to_size() {
        let mut store = BlockStore::new(4);
        let a = store.store(&[]).unwrap();
        let b = store.store(&[]).unwrap();
        store.get_mut(a).unwrap().write(&[1; BLOCK_SIZE]);
        store.get_mut(b).unwrap().write(&[2; 3]);

        let data = store.read(&[a, b], BLOCK_SIZE + 2);

        assert_eq!(data.len(), BLOCK_SIZE + 2);
        assert!(data[..BLOCK_SIZE].iter().all(|b| *b == 1));
        assert_eq!(&data[BLOCK_SIZE..], [2, 2]);
    }

    #[test]
    fn test_read_skips_missing_blocks() {
        let mut store = BlockStore::new(4);
        let a = store.store(&[]).unwrap();
        let b = store.store(&[]).unwrap();
        store.get_mut(a).unwrap().write(&[1; BLOCK_SIZE]);
        store.get_mut(b).unwrap().write(&[2; 4]);
        store.free(a);

        // the surviving block moves to the start and the tail is zero-filled
        let data = store.read(&[a, b], BLOCK_SIZE + 4);
        assert_eq!(data.len(), BLOCK_SIZE + 4);
        assert_eq!(&data[..5], [2, 2, 2, 2, 0]);
        assert!(data[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_compact_renumbers_in_list_order() {
        let mut store = BlockStore::new(8);
        let numbers: Vec<_> = (0..5).map(|_| store.store(&[]).unwrap()).collect();
        for &n in &numbers {
            store.get_mut(n).unwrap().write(&[n as u8 + 1]);
        }
        store.free(0);
        store.free(2);

        let mut first = vec![4, 1];
        let mut second = vec![3];
        let count = store.compact([&mut first, &mut second]);

        assert_eq!(count, 3);
        assert_eq!(first, [0, 1]);
        assert_eq!(second, [2]);
        assert_eq!(store.next_block_number(), 3);
        assert_eq!(store.read(&first, 2), [5, 2]);
        assert_eq!(store.read(&second, 1), [4]);
    }

    #[test]
    fn test_sync_counts_dirty_blocks() {
        let mut store = BlockStore::new(4);
        let a = store.store(b"a").unwrap();
        store.store(b"b").unwrap();
        assert_eq!(store.sync(), 2);

        store.get_mut(a).unwrap().write(b"x");
        assert_eq!(store.sync(), 1);
        assert_eq!(store.sync(), 0);
    }
}
