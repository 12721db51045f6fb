use std::fmt::{self, Debug};

/// size of a block in bytes
pub const BLOCK_SIZE: usize = 4096;

const_assert!(BLOCK_SIZE % 1024 == 0);
/// The size of a block in kilobytes, as used by the statistics report.
pub const BLOCK_SIZE_KB: usize = BLOCK_SIZE / 1024;

/// A fixed-size data block.
///
/// Freshly allocated blocks are zero-filled, so a partially written last block is implicitly
/// zero-padded.
#[derive(Clone, PartialEq, Eq)]
pub struct DataBlock {
    data: Box<[u8; BLOCK_SIZE]>,
    dirty: bool,
}

impl DataBlock {
    /// Constructs a new zero-filled, clean [`DataBlock`].
    pub fn new() -> Self {
        Self {
            data: Box::new([0; BLOCK_SIZE]),
            dirty: false,
        }
    }

    pub fn data(&self) -> &[u8; BLOCK_SIZE] {
        &self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Copies `src` to the start of the block. Bytes past [`BLOCK_SIZE`] are ignored.
    ///
    /// Returns the number of bytes copied.
    pub fn write(&mut self, src: &[u8]) -> usize {
        let len = src.len().min(BLOCK_SIZE);
        self.data[..len].copy_from_slice(&src[..len]);
        self.dirty = true;

        len
    }

    /// Returns the first `len` bytes of the block (at most [`BLOCK_SIZE`]).
    pub fn read(&self, len: usize) -> &[u8] {
        &self.data[..len.min(BLOCK_SIZE)]
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
        self.dirty = true;
    }

    pub fn sync(&mut self) {
        self.dirty = false;
    }
}

impl Default for DataBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for DataBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = self.data.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);

        f.debug_struct("DataBlock")
            .field("used", &used)
            .field("dirty", &self.dirty)
            .finish()
    }
}
