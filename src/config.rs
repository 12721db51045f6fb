/// The default maximum number of inodes.
pub const MAX_INODES: usize = 2048;
/// The default maximum number of data blocks.
pub const MAX_BLOCKS: usize = 16384;
/// The default filesystem label.
pub const DEFAULT_LABEL: &str = "MiniOS-FS";

/// Capacity and labelling of a [`FileSystem`](crate::fs::FileSystem).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The number of inode numbers that can be handed out. Inode numbers are never reused.
    pub max_inodes: usize,
    /// The number of block numbers that can be handed out before the next defragmentation.
    pub max_blocks: usize,
    pub label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_inodes: MAX_INODES,
            max_blocks: MAX_BLOCKS,
            label: DEFAULT_LABEL.to_owned(),
        }
    }
}
