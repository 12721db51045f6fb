/// The data block arena.
mod block_store;
/// The inode arena.
mod inode_table;

pub use block_store::*;
pub use inode_table::*;
