/// Perform a const assertion.
macro_rules! const_assert {
    ($($tt:tt)*) => {
        const _: () = assert!($($tt)*);
    }
}

/// Data blocks.
pub mod block;
/// Directory entries.
pub mod directory_entry;
/// Inodes and permission bits.
pub mod inode;
/// The superblock.
pub mod superblock;
