use std::fmt;
use std::time::SystemTime;

use crate::config::Config;

use super::block::{BLOCK_SIZE, BLOCK_SIZE_KB};

/// Capacity and free-count accounting for the whole filesystem.
///
/// The counters are not validated: callers adjust them in lockstep with the inode table and
/// block store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Superblock {
    pub total_inodes: usize,
    pub total_blocks: usize,
    pub free_inodes: usize,
    pub free_blocks: usize,
    /// size of a block in bytes
    pub block_size: usize,
    pub creation_time: SystemTime,
    pub last_mount_time: SystemTime,
    pub mount_count: u32,
    pub label: String,
}

impl Superblock {
    /// Constructs an unmounted superblock with every inode and block free.
    pub fn new(config: &Config) -> Self {
        let now = SystemTime::now();

        Self {
            total_inodes: config.max_inodes,
            total_blocks: config.max_blocks,
            free_inodes: config.max_inodes,
            free_blocks: config.max_blocks,
            block_size: BLOCK_SIZE,
            creation_time: now,
            last_mount_time: now,
            mount_count: 0,
            label: config.label.clone(),
        }
    }

    pub fn allocate_inode(&mut self) {
        self.free_inodes -= 1;
    }

    pub fn free_inode(&mut self) {
        self.free_inodes += 1;
    }

    pub fn allocate_block(&mut self) {
        self.free_blocks -= 1;
    }

    pub fn free_block(&mut self) {
        self.free_blocks += 1;
    }

    pub fn mount(&mut self) {
        self.last_mount_time = SystemTime::now();
        self.mount_count += 1;
    }

    pub fn used_inodes(&self) -> usize {
        self.total_inodes - self.free_inodes
    }

    pub fn used_blocks(&self) -> usize {
        self.total_blocks - self.free_blocks
    }
}

impl fmt::Display for Superblock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Filesystem: {}", self.label)?;
        writeln!(
            f,
            "Total Inodes: {} (Free: {})",
            self.total_inodes, self.free_inodes
        )?;
        writeln!(
            f,
            "Total Blocks: {} (Free: {})",
            self.total_blocks, self.free_blocks
        )?;
        writeln!(f, "Block Size: {} bytes", self.block_size)?;
        write!(f, "Mount Count: {}", self.mount_count)
    }
}

/// A point-in-time snapshot of filesystem usage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stats {
    pub superblock: Superblock,
    /// blocks actually present in the block store
    pub stored_blocks: usize,
    pub used_kb: usize,
    pub free_kb: usize,
    /// percentage of inodes in use, rounded down
    pub inode_usage: usize,
    /// percentage of blocks in use, rounded down
    pub block_usage: usize,
}

impl Stats {
    pub fn new(superblock: &Superblock, stored_blocks: usize) -> Self {
        Self {
            superblock: superblock.clone(),
            stored_blocks,
            used_kb: stored_blocks * BLOCK_SIZE_KB,
            free_kb: superblock.free_blocks * BLOCK_SIZE_KB,
            inode_usage: percentage(superblock.used_inodes(), superblock.total_inodes),
            block_usage: percentage(superblock.used_blocks(), superblock.total_blocks),
        }
    }
}

fn percentage(used: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }

    used * 100 / total
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.superblock)?;
        writeln!(f, "Used Space: {} KB", self.used_kb)?;
        writeln!(f, "Free Space: {} KB", self.free_kb)?;
        writeln!(f, "Inode Usage: {}%", self.inode_usage)?;
        write!(f, "Block Usage: {}%", self.block_usage)
    }
}
