use std::fmt;

use bitvec::vec::BitVec;
use log::{info, warn};

use crate::checksum::{Blake3Hasher, ContentHasher};
use crate::config::Config;
use crate::directory::DirectoryTree;
use crate::error::{FsError, Result};
use crate::format::{
    block::BLOCK_SIZE,
    directory_entry::DirectoryEntry,
    inode::{Inode, InodeType, Permissions, ROOT_INODE},
    superblock::{Stats, Superblock},
};
use crate::storage::{BlockStore, InodeTable};

pub type InodeNumber = u32;

pub type BlockNumber = usize;

/// The name the root directory is created with.
pub const ROOT_NAME: &str = "/";

/// The rows of a directory listing, one per live entry, in entry order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryListing {
    pub name: String,
    pub rows: Vec<String>,
}

impl fmt::Display for DirectoryListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Directory: {}", self.name)?;
        writeln!(f)?;

        for row in &self.rows {
            writeln!(f, "{row}")?;
        }

        Ok(())
    }
}

/// An in-memory filesystem: inode table, block store, directory tree and superblock.
///
/// Multi-step operations are not transactional. A failing step leaves the effects of the
/// earlier steps in place (see [`FileSystem::write_file`] and [`FileSystem::copy_file`]).
pub struct FileSystem<H: ContentHasher = Blake3Hasher> {
    superblock: Superblock,
    inodes: InodeTable,
    blocks: BlockStore,
    directories: DirectoryTree,
    hasher: H,
}

impl FileSystem<Blake3Hasher> {
    /// Constructs and mounts a filesystem with the default capacity.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_hasher(config, Blake3Hasher)
    }
}

impl<H: ContentHasher> FileSystem<H> {
    /// Constructs and mounts a filesystem that holds only the root directory.
    pub fn with_hasher(config: Config, hasher: H) -> Result<Self> {
        let mut fs = Self {
            superblock: Superblock::new(&config),
            inodes: InodeTable::new(config.max_inodes),
            blocks: BlockStore::new(config.max_blocks),
            directories: DirectoryTree::new(),
            hasher,
        };

        fs.superblock.mount();
        fs.create(ROOT_NAME, None, InodeType::Directory)?;

        info!(
            "{:?}: {} inodes, {} blocks",
            config.label, config.max_inodes, config.max_blocks
        );
        Ok(fs)
    }

    pub fn superblock(&self) -> &Superblock {
        &self.superblock
    }

    pub fn inode(&self, inum: InodeNumber) -> Result<&Inode> {
        self.inodes.lookup(inum)
    }

    pub fn mount(&mut self) {
        self.superblock.mount();
        info!("mounted (mount count = {})", self.superblock.mount_count);
    }

    pub fn create_file(&mut self, name: &str, parent: InodeNumber) -> Result<InodeNumber> {
        self.create(name, Some(parent), InodeType::Regular)
    }

    pub fn create_directory(&mut self, name: &str, parent: InodeNumber) -> Result<InodeNumber> {
        self.create(name, Some(parent), InodeType::Directory)
    }

    /// Replaces the whole contents of a file.
    ///
    /// The old blocks are released before any new block is allocated. If the block store runs
    /// out of block numbers part way, the blocks allocated so far are released again and the
    /// file is left with no blocks, while its size and checksum still describe the old
    /// contents.
    pub fn write_file(&mut self, inum: InodeNumber, data: &[u8]) -> Result<()> {
        info!("[inode #{inum}] writing file (data.len() = {})", data.len());

        let inode = self.inodes.lookup_mut(inum)?;
        if inode.is_directory() {
            return Err(FsError::IsDirectory(inum));
        }

        for block_number in std::mem::take(&mut inode.blocks) {
            if self.blocks.free(block_number).is_some() {
                self.superblock.free_block();
            }
        }

        let mut new_blocks = Vec::with_capacity(Inode::blocks_needed(data.len()));
        for chunk in data.chunks(BLOCK_SIZE) {
            match self.blocks.store(chunk) {
                Ok(block_number) => {
                    self.superblock.allocate_block();
                    new_blocks.push(block_number);
                }
                Err(err) => {
                    warn!(
                        "[inode #{inum}] write failed after {} of {} blocks",
                        new_blocks.len(),
                        Inode::blocks_needed(data.len())
                    );

                    for block_number in new_blocks {
                        self.blocks.free(block_number);
                        self.superblock.free_block();
                    }

                    return Err(err);
                }
            }
        }

        inode.blocks = new_blocks;
        inode.size = data.len();
        inode.times.touch_modified();
        inode.checksum = self.hasher.hex_digest(data);

        info!("[inode #{inum}] wrote {} bytes", data.len());
        Ok(())
    }

    /// Returns the contents of a file, `size` bytes long. Blocks missing from the block store are
    /// skipped and the remainder is zero-filled.
    pub fn read_file(&mut self, inum: InodeNumber) -> Result<Vec<u8>> {
        info!("[inode #{inum}] reading file");

        let inode = self.inodes.lookup_mut(inum)?;
        if inode.is_directory() {
            return Err(FsError::IsDirectory(inum));
        }

        inode.times.touch_accessed();

        Ok(self.blocks.read(&inode.blocks, inode.size))
    }

    /// Deletes a file or an empty directory and removes its entry from the directory recorded as
    /// its parent.
    pub fn delete_file(&mut self, inum: InodeNumber) -> Result<()> {
        info!("[inode #{inum}] deleting");

        if inum == ROOT_INODE {
            return Err(FsError::InvalidOperation("cannot delete the root directory"));
        }

        let inode = self.inodes.lookup(inum)?;
        if inode.is_directory() {
            if self.directories.has_entries(inum) {
                return Err(FsError::DirectoryNotEmpty(inum));
            }

            self.directories.unregister(inum);
        } else {
            for &block_number in &inode.blocks {
                if self.blocks.free(block_number).is_some() {
                    self.superblock.free_block();
                }
            }
        }

        if let Some(parent) = inode.parent.filter(|p| self.directories.is_directory(*p)) {
            if self.directories.remove_entry(parent, inum) == 0 {
                warn!("[inode #{inum}] no entry in recorded parent {parent}");
            }

            self.inodes.touch_modified(parent);
        }

        self.inodes.remove(inum);
        self.superblock.free_inode();

        Ok(())
    }

    /// Lists a directory. Entries whose inode no longer exists are skipped.
    pub fn list_directory(&self, inum: InodeNumber) -> Result<DirectoryListing> {
        let entries = self.read_directory(inum)?;

        let rows = entries
            .iter()
            .filter_map(|entry| match self.inodes.get(entry.inum) {
                Some(inode) => Some(inode.to_string()),
                None => {
                    warn!(
                        "[inode #{inum}] skipping dangling entry {:?} -> {}",
                        entry.name, entry.inum
                    );
                    None
                }
            })
            .collect();

        let name = self
            .inodes
            .get(inum)
            .map(|inode| inode.name.clone())
            .unwrap_or_default();

        Ok(DirectoryListing { name, rows })
    }

    /// The raw entries of a directory, in insertion order.
    pub fn read_directory(&self, inum: InodeNumber) -> Result<&[DirectoryEntry]> {
        self.directories
            .entries(inum)
            .ok_or(FsError::NotADirectory(inum))
    }

    pub fn find_file(&self, path: &str) -> Result<InodeNumber> {
        self.directories.resolve(path)
    }

    /// Copies a file's contents into a new file under `dest_parent`, returning the new inode
    /// number.
    ///
    /// If writing the copy fails, the new (empty) file is kept.
    pub fn copy_file(
        &mut self,
        src: InodeNumber,
        dest_parent: InodeNumber,
        new_name: &str,
    ) -> Result<InodeNumber> {
        let data = self.read_file(src)?;
        let new_inum = self.create_file(new_name, dest_parent)?;
        self.write_file(new_inum, &data)?;

        Ok(new_inum)
    }

    /// Moves the directory entry of `inum` from its recorded parent to `new_parent`.
    ///
    /// The inode's `parent` field keeps the directory it was created in. The old entry is
    /// removed before `new_parent` is checked, so moving into a non-directory leaves the inode
    /// without any entry.
    pub fn move_file(&mut self, inum: InodeNumber, new_parent: InodeNumber) -> Result<()> {
        info!("[inode #{inum}] moving to {new_parent}");

        if inum == ROOT_INODE {
            return Err(FsError::InvalidOperation("cannot move the root directory"));
        }

        let inode = self.inodes.lookup(inum)?;
        let entry = DirectoryEntry::new(&inode.name, inum, inode.type_);

        if let Some(old_parent) = inode.parent {
            self.directories.remove_entry(old_parent, inum);
        }

        if !self.directories.append(new_parent, entry) {
            warn!("[inode #{inum}] move target {new_parent} is not a directory");
            return Err(FsError::NotADirectory(new_parent));
        }

        Ok(())
    }

    /// Renumbers every file's blocks contiguously from zero, visiting files in inode number
    /// order. Returns the number of blocks in use afterwards.
    pub fn defragment(&mut self) -> usize {
        info!(
            "starting defragmentation ({} blocks, next block number {})",
            self.blocks.len(),
            self.blocks.next_block_number()
        );

        let block_lists = self
            .inodes
            .iter_mut()
            .filter(|inode| !inode.is_directory())
            .map(|inode| &mut inode.blocks);
        let count = self.blocks.compact(block_lists);

        info!("defragmentation complete: blocks compacted to {count}");
        count
    }

    /// Stores new permission bits. Permissions are never enforced.
    pub fn set_permissions(&mut self, inum: InodeNumber, permissions: Permissions) -> Result<()> {
        self.inodes.lookup_mut(inum)?.permissions = permissions;
        Ok(())
    }

    /// Clears every block's dirty flag, returning the number of blocks that were dirty.
    pub fn sync(&mut self) -> usize {
        let synced = self.blocks.sync();
        info!("synced {synced} blocks");

        synced
    }

    pub fn stats(&self) -> Stats {
        Stats::new(&self.superblock, self.blocks.len())
    }

    /// Checks the filesystem for consistency.
    ///
    /// Verifies the superblock counters, block ownership and block counts. Entries pointing at
    /// deleted inodes and stale `parent` fields left by [`FileSystem::move_file`] are tolerated
    /// and only logged.
    pub fn check(&self) -> Result<()> {
        let root = self
            .inodes
            .get(ROOT_INODE)
            .ok_or_else(|| inconsistent("no root inode"))?;
        if !root.is_directory() || !self.directories.is_directory(ROOT_INODE) {
            return Err(inconsistent("root inode does not represent a directory"));
        }

        if self.superblock.free_inodes + self.inodes.len() != self.superblock.total_inodes {
            return Err(inconsistent(format!(
                "{} free inodes recorded but {} of {} in use",
                self.superblock.free_inodes,
                self.inodes.len(),
                self.superblock.total_inodes
            )));
        }

        if self.superblock.free_blocks + self.blocks.len() != self.superblock.total_blocks {
            return Err(inconsistent(format!(
                "{} free blocks recorded but {} of {} in use",
                self.superblock.free_blocks,
                self.blocks.len(),
                self.superblock.total_blocks
            )));
        }

        // A value of `true` represents "owned by some inode".
        let mut owned_blocks: BitVec = BitVec::new();
        owned_blocks.resize(self.blocks.next_block_number(), false);

        for inode in self.inodes.iter() {
            let inum = inode.inum;

            if inode.is_directory() {
                if !inode.blocks.is_empty() {
                    return Err(inconsistent(format!("directory {inum} owns blocks")));
                }

                if !self.directories.is_directory(inum) {
                    return Err(inconsistent(format!("directory {inum} has no entry list")));
                }

                continue;
            }

            if inode.blocks.len() != Inode::blocks_needed(inode.size) {
                return Err(inconsistent(format!(
                    "inode {inum} has {} blocks for {} bytes",
                    inode.blocks.len(),
                    inode.size
                )));
            }

            for &block_number in &inode.blocks {
                if !self.blocks.contains(block_number) {
                    return Err(inconsistent(format!(
                        "inode {inum} references missing block {block_number}"
                    )));
                }

                if owned_blocks[block_number] {
                    return Err(inconsistent(format!(
                        "block {block_number} is owned by more than one inode"
                    )));
                }

                owned_blocks.set(block_number, true);
            }

            if let Some(parent) = inode.parent {
                let listed = self
                    .directories
                    .entries(parent)
                    .is_some_and(|entries| entries.iter().any(|entry| entry.inum == inum));
                if !listed {
                    warn!("[inode #{inum}] not listed in recorded parent {parent}");
                }
            }
        }

        if owned_blocks.count_ones() != self.blocks.len() {
            return Err(inconsistent(format!(
                "{} blocks stored but {} owned",
                self.blocks.len(),
                owned_blocks.count_ones()
            )));
        }

        for (inum, entries) in self.directories.iter() {
            if !self.inodes.contains(inum) {
                return Err(inconsistent(format!("entry list for deleted inode {inum}")));
            }

            for entry in entries.iter().filter(|e| !self.inodes.contains(e.inum)) {
                warn!(
                    "[inode #{inum}] dangling entry {:?} -> {}",
                    entry.name, entry.inum
                );
            }
        }

        Ok(())
    }

    fn create(
        &mut self,
        name: &str,
        parent: Option<InodeNumber>,
        inode_type: InodeType,
    ) -> Result<InodeNumber> {
        info!("creating {inode_type:?} {name:?} (parent = {parent:?})");

        let inum = self.inodes.create(name, inode_type, parent)?;

        if inode_type == InodeType::Directory {
            self.directories.register(inum);
        }

        if let Some(parent) = parent {
            let entry = DirectoryEntry::new(name, inum, inode_type);
            if self.directories.append(parent, entry) {
                self.inodes.touch_modified(parent);
            } else {
                warn!("[inode #{inum}] parent {parent} is not a directory; no entry added");
            }
        }

        self.superblock.allocate_inode();

        Ok(inum)
    }
}

fn inconsistent(message: impl Into<String>) -> FsError {
    FsError::Inconsistent(message.into())
}
