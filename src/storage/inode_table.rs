use log::debug;

use crate::error::{FsError, Resource, Result};
use crate::format::inode::{Inode, InodeType};
use crate::fs::InodeNumber;

/// An arena of inodes indexed by inode number.
///
/// Inode numbers are assigned sequentially from zero and never reused. Iteration follows inode
/// number order.
#[derive(Debug)]
pub struct InodeTable {
    /// `inodes[n]` holds inode number `n`; `None` marks a deleted inode.
    inodes: Vec<Option<Inode>>,
    /// The number of `Some` entries in `inodes`.
    len: usize,
    max_inodes: usize,
}

impl InodeTable {
    pub fn new(max_inodes: usize) -> Self {
        Self {
            inodes: vec![],
            len: 0,
            max_inodes,
        }
    }

    /// The inode number the next [`InodeTable::create`] would assign. Fails once the counter
    /// no longer fits in an [`InodeNumber`].
    pub fn next_inode_number(&self) -> Result<InodeNumber> {
        inode_number(self.inodes.len())
    }

    /// The number of live inodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Creates an inode under the next inode number. Fails without side effects once every
    /// inode number has been handed out.
    pub fn create(
        &mut self,
        name: &str,
        inode_type: InodeType,
        parent: Option<InodeNumber>,
    ) -> Result<InodeNumber> {
        if self.inodes.len() >= self.max_inodes {
            return Err(FsError::ResourceExhausted(Resource::Inodes));
        }

        let inum = self.next_inode_number()?;
        self.inodes
            .push(Some(Inode::new(inum, name, inode_type, parent)));
        self.len += 1;

        debug!("[inode #{inum}] created {inode_type:?} {name:?}");
        Ok(inum)
    }

    pub fn contains(&self, inum: InodeNumber) -> bool {
        self.get(inum).is_some()
    }

    pub fn get(&self, inum: InodeNumber) -> Option<&Inode> {
        self.inodes.get(inum as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, inum: InodeNumber) -> Option<&mut Inode> {
        self.inodes.get_mut(inum as usize)?.as_mut()
    }

    /// Like [`InodeTable::get`], but fails with [`FsError::NotFound`].
    pub fn lookup(&self, inum: InodeNumber) -> Result<&Inode> {
        self.get(inum).ok_or(FsError::NotFound(inum))
    }

    /// Like [`InodeTable::get_mut`], but fails with [`FsError::NotFound`].
    pub fn lookup_mut(&mut self, inum: InodeNumber) -> Result<&mut Inode> {
        self.get_mut(inum).ok_or(FsError::NotFound(inum))
    }

    pub fn remove(&mut self, inum: InodeNumber) -> Option<Inode> {
        let inode = self.inodes.get_mut(inum as usize)?.take()?;
        self.len -= 1;

        debug!("[inode #{inum}] removed");
        Some(inode)
    }

    /// Updates the modification time of `inum`, if it exists.
    pub fn touch_modified(&mut self, inum: InodeNumber) {
        if let Some(inode) = self.get_mut(inum) {
            inode.times.touch_modified();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Inode> {
        self.inodes.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Inode> {
        self.inodes.iter_mut().flatten()
    }
}

fn inode_number(index: usize) -> Result<InodeNumber> {
    InodeNumber::try_from(index).map_err(|_| FsError::ResourceExhausted(Resource::Inodes))
}
