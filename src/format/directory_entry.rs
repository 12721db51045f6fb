use crate::fs::InodeNumber;

use super::inode::InodeType;

/// A directory entry.
///
/// Names are not required to be unique within a directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DirectoryEntry {
    /// The name of the entry.
    pub name: String,
    /// The inode number.
    pub inum: InodeNumber,
    /// The type of the inode at the time the entry was made.
    pub type_: InodeType,
}

impl DirectoryEntry {
    /// Constructs a new [`DirectoryEntry`] instance.
    pub fn new(name: &str, inum: InodeNumber, type_: InodeType) -> DirectoryEntry {
        DirectoryEntry {
            name: name.to_owned(),
            inum,
            type_,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.type_ == InodeType::Directory
    }
}
