use std::fmt;
use std::ops::{BitAnd, BitOr};

use crate::fs::{BlockNumber, InodeNumber};
use crate::metadata::{format_timestamp, OwnershipMetadata, TimeMetadata};

use super::block::BLOCK_SIZE;

/// The inode number of the root directory.
pub const ROOT_INODE: InodeNumber = 0;

/// The kind of object an inode describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InodeType {
    /// This inode describes a directory.
    Directory,
    /// This inode describes a regular data file.
    Regular,
}

impl InodeType {
    /// The type character used in permission strings.
    pub fn type_char(self) -> char {
        match self {
            InodeType::Directory => 'd',
            InodeType::Regular => '-',
        }
    }
}

/// POSIX-style permission bits (owner/group/other × read/write/execute).
///
/// Bits are stored, never enforced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Permissions(u16);

impl Permissions {
    pub const OWNER_READ: Permissions = Permissions(0o400);
    pub const OWNER_WRITE: Permissions = Permissions(0o200);
    pub const OWNER_EXEC: Permissions = Permissions(0o100);
    pub const GROUP_READ: Permissions = Permissions(0o040);
    pub const GROUP_WRITE: Permissions = Permissions(0o020);
    pub const GROUP_EXEC: Permissions = Permissions(0o010);
    pub const OTHER_READ: Permissions = Permissions(0o004);
    pub const OTHER_WRITE: Permissions = Permissions(0o002);
    pub const OTHER_EXEC: Permissions = Permissions(0o001);

    /// `rwxr-xr-x`
    pub const DEFAULT_DIRECTORY: Permissions = Permissions(0o755);
    /// `rw-r--r--`
    pub const DEFAULT_FILE: Permissions = Permissions(0o644);

    /// Every permission bit, in rendering order.
    const ORDERED: [(Permissions, char); 9] = [
        (Self::OWNER_READ, 'r'),
        (Self::OWNER_WRITE, 'w'),
        (Self::OWNER_EXEC, 'x'),
        (Self::GROUP_READ, 'r'),
        (Self::GROUP_WRITE, 'w'),
        (Self::GROUP_EXEC, 'x'),
        (Self::OTHER_READ, 'r'),
        (Self::OTHER_WRITE, 'w'),
        (Self::OTHER_EXEC, 'x'),
    ];

    /// Constructs permissions from a mode; bits outside `0o777` are dropped.
    pub const fn from_mode(mode: u16) -> Self {
        Permissions(mode & 0o777)
    }

    pub const fn mode(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn default_for(inode_type: InodeType) -> Self {
        match inode_type {
            InodeType::Directory => Self::DEFAULT_DIRECTORY,
            InodeType::Regular => Self::DEFAULT_FILE,
        }
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self::Output {
        Permissions(self.0 | rhs.0)
    }
}

impl BitAnd for Permissions {
    type Output = Permissions;

    fn bitand(self, rhs: Self) -> Self::Output {
        Permissions(self.0 & rhs.0)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (bit, c) in Self::ORDERED {
            write!(f, "{}", if self.contains(bit) { c } else { '-' })?;
        }

        Ok(())
    }
}

/// The metadata record of a file or directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inode {
    /// inode number
    pub inum: InodeNumber,
    /// name given at creation; renames are not supported
    pub name: String,
    /// file type
    pub type_: InodeType,
    /// file size in bytes
    pub size: usize,
    pub times: TimeMetadata,
    pub permissions: Permissions,
    pub owner: OwnershipMetadata,
    /// number of hard links to inode
    pub nlink: u32,
    /// block numbers holding the file contents, in file order (always empty for directories)
    pub blocks: Vec<BlockNumber>,
    /// the directory this inode was created in; `None` only for the root
    pub parent: Option<InodeNumber>,
    /// hex digest of the file contents, empty until the first write
    pub checksum: String,
}

impl Inode {
    /// Constructs a new [`Inode`] instance with all timestamps set to now.
    pub fn new(
        inum: InodeNumber,
        name: &str,
        type_: InodeType,
        parent: Option<InodeNumber>,
    ) -> Self {
        Self {
            inum,
            name: name.to_owned(),
            type_,
            size: 0,
            times: TimeMetadata::now(),
            permissions: Permissions::default_for(type_),
            owner: OwnershipMetadata::default(),
            nlink: 1,
            blocks: vec![],
            parent,
            checksum: String::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.type_ == InodeType::Directory
    }

    /// The number of blocks needed to hold `size` bytes.
    pub fn blocks_needed(size: usize) -> usize {
        size.div_ceil(BLOCK_SIZE)
    }

    /// Type character followed by the nine permission characters, e.g. `drwxr-xr-x`.
    pub fn permission_string(&self) -> String {
        format!("{}{}", self.type_.type_char(), self.permissions)
    }

    pub fn increment_links(&mut self) {
        self.nlink += 1;
    }

    pub fn decrement_links(&mut self) {
        self.nlink = self.nlink.saturating_sub(1);
    }
}

/// Renders the `ls -l`-style row used by directory listings.
impl fmt::Display for Inode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:3} {:4} {:4} {:8} {} {}",
            self.permission_string(),
            self.nlink,
            self.owner.uid,
            self.owner.gid,
            self.size,
            format_timestamp(self.times.mtime),
            self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;

    #[test]
    fn test_default_permission_strings() {
        let dir = Inode::new(1, "etc", InodeType::Directory, Some(ROOT_INODE));
        let file = Inode::new(2, "config.sys", InodeType::Regular, Some(1));

        assert_eq!(dir.permission_string(), "drwxr-xr-x");
        assert_eq!(file.permission_string(), "-rw-r--r--");
    }

    #[test]
    fn test_permission_bits() {
        let perms = Permissions::OWNER_READ | Permissions::GROUP_WRITE | Permissions::OTHER_EXEC;

        assert_eq!(perms.mode(), 0o421);
        assert_eq!(perms.to_string(), "r---w---x");
        assert!(perms.contains(Permissions::GROUP_WRITE));
        assert!(!perms.contains(Permissions::OWNER_WRITE));
        assert_eq!(Permissions::from_mode(0o7777).mode(), 0o777);
    }

    #[test]
    fn test_new_inode() {
        let inode = Inode::new(3, "a", InodeType::Regular, Some(0));

        assert_eq!(inode.size, 0);
        assert_eq!(inode.nlink, 1);
        assert!(inode.blocks.is_empty());
        assert!(inode.checksum.is_empty());
        assert_eq!(inode.times.crtime, inode.times.mtime);
    }

    #[test]
    fn test_link_count_never_underflows() {
        let mut inode = Inode::new(3, "a", InodeType::Regular, Some(0));
        inode.increment_links();
        assert_eq!(inode.nlink, 2);

        inode.decrement_links();
        inode.decrement_links();
        inode.decrement_links();
        assert_eq!(inode.nlink, 0);
    }

    #[test]
    fn test_listing_row() {
        let mut inode = Inode::new(2, "config.sys", InodeType::Regular, Some(1));
        inode.size = 5;
        inode.times.mtime = UNIX_EPOCH;

        assert_eq!(
            inode.to_string(),
            "-rw-r--r--   1    0    0        5 1970-01-01 00:00:00 config.sys"
        );
    }

    #[test]
    fn test_blocks_needed() {
        assert_eq!(Inode::blocks_needed(0), 0);
        assert_eq!(Inode::blocks_needed(1), 1);
        assert_eq!(Inode::blocks_needed(BLOCK_SIZE), 1);
        assert_eq!(Inode::blocks_needed(BLOCK_SIZE + 1), 2);
    }
}
