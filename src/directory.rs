use std::collections::BTreeMap;

use log::debug;

use crate::error::{FsError, Result};
use crate::format::directory_entry::DirectoryEntry;
use crate::format::inode::ROOT_INODE;
use crate::fs::InodeNumber;

/// The entry lists of every directory, keyed by the directory's inode number.
///
/// Entry lists keep insertion order. Duplicate names are allowed; lookups take the first match.
#[derive(Debug, Default)]
pub struct DirectoryTree {
    directories: BTreeMap<InodeNumber, Vec<DirectoryEntry>>,
}

impl DirectoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an empty entry list for `inum`.
    pub fn register(&mut self, inum: InodeNumber) {
        self.directories.entry(inum).or_default();
    }

    /// Drops the entry list of `inum`, returning it.
    pub fn unregister(&mut self, inum: InodeNumber) -> Option<Vec<DirectoryEntry>> {
        self.directories.remove(&inum)
    }

    pub fn is_directory(&self, inum: InodeNumber) -> bool {
        self.directories.contains_key(&inum)
    }

    pub fn entries(&self, inum: InodeNumber) -> Option<&[DirectoryEntry]> {
        self.directories.get(&inum).map(Vec::as_slice)
    }

    /// Whether `inum` has an entry list holding at least one entry.
    pub fn has_entries(&self, inum: InodeNumber) -> bool {
        self.entries(inum).is_some_and(|entries| !entries.is_empty())
    }

    /// Appends `entry` to the entry list of `parent`. Returns `false` if `parent` has no entry
    /// list.
    pub fn append(&mut self, parent: InodeNumber, entry: DirectoryEntry) -> bool {
        let Some(entries) = self.directories.get_mut(&parent) else {
            return false;
        };

        debug!(
            "[inode #{parent}] adding entry {:?} -> {}",
            entry.name, entry.inum
        );
        entries.push(entry);

        true
    }

    /// Removes every entry of `parent` that points to `inum`. Returns the number removed.
    pub fn remove_entry(&mut self, parent: InodeNumber, inum: InodeNumber) -> usize {
        let Some(entries) = self.directories.get_mut(&parent) else {
            return 0;
        };

        let before = entries.len();
        entries.retain(|entry| entry.inum != inum);

        before - entries.len()
    }

    /// Finds the first entry of `parent` named `name`.
    pub fn lookup(&self, parent: InodeNumber, name: &str) -> Option<&DirectoryEntry> {
        self.entries(parent)?
            .iter()
            .find(|entry| entry.name == name)
    }

    /// Resolves a `/`-separated path starting at the root. Empty segments are ignored; `.` and
    /// `..` have no special meaning.
    pub fn resolve(&self, path: &str) -> Result<InodeNumber> {
        if path == "/" {
            return Ok(ROOT_INODE);
        }

        let mut current = ROOT_INODE;
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            current = self
                .lookup(current, segment)
                .ok_or_else(|| FsError::PathNotFound(path.to_owned()))?
                .inum;
        }

        Ok(current)
    }

    /// Iterates over every directory and its entries, in inode number order.
    pub fn iter(&self) -> impl Iterator<Item = (InodeNumber, &[DirectoryEntry])> {
        self.directories
            .iter()
            .map(|(inum, entries)| (*inum, entries.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use crate::format::inode::InodeType;

    use super::*;

    /// `/a/b/c` where `a` and `b` are directories.
    fn tree() -> DirectoryTree {
        let mut tree = DirectoryTree::new();
        tree.register(0);
        tree.register(1);
        tree.register(2);
        tree.append(0, DirectoryEntry::new("a", 1, InodeType::Directory));
        tree.append(1, DirectoryEntry::new("b", 2, InodeType::Directory));
        tree.append(2, DirectoryEntry::new("c", 3, InodeType::Regular));

        tree
    }

    mod resolve {
        use super::*;

        #[test]
        fn test_root() {
            assert_eq!(tree().resolve("/"), Ok(ROOT_INODE));
            assert_eq!(tree().resolve(""), Ok(ROOT_INODE));
        }

        #[test]
        fn test_nested_file() {
            assert_eq!(tree().resolve("/a/b/c"), Ok(3));
        }

        #[test]
        fn test_ignores_empty_segments() {
            assert_eq!(tree().resolve("//a///b/"), Ok(2));
            assert_eq!(tree().resolve("a/b/c"), Ok(3));
        }

        #[test]
        fn test_missing_segment() {
            assert_eq!(
                tree().resolve("/a/x"),
                Err(FsError::PathNotFound("/a/x".to_owned()))
            );
        }

        #[test]
        fn test_through_file() {
            assert!(tree().resolve("/a/b/c/d").is_err());
        }

        #[test]
        fn test_dot_segments_are_names() {
            assert!(tree().resolve("/a/./b").is_err());
            assert!(tree().resolve("/a/..").is_err());
        }

        #[test]
        fn test_first_duplicate_wins() {
            let mut tree = tree();
            tree.register(4);
            tree.append(0, DirectoryEntry::new("a", 4, InodeType::Directory));

            assert_eq!(tree.resolve("/a"), Ok(1));
        }
    }

    mod entries {
        use super::*;

        #[test]
        fn test_append_to_missing_directory() {
            let mut tree = tree();

            assert!(!tree.append(3, DirectoryEntry::new("x", 9, InodeType::Regular)));
            assert!(tree.entries(3).is_none());
        }

        #[test]
        fn test_remove_by_inode_number() {
            let mut tree = tree();
            tree.append(0, DirectoryEntry::new("z", 7, InodeType::Regular));
            tree.append(0, DirectoryEntry::new("y", 8, InodeType::Regular));

            assert_eq!(tree.remove_entry(0, 7), 1);
            let names: Vec<_> = tree
                .entries(0)
                .unwrap()
                .iter()
                .map(|entry| entry.name.as_str())
                .collect();
            assert_eq!(names, ["a", "y"]);

            assert_eq!(tree.remove_entry(0, 7), 0);
            assert_eq!(tree.remove_entry(42, 7), 0);
        }

        #[test]
        fn test_has_entries() {
            let mut tree = tree();
            assert!(tree.has_entries(2));

            tree.remove_entry(2, 3);
            assert!(!tree.has_entries(2));
            assert!(!tree.has_entries(3));
        }

        #[test]
        fn test_unregister() {
            let mut tree = tree();
            let entries = tree.unregister(2).unwrap();

            assert_eq!(entries.len(), 1);
            assert!(!tree.is_directory(2));
        }
    }
}
