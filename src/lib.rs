//! An in-memory filesystem: an inode table, a fixed-size block pool and a directory tree, with
//! whole-file operations built on top.
//!
//! The engine is single-threaded. Callers sharing a [`FileSystem`] between threads must wrap it
//! in their own lock.

pub mod checksum;
pub mod config;
pub mod directory;
pub mod error;
pub mod format;
pub mod fs;
mod metadata;
pub mod storage;

pub use checksum::{Blake3Hasher, ContentHasher};
pub use config::Config;
pub use error::{ErrorKind, FsError, Resource, Result};
pub use format::inode::{Inode, InodeType, Permissions, ROOT_INODE};
pub use fs::{BlockNumber, DirectoryListing, FileSystem, InodeNumber};
pub use metadata::{format_timestamp, OwnershipMetadata, TimeMetadata};
