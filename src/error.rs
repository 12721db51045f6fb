use std::fmt;

use thiserror::Error;

use crate::fs::InodeNumber;

/// A capacity-limited resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Inodes,
    Blocks,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Inodes => write!(f, "inodes"),
            Resource::Blocks => write!(f, "blocks"),
        }
    }
}

/// The broad class of an [`FsError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    ResourceExhausted,
    NotFound,
    InvalidOperation,
    Inconsistency,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("no more free {0}")]
    ResourceExhausted(Resource),

    #[error("no such inode: {0}")]
    NotFound(InodeNumber),

    #[error("no such file or directory: {0}")]
    PathNotFound(String),

    #[error("inode is a directory: {0}")]
    IsDirectory(InodeNumber),

    #[error("inode is not a directory: {0}")]
    NotADirectory(InodeNumber),

    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(InodeNumber),

    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    #[error("filesystem is inconsistent: {0}")]
    Inconsistent(String),
}

impl FsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            FsError::NotFound(_) | FsError::PathNotFound(_) | FsError::NotADirectory(_) => {
                ErrorKind::NotFound
            }
            FsError::IsDirectory(_)
            | FsError::DirectoryNotEmpty(_)
            | FsError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            FsError::Inconsistent(_) => ErrorKind::Inconsistency,
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
