// Filesystem adapter used by the FTP worker. The protocol layer only ever
// sees this capability set, so backends other than the local disk (or test
// doubles) can be dropped in without touching the dispatcher.
pub mod local;

use thiserror::Error;

pub type FsResult<T> = Result<T, FsError>;

/// Structured filesystem error. The protocol needs to distinguish
/// already-exists and not-found from everything else; the remainder is
/// surfaced to the client as a raw errno diagnostic byte.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("file already exists")]
    AlreadyExists,

    #[error("no such file or directory")]
    NotFound,

    #[error("filesystem error (errno {0})")]
    Errno(i32),
}

impl From<std::io::Error> for FsError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::AlreadyExists => FsError::AlreadyExists,
            std::io::ErrorKind::NotFound => FsError::NotFound,
            _ => FsError::Errno(err.raw_os_error().unwrap_or(0)),
        }
    }
}

impl FsError {
    /// The errno value reported to the client for diagnostics.
    pub fn errno_byte(&self) -> u8 {
        match self {
            FsError::AlreadyExists => libc_errno::EEXIST,
            FsError::NotFound => libc_errno::ENOENT,
            FsError::Errno(n) => *n as u8,
        }
    }
}

// The two errno values the protocol translates by name.
mod libc_errno {
    pub const EEXIST: u8 = 17;
    pub const ENOENT: u8 = 2;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

/// One directory entry as reported by the backend. `kind` is `None` on
/// backends that cannot tag entries without a separate stat call.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub kind: Option<EntryKind>,
}

#[derive(Debug, Clone, Copy)]
pub struct FileInfo {
    pub size: u64,
    pub is_dir: bool,
}

/// An open file owned by the session.
pub trait FileHandle: Send {
    fn seek(&mut self, offset: u64) -> FsResult<()>;
    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize>;
    fn write(&mut self, buf: &[u8]) -> FsResult<usize>;
}

/// An open directory iterator. Entries the backend cannot describe are
/// silently skipped so transient removals never fail a listing.
pub trait DirHandle: Send {
    fn next_entry(&mut self) -> Option<DirEntry>;
}

pub trait Filesystem: Send + Sync {
    fn open_read(&self, path: &str) -> FsResult<Box<dyn FileHandle>>;
    /// Opens an existing file for writing without truncation.
    fn open_write(&self, path: &str) -> FsResult<Box<dyn FileHandle>>;
    /// Creates (or truncates) a file and opens it for writing.
    fn create(&self, path: &str) -> FsResult<Box<dyn FileHandle>>;
    fn stat(&self, path: &str) -> FsResult<FileInfo>;
    fn opendir(&self, path: &str) -> FsResult<Box<dyn DirHandle>>;
    /// Removes a file, or a directory where the backend supports it.
    fn unlink(&self, path: &str) -> FsResult<()>;
    fn mkdir(&self, path: &str) -> FsResult<()>;
    fn rename(&self, from: &str, to: &str) -> FsResult<()>;
    fn crc32(&self, path: &str) -> FsResult<u32>;
}
