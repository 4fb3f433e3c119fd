use crate::core_filesystem::{
    DirEntry, DirHandle, EntryKind, FileHandle, FileInfo, FsResult, Filesystem,
};
use log::debug;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// Filesystem backend over the host's disk. Every request path is resolved
/// relative to `root`, component by component, so a client cannot escape the
/// configured directory.
pub struct LocalFilesystem {
    root: PathBuf,
}

impl LocalFilesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalFilesystem { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        // rebuilt segment by segment; no `.` or `..` component ever reaches
        // the OS, on either separator style
        let mut resolved = self.root.clone();
        for segment in path.split(|c| c == '/' || c == '\\') {
            match segment {
                "" | "." | ".." => continue,
                segment => resolved.push(segment),
            }
        }
        resolved
    }
}

struct LocalFile {
    file: File,
}

impl FileHandle for LocalFile {
    fn seek(&mut self, offset: u64) -> FsResult<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        Ok(self.file.read(buf)?)
    }

    fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        Ok(self.file.write(buf)?)
    }
}

struct LocalDir {
    inner: fs::ReadDir,
}

impl DirHandle for LocalDir {
    fn next_entry(&mut self) -> Option<DirEntry> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let kind = entry.file_type().ok().map(|ft| {
                if ft.is_dir() {
                    EntryKind::Directory
                } else if ft.is_symlink() {
                    EntryKind::Symlink
                } else if ft.is_file() {
                    EntryKind::File
                } else {
                    EntryKind::Other
                }
            });
            return Some(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
    }
}

impl Filesystem for LocalFilesystem {
    fn open_read(&self, path: &str) -> FsResult<Box<dyn FileHandle>> {
        let file = File::open(self.resolve(path))?;
        Ok(Box::new(LocalFile { file }))
    }

    fn open_write(&self, path: &str) -> FsResult<Box<dyn FileHandle>> {
        let file = OpenOptions::new().write(true).open(self.resolve(path))?;
        Ok(Box::new(LocalFile { file }))
    }

    fn create(&self, path: &str) -> FsResult<Box<dyn FileHandle>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.resolve(path))?;
        Ok(Box::new(LocalFile { file }))
    }

    fn stat(&self, path: &str) -> FsResult<FileInfo> {
        let meta = fs::metadata(self.resolve(path))?;
        Ok(FileInfo {
            size: meta.len(),
            is_dir: meta.is_dir(),
        })
    }

    fn opendir(&self, path: &str) -> FsResult<Box<dyn DirHandle>> {
        let inner = fs::read_dir(self.resolve(path))?;
        Ok(Box::new(LocalDir { inner }))
    }

    fn unlink(&self, path: &str) -> FsResult<()> {
        let target = self.resolve(path);
        let meta = fs::metadata(&target)?;
        if meta.is_dir() {
            fs::remove_dir(&target)?;
        } else {
            fs::remove_file(&target)?;
        }
        Ok(())
    }

    fn mkdir(&self, path: &str) -> FsResult<()> {
        fs::create_dir(self.resolve(path))?;
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        fs::rename(self.resolve(from), self.resolve(to))?;
        Ok(())
    }

    fn crc32(&self, path: &str) -> FsResult<u32> {
        let mut file = File::open(self.resolve(path))?;
        let mut buf = [0u8; 4096];
        let mut crc: u32 = 0xFFFF_FFFF;
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            crc = crc32_update(crc, &buf[..n]);
        }
        Ok(!crc)
    }
}

// Bitwise CRC-32 (IEEE 802.3 reflected polynomial), small enough to avoid a
// lookup table on the hot path of a rarely-used opcode.
fn crc32_update(mut crc: u32, buf: &[u8]) -> u32 {
    for &byte in buf {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    crc
}
