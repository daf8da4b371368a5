//! Log file access
//!
//! Handles appending packets to and streaming chunks out of the log file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::error::{PacketLogError, Result};

/// rw-r--r--
const LOG_FILE_MODE: u32 = 0o644;

/// An open handle on the log file
pub struct LogStore {
    /// Opened read + append
    file: File,

    /// Path the handle was opened from
    path: PathBuf,

    /// Sync strategy
    sync_strategy: SyncStrategy,
}

impl LogStore {
    /// Open or create the log file
    ///
    /// Existing content is kept: a log left behind by a crashed process is
    /// part of the next echo.
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .mode(LOG_FILE_MODE)
            .open(path)
            .map_err(PacketLogError::os("open data file"))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            sync_strategy,
        })
    }

    /// Append bytes with a single write
    ///
    /// Returns the number of bytes written. Fewer bytes than requested is
    /// reported as `ShortWrite` and never retried, so a packet is either
    /// stored whole or the error surfaces.
    pub fn append(&mut self, bytes: &[u8]) -> Result<usize> {
        let written = self
            .file
            .write(bytes)
            .map_err(PacketLogError::os("write data file"))?;

        if written != bytes.len() {
            return Err(PacketLogError::ShortWrite {
                expected: bytes.len(),
                written,
            });
        }

        if self.sync_strategy == SyncStrategy::EveryAppend {
            self.file
                .sync_data()
                .map_err(PacketLogError::os("fsync data file"))?;
        }

        Ok(written)
    }

    /// Rewind to offset 0 and return a lazy chunk reader
    pub fn chunks(&mut self, chunk_size: usize) -> Result<LogChunks<'_>> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(PacketLogError::os("lseek"))?;

        Ok(LogChunks {
            file: &mut self.file,
            buf: vec![0u8; chunk_size.max(1)],
        })
    }

    /// Read the whole log into memory
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        let mut chunks = self.chunks(8 * 1024)?;
        while let Some(chunk) = chunks.next_chunk()? {
            content.extend_from_slice(chunk);
        }
        Ok(content)
    }

    /// Current file size in bytes
    pub fn len(&self) -> Result<u64> {
        let meta = self
            .file
            .metadata()
            .map_err(PacketLogError::os("fstat data file"))?;
        Ok(meta.len())
    }

    /// True if nothing has been appended yet
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlink the log file. A file that is already gone is fine.
    pub fn remove(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PacketLogError::Os {
                op: "unlink data file",
                source: e,
            }),
        }
    }
}

/// Lazy reader over the log file, from offset 0 to EOF
///
/// Each chunk borrows the internal buffer, so it must be consumed before
/// asking for the next one.
pub struct LogChunks<'a> {
    file: &'a mut File,
    buf: Vec<u8>,
}

impl LogChunks<'_> {
    /// Read the next chunk, `None` at end of file
    pub fn next_chunk(&mut self) -> Result<Option<&[u8]>> {
        loop {
            match self.file.read(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(&self.buf[..n])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(PacketLogError::Os {
                        op: "read data file",
                        source: e,
                    })
                }
            }
        }
    }
}
