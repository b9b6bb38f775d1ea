//! Concurrent positional writer for the output file.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// The output file, open for positional writes. `write_at` never touches a
/// shared cursor, so workers writing disjoint ranges need no lock.
#[derive(Debug)]
pub struct OutputSink {
    file: File,
    path: PathBuf,
}

impl OutputSink {
    pub(super) fn new(file: File, path: PathBuf) -> Self {
        Self { file, path }
    }

    /// Write part of `data` at `offset`; returns the number of bytes written.
    #[cfg(unix)]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.write_at(data, offset)
    }

    #[cfg(windows)]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.file.seek_write(data, offset)
    }

    #[cfg(not(any(unix, windows)))]
    pub fn write_at(&self, _offset: u64, _data: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "positional writes are not supported on this platform",
        ))
    }

    /// Write all of `data` at `offset`, looping over short writes.
    pub fn write_all_at(&self, mut offset: u64, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            match self.write_at(offset, data) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write whole buffer",
                    ))
                }
                Ok(n) => {
                    offset += n as u64;
                    data = &data[n..];
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush data to disk and close the file. Consumes the sink.
    pub fn close(self) -> io::Result<()> {
        self.file.sync_all()?;
        tracing::debug!(path = %self.path.display(), "output file closed");
        Ok(())
    }
}
