use crate::error::{CobbleError, Result, ResultExt};
use crate::logger::time::unix_millis;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Advisory, last-writer-wins lock on a world directory.
///
/// Acquiring writes the current time in milliseconds as an 8-byte big-endian integer at the
/// start of `session.lock`. Any later opener overwrites it, so ownership is checked by reading
/// the stamp back and comparing it with the value written here.
#[derive(Debug)]
pub struct SessionLock {
    path: PathBuf,
    file: File,
    timestamp: i64,
}

impl SessionLock {
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        Self::acquire_at(path, unix_millis())
    }

    pub(crate) fn acquire_at(path: impl AsRef<Path>, timestamp: i64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .context(format!("could not open {}", path.display()))?;

        file.seek(SeekFrom::Start(0))?;
        file.write_i64::<BigEndian>(timestamp)?;
        file.flush()?;
        file.sync_data()?;

        Ok(SessionLock {
            path,
            file,
            timestamp,
        })
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fails with [`CobbleError::LockLost`] once another process has stamped the file.
    pub fn verify(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        let found = self
            .file
            .read_i64::<BigEndian>()
            .context(format!("could not read {}", self.path.display()))?;
        if found != self.timestamp {
            return Err(CobbleError::LockLost {
                expected: self.timestamp,
                found,
            });
        }
        Ok(())
    }
}
