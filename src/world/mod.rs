//! On-disk world: directory validation, the session lock, level metadata and the chunk cache.

pub mod base36;
pub mod chunk;
pub mod level;
pub mod lock;
pub mod manager;

pub use chunk::{chunk_path, Chunk, ChunkPos};
pub use level::LevelData;
pub use lock::SessionLock;
pub use manager::{PlayerState, WorldHandle};

use crate::error::{CobbleError, Result, ResultExt};
use crate::logger::{log, LogSeverity};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const LEVEL_FILE: &str = "level.dat";
pub const LOCK_FILE: &str = "session.lock";

/// An open world directory. Holds the session lock for as long as it lives; chunks are loaded
/// on first use and kept until the world is closed.
#[derive(Debug)]
pub struct World {
    dir: PathBuf,
    level: LevelData,
    lock: SessionLock,
    chunks: HashMap<u64, Arc<Chunk>>,
}

impl World {
    /// Validates the layout, takes the lock and reads `level.dat`. Nothing is written unless
    /// both required files are present.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(CobbleError::NotADirectory(dir)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(CobbleError::NotADirectory(dir))
            }
            Err(err) => {
                return Err(err).context(format!("could not inspect world path {}", dir.display()))
            }
        }
        if !dir.join(LEVEL_FILE).is_file() {
            return Err(CobbleError::MissingLevelData(dir));
        }
        if !dir.join(LOCK_FILE).is_file() {
            return Err(CobbleError::MissingSessionLock(dir));
        }

        let lock = SessionLock::acquire(dir.join(LOCK_FILE))
            .context("unable to obtain the lock on the world")?;
        let level_path = dir.join(LEVEL_FILE);
        let level = LevelData::load(&level_path).map_err(|err| CobbleError::MalformedLevelData {
            path: level_path,
            source: Box::new(err),
        })?;

        log(
            format!(
                "Opened world {} (spawn {}, {}, {})",
                dir.display(),
                level.spawn.x,
                level.spawn.y,
                level.spawn.z
            ),
            LogSeverity::Info,
        );

        Ok(World {
            dir,
            level,
            lock,
            chunks: HashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn level(&self) -> &LevelData {
        &self.level
    }

    pub fn verify_lock(&mut self) -> Result<()> {
        self.lock.verify()
    }

    /// Returns the chunk at (x, z), reading it from disk on first use. The lock is checked on
    /// every call; a failed read leaves the cache untouched.
    pub fn load_chunk(&mut self, x: i32, z: i32) -> Result<Arc<Chunk>> {
        self.verify_lock()?;

        let key = ChunkPos::new(x, z).key();
        if let Some(chunk) = self.chunks.get(&key) {
            return Ok(Arc::clone(chunk));
        }

        let path = self.dir.join(chunk_path(x, z));
        let chunk = Arc::new(
            Chunk::load(&path).context(format!("could not load chunk ({}, {})", x, z))?,
        );
        log(
            format!("Loaded chunk ({}, {}) from {}", x, z, path.display()),
            LogSeverity::Debug,
        );
        self.chunks.insert(key, Arc::clone(&chunk));
        Ok(chunk)
    }

    /// Cached chunk at (x, z), if it has been loaded.
    pub fn chunk(&self, x: i32, z: i32) -> Option<Arc<Chunk>> {
        self.chunks.get(&ChunkPos::new(x, z).key()).cloned()
    }

    pub fn loaded_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Drops the cache and the lock file handle.
    pub fn close(self) {
        log(
            format!(
                "Closing world {} ({} chunks loaded)",
                self.dir.display(),
                self.chunks.len()
            ),
            LogSeverity::Info,
        );
    }
}
