//! Durable queue storage with atomic writes.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::mutation::QueuedMutation;
use crate::error::{Result, TaskstreamError};

/// Current on-disk format version.
pub const QUEUE_FILE_VERSION: u32 = 1;

/// Temporary file suffix for atomic writes.
const TMP_SUFFIX: &str = ".tmp";

/// Lock file suffix for concurrent access prevention.
const LOCK_SUFFIX: &str = ".lock";

/// Serialized queue contents for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueFile {
    pub version: u32,
    pub user_id: String,
    pub mutations: VecDeque<QueuedMutation>,
    /// Recently confirmed mutation ids, oldest first.
    #[serde(default)]
    pub confirmed: VecDeque<Uuid>,
}

/// Queue file manager for a single user.
#[derive(Debug, Clone)]
pub struct QueuePersistence {
    dir: PathBuf,
    user_id: String,
}

impl QueuePersistence {
    #[must_use]
    pub fn new(dir: impl AsRef<Path>, user_id: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            user_id: user_id.into(),
        }
    }

    /// Returns the path to the queue file.
    #[must_use]
    pub fn queue_file_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(&self.user_id)))
    }

    fn tmp_file_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.json{TMP_SUFFIX}", sanitize(&self.user_id)))
    }

    fn lock_file_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.json{LOCK_SUFFIX}", sanitize(&self.user_id)))
    }

    /// Save queue contents atomically.
    pub fn save(&self, file: &QueueFile) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let lock_file = File::create(self.lock_file_path())?;
        FileExt::lock_exclusive(&lock_file).map_err(|e| {
            TaskstreamError::Other(anyhow::anyhow!("Failed to acquire queue lock: {e}"))
        })?;

        let tmp_path = self.tmp_file_path();
        let json = serde_json::to_string_pretty(file)?;

        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;

        fs::rename(&tmp_path, self.queue_file_path())?;

        Ok(())
    }

    /// Load queue contents, or `None` if nothing usable is on disk.
    pub fn load(&self) -> Result<Option<QueueFile>> {
        let queue_path = self.queue_file_path();

        if !queue_path.exists() {
            return Ok(None);
        }

        let lock_path = self.lock_file_path();
        if lock_path.exists() {
            let lock_file = File::open(&lock_path)?;
            FileExt::lock_shared(&lock_file).map_err(|e| {
                TaskstreamError::Other(anyhow::anyhow!("Failed to acquire queue lock: {e}"))
            })?;
        }

        let mut file = match File::open(&queue_path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let queue: QueueFile = match serde_json::from_str(&contents) {
            Ok(q) => q,
            Err(e) => {
                warn!(
                    "Corrupted queue file at {}: {}. Discarding it.",
                    queue_path.display(),
                    e
                );
                let _ = fs::remove_file(&queue_path);
                return Ok(None);
            }
        };

        if queue.version != QUEUE_FILE_VERSION {
            warn!(
                "Incompatible queue version {} (supported: {}). Discarding it.",
                queue.version, QUEUE_FILE_VERSION
            );
            let _ = fs::remove_file(&queue_path);
            return Ok(None);
        }

        if queue.user_id != self.user_id {
            warn!(
                "Queue file {} belongs to another user. Ignoring it.",
                queue_path.display()
            );
            return Ok(None);
        }

        Ok(Some(queue))
    }

    /// Deletes the queue file if it exists.
    pub fn delete(&self) -> Result<()> {
        let queue_path = self.queue_file_path();
        if queue_path.exists() {
            fs::remove_file(&queue_path)?;
        }
        Ok(())
    }
}

/// Keep user ids from escaping the queue directory.
fn sanitize(user_id: &str) -> String {
    user_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
