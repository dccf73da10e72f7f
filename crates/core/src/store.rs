//! Persistence of the tracking memory.
//!
//! The on-disk document is a small versioned envelope around
//! [`StoredState`]. Sets are stored as sorted lists.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HomeroomError, Result};
use crate::models::Student;

/// Version of the persisted document layout.
pub const STORAGE_VERSION: u32 = 1;

/// Key identifying the persisted document.
pub const STORAGE_KEY: &str = "canvas.canvas_homework_state";

/// Serialized form of the tracking memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoredState {
    #[serde(default)]
    pub known_assignments: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub completed_assignments: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub student_info: BTreeMap<String, Student>,
    #[serde(default)]
    pub last_saved: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    version: u32,
    key: String,
    data: StoredState,
}

/// Load/save seam for the tracking memory.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<StoredState>>;

    async fn save(&self, state: &StoredState) -> Result<()>;
}

/// Stores the document as pretty JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocking read, for callers outside an async context.
    pub fn read(path: &Path) -> Result<Option<StoredState>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let document: StoredDocument = serde_json::from_str(&content).map_err(|e| {
            HomeroomError::Storage(format!("failed to parse {}: {e}", path.display()))
        })?;

        if document.version != STORAGE_VERSION {
            return Err(HomeroomError::Storage(format!(
                "unsupported state version {} in {} (expected {STORAGE_VERSION})",
                document.version,
                path.display()
            )));
        }
        if document.key != STORAGE_KEY {
            return Err(HomeroomError::Storage(format!(
                "unexpected state key '{}' in {}",
                document.key,
                path.display()
            )));
        }
        Ok(Some(document.data))
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> Result<Option<StoredState>> {
        let path = self.path.clone();
        let state = tokio::task::spawn_blocking(move || Self::read(&path))
            .await
            .map_err(|e| HomeroomError::Storage(format!("load task failed: {e}")))??;
        debug!(path = %self.path.display(), found = state.is_some(), "Loaded tracking state");
        Ok(state)
    }

    async fn save(&self, state: &StoredState) -> Result<()> {
        let document = StoredDocument {
            version: STORAGE_VERSION,
            key: STORAGE_KEY.to_string(),
            data: state.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|e| HomeroomError::Serialization(format!("tracking state: {e}")))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| HomeroomError::Storage(format!("save task failed: {e}")))??;
        debug!(path = %self.path.display(), "Saved tracking state");
        Ok(())
    }
}

/// Write `bytes` to a temp file beside `path`, then rename it into place.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| {
        HomeroomError::Storage(format!("failed to replace {}: {}", path.display(), e.error))
    })?;
    Ok(())
}
