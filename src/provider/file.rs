//! JSON file value store.

use std::collections::BTreeMap;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::error::SettingsError;
use crate::setting::{SettingId, SettingValue, Value};

use super::SettingValueProvider;

/// Current value file format version.
///
/// Increment this when making breaking changes to the format.
const VALUE_FILE_VERSION: u32 = 1;

/// On-disk value file format.
#[derive(Debug, Serialize, Deserialize)]
struct ValueFile {
    /// Format version
    version: u32,

    /// Unix timestamp of the last save, for debugging only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<String>,

    /// Stored values, ordered by setting id
    values: Vec<SettingValue>,
}

/// Failures of the file store, wrapped into [`SettingsError::Storage`].
#[derive(Debug, Error)]
enum FileStoreError {
    #[error("failed to read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid JSON in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("incompatible version in '{}': expected {}, got {found}", path.display(), VALUE_FILE_VERSION)]
    Version { path: PathBuf, found: u32 },

    #[error("failed to serialize values: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("background write task failed: {0}")]
    Task(#[source] tokio::task::JoinError),
}

impl From<FileStoreError> for SettingsError {
    fn from(error: FileStoreError) -> Self {
        let message = match &error {
            FileStoreError::Read { .. }
            | FileStoreError::Parse { .. }
            | FileStoreError::Version { .. } => "Failed to load setting values",
            FileStoreError::Serialize(_) | FileStoreError::Write { .. } | FileStoreError::Task(_) => {
                "Failed to save setting values"
            }
        };
        Self::storage(message, error)
    }
}

/// Value provider persisting to a single JSON file.
///
/// The file is read lazily on first use; a missing file is an empty store.
/// Writes go to `{path}.tmp` and are then renamed over the file, and the
/// in-memory copy only changes after the rename succeeded.
#[derive(Debug)]
pub struct FileValueStore {
    path: PathBuf,
    rank: i32,
    name: String,
    values: Mutex<Option<BTreeMap<SettingId, SettingValue>>>,
}

impl FileValueStore {
    /// Creates a store at `path` with the given rank.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, rank: i32) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self {
            path,
            rank,
            name,
            values: Mutex::new(None),
        }
    }

    /// Returns the path of the value file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<BTreeMap<SettingId, SettingValue>, FileStoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Value file {} not found, starting empty", path.display());
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(FileStoreError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let file: ValueFile =
            serde_json::from_str(&content).map_err(|source| FileStoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if file.version != VALUE_FILE_VERSION {
            return Err(FileStoreError::Version {
                path: path.to_path_buf(),
                found: file.version,
            });
        }

        Ok(file
            .values
            .into_iter()
            .map(|value| (value.setting_id, value))
            .collect())
    }

    fn save_blocking(path: &Path, file: &ValueFile) -> Result<(), FileStoreError> {
        let content = serde_json::to_string_pretty(file).map_err(FileStoreError::Serialize)?;
        let write_error = |source| FileStoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_error)?;
            }
        }

        // values.json -> values.json.tmp, not values.tmp
        let temp_path = PathBuf::from(format!("{}.tmp", path.display()));
        std::fs::write(&temp_path, content).map_err(write_error)?;
        std::fs::rename(&temp_path, path).map_err(write_error)?;

        Ok(())
    }

    async fn save(&self, values: &BTreeMap<SettingId, SettingValue>) -> Result<(), FileStoreError> {
        let path = self.path.clone();
        let file = ValueFile {
            version: VALUE_FILE_VERSION,
            saved_at: Some(unix_timestamp_now()),
            values: values.values().cloned().collect(),
        };

        tokio::task::spawn_blocking(move || Self::save_blocking(&path, &file))
            .await
            .map_err(FileStoreError::Task)?
    }

    /// Returns the cached values, loading them on first use.
    async fn snapshot(&self) -> Result<BTreeMap<SettingId, SettingValue>, FileStoreError> {
        let mut cached = self.values.lock().await;
        if let Some(values) = cached.as_ref() {
            return Ok(values.clone());
        }

        let path = self.path.clone();
        let loaded = tokio::task::spawn_blocking(move || Self::load(&path))
            .await
            .map_err(FileStoreError::Task)??;
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    async fn replace(&self, updated: BTreeMap<SettingId, SettingValue>) -> Result<(), FileStoreError> {
        self.save(&updated).await?;
        *self.values.lock().await = Some(updated);
        Ok(())
    }
}

#[async_trait]
impl SettingValueProvider for FileValueStore {
    fn rank(&self) -> i32 {
        self.rank
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn get_setting_values(&self) -> Result<Vec<SettingValue>, SettingsError> {
        Ok(self.snapshot().await?.into_values().collect())
    }

    async fn upsert_values(
        &self,
        values: Vec<SettingValue>,
    ) -> Result<Vec<SettingValue>, SettingsError> {
        // JSON has no NaN or infinity
        if let Some(value) = values
            .iter()
            .find(|v| matches!(v.value, Value::Float(f) if !f.is_finite()))
        {
            return Err(SettingsError::BadRequest(format!(
                "Cannot store {} for setting {}: not a finite number",
                value.value, value.setting_id
            )));
        }

        let mut updated = self.snapshot().await?;
        for value in &values {
            updated.insert(value.setting_id, value.clone());
        }

        self.replace(updated).await?;
        tracing::debug!("Wrote {} value(s) to {}", values.len(), self.path.display());
        Ok(values)
    }

    async fn delete(&self, setting_id: SettingId) -> Result<(), SettingsError> {
        let mut updated = self.snapshot().await?;
        if updated.remove(&setting_id).is_none() {
            return Ok(());
        }

        self.replace(updated).await?;
        tracing::debug!("Removed value {setting_id} from {}", self.path.display());
        Ok(())
    }
}

/// Returns the current Unix timestamp as a string.
fn unix_timestamp_now() -> String {
    use std::time::SystemTime;

    let duration = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", duration.as_secs())
}
