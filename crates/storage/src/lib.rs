use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use takeoff_core::{MeasurementRepository, MeasurementSet, PersistenceError, PersistenceResult};

const SET_SCHEMA_VERSION: u32 = 1;
const SET_EXTENSION: &str = "measurements.json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("invalid file id: {0:?}")]
    InvalidFileId(String),
    #[error("unsupported measurement file version {0}")]
    UnsupportedVersion(u32),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<StorageError> for PersistenceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(err) => PersistenceError::Io(err),
            StorageError::Serde(err) => PersistenceError::Serde(err),
            other => PersistenceError::Unavailable(other.to_string()),
        }
    }
}

/// Measurement sets stored as one JSON file per file id
#[derive(Debug, Clone)]
pub struct JsonDirectoryRepository {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetEnvelope {
    version: u32,
    file_id: String,
    set: MeasurementSet,
}

impl JsonDirectoryRepository {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs =
            ProjectDirs::from("dev", "Takeoff", "Takeoff").ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().join("measurements") })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the stored set, or `None` if the file has none yet
    ///
    /// Bare sets written without the versioned envelope are accepted too.
    pub fn load(&self, file_id: &str) -> Result<Option<MeasurementSet>, StorageError> {
        let path = self.set_path(file_id)?;
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        let set = if value.get("version").is_some() {
            let envelope: SetEnvelope = serde_json::from_value(value)?;
            if envelope.version > SET_SCHEMA_VERSION {
                return Err(StorageError::UnsupportedVersion(envelope.version));
            }
            envelope.set
        } else {
            serde_json::from_value(value)?
        };

        tracing::debug!(file_id, path = %path.display(), "measurement set read");
        Ok(Some(set))
    }

    /// Write the set through a temporary file so readers never see a partial write
    pub fn save(&self, file_id: &str, set: &MeasurementSet) -> Result<(), StorageError> {
        let path = self.set_path(file_id)?;
        fs::create_dir_all(&self.root)?;

        let envelope = SetEnvelope {
            version: SET_SCHEMA_VERSION,
            file_id: file_id.to_string(),
            set: set.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&envelope)?;

        let temp = path.with_extension("json.tmp");
        fs::write(&temp, bytes)?;
        fs::rename(&temp, &path)?;

        tracing::debug!(file_id, path = %path.display(), "measurement set written");
        Ok(())
    }

    /// Delete the stored set; returns false if there was none
    pub fn remove(&self, file_id: &str) -> Result<bool, StorageError> {
        let path = self.set_path(file_id)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    /// File ids with a stored set, sorted
    pub fn file_ids(&self) -> Result<Vec<String>, StorageError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let suffix = format!(".{SET_EXTENSION}");
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let name = entry?.file_name();
            if let Some(id) = name.to_str().and_then(|n| n.strip_suffix(&suffix)) {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn set_path(&self, file_id: &str) -> Result<PathBuf, StorageError> {
        let valid = !file_id.is_empty()
            && !file_id.starts_with('.')
            && file_id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidFileId(file_id.to_string()));
        }
        Ok(self.root.join(format!("{file_id}.{SET_EXTENSION}")))
    }
}

impl MeasurementRepository for JsonDirectoryRepository {
    fn load_measurement_set(&self, file_id: &str) -> PersistenceResult<Option<MeasurementSet>> {
        Ok(self.load(file_id)?)
    }

    fn save_measurement_set(&mut self, file_id: &str, set: &MeasurementSet) -> PersistenceResult<()> {
        Ok(self.save(file_id, set)?)
    }
}
