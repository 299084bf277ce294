use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::compression::compress::CompressionType;
use crate::core::error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage_path: PathBuf,
    pub id_field: String,

    /// `None` fails fast when another writer holds the lock.
    pub lock_timeout: Option<Duration>,

    pub stored_compression: CompressionType,
    pub sync_on_commit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: PathBuf::from("./data"),
            id_field: "id".to_string(),
            lock_timeout: None,
            stored_compression: CompressionType::Lz4,
            sync_on_commit: true,
        }
    }
}

impl Config {
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        serde_json::from_slice(&data)
            .map_err(|e| Error::new(ErrorKind::Parse, format!("Invalid config {}: {}", path.display(), e)))
    }

    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            id_field: self.id_field.clone(),
            lock_timeout: self.lock_timeout,
            stored_compression: self.stored_compression,
            sync_on_commit: self.sync_on_commit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub id_field: String,
    pub lock_timeout: Option<Duration>,
    pub stored_compression: CompressionType,
    pub sync_on_commit: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Config::default().writer_config()
    }
}
