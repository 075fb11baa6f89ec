// ABOUTME: File-backed persistence backend storing one JSON array file per storage key.
// ABOUTME: Writes go to a temp file that is fsynced and renamed over the target for crash safety.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::backend::PersistenceBackend;
use crate::error::BackendError;

/// Stores each slot as `<dir>/<encoded key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open a backend rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding the slot for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

/// Encode a storage key into a file name. Unsafe bytes become `%XX`, so
/// distinct keys always map to distinct names.
fn encode_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b'_') {
            name.push(byte as char);
        } else {
            name.push_str(&format!("%{:02X}", byte));
        }
    }
    name
}

#[async_trait]
impl PersistenceBackend for FileBackend {
    async fn get_item(&self, key: &str) -> Result<Option<Vec<Value>>, BackendError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let values: Vec<Value> = serde_json::from_slice(&bytes)?;
        Ok(Some(values))
    }

    async fn set_item(&self, key: &str, values: &[Value]) -> Result<(), BackendError> {
        let final_path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{}.json.tmp", encode_key(key)));

        let json = serde_json::to_vec_pretty(values)?;

        let written = write_and_rename(&tmp_path, &final_path, &json).await;
        if written.is_err() {
            // Best-effort: the target still holds the previous snapshot.
            let _ = fs::remove_file(&tmp_path).await;
        }
        written
    }
}

async fn write_and_rename(
    tmp_path: &Path,
    final_path: &Path,
    json: &[u8],
) -> Result<(), BackendError> {
    let mut file = File::create(tmp_path).await?;
    file.write_all(json).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(tmp_path, final_path).await?;

    Ok(())
}
