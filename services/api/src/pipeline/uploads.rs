//! services/api/src/pipeline/uploads.rs
//!
//! Stores uploaded files under collision-resistant keys inside the upload directory.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::error;
use uuid::Uuid;

use crate::error::PipelineError;

const MAX_NAME_CHARS: usize = 100;

static UNSAFE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex is valid"));

static STORAGE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{32}-[A-Za-z0-9._-]{1,100}$").expect("static regex is valid")
});

/// The upload directory. Keys are derived from the owner, name and content, so
/// the same user re-uploading the same file overwrites in place while different
/// users never share a key.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the upload directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Derives `<hash>-<sanitised name>` for an upload.
    pub fn storage_key(user_id: Uuid, filename: &str, bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(user_id.as_bytes());
        hasher.update((filename.len() as u64).to_le_bytes());
        hasher.update(filename.as_bytes());
        hasher.update(bytes);
        let digest = hex::encode(hasher.finalize());

        format!("{}-{}", &digest[..32], sanitise_filename(filename))
    }

    pub fn is_valid_key(key: &str) -> bool {
        STORAGE_KEY.is_match(key)
    }

    /// Writes the bytes under `key`, replacing any previous file with that key.
    pub async fn save(&self, key: &str, bytes: &[u8]) -> Result<PathBuf, PipelineError> {
        let path = self.path_for(key)?;
        fs::write(&path, bytes).await.map_err(|e| {
            error!("Failed to write upload {}: {}", path.display(), e);
            PipelineError::StorageError(format!("could not write upload: {}", e))
        })?;
        Ok(path)
    }

    pub async fn read(&self, key: &str) -> Result<Vec<u8>, PipelineError> {
        let path = self.path_for(key)?;
        fs::read(&path).await.map_err(|e| {
            error!("Failed to read upload {}: {}", path.display(), e);
            PipelineError::StorageError(format!("could not read upload: {}", e))
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PipelineError> {
        if !Self::is_valid_key(key) {
            return Err(PipelineError::bad_input("Invalid storage key"));
        }
        Ok(self.dir.join(key))
    }
}

fn sanitise_filename(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload");
    let cleaned = UNSAFE_NAME_CHARS.replace_all(base, "_");
    let cleaned: String = cleaned.chars().take(MAX_NAME_CHARS).collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_stable_for_identical_uploads() {
        let user = Uuid::new_v4();
        let a = UploadStore::storage_key(user, "report.pdf", b"same bytes");
        let b = UploadStore::storage_key(user, "report.pdf", b"same bytes");
        assert_eq!(a, b);
        assert!(a.ends_with("-report.pdf"));
        assert!(UploadStore::is_valid_key(&a));
    }

    #[test]
    fn keys_differ_across_users_and_content() {
        let bytes = b"lab results";
        let first = UploadStore::storage_key(Uuid::new_v4(), "report.pdf", bytes);
        let second = UploadStore::storage_key(Uuid::new_v4(), "report.pdf", bytes);
        assert_ne!(first, second);

        let user = Uuid::new_v4();
        assert_ne!(
            UploadStore::storage_key(user, "report.pdf", b"v1"),
            UploadStore::storage_key(user, "report.pdf", b"v2"),
        );
    }

    #[test]
    fn filenames_are_sanitised_into_a_single_path_component() {
        let key = UploadStore::storage_key(Uuid::new_v4(), "../../etc/pass wd.png", b"x");
        assert!(key.ends_with("-pass_wd.png"));
        assert!(!key.contains('/'));
        assert!(UploadStore::is_valid_key(&key));
        assert!(!UploadStore::is_valid_key("../secret"));
    }

    #[tokio::test]
    async fn save_overwrites_and_read_returns_latest_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let key = UploadStore::storage_key(Uuid::new_v4(), "scan.png", b"ignored");

        store.save(&key, b"first").await.unwrap();
        store.save(&key, b"second").await.unwrap();

        assert_eq!(store.read(&key).await.unwrap(), b"second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
