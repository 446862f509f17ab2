//! Artifact persistence on the local filesystem.
//!
//! Each key is stored as `model_<key>.json` under the models directory.

use crate::domain::errors::PredictionError;
use crate::domain::ports::ArtifactStore;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Handles persistence of model artifacts to disk.
pub struct FileArtifactStore {
    root: PathBuf,
}

impl FileArtifactStore {
    /// Creates the store, creating `root` if it does not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, PredictionError> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|e| PredictionError::Store {
                key: root.display().to_string(),
                reason: format!("Failed to create models directory: {}", e),
            })?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("model_{}.json", key))
    }

    fn store_error(key: &str, action: &str, err: impl std::fmt::Display) -> PredictionError {
        PredictionError::Store {
            key: key.to_string(),
            reason: format!("Failed to {}: {}", action, err),
        }
    }
}

impl ArtifactStore for FileArtifactStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PredictionError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(blob) => {
                debug!("Loaded {} bytes from {:?}", blob.len(), path);
                Ok(Some(blob))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::store_error(key, "read artifact file", e)),
        }
    }

    fn save(&self, key: &str, blob: &[u8]) -> Result<(), PredictionError> {
        let path = self.path_for(key);

        // Atomic write: unique temp file in the same directory, then rename
        let mut temp = NamedTempFile::new_in(&self.root)
            .map_err(|e| Self::store_error(key, "create temp file", e))?;
        temp.write_all(blob)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| Self::store_error(key, "write temp file", e))?;
        temp.persist(&path)
            .map_err(|e| Self::store_error(key, "rename temp file", e.error))?;

        info!("Saved artifact to {:?}", path);
        Ok(())
    }

    fn describe(&self, key: &str) -> String {
        self.path_for(key).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileArtifactStore::new(dir.path()).unwrap();
        assert!(store.load("AAPL").unwrap().is_none());
    }

    #[test]
    fn test_new_creates_nested_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("a").join("models");
        let store = FileArtifactStore::new(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    fn leftover_temp_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| !entry.file_name().to_string_lossy().starts_with("model_"))
            .count()
    }

    #[test]
    fn test_save_replaces_blob() {
        let dir = TempDir::new().unwrap();
        let store = FileArtifactStore::new(dir.path()).unwrap();

        store.save("AAPL", b"first").unwrap();
        store.save("AAPL", b"second").unwrap();

        assert_eq!(store.load("AAPL").unwrap(), Some(b"second".to_vec()));
        assert!(store.describe("AAPL").ends_with("model_AAPL.json"));
        assert_eq!(leftover_temp_files(dir.path()), 0);
    }

    #[test]
    fn test_concurrent_saves_of_same_key_all_succeed() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileArtifactStore::new(dir.path()).unwrap());

        let writers: Vec<_> = [b'a', b'b']
            .into_iter()
            .map(|fill| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let blob = vec![fill; 256 * 1024];
                    (0..30)
                        .filter(|_| store.save("K", &blob).is_err())
                        .count()
                })
            })
            .collect();

        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut torn = 0;
                for _ in 0..60 {
                    if let Ok(Some(blob)) = store.load("K") {
                        let uniform = blob.len() == 256 * 1024
                            && blob.iter().all(|b| *b == blob[0]);
                        if !uniform {
                            torn += 1;
                        }
                    }
                }
                torn
            })
        };

        let failures: usize = writers.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(failures, 0);
        assert_eq!(reader.join().unwrap(), 0);

        // Last writer wins with a complete blob
        let blob = store.load("K").unwrap().unwrap();
        assert_eq!(blob.len(), 256 * 1024);
        assert!(blob[0] == b'a' || blob[0] == b'b');
        assert_eq!(leftover_temp_files(dir.path()), 0);
    }
}
