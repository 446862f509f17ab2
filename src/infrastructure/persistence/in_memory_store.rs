use crate::domain::errors::PredictionError;
use crate::domain::ports::ArtifactStore;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Process-local artifact store, mainly for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.read().contains_key(key)
    }

    /// Overwrites `key` with arbitrary bytes, bypassing any encoding.
    pub fn insert_raw(&self, key: &str, blob: Vec<u8>) {
        self.blobs.write().insert(key.to_string(), blob);
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PredictionError> {
        Ok(self.blobs.read().get(key).cloned())
    }

    fn save(&self, key: &str, blob: &[u8]) -> Result<(), PredictionError> {
        self.blobs.write().insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn describe(&self, key: &str) -> String {
        format!("memory://{}", key)
    }
}
