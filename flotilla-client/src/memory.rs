//! In-memory collaborators
//!
//! Process-local `ArtifactStore` and `ParameterStore` implementations for dry
//! runs and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::artifacts::ArtifactStore;
use crate::error::{ClientError, Result};
use crate::parameters::ParameterStore;

#[derive(Debug, Default)]
pub struct InMemoryParameterStore {
    parameters: RwLock<HashMap<String, String>>,
}

impl InMemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn put_parameter(&self, name: &str, value: &str) -> Result<()> {
        self.parameters
            .write()
            .await
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn get_parameter(&self, name: &str) -> Result<String> {
        self.parameters
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("parameter '{}'", name)))
    }
}

/// Artifact store keeping the latest version of each object
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Keys stored in `bucket`, sorted
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, key)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }
}
