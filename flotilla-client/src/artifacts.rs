//! Artifact store interface and endpoints

use async_trait::async_trait;
use tracing::debug;

use crate::ServiceClient;
use crate::error::Result;

/// Writes packaged artifacts into the shared bucket
///
/// Packaging happens upstream; the store receives finished bytes.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `body` to `<bucket>/<key>`, replacing any previous version
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;
}

#[async_trait]
impl ArtifactStore for ServiceClient {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        // The key's `/` separates object path segments
        let segments = ["api", "buckets", bucket, "objects"]
            .into_iter()
            .chain(key.split('/'));
        let url = self.endpoint(segments)?;
        debug!("Uploading {} byte(s) to {}/{}", body.len(), bucket, key);

        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, "application/zip")
            .body(body)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
