//! Flotilla Client
//!
//! Narrow interfaces to the remote collaborators the orchestrator depends on,
//! plus an HTTP implementation of each:
//! - `JobClient`: start a named job and report its status
//! - `ArtifactStore`: write objects into the shared artifact bucket
//! - `ParameterStore`: publish and resolve the shared bucket location
//!
//! # Example
//!
//! ```no_run
//! use flotilla_client::{JobClient, ServiceClient};
//!
//! #[tokio::main]
//! async fn main() -> flotilla_client::Result<()> {
//!     let client = ServiceClient::new("http://localhost:8080");
//!
//!     let execution_id = client.start("qa-pipeline").await?;
//!     let status = client.get_status(&execution_id, "qa-pipeline").await?;
//!
//!     println!("qa-pipeline is {}", status);
//!     Ok(())
//! }
//! ```

mod artifacts;
pub mod error;
mod jobs;
pub mod memory;
mod parameters;

pub use artifacts::ArtifactStore;
pub use error::{ClientError, Result};
pub use jobs::JobClient;
pub use parameters::{ParameterStore, publish_location, resolve_location};

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

/// HTTP client for the job, artifact and parameter services
///
/// Endpoints are grouped by collaborator:
/// - `/api/jobs/...` implements `JobClient`
/// - `/api/buckets/...` implements `ArtifactStore`
/// - `/api/parameters` implements `ParameterStore`
#[derive(Debug, Clone)]
pub struct ServiceClient {
    /// Base URL of the service (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl ServiceClient {
    /// Create a new service client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the service (e.g., "http://localhost:8080")
    ///
    /// # Example
    /// ```
    /// use flotilla_client::ServiceClient;
    ///
    /// let client = ServiceClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new service client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of `base_url` extended by `segments`, each percent-encoded
    ///
    /// Job names and execution ids are caller-supplied, so a `/`, `?` or `#`
    /// in them must stay inside its own segment.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::InvalidRequest(format!("invalid base URL '{}': {}", self.base_url, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidRequest(format!(
                    "base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize a JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::remote(status.as_u16(), error_text));
        }

        response.json().await.map_err(|e| {
            ClientError::MalformedResponse(format!("Failed to parse JSON response: {}", e))
        })
    }

    /// Check the status code of a response without a body
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::remote(status.as_u16(), error_text));
        }

        Ok(())
    }
}
