//! Parameter store interface and endpoints
//!
//! The shared bucket identifier is published under a predictable parameter
//! name so that sub-pipeline provisioning can find it without a build-graph
//! dependency on the root builder.

use async_trait::async_trait;
use flotilla_core::domain::asset::SharedAssetLocation;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ServiceClient;
use crate::error::{ClientError, Result};

/// Named string parameters resolvable by a fixed key
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn put_parameter(&self, name: &str, value: &str) -> Result<()>;

    /// Fails with `ClientError::NotFound` (or a 404) when the name is unknown
    async fn get_parameter(&self, name: &str) -> Result<String>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Parameter {
    name: String,
    value: String,
}

#[async_trait]
impl ParameterStore for ServiceClient {
    async fn put_parameter(&self, name: &str, value: &str) -> Result<()> {
        let url = self.endpoint(["api", "parameters"])?;
        let response = self
            .client
            .put(url)
            .json(&Parameter {
                name: name.to_string(),
                value: value.to_string(),
            })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    async fn get_parameter(&self, name: &str) -> Result<String> {
        let url = self.endpoint(["api", "parameters"])?;
        let response = self
            .client
            .get(url)
            .query(&[("name", name)])
            .send()
            .await?;

        let parameter: Parameter = self.handle_response(response).await?;
        Ok(parameter.value)
    }
}

/// Publish the bucket identifier under the location's parameter name
pub async fn publish_location(
    store: &dyn ParameterStore,
    location: &SharedAssetLocation,
) -> Result<()> {
    store
        .put_parameter(&location.parameter_name, &location.bucket)
        .await?;

    info!(
        "Published asset bucket '{}' as '{}'",
        location.bucket, location.parameter_name
    );
    Ok(())
}

/// Resolve the bucket identifier published under `parameter_name`
pub async fn resolve_location(store: &dyn ParameterStore, parameter_name: &str) -> Result<String> {
    let bucket = store.get_parameter(parameter_name).await?;
    if bucket.is_empty() {
        return Err(ClientError::NotFound(format!(
            "parameter '{}' holds no bucket",
            parameter_name
        )));
    }
    Ok(bucket)
}
