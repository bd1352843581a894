//! Shared artifact location
//!
//! Every sub-pipeline reads its source artifact from one bucket written by the
//! root coordinator. The bucket identifier is published under a parameter with
//! a predictable name, so sub-pipelines can resolve it without depending on
//! the builder that created it.

use serde::{Deserialize, Serialize};

/// File name of the packaged artifact under each job's key prefix
pub const ARTIFACT_FILE_NAME: &str = "source.zip";

/// Retention and access policy of the shared bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketLifecycle {
    pub versioned: bool,
    pub block_public_access: bool,
    pub expiration_days: u32,
    pub noncurrent_version_expiration_days: u32,
}

impl Default for BucketLifecycle {
    fn default() -> Self {
        Self {
            versioned: true,
            block_public_access: true,
            expiration_days: 14,
            noncurrent_version_expiration_days: 3,
        }
    }
}

/// Named, versioned storage location shared by all sub-pipelines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedAssetLocation {
    /// Bucket identifier
    pub bucket: String,
    /// Name of the parameter holding `bucket`
    pub parameter_name: String,
    pub lifecycle: BucketLifecycle,
}

impl SharedAssetLocation {
    pub fn new(bucket: impl Into<String>, parameter_name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            parameter_name: parameter_name.into(),
            lifecycle: BucketLifecycle::default(),
        }
    }

    /// Parameter name used when none is configured: `/<builderId>/AssetBucketArn`
    pub fn default_parameter_name(builder_id: &str) -> String {
        format!("/{}/AssetBucketArn", builder_id)
    }

    /// Object key a job's artifact is written to: `<jobName>/source.zip`
    pub fn object_key(job_name: &str) -> String {
        format!("{}/{}", job_name, ARTIFACT_FILE_NAME)
    }

    /// Full artifact path: `<bucket>/<jobName>/source.zip`
    pub fn object_path(&self, job_name: &str) -> String {
        format!("{}/{}", self.bucket, Self::object_key(job_name))
    }
}
