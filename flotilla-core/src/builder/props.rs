//! Builder configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::build::{BuildStep, CodeSource};

/// Mapping from logical environment name to the job name deployed for it
///
/// Job names must be stable across redeploys: the monitor finds the remote
/// job by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobNames(BTreeMap<String, String>);

impl JobNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping, builder style
    pub fn with(mut self, environment: impl Into<String>, job_name: impl Into<String>) -> Self {
        self.insert(environment, job_name);
        self
    }

    pub fn insert(&mut self, environment: impl Into<String>, job_name: impl Into<String>) {
        self.0.insert(environment.into(), job_name.into());
    }

    pub fn get(&self, environment: &str) -> Option<&str> {
        self.0.get(environment).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for JobNames {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(env, job)| (env.into(), job.into()))
                .collect(),
        )
    }
}

/// Construction-time properties of a `PipelineBuilder`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineProps {
    /// Builder id; also scopes the default parameter name
    pub id: String,

    /// Bucket holding the shared artifacts (default: `<id>-assets`, lowercased)
    #[serde(default)]
    pub asset_bucket: Option<String>,

    /// Parameter name the bucket is published under
    /// (default: `/<id>/AssetBucketArn`)
    #[serde(default)]
    pub parameter_name: Option<String>,

    #[serde(default)]
    pub source: Option<CodeSource>,

    /// Explicit build step; takes precedence over `source`
    #[serde(default)]
    pub build_step: Option<BuildStep>,

    #[serde(default)]
    pub job_names: JobNames,
}

impl PipelineProps {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: CodeSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_build_step(mut self, step: BuildStep) -> Self {
        self.build_step = Some(step);
        self
    }

    pub fn with_asset_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.asset_bucket = Some(bucket.into());
        self
    }

    pub fn with_parameter_name(mut self, name: impl Into<String>) -> Self {
        self.parameter_name = Some(name.into());
        self
    }

    pub fn with_job_names(mut self, job_names: JobNames) -> Self {
        self.job_names = job_names;
        self
    }
}
