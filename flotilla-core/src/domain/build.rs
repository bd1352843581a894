//! Source and build step definitions
//!
//! The root builder needs a build step whose output directory becomes the
//! shared file set pushed to every sub-pipeline.

use serde::{Deserialize, Serialize};

/// Repository and branch the root pipeline pulls from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSource {
    pub repository: String,
    pub branch: String,
}

impl CodeSource {
    pub fn new(repository: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            branch: branch.into(),
        }
    }
}

/// Build step producing the shared output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStep {
    pub name: String,
    #[serde(default)]
    pub input: Option<CodeSource>,
    #[serde(default)]
    pub install_commands: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default = "default_output_directory")]
    pub output_directory: String,
}

fn default_output_directory() -> String {
    "./".to_string()
}

impl BuildStep {
    /// Default synth step used when only a code source is configured
    pub fn synth(source: CodeSource) -> Self {
        Self {
            name: "SynthStep".to_string(),
            input: Some(source),
            install_commands: vec!["npm install -g aws-cdk".to_string()],
            commands: vec![
                "npm ci".to_string(),
                "npm run build".to_string(),
                "npx cdk synth".to_string(),
            ],
            output_directory: default_output_directory(),
        }
    }
}
