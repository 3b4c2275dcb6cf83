//! The project descriptor (`project.yaml`)

use crate::core::errors::{ProjectError, ProjectResult};
use crate::io::ProjectIo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-master settings as persisted in the descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterConfig {
    /// Rule file of the master, relative to the rules directory
    pub cps_file: String,
    /// `<master>.db` for database backed masters, otherwise a rule source
    pub properties_file: String,
    /// Name of the glyph layer holding the skeleton
    pub skeleton: String,
}

/// Everything the project remembers about its masters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    #[serde(default)]
    pub masters: BTreeMap<String, MasterConfig>,
}

impl ProjectDescriptor {
    pub fn from_yaml(contents: &str, path: &str) -> ProjectResult<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(contents).map_err(|e| ProjectError::malformed(path, e))
    }

    pub fn to_yaml(&self) -> ProjectResult<String> {
        serde_yaml_ng::to_string(self).map_err(|e| ProjectError::malformed("project descriptor", e))
    }

    pub async fn read<I: ProjectIo>(io: &I, path: &str) -> ProjectResult<Self> {
        let contents = io.read_to_string(path).await?;
        let descriptor = Self::from_yaml(&contents, path)?;
        debug!("Loaded {} with {} masters", path, descriptor.masters.len());
        Ok(descriptor)
    }

    pub async fn write<I: ProjectIo>(&self, io: &I, path: &str) -> ProjectResult<()> {
        io.write_file(path, self.to_yaml()?.as_bytes()).await
    }
}
