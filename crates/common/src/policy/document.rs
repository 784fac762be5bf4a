use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity::ExtensionId;

/// Name of the policy file written into each managed-policy directory
pub const POLICY_FILE_NAME: &str = "ExtensionSettings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationMode {
    ForceInstalled,
}

/// One `ExtensionSettings` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionPolicy {
    pub installation_mode: InstallationMode,
    pub override_update_url: bool,
    pub update_url: String,
}

impl ExtensionPolicy {
    /// Install silently, keep installed, and only ever update from `update_url`
    pub fn force_installed(update_url: impl Into<String>) -> Self {
        Self {
            installation_mode: InstallationMode::ForceInstalled,
            override_update_url: true,
            update_url: update_url.into(),
        }
    }
}

/// Contents of a managed-policy JSON file
///
/// Entries and top-level keys we did not write are kept as raw JSON so that
/// editing a file never drops someone else's settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "ExtensionSettings", default)]
    pub extension_settings: Map<String, Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl PolicyDocument {
    pub fn single(id: &ExtensionId, policy: &ExtensionPolicy) -> Result<Self, serde_json::Error> {
        let mut document = Self::default();
        document.insert(id, policy)?;
        Ok(document)
    }

    pub fn insert(
        &mut self,
        id: &ExtensionId,
        policy: &ExtensionPolicy,
    ) -> Result<(), serde_json::Error> {
        self.extension_settings
            .insert(id.to_string(), serde_json::to_value(policy)?);
        Ok(())
    }

    pub fn remove(&mut self, id: &ExtensionId) -> bool {
        self.extension_settings.remove(id.as_str()).is_some()
    }

    pub fn get(&self, id: &ExtensionId) -> Option<ExtensionPolicy> {
        self.extension_settings
            .get(id.as_str())
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Nothing left worth keeping a file around for
    pub fn is_empty(&self) -> bool {
        self.extension_settings.is_empty() && self.other.is_empty()
    }
}
