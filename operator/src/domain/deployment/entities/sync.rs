use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Datacenter-to-datacenter replication settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl SyncSpec {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub fn set_defaults_from(&mut self, source: &SyncSpec) {
        if self.enabled.is_none() {
            self.enabled = source.enabled;
        }
    }
}
