use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::ResourceRequirements, apimachinery::pkg::api::resource::Quantity,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{
    deployment::entities::{
        group::ServerGroup,
        mode::{DeploymentMode, Environment},
    },
    error::ValidationError,
};

const RESOURCE_STORAGE: &str = "storage";
const DEFAULT_STORAGE_REQUEST: &str = "8Gi";

/// Desired state of all servers in a single group (e.g. all agents).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerGroupSpec {
    /// Requested number of servers. Absent and zero both mean "unused".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
    /// Additional command line arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
    #[serde(default, rename = "resource", skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

impl ServerGroupSpec {
    pub fn get_count(&self) -> i32 {
        self.count.unwrap_or(0)
    }

    pub fn get_storage_class_name(&self) -> &str {
        self.storage_class_name.as_deref().unwrap_or("")
    }

    #[cfg(test)]
    pub fn get_args(&self) -> &[String] {
        self.args.as_deref().unwrap_or(&[])
    }

    pub fn get_storage_request(&self) -> Option<&Quantity> {
        self.resources
            .as_ref()
            .and_then(|r| r.requests.as_ref())
            .and_then(|requests| requests.get(RESOURCE_STORAGE))
    }

    pub fn validate(
        &self,
        group: ServerGroup,
        used: bool,
        mode: DeploymentMode,
        env: Environment,
    ) -> Result<(), ValidationError> {
        let count = self.get_count();
        if !used {
            if count != 0 {
                return Err(ValidationError::new(format!(
                    "Invalid count value {} for un-used group. Expected 0",
                    count
                )));
            }
            return Ok(());
        }

        let min_count = minimum_count(group, mode, env);
        if count < min_count {
            return Err(ValidationError::new(format!(
                "Invalid count value {}. Expected >= {}",
                count, min_count
            )));
        }
        if count > 1 && group == ServerGroup::Single && mode == DeploymentMode::Single {
            return Err(ValidationError::new(format!(
                "Invalid count value {}. Expected 1",
                count
            )));
        }
        Ok(())
    }

    pub fn set_defaults(&mut self, group: ServerGroup, used: bool, mode: DeploymentMode) {
        if self.get_count() == 0 && used {
            let count = match group {
                ServerGroup::Single if mode == DeploymentMode::Single => 1,
                ServerGroup::Single => 2,
                _ => 3,
            };
            self.count = Some(count);
        }

        let holds_data = matches!(
            group,
            ServerGroup::Single | ServerGroup::Agents | ServerGroup::DBServers
        );
        if holds_data && self.get_storage_request().is_none() {
            let resources = self.resources.get_or_insert_with(Default::default);
            resources
                .requests
                .get_or_insert_with(BTreeMap::new)
                .insert(
                    RESOURCE_STORAGE.to_string(),
                    Quantity(DEFAULT_STORAGE_REQUEST.to_string()),
                );
        }
    }

    /// Fills fields the user left unset with the values of `source`.
    pub fn set_defaults_from(&mut self, source: &ServerGroupSpec) {
        if self.count.is_none() {
            self.count = source.count;
        }
        if self.args.is_none() {
            self.args = source.args.clone();
        }
        if self.storage_class_name.is_none() {
            self.storage_class_name = source.storage_class_name.clone();
        }
        if self.resources.is_none() {
            self.resources = source.resources.clone();
        }
    }

    /// Replaces every immutable field of `target` that differs from `self` and
    /// returns the paths of the fields that were reset.
    pub fn reset_immutable_fields(
        &self,
        group: ServerGroup,
        field_prefix: &str,
        target: &mut ServerGroupSpec,
    ) -> Vec<String> {
        let mut reset_fields = Vec::new();
        if group == ServerGroup::Agents && self.get_count() != target.get_count() {
            target.count = self.count;
            reset_fields.push(format!("{}.count", field_prefix));
        }
        if self.get_storage_class_name() != target.get_storage_class_name() {
            target.storage_class_name = self.storage_class_name.clone();
            reset_fields.push(format!("{}.storageClassName", field_prefix));
        }
        reset_fields
    }
}

fn minimum_count(group: ServerGroup, mode: DeploymentMode, env: Environment) -> i32 {
    if !env.is_production() {
        return 1;
    }
    match group {
        ServerGroup::Single if mode == DeploymentMode::ResilientSingle => 2,
        ServerGroup::Single => 1,
        ServerGroup::Agents => 3,
        ServerGroup::DBServers
        | ServerGroup::Coordinators
        | ServerGroup::SyncMasters
        | ServerGroup::SyncWorkers => 2,
    }
}
