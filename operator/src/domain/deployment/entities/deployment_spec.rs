use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{
    deployment::entities::{
        authentication::AuthenticationSpec,
        bootstrap::BootstrapSpec,
        group::ServerGroup,
        mode::{DeploymentMode, Environment, PullPolicy, StorageEngine},
        server_group_spec::ServerGroupSpec,
        status::DeploymentStatus,
        sync::SyncSpec,
        tls::TLSSpec,
    },
    error::ValidationError,
};

pub const DEFAULT_IMAGE: &str = "arangodb/arangodb:latest";

/// Desired state of an ArangoDB deployment.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "database.arangodb.com",
    version = "v1alpha",
    kind = "ArangoDeployment",
    plural = "arangodeployments",
    shortname = "arangodb",
    namespaced,
    status = "DeploymentStatus",
    printcolumn = r#"{"name":"Mode", "type":"string", "jsonPath":".spec.mode"}"#,
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<DeploymentMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_engine: Option<StorageEngine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<PullPolicy>,

    #[serde(default, rename = "auth")]
    pub authentication: AuthenticationSpec,
    #[serde(default)]
    pub tls: TLSSpec,
    #[serde(default)]
    pub sync: SyncSpec,
    #[serde(default)]
    pub bootstrap: BootstrapSpec,

    #[serde(default)]
    pub single: ServerGroupSpec,
    #[serde(default)]
    pub agents: ServerGroupSpec,
    #[serde(default, rename = "dbservers")]
    pub dbservers: ServerGroupSpec,
    #[serde(default)]
    pub coordinators: ServerGroupSpec,
    #[serde(default, rename = "syncmasters")]
    pub syncmasters: ServerGroupSpec,
    #[serde(default, rename = "syncworkers")]
    pub syncworkers: ServerGroupSpec,
}

impl DeploymentSpec {
    pub fn get_mode(&self) -> DeploymentMode {
        self.mode.unwrap_or_default()
    }

    pub fn get_environment(&self) -> Environment {
        self.environment.unwrap_or_default()
    }

    pub fn get_storage_engine(&self) -> StorageEngine {
        self.storage_engine.unwrap_or_default()
    }

    pub fn get_image(&self) -> &str {
        self.image.as_deref().unwrap_or("")
    }

    pub fn get_server_group_spec(&self, group: ServerGroup) -> &ServerGroupSpec {
        match group {
            ServerGroup::Single => &self.single,
            ServerGroup::Agents => &self.agents,
            ServerGroup::DBServers => &self.dbservers,
            ServerGroup::Coordinators => &self.coordinators,
            ServerGroup::SyncMasters => &self.syncmasters,
            ServerGroup::SyncWorkers => &self.syncworkers,
        }
    }

    fn get_server_group_spec_mut(&mut self, group: ServerGroup) -> &mut ServerGroupSpec {
        match group {
            ServerGroup::Single => &mut self.single,
            ServerGroup::Agents => &mut self.agents,
            ServerGroup::DBServers => &mut self.dbservers,
            ServerGroup::Coordinators => &mut self.coordinators,
            ServerGroup::SyncMasters => &mut self.syncmasters,
            ServerGroup::SyncWorkers => &mut self.syncworkers,
        }
    }

    /// Whether the deployment runs members of `group`.
    pub fn is_group_used(&self, group: ServerGroup) -> bool {
        let mode = self.get_mode();
        match group {
            ServerGroup::Single => mode.has_single_servers(),
            ServerGroup::Agents => mode.has_agents(),
            ServerGroup::DBServers => mode.has_dbservers(),
            ServerGroup::Coordinators => mode.has_coordinators(),
            ServerGroup::SyncMasters | ServerGroup::SyncWorkers => {
                mode.supports_sync() && self.sync.is_enabled()
            }
        }
    }

    pub fn is_development(&self) -> bool {
        self.get_environment() == Environment::Development
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.get_image().is_empty() {
            return Err(ValidationError::new("spec.image must be set"));
        }
        self.authentication
            .validate(false)
            .map_err(|e| e.within("spec.auth"))?;

        let mode = self.get_mode();
        let env = self.get_environment();
        for group in ServerGroup::ALL {
            self.get_server_group_spec(group)
                .validate(group, self.is_group_used(group), mode, env)
                .map_err(|e| e.within(&format!("spec.{}", group.as_field())))?;
        }

        self.tls.validate().map_err(|e| e.within("spec.tls"))?;
        self.bootstrap
            .validate()
            .map_err(|e| e.within("spec.bootstrap"))?;
        Ok(())
    }

    pub fn set_defaults(&mut self, deployment_name: &str) {
        if self.mode.is_none() {
            self.mode = Some(DeploymentMode::Cluster);
        }
        if self.environment.is_none() {
            self.environment = Some(Environment::Development);
        }
        if self.storage_engine.is_none() {
            self.storage_engine = Some(StorageEngine::RocksDB);
        }
        if self.get_image().is_empty() && self.is_development() {
            self.image = Some(DEFAULT_IMAGE.to_string());
        }
        if self.image_pull_policy.is_none() {
            self.image_pull_policy = Some(PullPolicy::IfNotPresent);
        }

        self.authentication
            .set_defaults(&format!("{}-jwt", deployment_name));
        self.tls.set_defaults(&format!("{}-ca", deployment_name));

        let mode = self.get_mode();
        for group in ServerGroup::ALL {
            let used = self.is_group_used(group);
            self.get_server_group_spec_mut(group)
                .set_defaults(group, used, mode);
        }

        self.bootstrap.set_defaults(deployment_name);
    }

    /// Fills every field the user left unset with the value from `source`,
    /// usually the last accepted spec.
    pub fn set_defaults_from(&mut self, source: &DeploymentSpec) {
        if self.mode.is_none() {
            self.mode = source.mode;
        }
        if self.environment.is_none() {
            self.environment = source.environment;
        }
        if self.storage_engine.is_none() {
            self.storage_engine = source.storage_engine;
        }
        if self.image.is_none() {
            self.image = source.image.clone();
        }
        if self.image_pull_policy.is_none() {
            self.image_pull_policy = source.image_pull_policy;
        }
        self.authentication
            .set_defaults_from(&source.authentication);
        self.tls.set_defaults_from(&source.tls);
        self.sync.set_defaults_from(&source.sync);
        self.bootstrap.set_defaults_from(&source.bootstrap);
        for group in ServerGroup::ALL {
            self.get_server_group_spec_mut(group)
                .set_defaults_from(source.get_server_group_spec(group));
        }
    }

    /// Heals every immutable field of `target` that differs from `self` and
    /// returns the paths of the healed fields.
    pub fn reset_immutable_fields(&self, target: &mut DeploymentSpec) -> Vec<String> {
        let mut reset_fields = Vec::new();
        if self.get_mode() != target.get_mode() {
            target.mode = self.mode;
            reset_fields.push("mode".to_string());
        }
        if self.get_storage_engine() != target.get_storage_engine() {
            target.storage_engine = self.storage_engine;
            reset_fields.push("storageEngine".to_string());
        }
        reset_fields.extend(
            self.authentication
                .reset_immutable_fields("auth", &mut target.authentication),
        );
        reset_fields.extend(self.tls.reset_immutable_fields("tls", &mut target.tls));
        for group in ServerGroup::ALL {
            let healed = self.get_server_group_spec(group).reset_immutable_fields(
                group,
                group.as_field(),
                target.get_server_group_spec_mut(group),
            );
            reset_fields.extend(healed);
        }
        reset_fields
    }
}
