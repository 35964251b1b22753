use std::sync::Arc;

use kube::{
    Api, Client, ResourceExt,
    api::{Patch, PatchParams},
};
use serde_json::json;
use tracing::debug;

use crate::{
    domain::{
        deployment::entities::{
            deployment_spec::{ArangoDeployment, DeploymentSpec},
            group::ServerGroup,
            status::DeploymentStatus,
        },
        error::OperatorError,
        resilience::ports::ResilienceContext,
    },
    infrastructure::agency::http::{ARANGOD_PORT, HttpAgencyConnection},
};

/// Resilience context backed by one observed `ArangoDeployment` object.
pub struct K8sResilienceContext {
    client: Client,
    agency_client: reqwest::Client,
    deployment: Arc<ArangoDeployment>,
}

impl K8sResilienceContext {
    pub fn new(
        client: Client,
        agency_client: reqwest::Client,
        deployment: Arc<ArangoDeployment>,
    ) -> Self {
        Self {
            client,
            agency_client,
            deployment,
        }
    }

    fn namespace(&self) -> String {
        self.deployment.namespace().unwrap_or_default()
    }
}

/// Status patch for the deployment. The resource version turns the patch into
/// an optimistic write.
pub fn status_patch(status: &DeploymentStatus, resource_version: Option<&str>) -> serde_json::Value {
    let mut patch = match resource_version {
        Some(version) => json!({
            "metadata": { "resourceVersion": version },
            "status": status,
        }),
        None => json!({ "status": status }),
    };
    // A merge patch only removes a stored reason through an explicit null.
    if status.reason.is_none() {
        patch["status"]["reason"] = serde_json::Value::Null;
    }
    patch
}

/// Name of the pod running member `id` of `group`.
pub fn member_pod_name(deployment_name: &str, group: ServerGroup, id: &str) -> String {
    format!("{}-{}-{}", deployment_name, group.as_role(), id).to_lowercase()
}

/// Address of a server reached through the deployment's headless service.
pub fn member_endpoint(
    secure: bool,
    pod_name: &str,
    deployment_name: &str,
    namespace: &str,
) -> String {
    let scheme = if secure { "https" } else { "http" };
    format!(
        "{}://{}.{}-int.{}.svc:{}",
        scheme, pod_name, deployment_name, namespace, ARANGOD_PORT
    )
}

impl ResilienceContext for K8sResilienceContext {
    type Agency = HttpAgencyConnection;

    fn get_spec(&self) -> DeploymentSpec {
        self.deployment.spec.clone()
    }

    fn get_status(&self) -> DeploymentStatus {
        self.deployment.status.clone().unwrap_or_default()
    }

    async fn update_status(
        &self,
        status: DeploymentStatus,
        force: bool,
    ) -> Result<(), OperatorError> {
        let name = self.deployment.name_any();
        let api: Api<ArangoDeployment> = Api::namespaced(self.client.clone(), &self.namespace());

        let resource_version = if force {
            None
        } else {
            self.deployment.resource_version()
        };
        let patch = status_patch(&status, resource_version.as_deref());

        api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| match e {
                kube::Error::Api(response) if response.code == 409 => {
                    OperatorError::StatusConflict { name: name.clone() }
                }
                e => OperatorError::from(e),
            })?;

        debug!(deployment = name.as_str(), force, "Updated deployment status");
        Ok(())
    }

    async fn get_agency_clients(
        &self,
        predicate: Option<&(dyn Fn(&str) -> bool + Sync)>,
    ) -> Result<Vec<HttpAgencyConnection>, OperatorError> {
        // Members without a recorded pod get the name their pod is created under.
        let name = self.deployment.name_any();
        let namespace = self.namespace();
        let secure = self.deployment.spec.tls.is_secure();

        let agents = self
            .get_status()
            .members
            .agents
            .iter()
            .filter(|member| predicate.is_none_or(|matches| matches(&member.id)))
            .map(|member| {
                let pod_name = member
                    .pod_name
                    .clone()
                    .filter(|pod_name| !pod_name.is_empty())
                    .unwrap_or_else(|| member_pod_name(&name, ServerGroup::Agents, &member.id));
                HttpAgencyConnection::new(
                    self.agency_client.clone(),
                    member.id.clone(),
                    member_endpoint(secure, &pod_name, &name, &namespace),
                )
            })
            .collect();
        Ok(agents)
    }
}
