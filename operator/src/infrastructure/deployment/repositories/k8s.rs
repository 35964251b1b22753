use k8s_openapi::api::core::v1::{ObjectReference, PersistentVolumeClaim};
use kube::{
    Api, Client, Resource,
    runtime::events::{Event, EventType, Recorder, Reporter},
};
use tracing::debug;

use crate::domain::{
    deployment::{
        entities::{deployment_ref::DeploymentRef, deployment_spec::ArangoDeployment},
        ports::DeploymentRepository,
    },
    error::OperatorError,
    reconcile::{entities::Incident, ports::ClaimState},
};

pub const CONTROLLER_NAME: &str = "arangodb-operator";

const CONDITION_FILE_SYSTEM_RESIZE_PENDING: &str = "FileSystemResizePending";

pub struct K8sDeploymentRepository {
    client: Client,
    recorder: Recorder,
}

impl K8sDeploymentRepository {
    pub fn new(client: Client) -> Self {
        let reporter = Reporter {
            controller: CONTROLLER_NAME.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        let recorder = Recorder::new(client.clone(), reporter);
        Self { client, recorder }
    }
}

/// Reads the parts of a claim the planners look at.
pub fn claim_state(claim: &PersistentVolumeClaim) -> ClaimState {
    let storage_class_name = claim
        .spec
        .as_ref()
        .and_then(|spec| spec.storage_class_name.clone());
    let file_system_resize_pending = claim
        .status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == CONDITION_FILE_SYSTEM_RESIZE_PENDING && c.status == "True")
        });

    ClaimState {
        storage_class_name,
        file_system_resize_pending,
    }
}

fn object_reference(deployment: &DeploymentRef) -> ObjectReference {
    ObjectReference {
        api_version: Some(ArangoDeployment::api_version(&()).to_string()),
        kind: Some(ArangoDeployment::kind(&()).to_string()),
        name: Some(deployment.name.clone()),
        namespace: Some(deployment.namespace.clone()),
        uid: deployment.uid.clone(),
        ..Default::default()
    }
}

impl DeploymentRepository for K8sDeploymentRepository {
    async fn get_claim(
        &self,
        namespace: &str,
        claim_name: &str,
    ) -> Result<ClaimState, OperatorError> {
        let claims: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
        let claim = claims
            .get_opt(claim_name)
            .await?
            .ok_or_else(|| OperatorError::ClaimNotFound {
                name: claim_name.to_string(),
            })?;

        Ok(claim_state(&claim))
    }

    async fn publish_incident(
        &self,
        deployment: &DeploymentRef,
        incident: &Incident,
    ) -> Result<(), OperatorError> {
        let event = Event {
            type_: EventType::Warning,
            reason: incident.reason.as_str().to_string(),
            note: Some(incident.message.clone()),
            action: "Reconcile".to_string(),
            secondary: None,
        };

        self.recorder
            .publish(&event, &object_reference(deployment))
            .await?;

        debug!(
            deployment = deployment.name.as_str(),
            reason = incident.reason.as_str(),
            "Published incident"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::{
        PersistentVolumeClaimCondition, PersistentVolumeClaimSpec, PersistentVolumeClaimStatus,
    };

    use super::*;

    fn create_claim(storage_class: Option<&str>, conditions: Vec<(&str, &str)>) -> PersistentVolumeClaim {
        PersistentVolumeClaim {
            spec: Some(PersistentVolumeClaimSpec {
                storage_class_name: storage_class.map(str::to_string),
                ..Default::default()
            }),
            status: Some(PersistentVolumeClaimStatus {
                conditions: Some(
                    conditions
                        .into_iter()
                        .map(|(type_, status)| PersistentVolumeClaimCondition {
                            type_: type_.to_string(),
                            status: status.to_string(),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_claim_state_reads_storage_class_and_resize_condition() {
        let claim = create_claim(Some("ssd"), vec![("FileSystemResizePending", "True")]);

        let state = claim_state(&claim);

        assert_eq!(state.get_storage_class_name(), "ssd");
        assert!(state.file_system_resize_pending);
    }

    #[test]
    fn test_claim_state_ignores_inactive_conditions() {
        let claim = create_claim(None, vec![("FileSystemResizePending", "False"), ("Resizing", "True")]);

        let state = claim_state(&claim);

        assert_eq!(state.storage_class_name, None);
        assert!(!state.file_system_resize_pending);
    }

    #[test]
    fn test_object_reference_points_at_deployment() {
        let mut deployment = DeploymentRef::new("example", "db");
        deployment.uid = Some("1234".to_string());

        let reference = object_reference(&deployment);

        assert_eq!(reference.api_version.as_deref(), Some("database.arangodb.com/v1alpha"));
        assert_eq!(reference.kind.as_deref(), Some("ArangoDeployment"));
        assert_eq!(reference.namespace.as_deref(), Some("db"));
        assert_eq!(reference.uid.as_deref(), Some("1234"));
    }
}
