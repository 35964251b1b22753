use tracing::{debug, warn};

use crate::domain::{
    common::services::Service,
    deployment::{
        entities::{
            deployment_ref::DeploymentRef,
            deployment_spec::DeploymentSpec,
            group::ServerGroup,
            mode::DeploymentMode,
            reconcile_outcome::ReconcileOutcome,
            status::{DeploymentPhase, DeploymentStatus, MemberPhase},
        },
        ports::{DeploymentRepository, DeploymentService},
    },
    error::{OperatorError, ValidationError},
    reconcile::{
        entities::{Action, ActionType, Incident, MemberRef, Plan},
        plan_builder::create_plan,
        ports::ClaimSnapshot,
    },
    resilience::ports::{ResilienceContext, ResilienceService},
};

/// Brings a user supplied spec into its canonical form.
///
/// Unset fields are taken from the last accepted spec, then from the built-in
/// defaults. Immutable fields that differ from the accepted spec are put back;
/// their paths are returned. The result is validated last.
pub fn normalize_spec(
    deployment_name: &str,
    spec: &DeploymentSpec,
    accepted: Option<&DeploymentSpec>,
) -> Result<(DeploymentSpec, Vec<String>), ValidationError> {
    let mut spec = spec.clone();
    if let Some(accepted) = accepted {
        spec.set_defaults_from(accepted);
    }
    spec.set_defaults(deployment_name);

    let reset_fields = match accepted {
        Some(accepted) => accepted.reset_immutable_fields(&mut spec),
        None => Vec::new(),
    };

    spec.validate()?;
    Ok((spec, reset_fields))
}

/// Agent the plan takes down first, if any.
fn agent_shutdown_target(plan: &Plan) -> Option<String> {
    match plan.first() {
        Some(Action {
            action_type: ActionType::ShutdownMember,
            group: ServerGroup::Agents,
            member: MemberRef::Id(id),
            ..
        }) => Some(id.clone()),
        _ => None,
    }
}

impl<D> Service<D>
where
    D: DeploymentRepository,
{
    /// Reads the claim of every created member. Failed reads are kept so the
    /// planner only skips the affected member.
    async fn load_claims(&self, namespace: &str, status: &DeploymentStatus) -> ClaimSnapshot {
        let mut claims = ClaimSnapshot::default();
        for (_, members) in status.members.iter_groups() {
            for member in members.iter().filter(|m| m.phase == MemberPhase::Created) {
                if let Some(claim_name) = member.claim_name() {
                    let state = self
                        .deployment_repository
                        .get_claim(namespace, claim_name)
                        .await;
                    claims.insert(claim_name, state);
                }
            }
        }
        claims
    }
}

impl<D> DeploymentService for Service<D>
where
    D: DeploymentRepository,
{
    async fn reconcile_deployment<R>(
        &self,
        ctx: &R,
        deployment: &DeploymentRef,
    ) -> Result<ReconcileOutcome, OperatorError>
    where
        R: ResilienceContext,
    {
        let mut status = ctx.get_status();

        let (spec, reset_fields) =
            match normalize_spec(&deployment.name, &ctx.get_spec(), status.accepted_spec.as_ref()) {
                Ok(normalized) => normalized,
                Err(e) => {
                    warn!(deployment = %deployment.name, error = %e, "Rejected deployment spec");
                    let reason = Some(e.to_string());
                    if status.phase != DeploymentPhase::Failed || status.reason != reason {
                        status.phase = DeploymentPhase::Failed;
                        status.reason = reason;
                        if let Err(write_err) = ctx.update_status(status, false).await {
                            warn!(
                                deployment = %deployment.name,
                                error = %write_err,
                                "Failed to record rejected spec in status"
                            );
                        }
                    }
                    return Err(e.into());
                }
            };
        for field in &reset_fields {
            warn!(
                deployment = %deployment.name,
                field = field.as_str(),
                "Reset immutable field to its accepted value"
            );
        }

        if status.accepted_spec.as_ref() != Some(&spec)
            || status.phase != DeploymentPhase::Running
            || status.reason.is_some()
        {
            status.accepted_spec = Some(spec.clone());
            status.phase = DeploymentPhase::Running;
            status.reason = None;
            ctx.update_status(status.clone(), false).await?;
            debug!(deployment = %deployment.name, "Stored accepted spec");
        }

        let claims = if spec.get_mode() == DeploymentMode::Single {
            ClaimSnapshot::default()
        } else {
            self.load_claims(&deployment.namespace, &status).await
        };

        let mut incidents: Vec<Incident> = Vec::new();
        let mut plan = create_plan(&spec, &status, &claims, &mut incidents);

        if let Some(agent_id) = agent_shutdown_target(&plan) {
            if !self.agency_has_quorum_without(ctx, &spec, &agent_id).await? {
                warn!(
                    deployment = %deployment.name,
                    id = agent_id.as_str(),
                    "Agency would lose its quorum, postponing plan"
                );
                incidents.push(Incident::agency_quorum_at_risk(&agent_id, ServerGroup::Agents));
                plan = Plan::default();
            }
        }

        for incident in &incidents {
            if let Err(e) = self
                .deployment_repository
                .publish_incident(deployment, incident)
                .await
            {
                warn!(
                    deployment = %deployment.name,
                    reason = incident.reason.as_str(),
                    error = %e,
                    "Failed to publish incident"
                );
            }
        }

        Ok(ReconcileOutcome {
            spec,
            plan,
            reset_fields,
            incidents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        common::testing::TestServiceBuilder,
        deployment::{
            entities::mode::{Environment, StorageEngine},
            ports::MockDeploymentRepository,
            test_helpers::{
                FakeAgency, FakeResilienceContext, create_claim, create_cluster_status,
                create_created_member, create_defaulted_cluster_spec, create_deployment_ref,
            },
        },
        reconcile::entities::IncidentReason,
    };

    /// Repository whose claims all carry `default_class`, except the listed ones.
    fn create_claims_repository(
        default_class: &'static str,
        overrides: &'static [(&'static str, &'static str)],
    ) -> impl FnOnce(&mut MockDeploymentRepository) {
        move |mock| {
            mock.expect_get_claim().returning(move |_, claim_name| {
                let class = overrides
                    .iter()
                    .find(|(name, _)| *name == claim_name)
                    .map(|(_, class)| *class)
                    .unwrap_or(default_class);
                Box::pin(async move { Ok(create_claim(class)) })
            });
        }
    }

    /// Context whose accepted spec already matches the normalized spec.
    fn create_accepted_context(spec: DeploymentSpec) -> FakeResilienceContext {
        let (accepted, _) = normalize_spec("example", &spec, None).unwrap();
        let mut status = create_cluster_status();
        status.phase = DeploymentPhase::Running;
        status.accepted_spec = Some(accepted);
        FakeResilienceContext::new(spec).with_status(status)
    }

    #[test]
    fn test_normalize_spec_heals_and_reports_immutable_fields() {
        let accepted = create_defaulted_cluster_spec("example");
        let mut spec = accepted.clone();
        spec.storage_engine = Some(StorageEngine::MMFiles);
        spec.dbservers.count = Some(5);

        let (normalized, reset) = normalize_spec("example", &spec, Some(&accepted)).unwrap();

        assert_eq!(reset, vec!["storageEngine"]);
        assert_eq!(normalized.get_storage_engine(), StorageEngine::RocksDB);
        assert_eq!(normalized.dbservers.get_count(), 5);
    }

    #[test]
    fn test_normalize_spec_inherits_unset_fields_from_accepted_spec() {
        let mut accepted = create_defaulted_cluster_spec("example");
        accepted.image = Some("arangodb/arangodb:3.11".to_string());

        let (normalized, reset) =
            normalize_spec("example", &DeploymentSpec::default(), Some(&accepted)).unwrap();

        assert!(reset.is_empty());
        assert_eq!(normalized.get_image(), "arangodb/arangodb:3.11");
    }

    #[test]
    fn test_agent_shutdown_target_only_matches_leading_agent_shutdown() {
        let agent_plan = Plan::from(vec![Action::new(
            ActionType::ShutdownMember,
            ServerGroup::Agents,
            MemberRef::id("AGNT-1"),
        )]);
        let dbserver_plan = Plan::from(vec![Action::new(
            ActionType::ShutdownMember,
            ServerGroup::DBServers,
            MemberRef::id("PRMR-1"),
        )]);

        assert_eq!(agent_shutdown_target(&agent_plan).as_deref(), Some("AGNT-1"));
        assert_eq!(agent_shutdown_target(&dbserver_plan), None);
        assert_eq!(agent_shutdown_target(&Plan::default()), None);
    }

    #[tokio::test]
    async fn test_reconcile_replaces_dbserver_on_new_storage_class() {
        // Arrange
        let service = TestServiceBuilder::new()
            .customize_deployment_repository(create_claims_repository(
                "fast",
                &[("example-dbserver-2", "standard")],
            ))
            .build();
        let mut spec = create_defaulted_cluster_spec("example");
        spec.dbservers.storage_class_name = Some("fast".to_string());
        let ctx = create_accepted_context(spec);

        // Act
        let outcome = service
            .reconcile_deployment(&ctx, &create_deployment_ref())
            .await
            .unwrap();

        // Assert
        assert_eq!(
            outcome.plan.action_types(),
            vec![
                ActionType::AddMember,
                ActionType::WaitForMemberUp,
                ActionType::CleanOutMember,
                ActionType::ShutdownMember,
                ActionType::RemoveMember,
            ]
        );
        assert_eq!(outcome.plan.0[2].member, MemberRef::id("PRMR-2"));
        assert!(outcome.incidents.is_empty());
        assert!(ctx.recorded_updates().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_rejects_invalid_spec() {
        // Arrange
        let service = TestServiceBuilder::new().build();
        let spec = DeploymentSpec {
            environment: Some(Environment::Production),
            ..Default::default()
        };
        let ctx = FakeResilienceContext::new(spec);

        // Act
        let result = service
            .reconcile_deployment(&ctx, &create_deployment_ref())
            .await;

        // Assert
        match result.unwrap_err() {
            OperatorError::InvalidSpec(e) => assert_eq!(e.message, "spec.image must be set"),
            _ => panic!("Expected InvalidSpec error"),
        }
        let updates = ctx.recorded_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0.phase, DeploymentPhase::Failed);
        assert!(
            updates[0]
                .0
                .reason
                .as_deref()
                .is_some_and(|r| r.contains("spec.image must be set"))
        );
        assert_eq!(updates[0].0.accepted_spec, None);
    }

    #[tokio::test]
    async fn test_reconcile_does_not_rewrite_same_failure() {
        // Arrange
        let service = TestServiceBuilder::new().build();
        let spec = DeploymentSpec {
            environment: Some(Environment::Production),
            ..Default::default()
        };
        let reason = normalize_spec("example", &spec, None).unwrap_err().to_string();
        let status = DeploymentStatus {
            phase: DeploymentPhase::Failed,
            reason: Some(reason),
            ..Default::default()
        };
        let ctx = FakeResilienceContext::new(spec).with_status(status);

        // Act
        let result = service
            .reconcile_deployment(&ctx, &create_deployment_ref())
            .await;

        // Assert
        assert!(result.is_err());
        assert!(ctx.recorded_updates().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_clears_failure_once_spec_is_valid() {
        // Arrange
        let service = TestServiceBuilder::new()
            .customize_deployment_repository(create_claims_repository("", &[]))
            .build();
        let mut ctx = create_accepted_context(create_defaulted_cluster_spec("example"));
        ctx.status.phase = DeploymentPhase::Failed;
        ctx.status.reason = Some("spec.image must be set".to_string());

        // Act
        service
            .reconcile_deployment(&ctx, &create_deployment_ref())
            .await
            .unwrap();

        // Assert
        let updates = ctx.recorded_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0.phase, DeploymentPhase::Running);
        assert_eq!(updates[0].0.reason, None);
    }

    #[tokio::test]
    async fn test_reconcile_stores_accepted_spec_on_first_pass() {
        // Arrange
        let service = TestServiceBuilder::new().build();
        let ctx = FakeResilienceContext::new(DeploymentSpec::default());

        // Act
        let outcome = service
            .reconcile_deployment(&ctx, &create_deployment_ref())
            .await
            .unwrap();

        // Assert
        let updates = ctx.recorded_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0.accepted_spec.as_ref(), Some(&outcome.spec));
        assert_eq!(updates[0].0.phase, DeploymentPhase::Running);
        assert!(!updates[0].1);
        assert_eq!(outcome.plan.len(), 3);
        assert!(
            outcome
                .plan
                .iter()
                .all(|a| a.action_type == ActionType::AddMember && a.group == ServerGroup::DBServers)
        );
    }

    #[tokio::test]
    async fn test_reconcile_heals_immutable_fields_without_status_write() {
        // Arrange
        let service = TestServiceBuilder::new()
            .customize_deployment_repository(create_claims_repository("", &[]))
            .build();
        let mut ctx = create_accepted_context(create_defaulted_cluster_spec("example"));
        ctx.spec.storage_engine = Some(StorageEngine::MMFiles);

        // Act
        let outcome = service
            .reconcile_deployment(&ctx, &create_deployment_ref())
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome.reset_fields, vec!["storageEngine"]);
        assert_eq!(outcome.spec.get_storage_engine(), StorageEngine::RocksDB);
        assert!(outcome.plan.is_empty());
        assert!(ctx.recorded_updates().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_propagates_status_conflict() {
        // Arrange
        let service = TestServiceBuilder::new().build();
        let mut ctx = FakeResilienceContext::new(DeploymentSpec::default());
        ctx.conflict_on_update = true;

        // Act
        let result = service
            .reconcile_deployment(&ctx, &create_deployment_ref())
            .await;

        // Assert
        match result.unwrap_err() {
            OperatorError::StatusConflict { name } => assert_eq!(name, "example"),
            _ => panic!("Expected StatusConflict error"),
        }
    }

    #[tokio::test]
    async fn test_reconcile_postpones_agent_replacement_without_quorum() {
        // Arrange
        let service = TestServiceBuilder::new()
            .customize_deployment_repository(|mock| {
                create_claims_repository("standard", &[])(mock);
                mock.expect_publish_incident()
                    .withf(|_, incident| incident.reason == IncidentReason::AgencyQuorumAtRisk)
                    .times(1)
                    .returning(|_, _| Box::pin(async move { Ok(()) }));
            })
            .build();
        let mut spec = create_defaulted_cluster_spec("example");
        spec.agents.storage_class_name = Some("fast".to_string());
        let ctx = create_accepted_context(spec).with_agents(vec![
            FakeAgency::healthy("AGNT-1"),
            FakeAgency::unreachable("AGNT-2"),
            FakeAgency::healthy("AGNT-3"),
        ]);

        // Act
        let outcome = service
            .reconcile_deployment(&ctx, &create_deployment_ref())
            .await
            .unwrap();

        // Assert
        assert!(outcome.plan.is_empty());
        assert_eq!(outcome.incidents.len(), 1);
        assert_eq!(outcome.incidents[0].member_id, "AGNT-1");
    }

    #[tokio::test]
    async fn test_reconcile_keeps_agent_replacement_with_quorum() {
        // Arrange
        let service = TestServiceBuilder::new()
            .customize_deployment_repository(create_claims_repository("standard", &[]))
            .build();
        let mut spec = create_defaulted_cluster_spec("example");
        spec.agents.storage_class_name = Some("fast".to_string());
        let ctx = create_accepted_context(spec).with_agents(vec![
            FakeAgency::healthy("AGNT-1"),
            FakeAgency::healthy("AGNT-2"),
            FakeAgency::healthy("AGNT-3"),
        ]);

        // Act
        let outcome = service
            .reconcile_deployment(&ctx, &create_deployment_ref())
            .await
            .unwrap();

        // Assert
        assert_eq!(
            outcome.plan.action_types(),
            vec![
                ActionType::ShutdownMember,
                ActionType::RemoveMember,
                ActionType::AddMember,
                ActionType::WaitForMemberUp,
            ]
        );
        assert!(outcome.plan.iter().all(|a| a.member == MemberRef::id("AGNT-1")));
    }

    #[tokio::test]
    async fn test_reconcile_propagates_agency_errors() {
        // Arrange
        let service = TestServiceBuilder::new()
            .customize_deployment_repository(create_claims_repository("standard", &[]))
            .build();
        let mut spec = create_defaulted_cluster_spec("example");
        spec.agents.storage_class_name = Some("fast".to_string());
        let mut ctx = create_accepted_context(spec);
        ctx.agents = Err(OperatorError::AgencyError {
            message: "agency lookup failed".to_string(),
        });

        // Act
        let result = service
            .reconcile_deployment(&ctx, &create_deployment_ref())
            .await;

        // Assert
        match result.unwrap_err() {
            OperatorError::AgencyError { message } => {
                assert_eq!(message, "agency lookup failed")
            }
            _ => panic!("Expected AgencyError"),
        }
    }

    #[tokio::test]
    async fn test_reconcile_survives_incident_publish_failure() {
        // Arrange
        let service = TestServiceBuilder::new()
            .customize_deployment_repository(|mock| {
                create_claims_repository("standard", &[])(mock);
                mock.expect_publish_incident().times(3).returning(|_, _| {
                    Box::pin(async move {
                        Err(OperatorError::KubeApiError {
                            message: "events are forbidden".to_string(),
                        })
                    })
                });
            })
            .build();
        let mut spec = create_defaulted_cluster_spec("example");
        spec.coordinators.storage_class_name = Some("fast".to_string());
        let mut ctx = create_accepted_context(spec);
        ctx.status.members.coordinators = (1..=3)
            .map(|i| create_created_member(&format!("CRDN-{i}"), &format!("example-coordinator-{i}")))
            .collect::<Vec<_>>()
            .into();

        // Act
        let outcome = service
            .reconcile_deployment(&ctx, &create_deployment_ref())
            .await
            .unwrap();

        // Assert
        assert!(outcome.plan.is_empty());
        assert_eq!(outcome.incidents.len(), 3);
        assert!(
            outcome
                .incidents
                .iter()
                .all(|i| i.reason == IncidentReason::CannotChangeStorageClass)
        );
    }
}
