use tracing::debug;

use crate::domain::{
    deployment::entities::{
        deployment_spec::DeploymentSpec,
        group::ServerGroup,
        status::{DeploymentStatus, MemberPhase, MemberStatus},
    },
    reconcile::{
        entities::{Action, ActionType, MemberRef, Plan},
        plan_builder_scale::create_scale_plan,
        plan_builder_storage::create_rotate_server_storage_plan,
        ports::{ClaimInspector, IncidentRecorder},
    },
};

/// Builds the plan that moves `status` one step closer to `spec`.
///
/// The planners run in priority order and the first non-empty plan wins:
/// replacing failed members, scaling, then storage rotation.
pub fn create_plan<C, R>(
    spec: &DeploymentSpec,
    status: &DeploymentStatus,
    claims: &C,
    incidents: &mut R,
) -> Plan
where
    C: ClaimInspector + ?Sized,
    R: IncidentRecorder + ?Sized,
{
    let plan = create_replace_failed_member_plan(status);
    if !plan.is_empty() {
        return plan;
    }

    let plan = create_scale_plan(spec, status);
    if !plan.is_empty() {
        return plan;
    }

    create_rotate_server_storage_plan(spec, status, claims, incidents)
}

/// Replaces the first failed member found. Agents come back under their old
/// identifier, other groups get a fresh one.
fn create_replace_failed_member_plan(status: &DeploymentStatus) -> Plan {
    for (group, members) in status.members.iter_groups() {
        if let Some(member) = members.iter().find(|m| m.phase == MemberPhase::Failed) {
            debug!(id = %member.id, role = group.as_role(), "Creating plan to replace failed member");
            let replacement = match group {
                ServerGroup::Agents => MemberRef::id(&member.id),
                _ => MemberRef::New,
            };
            return Plan::from(vec![
                Action::new(ActionType::RemoveMember, group, MemberRef::id(&member.id)),
                Action::new(ActionType::AddMember, group, replacement),
            ]);
        }
    }
    Plan::default()
}

/// Restarts `member` in place and waits for it to come back.
pub fn create_rotate_member_plan(member: &MemberStatus, group: ServerGroup, reason: &str) -> Plan {
    debug!(
        id = %member.id,
        role = group.as_role(),
        reason,
        "Creating rotation plan"
    );
    Plan::from(vec![
        Action::new(ActionType::RotateMember, group, MemberRef::id(&member.id)).with_reason(reason),
        Action::new(ActionType::WaitForMemberUp, group, MemberRef::id(&member.id)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        deployment::test_helpers::{
            create_created_member, create_defaulted_cluster_spec, create_status_with_members,
        },
        reconcile::{
            entities::Incident,
            ports::{ClaimState, MockClaimInspector},
        },
    };

    fn claims_with_class(storage_class: &'static str) -> MockClaimInspector {
        let mut mock = MockClaimInspector::new();
        mock.expect_get_claim().returning(move |_| {
            Ok(ClaimState {
                storage_class_name: Some(storage_class.to_string()),
                file_system_resize_pending: false,
            })
        });
        mock
    }

    fn full_cluster_status() -> DeploymentStatus {
        let mut status = DeploymentStatus::default();
        status.members.agents = (1..=3)
            .map(|i| create_created_member(&format!("AGNT-{i}"), &format!("agent-{i}")))
            .collect::<Vec<_>>()
            .into();
        status.members.dbservers = (1..=3)
            .map(|i| create_created_member(&format!("PRMR-{i}"), &format!("dbserver-{i}")))
            .collect::<Vec<_>>()
            .into();
        status.members.coordinators = (1..=3)
            .map(|i| create_created_member(&format!("CRDN-{i}"), ""))
            .collect::<Vec<_>>()
            .into();
        status
    }

    #[test]
    fn test_converged_deployment_has_empty_plan() {
        let spec = create_defaulted_cluster_spec("example");
        let claims = claims_with_class("standard");
        let mut incidents: Vec<Incident> = Vec::new();

        let plan = create_plan(&spec, &full_cluster_status(), &claims, &mut incidents);

        assert!(plan.is_empty());
    }

    #[test]
    fn test_failed_member_is_replaced_first() {
        let mut spec = create_defaulted_cluster_spec("example");
        spec.dbservers.storage_class_name = Some("fast".to_string());
        let mut status = full_cluster_status();
        status.members.coordinators.0[1].phase = MemberPhase::Failed;
        let mut claims = MockClaimInspector::new();
        claims.expect_get_claim().times(0);
        let mut incidents: Vec<Incident> = Vec::new();

        let plan = create_plan(&spec, &status, &claims, &mut incidents);

        assert_eq!(
            plan.0,
            vec![
                Action::new(
                    ActionType::RemoveMember,
                    ServerGroup::Coordinators,
                    MemberRef::id("CRDN-2")
                ),
                Action::new(ActionType::AddMember, ServerGroup::Coordinators, MemberRef::New),
            ]
        );
    }

    #[test]
    fn test_failed_agent_keeps_its_identifier() {
        let status = create_status_with_members(
            ServerGroup::Agents,
            vec![MemberStatus::new("AGNT-1", MemberPhase::Failed)],
        );

        let plan = create_replace_failed_member_plan(&status);

        assert_eq!(plan.0[1].member, MemberRef::id("AGNT-1"));
    }

    #[test]
    fn test_scaling_precedes_storage_rotation() {
        let mut spec = create_defaulted_cluster_spec("example");
        spec.dbservers.storage_class_name = Some("fast".to_string());
        spec.coordinators.count = Some(4);
        let claims = claims_with_class("standard");
        let mut incidents: Vec<Incident> = Vec::new();

        let plan = create_plan(&spec, &full_cluster_status(), &claims, &mut incidents);

        assert_eq!(
            plan.0,
            vec![Action::new(
                ActionType::AddMember,
                ServerGroup::Coordinators,
                MemberRef::New
            )]
        );
    }

    #[test]
    fn test_storage_rotation_runs_when_nothing_else_to_do() {
        let mut spec = create_defaulted_cluster_spec("example");
        spec.dbservers.storage_class_name = Some("fast".to_string());
        let claims = claims_with_class("standard");
        let mut incidents: Vec<Incident> = Vec::new();

        let plan = create_plan(&spec, &full_cluster_status(), &claims, &mut incidents);

        assert_eq!(plan.len(), 5);
        assert_eq!(plan.0[2].member, MemberRef::id("PRMR-1"));
    }

    #[test]
    fn test_rotate_member_plan() {
        let member = create_created_member("PRMR-1", "dbserver-1");

        let plan = create_rotate_member_plan(&member, ServerGroup::DBServers, "Image changed");

        assert_eq!(
            plan.0,
            vec![
                Action::new(
                    ActionType::RotateMember,
                    ServerGroup::DBServers,
                    MemberRef::id("PRMR-1")
                )
                .with_reason("Image changed"),
                Action::new(
                    ActionType::WaitForMemberUp,
                    ServerGroup::DBServers,
                    MemberRef::id("PRMR-1")
                ),
            ]
        );
    }
}
