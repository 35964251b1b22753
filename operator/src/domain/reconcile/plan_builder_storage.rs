use tracing::{debug, warn};

use crate::domain::{
    deployment::entities::{
        deployment_spec::DeploymentSpec,
        group::ServerGroup,
        mode::DeploymentMode,
        status::{DeploymentStatus, MemberPhase, MemberStatus},
    },
    reconcile::{
        entities::{Action, ActionType, Incident, MemberRef, Plan},
        plan_builder::create_rotate_member_plan,
        ports::{ClaimInspector, IncidentRecorder},
    },
};

/// Plans the rotation of one server whose volume no longer matches its group
/// spec: either the storage class changed (the member is replaced) or the
/// claim waits for a filesystem resize (the member is restarted).
///
/// At most one member is handled per call.
pub fn create_rotate_server_storage_plan<C, R>(
    spec: &DeploymentSpec,
    status: &DeploymentStatus,
    claims: &C,
    incidents: &mut R,
) -> Plan
where
    C: ClaimInspector + ?Sized,
    R: IncidentRecorder + ?Sized,
{
    if spec.get_mode() == DeploymentMode::Single {
        // A single server cannot be rotated without downtime.
        return Plan::default();
    }

    for (group, members) in status.members.iter_groups() {
        for member in members {
            if member.phase != MemberPhase::Created {
                continue;
            }
            let Some(claim_name) = member.claim_name() else {
                continue;
            };

            let storage_class_name = spec.get_server_group_spec(group).get_storage_class_name();
            let claim = match claims.get_claim(claim_name) {
                Ok(claim) => claim,
                Err(e) => {
                    warn!(
                        role = group.as_role(),
                        id = %member.id,
                        error = %e,
                        "Failed to get PVC"
                    );
                    incidents.record(Incident::claim_read_failed(
                        &member.id,
                        group,
                        &e.to_string(),
                    ));
                    continue;
                }
            };

            let replacement_needed = !storage_class_name.is_empty()
                && claim.get_storage_class_name() != storage_class_name;

            if replacement_needed {
                debug!(
                    pod_name = member.pod_name.as_deref().unwrap_or(""),
                    pvc_storage_class = claim.get_storage_class_name(),
                    group_storage_class = storage_class_name,
                    "Storage class has changed - pod needs replacement"
                );
                if !group.can_change_storage_class() {
                    incidents.record(Incident::cannot_change_storage_class(
                        &member.id,
                        group,
                        "Not supported",
                    ));
                    continue;
                }
                return create_replace_member_plan(member, group);
            }

            if claim.file_system_resize_pending {
                return create_rotate_member_plan(member, group, "Filesystem resize pending");
            }
        }
    }

    Plan::default()
}

/// Replaces `member` by a fresh one on newly provisioned storage.
///
/// Agents are replaced in place under their old identifier so the agency never
/// grows beyond its agreed size. Every other group scales up first and only
/// then removes the old member; dbservers move their data off before shutdown.
pub fn create_replace_member_plan(member: &MemberStatus, group: ServerGroup) -> Plan {
    let old = || MemberRef::id(&member.id);

    let actions = match group {
        ServerGroup::Agents => vec![
            Action::new(ActionType::ShutdownMember, group, old()),
            Action::new(ActionType::RemoveMember, group, old()),
            Action::new(ActionType::AddMember, group, old()),
            Action::new(ActionType::WaitForMemberUp, group, old()),
        ],
        ServerGroup::DBServers => vec![
            Action::new(ActionType::AddMember, group, MemberRef::New),
            Action::new(ActionType::WaitForMemberUp, group, MemberRef::PreviousAction),
            Action::new(ActionType::CleanOutMember, group, old()),
            Action::new(ActionType::ShutdownMember, group, old()),
            Action::new(ActionType::RemoveMember, group, old()),
        ],
        _ => vec![
            Action::new(ActionType::AddMember, group, MemberRef::New),
            Action::new(ActionType::WaitForMemberUp, group, MemberRef::PreviousAction),
            Action::new(ActionType::ShutdownMember, group, old()),
            Action::new(ActionType::RemoveMember, group, old()),
        ],
    };
    Plan::from(actions)
}
