use tracing::debug;

use crate::domain::{
    deployment::entities::{
        deployment_spec::DeploymentSpec,
        group::ServerGroup,
        mode::DeploymentMode,
        status::{DeploymentStatus, MemberStatusList},
    },
    reconcile::entities::{Action, ActionType, MemberRef, Plan},
};

/// Compares member counts with the spec for every scalable group and plans the
/// first difference found. Agents are never scaled: their count is fixed once
/// accepted.
pub fn create_scale_plan(spec: &DeploymentSpec, status: &DeploymentStatus) -> Plan {
    let mut targets: Vec<(ServerGroup, i32)> = Vec::new();
    match spec.get_mode() {
        DeploymentMode::Single => targets.push((ServerGroup::Single, 1)),
        DeploymentMode::ResilientSingle => {
            targets.push((ServerGroup::Single, spec.single.get_count()));
        }
        DeploymentMode::Cluster => {
            targets.push((ServerGroup::DBServers, spec.dbservers.get_count()));
            targets.push((ServerGroup::Coordinators, spec.coordinators.get_count()));
        }
    }
    for group in [ServerGroup::SyncMasters, ServerGroup::SyncWorkers] {
        if spec.is_group_used(group) {
            targets.push((group, spec.get_server_group_spec(group).get_count()));
        }
    }

    for (group, count) in targets {
        let plan = create_scale_group_plan(status.members.members_of(group), group, count);
        if !plan.is_empty() {
            return plan;
        }
    }
    Plan::default()
}

/// Scales up by adding every missing member at once; scales down one member at
/// a time.
fn create_scale_group_plan(members: &MemberStatusList, group: ServerGroup, count: i32) -> Plan {
    let current = members.len() as i32;
    let mut plan = Plan::default();

    if current < count {
        debug!(role = group.as_role(), current, count, "Creating scale-up plan");
        for _ in current..count {
            plan.push(Action::new(ActionType::AddMember, group, MemberRef::New));
        }
    } else if current > count {
        if let Some(member) = members.select_member_to_remove() {
            debug!(role = group.as_role(), id = %member.id, current, count, "Creating scale-down plan");
            let id = || MemberRef::id(&member.id);
            if group == ServerGroup::DBServers {
                plan.push(Action::new(ActionType::CleanOutMember, group, id()));
            }
            plan.push(Action::new(ActionType::ShutdownMember, group, id()));
            plan.push(Action::new(ActionType::RemoveMember, group, id()));
        }
    }
    plan
}
