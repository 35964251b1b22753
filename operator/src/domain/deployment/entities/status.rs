use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::deployment::entities::{deployment_spec::DeploymentSpec, group::ServerGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum DeploymentPhase {
    #[default]
    #[serde(rename = "")]
    None,
    Running,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum MemberPhase {
    /// Known to the status, no pod yet.
    #[default]
    #[serde(rename = "")]
    None,
    Pending,
    Creating,
    /// Pod created and in use.
    Created,
    Failed,
    CleanOut,
    ShuttingDown,
    Rotating,
    Upgrading,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberStatus {
    pub id: String,
    #[serde(default)]
    pub phase: MemberPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_name: Option<String>,
}

impl MemberStatus {
    pub fn new(id: impl Into<String>, phase: MemberPhase) -> Self {
        Self {
            id: id.into(),
            phase,
            ..Default::default()
        }
    }

    /// Claim name, if the member owns a non-empty one.
    pub fn claim_name(&self) -> Option<&str> {
        self.persistent_volume_claim_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct MemberStatusList(pub Vec<MemberStatus>);

impl MemberStatusList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MemberStatus> {
        self.0.iter()
    }

    /// Picks the member to drop when scaling down: a member that never got a
    /// pod if there is one, otherwise the most recently listed created member.
    pub fn select_member_to_remove(&self) -> Option<&MemberStatus> {
        self.0
            .iter()
            .find(|m| m.phase == MemberPhase::None)
            .or_else(|| {
                self.0
                    .iter()
                    .rev()
                    .find(|m| m.phase == MemberPhase::Created)
            })
    }
}

impl From<Vec<MemberStatus>> for MemberStatusList {
    fn from(members: Vec<MemberStatus>) -> Self {
        Self(members)
    }
}

impl<'a> IntoIterator for &'a MemberStatusList {
    type Item = &'a MemberStatus;
    type IntoIter = std::slice::Iter<'a, MemberStatus>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeploymentStatusMembers {
    #[serde(default, skip_serializing_if = "MemberStatusList::is_empty")]
    pub single: MemberStatusList,
    #[serde(default, skip_serializing_if = "MemberStatusList::is_empty")]
    pub agents: MemberStatusList,
    #[serde(default, skip_serializing_if = "MemberStatusList::is_empty")]
    pub dbservers: MemberStatusList,
    #[serde(default, skip_serializing_if = "MemberStatusList::is_empty")]
    pub coordinators: MemberStatusList,
    #[serde(default, skip_serializing_if = "MemberStatusList::is_empty")]
    pub syncmasters: MemberStatusList,
    #[serde(default, skip_serializing_if = "MemberStatusList::is_empty")]
    pub syncworkers: MemberStatusList,
}

impl DeploymentStatusMembers {
    pub fn members_of(&self, group: ServerGroup) -> &MemberStatusList {
        match group {
            ServerGroup::Single => &self.single,
            ServerGroup::Agents => &self.agents,
            ServerGroup::DBServers => &self.dbservers,
            ServerGroup::Coordinators => &self.coordinators,
            ServerGroup::SyncMasters => &self.syncmasters,
            ServerGroup::SyncWorkers => &self.syncworkers,
        }
    }

    /// Every group with its members, in [`ServerGroup::ALL`] order.
    pub fn iter_groups(&self) -> impl Iterator<Item = (ServerGroup, &MemberStatusList)> {
        ServerGroup::ALL
            .into_iter()
            .map(move |group| (group, self.members_of(group)))
    }
}

/// Observed state of a deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    #[serde(default)]
    pub phase: DeploymentPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub members: DeploymentStatusMembers,
    /// Last spec that passed validation; the reference for immutable fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_spec: Option<DeploymentSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_member_to_remove_prefers_members_without_pod() {
        let list = MemberStatusList::from(vec![
            MemberStatus::new("a", MemberPhase::Created),
            MemberStatus::new("b", MemberPhase::None),
            MemberStatus::new("c", MemberPhase::Created),
        ]);

        assert_eq!(list.select_member_to_remove().map(|m| m.id.as_str()), Some("b"));
    }

    #[test]
    fn test_select_member_to_remove_falls_back_to_last_created() {
        let list = MemberStatusList::from(vec![
            MemberStatus::new("a", MemberPhase::Created),
            MemberStatus::new("b", MemberPhase::Created),
            MemberStatus::new("c", MemberPhase::Failed),
        ]);

        assert_eq!(list.select_member_to_remove().map(|m| m.id.as_str()), Some("b"));
        assert!(MemberStatusList::default().select_member_to_remove().is_none());
    }

    #[test]
    fn test_iter_groups_uses_fixed_order() {
        let groups: Vec<ServerGroup> = DeploymentStatusMembers::default()
            .iter_groups()
            .map(|(group, _)| group)
            .collect();

        assert_eq!(groups, ServerGroup::ALL.to_vec());
    }

    #[test]
    fn test_member_wire_format() {
        let member: MemberStatus = serde_json::from_value(serde_json::json!({
            "id": "PRMR-abc",
            "phase": "Created",
            "persistentVolumeClaimName": "example-dbserver-abc",
            "podName": "example-prmr-abc"
        }))
        .unwrap();

        assert_eq!(member.phase, MemberPhase::Created);
        assert_eq!(member.claim_name(), Some("example-dbserver-abc"));

        let none: MemberStatus = serde_json::from_value(serde_json::json!({
            "id": "x",
            "phase": "",
            "persistentVolumeClaimName": ""
        }))
        .unwrap();
        assert_eq!(none.phase, MemberPhase::None);
        assert_eq!(none.claim_name(), None);
    }
}
