use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::deployment::entities::group::ServerGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    AddMember,
    RemoveMember,
    CleanOutMember,
    ShutdownMember,
    RotateMember,
    /// Executor waits (with its own timeout) until the member reports ready.
    WaitForMemberUp,
}

/// Member an action applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberRef {
    /// An existing (or re-used) member identifier.
    Id(String),
    /// A member that does not exist yet; the executor generates its identifier.
    New,
    /// The identifier produced by the immediately preceding action, resolved by
    /// the executor when it applies the plan.
    PreviousAction,
}

impl MemberRef {
    pub fn id(id: impl Into<String>) -> Self {
        MemberRef::Id(id.into())
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRef::Id(id) => f.write_str(id),
            MemberRef::New => f.write_str("<new>"),
            MemberRef::PreviousAction => f.write_str("<previous>"),
        }
    }
}

/// One planned step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub action_type: ActionType,
    pub group: ServerGroup,
    pub member: MemberRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Action {
    pub fn new(action_type: ActionType, group: ServerGroup, member: MemberRef) -> Self {
        Self {
            action_type,
            group,
            member,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({} {})", self.action_type, self.group, self.member)
    }
}

/// Ordered actions computed for one reconciliation pass. Empty means nothing
/// to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan(pub Vec<Action>);

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&Action> {
        self.0.first()
    }

    pub fn push(&mut self, action: Action) {
        self.0.push(action);
    }

    #[cfg(test)]
    pub fn action_types(&self) -> Vec<ActionType> {
        self.0.iter().map(|a| a.action_type).collect()
    }
}

impl From<Vec<Action>> for Plan {
    fn from(actions: Vec<Action>) -> Self {
        Self(actions)
    }
}

impl Extend<Action> for Plan {
    fn extend<T: IntoIterator<Item = Action>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Plan {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentReason {
    CannotChangeStorageClass,
    ClaimReadFailed,
    AgencyQuorumAtRisk,
}

impl IncidentReason {
    /// Stable reason code attached to the published event.
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentReason::CannotChangeStorageClass => "CannotChangeStorageClass",
            IncidentReason::ClaimReadFailed => "ClaimReadFailed",
            IncidentReason::AgencyQuorumAtRisk => "AgencyQuorumAtRisk",
        }
    }
}

/// Something a planner could not turn into actions, reported to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub reason: IncidentReason,
    pub member_id: String,
    pub role: String,
    pub message: String,
}

impl Incident {
    pub fn cannot_change_storage_class(member_id: &str, group: ServerGroup, cause: &str) -> Self {
        Self {
            reason: IncidentReason::CannotChangeStorageClass,
            member_id: member_id.to_string(),
            role: group.as_role().to_string(),
            message: format!(
                "Member {} with role {} cannot change its storage class ({})",
                member_id,
                group.as_role(),
                cause
            ),
        }
    }

    pub fn claim_read_failed(member_id: &str, group: ServerGroup, cause: &str) -> Self {
        Self {
            reason: IncidentReason::ClaimReadFailed,
            member_id: member_id.to_string(),
            role: group.as_role().to_string(),
            message: format!(
                "Failed to read the volume claim of member {} with role {} ({})",
                member_id,
                group.as_role(),
                cause
            ),
        }
    }

    pub fn agency_quorum_at_risk(member_id: &str, group: ServerGroup) -> Self {
        Self {
            reason: IncidentReason::AgencyQuorumAtRisk,
            member_id: member_id.to_string(),
            role: group.as_role().to_string(),
            message: format!(
                "Member {} with role {} cannot be shut down without losing the agency quorum",
                member_id,
                group.as_role()
            ),
        }
    }
}
