use std::fmt;

use serde::{Deserialize, Serialize};

/// Role-homogeneous subset of the members of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerGroup {
    Single,
    Agents,
    DBServers,
    Coordinators,
    SyncMasters,
    SyncWorkers,
}

impl ServerGroup {
    /// Every group, in the order planners visit them.
    pub const ALL: [ServerGroup; 6] = [
        ServerGroup::Single,
        ServerGroup::Agents,
        ServerGroup::DBServers,
        ServerGroup::Coordinators,
        ServerGroup::SyncMasters,
        ServerGroup::SyncWorkers,
    ];

    /// Role label used in pod names, labels and events.
    pub fn as_role(&self) -> &'static str {
        match self {
            ServerGroup::Single => "single",
            ServerGroup::Agents => "agent",
            ServerGroup::DBServers => "dbserver",
            ServerGroup::Coordinators => "coordinator",
            ServerGroup::SyncMasters => "syncmaster",
            ServerGroup::SyncWorkers => "syncworker",
        }
    }

    /// Name of the group's field in the deployment spec.
    pub fn as_field(&self) -> &'static str {
        match self {
            ServerGroup::Single => "single",
            ServerGroup::Agents => "agents",
            ServerGroup::DBServers => "dbservers",
            ServerGroup::Coordinators => "coordinators",
            ServerGroup::SyncMasters => "syncmasters",
            ServerGroup::SyncWorkers => "syncworkers",
        }
    }

    /// Whether members of the group may be replaced to move them onto another
    /// storage class.
    pub fn can_change_storage_class(&self) -> bool {
        matches!(self, ServerGroup::Agents | ServerGroup::DBServers)
    }
}

impl fmt::Display for ServerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_role())
    }
}
