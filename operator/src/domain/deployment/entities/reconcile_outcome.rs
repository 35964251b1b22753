use crate::domain::{
    deployment::entities::deployment_spec::DeploymentSpec,
    reconcile::entities::{Incident, Plan},
};

/// Result of one reconciliation pass, handed to the executor.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// Normalized spec the plan was built against.
    pub spec: DeploymentSpec,
    pub plan: Plan,
    /// Immutable fields that were healed back to their accepted values.
    pub reset_fields: Vec<String>,
    pub incidents: Vec<Incident>,
}
