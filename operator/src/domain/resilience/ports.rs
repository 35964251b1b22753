use crate::domain::{
    deployment::entities::{deployment_spec::DeploymentSpec, status::DeploymentStatus},
    error::OperatorError,
};

/// Connection to a single member of the agency.
pub trait AgencyConnection: Send + Sync {
    fn member_id(&self) -> &str;

    /// Succeeds when the agent answers.
    fn ping(&self) -> impl Future<Output = Result<(), OperatorError>> + Send;
}

/// Cluster knowledge and write access offered to planners by the controller
/// that owns one deployment.
pub trait ResilienceContext: Send + Sync {
    type Agency: AgencyConnection;

    /// Spec as of the start of the pass.
    fn get_spec(&self) -> DeploymentSpec;

    /// Status as of the start of the pass.
    fn get_status(&self) -> DeploymentStatus;

    /// Replaces the status of the deployment. Unless `force` is set the write
    /// fails with [`OperatorError::StatusConflict`] when the deployment changed
    /// since the snapshot was taken.
    fn update_status(
        &self,
        status: DeploymentStatus,
        force: bool,
    ) -> impl Future<Output = Result<(), OperatorError>> + Send;

    /// Returns a connection for every agent, or only for the agents whose id
    /// matches `predicate` when one is given.
    fn get_agency_clients(
        &self,
        predicate: Option<&(dyn Fn(&str) -> bool + Sync)>,
    ) -> impl Future<Output = Result<Vec<Self::Agency>, OperatorError>> + Send;
}

pub trait ResilienceService: Send + Sync {
    /// Whether enough agents stay reachable to keep a quorum once `member_id`
    /// is gone. The agency size comes from the normalized `spec`.
    fn agency_has_quorum_without<R>(
        &self,
        ctx: &R,
        spec: &DeploymentSpec,
        member_id: &str,
    ) -> impl Future<Output = Result<bool, OperatorError>> + Send
    where
        R: ResilienceContext;
}
