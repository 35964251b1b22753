use crate::domain::{
    deployment::entities::{deployment_ref::DeploymentRef, reconcile_outcome::ReconcileOutcome},
    error::OperatorError,
    reconcile::{entities::Incident, ports::ClaimState},
    resilience::ports::ResilienceContext,
};

pub trait DeploymentService: Send + Sync {
    /// Runs one reconciliation pass for `deployment` and returns the plan the
    /// executor should apply next.
    fn reconcile_deployment<R>(
        &self,
        ctx: &R,
        deployment: &DeploymentRef,
    ) -> impl Future<Output = Result<ReconcileOutcome, OperatorError>> + Send
    where
        R: ResilienceContext;
}

#[cfg_attr(test, mockall::automock)]
pub trait DeploymentRepository: Send + Sync {
    fn get_claim(
        &self,
        namespace: &str,
        claim_name: &str,
    ) -> impl Future<Output = Result<ClaimState, OperatorError>> + Send;
    fn publish_incident(
        &self,
        deployment: &DeploymentRef,
        incident: &Incident,
    ) -> impl Future<Output = Result<(), OperatorError>> + Send;
}
