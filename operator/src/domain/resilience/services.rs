use tracing::{debug, warn};

use crate::domain::{
    common::services::Service,
    deployment::{entities::deployment_spec::DeploymentSpec, ports::DeploymentRepository},
    error::OperatorError,
    resilience::ports::{AgencyConnection, ResilienceContext, ResilienceService},
};

impl<D> ResilienceService for Service<D>
where
    D: DeploymentRepository,
{
    async fn agency_has_quorum_without<R>(
        &self,
        ctx: &R,
        spec: &DeploymentSpec,
        member_id: &str,
    ) -> Result<bool, OperatorError>
    where
        R: ResilienceContext,
    {
        let agency_size = spec
            .agents
            .get_count()
            .max(ctx.get_status().members.agents.len() as i32);
        let quorum = agency_size / 2 + 1;

        let others: &(dyn Fn(&str) -> bool + Sync) = &|id: &str| id != member_id;
        let agents = ctx.get_agency_clients(Some(others)).await?;

        let mut reachable = 0;
        for agent in &agents {
            match agent.ping().await {
                Ok(()) => reachable += 1,
                Err(e) => warn!(id = agent.member_id(), error = %e, "Agent is not reachable"),
            }
        }

        debug!(
            excluded = member_id,
            reachable, quorum, "Checked agency quorum"
        );
        Ok(reachable >= quorum)
    }
}
