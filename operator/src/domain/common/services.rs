use crate::domain::deployment::ports::DeploymentRepository;

#[derive(Clone)]
pub struct Service<D>
where
    D: DeploymentRepository,
{
    pub(crate) deployment_repository: D,
}

impl<D> Service<D>
where
    D: DeploymentRepository,
{
    pub fn new(deployment_repository: D) -> Self {
        Service {
            deployment_repository,
        }
    }
}
