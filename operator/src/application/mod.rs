use std::sync::Arc;

use kube::Client;
use tracing::{debug, error, info};

use crate::{
    application::deployment::controller::run_deployment_controller,
    domain::{
        common::{OperatorConfig, services::Service},
        error::OperatorError,
    },
    infrastructure::deployment::repositories::k8s::K8sDeploymentRepository,
};

pub mod deployment;

pub type OperatorService = Service<K8sDeploymentRepository>;
pub struct OperatorApp;

pub fn create_service(client: Client) -> OperatorService {
    let deployment_repository = K8sDeploymentRepository::new(client);

    Service::new(deployment_repository)
}

impl OperatorApp {
    pub async fn run(config: OperatorConfig) -> Result<(), OperatorError> {
        debug!("initializing kubernetes client...");
        let client = Client::try_default().await.map_err(|e| {
            error!("unable to create the Kubernetes client: {:?}", e);
            OperatorError::InternalServerError {
                message: format!("Kubernetes client error: {}", e),
            }
        })?;

        info!("kubernetes client initialized");

        let service = Arc::new(create_service(client.clone()));
        info!("service initialized");

        let deployment_controller = run_deployment_controller(client, service, &config);

        info!(
            namespace = config.namespace.as_deref().unwrap_or("*"),
            "deployment controller started"
        );

        tokio::select! {
            result = deployment_controller => {
                info!("Deployment controller has stopped.");
                result?;
            }
        }

        Ok(())
    }
}
