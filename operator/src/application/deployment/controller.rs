use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use kube::{
    Api, Client, ResourceExt,
    runtime::{
        Controller,
        controller::Action,
        watcher,
    },
};
use tracing::{debug, info, warn};

use crate::{
    application::OperatorService,
    domain::{
        common::OperatorConfig,
        deployment::{
            entities::{
                deployment_ref::DeploymentRef, deployment_spec::ArangoDeployment,
                reconcile_outcome::ReconcileOutcome,
            },
            ports::DeploymentService,
        },
        error::OperatorError,
    },
    infrastructure::{
        agency::http::create_agency_http_client, deployment::context::K8sResilienceContext,
    },
};

const ERROR_REQUEUE: Duration = Duration::from_secs(60);

pub struct ControllerContext {
    client: Client,
    service: Arc<OperatorService>,
    agency_client: reqwest::Client,
    reconcile_interval: Duration,
}

pub async fn run_deployment_controller(
    client: Client,
    service: Arc<OperatorService>,
    config: &OperatorConfig,
) -> Result<(), OperatorError> {
    let deployments: Api<ArangoDeployment> = match &config.namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    };

    let context = Arc::new(ControllerContext {
        client,
        service,
        agency_client: create_agency_http_client(config.agency_timeout)?,
        reconcile_interval: config.reconcile_interval,
    });

    Controller::new(deployments, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((deployment, _)) => debug!(deployment = deployment.name.as_str(), "reconciled"),
                Err(e) => warn!(error = %e, "reconcile failed"),
            }
        })
        .await;

    Ok(())
}

fn deployment_ref(deployment: &ArangoDeployment) -> DeploymentRef {
    let mut deployment_ref =
        DeploymentRef::new(deployment.name_any(), deployment.namespace().unwrap_or_default());
    deployment_ref.uid = deployment.uid();
    deployment_ref
}

/// Hands the plan over to the executor. Execution is not performed here; each
/// action is logged so it can be traced.
fn emit_plan(deployment: &DeploymentRef, outcome: &ReconcileOutcome) {
    if outcome.plan.is_empty() {
        debug!(deployment = deployment.name.as_str(), "Deployment is up to date");
        return;
    }

    info!(
        deployment = deployment.name.as_str(),
        actions = outcome.plan.len(),
        "Created plan"
    );
    for (index, action) in outcome.plan.iter().enumerate() {
        info!(
            deployment = deployment.name.as_str(),
            index,
            action = %action,
            reason = action.reason.as_deref().unwrap_or(""),
            "Planned action"
        );
    }
}

async fn reconcile(
    deployment: Arc<ArangoDeployment>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, OperatorError> {
    let deployment_ref = deployment_ref(&deployment);
    debug!(
        deployment = deployment_ref.name.as_str(),
        namespace = deployment_ref.namespace.as_str(),
        "Reconciling deployment"
    );

    let resilience =
        K8sResilienceContext::new(ctx.client.clone(), ctx.agency_client.clone(), deployment);
    let outcome = ctx
        .service
        .reconcile_deployment(&resilience, &deployment_ref)
        .await?;

    emit_plan(&deployment_ref, &outcome);
    Ok(Action::requeue(ctx.reconcile_interval))
}

fn error_policy(
    deployment: Arc<ArangoDeployment>,
    error: &OperatorError,
    _ctx: Arc<ControllerContext>,
) -> Action {
    warn!(
        deployment = deployment.name_any().as_str(),
        error = %error,
        "Reconciliation failed"
    );
    Action::requeue(ERROR_REQUEUE)
}
