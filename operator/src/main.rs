use clap::Parser;
use kube::CustomResourceExt;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    application::OperatorApp,
    args::{Args, Command},
    domain::{
        common::{OperatorConfig, RuntimeEnvironment},
        deployment::entities::deployment_spec::ArangoDeployment,
    },
};

mod application;
mod args;
mod domain;
mod infrastructure;

fn init_tracing(env: RuntimeEnvironment) {
    let json = env == RuntimeEnvironment::Production;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arangodb_operator=info,kube=warn".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(Command::Crd) = args.command {
        print!("{}", serde_yaml::to_string(&ArangoDeployment::crd())?);
        return Ok(());
    }

    let config = OperatorConfig::from(args);
    init_tracing(config.env);

    OperatorApp::run(config).await?;
    Ok(())
}
