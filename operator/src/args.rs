use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::common::{OperatorConfig, RuntimeEnvironment};

#[derive(Debug, Clone, Parser)]
#[command(name = "arangodb-operator", version, about = "Kubernetes operator for ArangoDB deployments")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(long, env = "OPERATOR_ENVIRONMENT", value_enum, default_value_t = Environment::Development)]
    pub environment: Environment,

    /// Namespace to watch. All namespaces when omitted.
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub namespace: Option<String>,

    #[arg(long, env = "RECONCILE_INTERVAL", default_value = "30s")]
    pub reconcile_interval: humantime::Duration,

    /// Timeout of a single agency health check.
    #[arg(long, env = "AGENCY_TIMEOUT", default_value = "5s")]
    pub agency_timeout: humantime::Duration,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Watch ArangoDeployment resources and reconcile them (default)
    Run,
    /// Print the ArangoDeployment CustomResourceDefinition as YAML
    Crd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Test,
    Development,
    Production,
}

impl From<Environment> for RuntimeEnvironment {
    fn from(value: Environment) -> Self {
        match value {
            Environment::Test => RuntimeEnvironment::Test,
            Environment::Development => RuntimeEnvironment::Development,
            Environment::Production => RuntimeEnvironment::Production,
        }
    }
}

impl From<Args> for OperatorConfig {
    fn from(args: Args) -> Self {
        OperatorConfig {
            env: args.environment.into(),
            namespace: args.namespace.filter(|ns| !ns.is_empty()),
            reconcile_interval: args.reconcile_interval.into(),
            agency_timeout: args.agency_timeout.into(),
        }
    }
}
