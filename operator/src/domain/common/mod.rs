use std::time::Duration;

pub mod services;

#[derive(Debug, Clone)]
pub struct OperatorConfig {
    pub env: RuntimeEnvironment,
    /// Namespace to watch; all namespaces when absent.
    pub namespace: Option<String>,
    pub reconcile_interval: Duration,
    pub agency_timeout: Duration,
}

/// Environment the operator process itself runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    Test,
    Development,
    Production,
}
