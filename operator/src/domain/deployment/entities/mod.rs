pub mod authentication;
pub mod bootstrap;
pub mod deployment_ref;
pub mod deployment_spec;
pub(crate) mod duration;
pub mod group;
pub mod mode;
pub mod reconcile_outcome;
pub mod server_group_spec;
pub mod status;
pub mod sync;
pub mod tls;
