pub mod common;
pub mod deployment;
pub mod error;
pub mod reconcile;
pub mod resilience;
