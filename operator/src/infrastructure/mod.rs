pub mod agency;
pub mod deployment;
