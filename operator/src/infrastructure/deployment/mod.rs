pub mod context;
pub mod repositories;
