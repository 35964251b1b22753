pub mod entities;
pub mod plan_builder;
pub mod plan_builder_scale;
pub mod plan_builder_storage;
pub mod ports;
