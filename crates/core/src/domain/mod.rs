pub mod factory;
pub mod requirement;
