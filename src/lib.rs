pub mod config;
pub mod fetch;
pub mod publish;
pub mod transform;
