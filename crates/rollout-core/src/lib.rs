pub mod config;
pub mod connectivity;
pub mod error;
pub mod health;
pub mod paths;
pub mod pipeline;
pub mod plan;
pub mod readiness;
pub mod runner;
pub mod tools;

pub use error::{Result, RolloutError};
