pub mod check;
pub mod cluster;
pub mod config;
pub mod deploy;
pub mod plan;
