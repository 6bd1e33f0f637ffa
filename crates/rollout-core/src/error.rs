use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("{tool} not found. Please install it and ensure it is in your PATH.")]
    ToolNotFound { tool: String },

    #[error("empty command: no program given")]
    EmptyCommand,

    #[error("working directory does not exist: {}", .0.display())]
    MissingWorkingDir(PathBuf),

    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed ({}): {command}", exit_label(.code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Timeout: ingress controller in namespace '{namespace}' did not become ready within {timeout_secs}s")]
    ReadinessTimeout { namespace: String, timeout_secs: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "terminated by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, RolloutError>;
