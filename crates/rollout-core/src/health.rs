use serde::Serialize;

use crate::runner::{execute, CommandRunner, CommandSpec};
use crate::tools::{Tool, ToolSet};

/// Outcome of the post-deploy snapshot. Purely informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub nodes_ok: bool,
    pub pods_ok: bool,
}

pub fn node_query(tools: &ToolSet) -> CommandSpec {
    CommandSpec::new(tools.path(Tool::Kubectl), ["get", "nodes", "-o", "wide"])
}

pub fn pod_query(tools: &ToolSet) -> CommandSpec {
    CommandSpec::new(
        tools.path(Tool::Kubectl),
        ["get", "pods", "--all-namespaces", "-o", "wide"],
    )
}

/// Print node and pod listings. Failures are reported and swallowed; this
/// never aborts a deployment.
pub fn report<R: CommandRunner + ?Sized>(runner: &mut R, tools: &ToolSet) -> HealthReport {
    runner.progress("\n=== Cluster Health Check ===");

    runner.progress("\nChecking node status...");
    let nodes_ok = match execute(runner, &node_query(tools)) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "node listing failed");
            runner.progress("Failed to fetch node status.");
            false
        }
    };

    runner.progress("\nChecking pod status across all namespaces...");
    let pods_ok = match execute(runner, &pod_query(tools)) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "pod listing failed");
            runner.progress("Failed to fetch pod status.");
            false
        }
    };

    HealthReport { nodes_ok, pods_ok }
}
