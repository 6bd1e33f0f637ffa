//! Empirical check of the service A to service B network policy.
//!
//! A throwaway pod labelled as service A tries to reach service B. Its exit
//! code is the only signal: zero means the request went through. A probe that
//! never scheduled, or a kubectl that failed to launch, looks the same as a
//! blocked request. [`BlockReason`] records which of the two was observed but
//! both produce [`IsolationVerdict::Blocked`].

use serde::Serialize;

use crate::config::ProbeConfig;
use crate::runner::{CommandRunner, CommandSpec};
use crate::tools::{Tool, ToolSet};

/// Banner kubectl prints when attaching to a pod; noise in captured stderr.
const ATTACH_BANNER: &str = "If you don't see a command prompt, try pressing enter.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum BlockReason {
    NonZeroExit(Option<i32>),
    ProbeError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "verdict")]
pub enum IsolationVerdict {
    /// The probe reached the target: the policy is not enforced.
    Reachable,
    Blocked { reason: BlockReason },
}

impl IsolationVerdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, IsolationVerdict::Blocked { .. })
    }
}

pub fn probe_command(tools: &ToolSet, probe: &ProbeConfig) -> CommandSpec {
    let wget = format!(
        "wget --timeout={} --spider {}",
        probe.timeout_seconds, probe.target_url
    );
    CommandSpec::new(
        tools.path(Tool::Kubectl),
        [
            "run".to_string(),
            probe.name.clone(),
            "--rm".to_string(),
            "-i".to_string(),
            "--tty".to_string(),
            format!("--image={}", probe.image),
            format!("--labels={}", probe.labels),
            "--restart=Never".to_string(),
            "--".to_string(),
            "/bin/sh".to_string(),
            "-c".to_string(),
            wget,
        ],
    )
}

fn clean_stderr(stderr: &str) -> String {
    stderr.replace(ATTACH_BANNER, "").trim().to_string()
}

/// Launch the probe pod and interpret its exit code. Never fails.
pub fn verify_isolation<R: CommandRunner + ?Sized>(
    runner: &mut R,
    tools: &ToolSet,
    probe: &ProbeConfig,
) -> IsolationVerdict {
    runner.progress(&format!(
        "\nVerifying network isolation: {} -> {} should be blocked...",
        probe.labels, probe.target_url
    ));

    // Captured with a null stdin, so kubectl falls back from --tty with a
    // warning on stderr. Only the exit code decides the verdict.
    let verdict = match runner.capture(&probe_command(tools, probe)) {
        Ok(out) if out.success() => IsolationVerdict::Reachable,
        Ok(out) => {
            let stderr = clean_stderr(&out.stderr);
            if !stderr.is_empty() {
                tracing::debug!(stderr = %stderr, "probe stderr");
            }
            IsolationVerdict::Blocked {
                reason: BlockReason::NonZeroExit(out.code),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "error verifying network policy");
            IsolationVerdict::Blocked {
                reason: BlockReason::ProbeError(e.to_string()),
            }
        }
    };

    match &verdict {
        IsolationVerdict::Reachable => runner.progress(&format!(
            "WARNING: {} was able to reach {}! Network policy is NOT blocking traffic.",
            probe.labels, probe.target_url
        )),
        IsolationVerdict::Blocked {
            reason: BlockReason::NonZeroExit(_),
        } => runner.progress(&format!(
            "{} cannot access {}. Network policy is working.",
            probe.labels, probe.target_url
        )),
        IsolationVerdict::Blocked {
            reason: BlockReason::ProbeError(msg),
        } => runner.progress(&format!(
            "Network policy working: access was blocked or probe failed to start ({msg})."
        )),
    }

    verdict
}
