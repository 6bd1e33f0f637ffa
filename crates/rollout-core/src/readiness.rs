//! Bounded polling for the ingress controller pod.
//!
//! The poller asks kubectl for the phase of the first pod matching the
//! controller selector, at a fixed interval, until it reports `Running` or the
//! timeout elapses. A failing query (pod not scheduled yet, API hiccup) counts
//! as "not ready", never as an error.

use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{Result, RolloutError};
use crate::runner::{CommandRunner, CommandSpec};
use crate::tools::{Tool, ToolSet};

pub const RUNNING_PHASE: &str = "Running";

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of time for the poll loop.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// ---------------------------------------------------------------------------
// ReadinessTarget / PollState
// ---------------------------------------------------------------------------

/// The pod whose phase is polled.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReadinessTarget {
    pub namespace: String,
    pub selector: String,
    pub expected: String,
    pub timeout: Duration,
    pub interval: Duration,
}

impl ReadinessTarget {
    pub fn ingress_controller(config: &Config) -> Self {
        Self {
            namespace: config.ingress.namespace.clone(),
            selector: config.ingress.controller_selector.clone(),
            expected: RUNNING_PHASE.to_string(),
            timeout: config.readiness.timeout(),
            interval: config.readiness.interval(),
        }
    }

    pub fn query(&self, tools: &ToolSet) -> CommandSpec {
        CommandSpec::new(
            tools.path(Tool::Kubectl),
            [
                "get",
                "pods",
                "-n",
                self.namespace.as_str(),
                "-l",
                self.selector.as_str(),
                "-o",
                "jsonpath={.items[0].status.phase}",
            ],
        )
    }
}

#[derive(Debug, Clone)]
pub struct PollState {
    started: Instant,
    timeout: Duration,
    pub attempts: u32,
}

impl PollState {
    pub fn start(now: Instant, timeout: Duration) -> Self {
        Self {
            started: now,
            timeout,
            attempts: 0,
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    pub fn expired(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.timeout
    }
}

// ---------------------------------------------------------------------------
// wait_until_ready
// ---------------------------------------------------------------------------

/// Poll until the target reports its expected phase.
///
/// Returns the number of queries issued. Fails with
/// [`RolloutError::ReadinessTimeout`] once the elapsed time reaches the
/// target's timeout.
pub fn wait_until_ready<R, C>(
    runner: &mut R,
    clock: &mut C,
    tools: &ToolSet,
    target: &ReadinessTarget,
) -> Result<u32>
where
    R: CommandRunner + ?Sized,
    C: Clock + ?Sized,
{
    runner.progress(&format!(
        "\nChecking if Ingress Controller is running in namespace '{}'...",
        target.namespace
    ));
    let query = target.query(tools);
    let mut state = PollState::start(clock.now(), target.timeout);

    while !state.expired(clock.now()) {
        state.attempts += 1;
        match runner.capture(&query) {
            Ok(out) if out.success() => {
                let status = out.stdout.trim();
                if status == target.expected {
                    runner.progress("Ingress Controller is running.");
                    tracing::info!(attempts = state.attempts, "ingress controller ready");
                    return Ok(state.attempts);
                }
                runner.progress(&format!(
                    "  Ingress controller pod status: {status} ... waiting"
                ));
            }
            Ok(out) => {
                tracing::debug!(code = ?out.code, stderr = %out.stderr.trim(), "controller query failed");
                runner.progress("  Waiting for ingress controller pod to appear...");
            }
            Err(e) => {
                tracing::debug!(error = %e, "controller query failed");
                runner.progress("  Waiting for ingress controller pod to appear...");
            }
        }
        clock.sleep(target.interval);
    }

    runner.progress("Timeout: Ingress controller did not become ready in time.");
    Err(RolloutError::ReadinessTimeout {
        namespace: target.namespace.clone(),
        timeout_secs: target.timeout.as_secs(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
