//! Walks a deployment plan step by step.
//!
//! Execution is strictly sequential. The first fatal failure is returned to
//! the caller as-is; nothing already applied is rolled back.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::connectivity::{verify_isolation, IsolationVerdict};
use crate::error::Result;
use crate::health::{self, HealthReport};
use crate::plan::{deployment_plan, StageGroup, Step};
use crate::readiness::{wait_until_ready, Clock};
use crate::runner::{execute, CommandRunner, CommandSpec};
use crate::tools::ToolSet;

/// What happened during a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    /// Names of the steps that ran, in order.
    pub steps: Vec<String>,
    /// Whether an interactive `az login` was needed.
    pub logged_in: bool,
    pub readiness_attempts: Option<u32>,
    pub health: Option<HealthReport>,
    pub isolation: Option<IsolationVerdict>,
}

pub struct Pipeline<'a, R: ?Sized, C: ?Sized> {
    runner: &'a mut R,
    clock: &'a mut C,
    tools: &'a ToolSet,
}

impl<'a, R, C> Pipeline<'a, R, C>
where
    R: CommandRunner + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(runner: &'a mut R, clock: &'a mut C, tools: &'a ToolSet) -> Self {
        Self {
            runner,
            clock,
            tools,
        }
    }

    pub fn run(&mut self, steps: &[Step]) -> Result<DeployReport> {
        let mut report = DeployReport::default();
        let mut group: Option<StageGroup> = None;
        let mut deployed = false;

        for step in steps {
            tracing::debug!(step = step.name(), "starting step");
            match step {
                Step::Authenticate { check, login } => {
                    report.logged_in = self.authenticate(check, login)?;
                }
                Step::Run(stage) => {
                    if group != Some(stage.group) {
                        self.runner.progress(&format!("\n{}", stage.group.heading()));
                        group = Some(stage.group);
                    }
                    execute(self.runner, &stage.command)?;
                }
                Step::AwaitReady(target) => {
                    let attempts = wait_until_ready(self.runner, self.clock, self.tools, target)?;
                    report.readiness_attempts = Some(attempts);
                }
                Step::HealthReport => {
                    announce_deployed(self.runner, &mut deployed);
                    report.health = Some(health::report(self.runner, self.tools));
                }
                Step::VerifyIsolation(probe) => {
                    announce_deployed(self.runner, &mut deployed);
                    report.isolation = Some(verify_isolation(self.runner, self.tools, probe));
                }
            }
            report.steps.push(step.name().to_string());
        }

        Ok(report)
    }

    /// Returns `true` when `login` had to run.
    fn authenticate(&mut self, check: &CommandSpec, login: &CommandSpec) -> Result<bool> {
        self.runner.progress("\nLogging into Azure...");
        match self.runner.capture(check) {
            Ok(out) if out.success() => {
                tracing::info!("existing cloud session found");
                Ok(false)
            }
            Ok(out) => {
                tracing::info!(code = ?out.code, "no cloud session, logging in");
                execute(self.runner, login)?;
                Ok(true)
            }
            Err(e) => {
                tracing::info!(error = %e, "session check failed, logging in");
                execute(self.runner, login)?;
                Ok(true)
            }
        }
    }
}

fn announce_deployed<R: CommandRunner + ?Sized>(runner: &mut R, deployed: &mut bool) {
    if !*deployed {
        runner.progress("\nAll resources deployed successfully.");
        *deployed = true;
    }
}

/// Full run: resolve every tool through `lookup`, then build and execute the
/// plan.
///
/// Tools are resolved before anything else, so a missing tool means no
/// command is ever issued.
pub fn deploy<L, R, C>(
    config: &Config,
    root: &Path,
    lookup: L,
    runner: &mut R,
    clock: &mut C,
) -> Result<DeployReport>
where
    L: FnMut(&str) -> Option<PathBuf>,
    R: CommandRunner + ?Sized,
    C: Clock + ?Sized,
{
    runner.progress("Checking prerequisites...");
    let tools = ToolSet::resolve_reporting(lookup, |tool, path| {
        runner.progress(&format!("Found {tool}: {}", path.display()))
    })?;
    runner.progress(&format!("ROOT_DIR = {}", root.display()));

    let steps = deployment_plan(config, &tools, root);
    let mut report = Pipeline::new(runner, clock, &tools).run(&steps)?;
    report.steps.insert(0, "resolve-tools".to_string());
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
