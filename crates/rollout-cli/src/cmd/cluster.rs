//! Post-deploy commands that only talk to the cluster through kubectl.

use crate::output::{console, print_json};
use anyhow::Context;
use rollout_core::config::Config;
use rollout_core::connectivity::verify_isolation;
use rollout_core::health;
use rollout_core::readiness::{wait_until_ready, ReadinessTarget, SystemClock};
use rollout_core::runner::SystemRunner;
use rollout_core::tools::{Tool, ToolSet};
use std::path::Path;

fn kubectl_only() -> anyhow::Result<ToolSet> {
    Ok(ToolSet::resolve_only(&[Tool::Kubectl])?)
}

pub fn wait_ingress(root: &Path) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let tools = kubectl_only()?;
    let target = ReadinessTarget::ingress_controller(&config);
    wait_until_ready(&mut SystemRunner::default(), &mut SystemClock, &tools, &target)?;
    Ok(())
}

pub fn health(_root: &Path, json: bool) -> anyhow::Result<()> {
    let tools = kubectl_only()?;
    let report = health::report(&mut SystemRunner::new(console(json)), &tools);
    if json {
        print_json(&report)?;
    }
    Ok(())
}

pub fn verify(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let tools = kubectl_only()?;
    let mut runner = SystemRunner::new(console(json));
    let verdict = verify_isolation(&mut runner, &tools, &config.probe);
    if json {
        print_json(&verdict)?;
    }
    Ok(())
}
