use crate::output::{console, print_json};
use anyhow::Context;
use rollout_core::config::{Config, WarnLevel};
use rollout_core::connectivity::IsolationVerdict;
use rollout_core::pipeline;
use rollout_core::readiness::SystemClock;
use rollout_core::runner::SystemRunner;
use rollout_core::tools::on_search_path;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    check_config(&config)?;

    let report = pipeline::deploy(
        &config,
        root,
        on_search_path,
        &mut SystemRunner::new(console(json)),
        &mut SystemClock,
    )
    .context("deployment aborted")?;

    if json {
        return print_json(&report);
    }

    println!("\n=== Summary ===");
    println!("Steps completed: {}", report.steps.len());
    if let Some(attempts) = report.readiness_attempts {
        println!("Ingress controller ready after {attempts} check(s)");
    }
    match report.isolation {
        Some(IsolationVerdict::Reachable) => {
            println!("Network isolation: NOT enforced (service A reached service B)")
        }
        Some(IsolationVerdict::Blocked { .. }) => println!("Network isolation: blocked"),
        None => {}
    }
    Ok(())
}

/// Refuse to provision from a config that `config validate` rejects.
fn check_config(config: &Config) -> anyhow::Result<()> {
    let mut errors = Vec::new();
    for w in config.validate() {
        match w.level {
            WarnLevel::Warning => tracing::warn!("{}", w.message),
            WarnLevel::Error => errors.push(w.message),
        }
    }
    if !errors.is_empty() {
        anyhow::bail!("invalid config: {}", errors.join("; "));
    }
    Ok(())
}
