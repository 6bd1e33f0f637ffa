use crate::output::{print_json, print_table};
use anyhow::Context;
use rollout_core::config::Config;
use rollout_core::plan::{deployment_plan, Step};
use rollout_core::tools::ToolSet;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let steps = deployment_plan(&config, &ToolSet::unresolved(), root);

    if json {
        return print_json(&steps);
    }

    let rows: Vec<Vec<String>> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            vec![
                (i + 1).to_string(),
                step.name().to_string(),
                describe(step),
                fatality(step).to_string(),
            ]
        })
        .collect();
    print_table(&["#", "STEP", "COMMAND", "ON FAILURE"], &rows);
    Ok(())
}

fn describe(step: &Step) -> String {
    match step {
        Step::Authenticate { check, login } => format!("{check} || {login}"),
        Step::Run(stage) => match &stage.command.cwd {
            Some(dir) => format!("(cd {}) {}", dir.display(), stage.command),
            None => stage.command.to_string(),
        },
        Step::AwaitReady(target) => format!(
            "poll pod phase in {} every {}s until {} (timeout {}s)",
            target.namespace,
            target.interval.as_secs(),
            target.expected,
            target.timeout.as_secs()
        ),
        Step::HealthReport => "kubectl get nodes; kubectl get pods --all-namespaces".to_string(),
        Step::VerifyIsolation(probe) => {
            format!("probe {} -> {} from {}", probe.name, probe.target_url, probe.labels)
        }
    }
}

fn fatality(step: &Step) -> &'static str {
    match step {
        Step::Run(stage) if !stage.command.fatal => "continue",
        Step::HealthReport | Step::VerifyIsolation(_) => "report",
        _ => "abort",
    }
}
