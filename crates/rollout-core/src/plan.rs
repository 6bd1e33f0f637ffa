//! The deployment as data: an ordered list of typed steps.
//!
//! [`deployment_plan`] is the single place that decides what runs and in which
//! order. The pipeline only walks the list.

use std::path::Path;

use serde::Serialize;

use crate::config::{Config, ProbeConfig};
use crate::paths;
use crate::readiness::ReadinessTarget;
use crate::runner::CommandSpec;
use crate::tools::{Tool, ToolSet};

/// Section a stage belongs to. A heading is printed whenever it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageGroup {
    RegistryInfra,
    ClusterInfra,
    AttachRegistry,
    Image,
    Credentials,
    IngressChart,
    Manifests,
}

impl StageGroup {
    pub fn heading(&self) -> &'static str {
        match self {
            StageGroup::RegistryInfra => "Deploying ACR with Terraform...",
            StageGroup::ClusterInfra => "Deploying AKS with Terraform...",
            StageGroup::AttachRegistry => "Attaching ACR to AKS...",
            StageGroup::Image => "Building and pushing Docker image...",
            StageGroup::Credentials => "Setting kubectl context...",
            StageGroup::IngressChart => "Installing ingress controller...",
            StageGroup::Manifests => "Applying Kubernetes manifests...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub name: String,
    pub group: StageGroup,
    pub command: CommandSpec,
}

impl Stage {
    fn new(name: impl Into<String>, group: StageGroup, command: CommandSpec) -> Self {
        Self {
            name: name.into(),
            group,
            command,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "step")]
pub enum Step {
    /// Run `login` only if `check` fails.
    Authenticate {
        check: CommandSpec,
        login: CommandSpec,
    },
    Run(Stage),
    AwaitReady(ReadinessTarget),
    HealthReport,
    VerifyIsolation(ProbeConfig),
}

impl Step {
    pub fn name(&self) -> &str {
        match self {
            Step::Authenticate { .. } => "authenticate",
            Step::Run(stage) => &stage.name,
            Step::AwaitReady(_) => "await-ingress-controller",
            Step::HealthReport => "health-report",
            Step::VerifyIsolation(_) => "verify-isolation",
        }
    }
}

fn terraform_module(tools: &ToolSet, dir: &Path, group: StageGroup, label: &str) -> [Step; 2] {
    let tf = tools.path(Tool::Terraform);
    [
        Step::Run(Stage::new(
            format!("{label}-init"),
            group,
            CommandSpec::new(tf, ["init", "-input=false"]).in_dir(dir),
        )),
        Step::Run(Stage::new(
            format!("{label}-apply"),
            group,
            CommandSpec::new(tf, ["apply", "-auto-approve"]).in_dir(dir),
        )),
    ]
}

fn apply_manifest(tools: &ToolSet, root: &Path, manifest: &str, group: StageGroup) -> Step {
    Step::Run(Stage::new(
        format!("apply {manifest}"),
        group,
        CommandSpec::new(tools.path(Tool::Kubectl), ["apply", "-f", manifest])
            .in_dir(paths::manifests_dir(root)),
    ))
}

/// Build the full, ordered deployment for the project rooted at `root`.
pub fn deployment_plan(config: &Config, tools: &ToolSet, root: &Path) -> Vec<Step> {
    let az = tools.path(Tool::Az);
    let docker = tools.path(Tool::Docker);
    let helm = tools.path(Tool::Helm);
    let kubectl = tools.path(Tool::Kubectl);
    let image = config.image_ref();
    let ingress = &config.ingress;

    let mut steps = vec![Step::Authenticate {
        check: CommandSpec::new(az, ["account", "show"]),
        login: CommandSpec::new(az, ["login"]),
    }];

    steps.extend(terraform_module(
        tools,
        &paths::registry_module_dir(root),
        StageGroup::RegistryInfra,
        "registry",
    ));
    steps.extend(terraform_module(
        tools,
        &paths::cluster_module_dir(root),
        StageGroup::ClusterInfra,
        "cluster",
    ));

    steps.push(Step::Run(Stage::new(
        "attach-registry",
        StageGroup::AttachRegistry,
        CommandSpec::new(
            az,
            [
                "aks",
                "update",
                "-n",
                config.cluster_name.as_str(),
                "-g",
                config.resource_group.as_str(),
                "--attach-acr",
                config.registry_name.as_str(),
            ],
        ),
    )));

    steps.extend([
        Step::Run(Stage::new(
            "image-build",
            StageGroup::Image,
            CommandSpec::new(docker, ["build", "-t", image.as_str(), "."])
                .in_dir(paths::app_dir(root)),
        )),
        Step::Run(Stage::new(
            "registry-login",
            StageGroup::Image,
            CommandSpec::new(az, ["acr", "login", "--name", config.registry_name.as_str()]),
        )),
        Step::Run(Stage::new(
            "image-push",
            StageGroup::Image,
            CommandSpec::new(docker, ["push", image.as_str()]),
        )),
    ]);

    steps.push(Step::Run(Stage::new(
        "cluster-credentials",
        StageGroup::Credentials,
        CommandSpec::new(
            az,
            [
                "aks",
                "get-credentials",
                "--resource-group",
                config.resource_group.as_str(),
                "--name",
                config.cluster_name.as_str(),
                "--overwrite-existing",
            ],
        ),
    )));

    steps.extend([
        Step::Run(Stage::new(
            "chart-repo-add",
            StageGroup::IngressChart,
            CommandSpec::new(
                helm,
                ["repo", "add", ingress.repo_name.as_str(), ingress.repo_url.as_str()],
            ),
        )),
        Step::Run(Stage::new(
            "chart-repo-update",
            StageGroup::IngressChart,
            CommandSpec::new(helm, ["repo", "update"]),
        )),
        // "AlreadyExists" on a re-run is expected.
        Step::Run(Stage::new(
            "ingress-namespace",
            StageGroup::IngressChart,
            CommandSpec::new(kubectl, ["create", "namespace", ingress.namespace.as_str()])
                .non_fatal(),
        )),
        Step::Run(Stage::new(
            "ingress-chart",
            StageGroup::IngressChart,
            CommandSpec::new(
                helm,
                [
                    "upgrade",
                    "--install",
                    ingress.release.as_str(),
                    ingress.chart.as_str(),
                    "--namespace",
                    ingress.namespace.as_str(),
                ],
            ),
        )),
    ]);

    steps.extend(
        paths::WORKLOAD_MANIFESTS
            .iter()
            .map(|m| apply_manifest(tools, root, m, StageGroup::Manifests)),
    );

    steps.push(Step::AwaitReady(ReadinessTarget::ingress_controller(config)));
    steps.push(apply_manifest(
        tools,
        root,
        paths::INGRESS_MANIFEST,
        StageGroup::Manifests,
    ));
    steps.push(Step::HealthReport);
    steps.push(Step::VerifyIsolation(config.probe.clone()));

    steps
}
