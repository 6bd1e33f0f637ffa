#![cfg(unix)]
#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TOOLS: [&str; 5] = ["az", "terraform", "docker", "kubectl", "helm"];

/// Stand-in for every external tool. Appends its invocation to
/// `$ROLLOUT_TEST_LOG`, reports the controller Running on the third poll, and
/// fails any command containing `$ROLLOUT_TEST_FAIL`.
const FAKE_TOOL: &str = r#"#!/bin/sh
line="${0##*/} $*"
echo "$line" >> "$ROLLOUT_TEST_LOG"
if [ -n "$ROLLOUT_TEST_FAIL" ]; then
  case "$line" in
    *"$ROLLOUT_TEST_FAIL"*) exit 7 ;;
  esac
fi
case "$line" in
  "kubectl get pods -n"*)
    n=0
    if [ -f "$ROLLOUT_TEST_LOG.polls" ]; then read n < "$ROLLOUT_TEST_LOG.polls"; fi
    n=$((n + 1))
    echo "$n" > "$ROLLOUT_TEST_LOG.polls"
    if [ "$n" -ge 3 ]; then printf Running; else printf Pending; fi
    ;;
  "kubectl run"*) exit 1 ;;
esac
exit 0
"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// A project tree plus a bin/ directory holding the listed fake tools.
    fn new(tools: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        for d in [
            "terraform/01-acr",
            "terraform/02-aks",
            "service-A",
            "kubernetes",
            "bin",
        ] {
            std::fs::create_dir_all(dir.path().join(d)).unwrap();
        }
        for tool in tools {
            let path = dir.path().join("bin").join(tool);
            std::fs::write(&path, FAKE_TOOL).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        std::fs::write(
            dir.path().join("rollout.yaml"),
            "readiness:\n  interval_seconds: 0\n  timeout_seconds: 30\n",
        )
        .unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn log_path(&self) -> PathBuf {
        self.root().join("calls.log")
    }

    fn log(&self) -> Vec<String> {
        std::fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn rollout(&self) -> Command {
        let mut cmd = Command::cargo_bin("rollout").unwrap();
        cmd.current_dir(self.root())
            .env("ROLLOUT_ROOT", self.root())
            .env("PATH", self.root().join("bin"))
            .env("ROLLOUT_TEST_LOG", self.log_path())
            .env_remove("ROLLOUT_TEST_FAIL")
            .env_remove("RUST_LOG");
        cmd
    }
}

// ---------------------------------------------------------------------------
// rollout deploy
// ---------------------------------------------------------------------------

#[test]
fn deploy_runs_every_stage_in_order() {
    let fx = Fixture::new(&TOOLS);

    fx.rollout()
        .arg("deploy")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ingress Controller is running."))
        .stdout(predicate::str::contains("All resources deployed successfully."))
        .stdout(predicate::str::contains("cannot access"));

    let log = fx.log();
    let poll = "kubectl get pods -n ingress-nginx -l app.kubernetes.io/component=controller -o jsonpath={.items[0].status.phase}";
    let expected = vec![
        "az account show",
        "terraform init -input=false",
        "terraform apply -auto-approve",
        "terraform init -input=false",
        "terraform apply -auto-approve",
        "az aks update -n orn-ha-cluster -g orn-ha-rg --attach-acr orserviceaacr123456",
        "docker build -t orserviceaacr123456.azurecr.io/service-a:latest .",
        "az acr login --name orserviceaacr123456",
        "docker push orserviceaacr123456.azurecr.io/service-a:latest",
        "az aks get-credentials --resource-group orn-ha-rg --name orn-ha-cluster --overwrite-existing",
        "helm repo add ingress-nginx https://kubernetes.github.io/ingress-nginx",
        "helm repo update",
        "kubectl create namespace ingress-nginx",
        "helm upgrade --install ingress-nginx ingress-nginx/ingress-nginx --namespace ingress-nginx",
        "kubectl apply -f base/access/service-b-access.yaml",
        "kubectl apply -f services/service-b/deployment.yaml",
        "kubectl apply -f services/service-b/service.yaml",
        "kubectl apply -f base/access/service-a-access.yaml",
        "kubectl apply -f services/service-a/deployment.yaml",
        "kubectl apply -f services/service-a/service.yaml",
        "kubectl apply -f base/networkpolicy/block-service-a-to-b.yaml",
        poll,
        poll,
        poll,
        "kubectl apply -f base/ingress/ingress.yaml",
        "kubectl get nodes -o wide",
        "kubectl get pods --all-namespaces -o wide",
        "kubectl run test-a --rm -i --tty --image=busybox --labels=app=service-a --restart=Never -- /bin/sh -c wget --timeout=3 --spider http://service-b",
    ];
    assert_eq!(log, expected);
}

#[test]
fn deploy_with_missing_tool_fails_before_any_call() {
    let fx = Fixture::new(&["az", "terraform", "docker", "kubectl"]);

    fx.rollout()
        .arg("deploy")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Found kubectl:"))
        .stderr(predicate::str::contains("helm not found"));

    assert!(fx.log().is_empty());
}

#[test]
fn deploy_stops_at_first_fatal_failure() {
    let fx = Fixture::new(&TOOLS);

    fx.rollout()
        .arg("deploy")
        .env("ROLLOUT_TEST_FAIL", "-auto-approve")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("exit code 7"));

    assert_eq!(
        fx.log(),
        [
            "az account show",
            "terraform init -input=false",
            "terraform apply -auto-approve",
        ]
    );
}

#[test]
fn deploy_survives_existing_namespace() {
    let fx = Fixture::new(&TOOLS);

    fx.rollout()
        .arg("deploy")
        .env("ROLLOUT_TEST_FAIL", "create namespace")
        .assert()
        .success();

    assert!(fx
        .log()
        .iter()
        .any(|l| l.starts_with("helm upgrade --install")));
}

#[test]
fn deploy_logs_in_when_no_session() {
    let fx = Fixture::new(&TOOLS);

    fx.rollout()
        .arg("deploy")
        .env("ROLLOUT_TEST_FAIL", "account show")
        .assert()
        .success();

    let log = fx.log();
    assert_eq!(log[0], "az account show");
    assert_eq!(log[1], "az login");
}

#[test]
fn deploy_refuses_invalid_config_before_any_call() {
    let fx = Fixture::new(&TOOLS);
    std::fs::write(fx.root().join("rollout.yaml"), "cluster_name: \"\"\n").unwrap();

    fx.rollout()
        .arg("deploy")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'cluster_name' must not be empty"));

    assert!(fx.log().is_empty());
}

#[test]
fn deploy_json_keeps_stdout_machine_readable() {
    let fx = Fixture::new(&TOOLS);

    let out = fx.rollout().args(["deploy", "--json"]).output().unwrap();
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["steps"][0], "resolve-tools");
    assert_eq!(report["readiness_attempts"], 3);
    assert_eq!(report["isolation"]["verdict"], "blocked");

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains(">>> Running:"));
    assert!(stderr.contains("All resources deployed successfully."));
}

#[test]
fn deploy_health_failure_is_not_fatal() {
    let fx = Fixture::new(&TOOLS);

    fx.rollout()
        .arg("deploy")
        .env("ROLLOUT_TEST_FAIL", "get nodes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed to fetch node status."));
}

// ---------------------------------------------------------------------------
// rollout plan / check / config
// ---------------------------------------------------------------------------

#[test]
fn plan_lists_steps_without_running_tools() {
    let fx = Fixture::new(&[]);

    fx.rollout()
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingress-namespace"))
        .stdout(predicate::str::contains("continue"))
        .stdout(predicate::str::contains("verify-isolation"));

    assert!(fx.log().is_empty());
}

#[test]
fn plan_json_is_ordered_array() {
    let fx = Fixture::new(&[]);

    let out = fx.rollout().args(["plan", "--json"]).output().unwrap();
    assert!(out.status.success());

    let steps: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let steps = steps.as_array().unwrap();
    assert_eq!(steps.len(), 25);
    assert_eq!(steps[0]["step"], "authenticate");
    assert_eq!(steps[21]["step"], "await_ready");
    assert_eq!(steps[24]["step"], "verify_isolation");
}

#[test]
fn check_lists_resolved_tools() {
    let fx = Fixture::new(&TOOLS);

    fx.rollout()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("kubectl"))
        .stdout(predicate::str::contains(
            fx.root().join("bin/helm").display().to_string(),
        ));
}

#[test]
fn check_fails_on_missing_tool() {
    let fx = Fixture::new(&["terraform"]);

    fx.rollout()
        .arg("check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "az not found. Please install it and ensure it is in your PATH.",
        ));
}

#[test]
fn config_show_merges_file_over_defaults() {
    let fx = Fixture::new(&[]);

    fx.rollout()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("interval_seconds: 0"))
        .stdout(predicate::str::contains("cluster_name: orn-ha-cluster"));
}

#[test]
fn config_validate_flags_empty_names() {
    let fx = Fixture::new(&[]);
    std::fs::write(fx.root().join("rollout.yaml"), "cluster_name: \"\"\n").unwrap();

    fx.rollout()
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] 'cluster_name' must not be empty"));
}

// ---------------------------------------------------------------------------
// rollout verify / wait-ingress
// ---------------------------------------------------------------------------

#[test]
fn verify_reports_blocked_without_failing() {
    let fx = Fixture::new(&["kubectl"]);

    fx.rollout()
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("cannot access"));
}

#[test]
fn verify_json_prints_only_the_verdict() {
    let fx = Fixture::new(&["kubectl"]);

    let out = fx.rollout().args(["verify", "--json"]).output().unwrap();
    assert!(out.status.success());

    let verdict: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(verdict["verdict"], "blocked");
    assert!(String::from_utf8_lossy(&out.stderr).contains("cannot access"));
}

#[test]
fn health_json_prints_only_the_report() {
    let fx = Fixture::new(&["kubectl"]);

    let out = fx.rollout().args(["health", "--json"]).output().unwrap();
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["nodes_ok"], true);
    assert_eq!(report["pods_ok"], true);
}

#[test]
fn verify_reports_reachable_without_failing() {
    let fx = Fixture::new(&["kubectl"]);
    let script = FAKE_TOOL.replace("  \"kubectl run\"*) exit 1 ;;\n", "");
    let path = fx.root().join("bin/kubectl");
    std::fs::write(&path, script).unwrap();

    fx.rollout()
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("NOT blocking traffic"));
}

#[test]
fn wait_ingress_times_out_with_exit_1() {
    let fx = Fixture::new(&["kubectl"]);
    std::fs::write(
        fx.root().join("rollout.yaml"),
        "readiness:\n  interval_seconds: 1\n  timeout_seconds: 1\n",
    )
    .unwrap();
    // Start the poll counter far below the Running threshold.
    std::fs::write(fx.root().join("calls.log.polls"), "-100\n").unwrap();

    fx.rollout()
        .arg("wait-ingress")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "Timeout: Ingress controller did not become ready in time.",
        ));
}
