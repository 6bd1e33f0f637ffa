use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "rollout.yaml";

pub const REGISTRY_MODULE_DIR: &str = "terraform/01-acr";
pub const CLUSTER_MODULE_DIR: &str = "terraform/02-aks";
pub const APP_DIR: &str = "service-A";
pub const MANIFESTS_DIR: &str = "kubernetes";

// ---------------------------------------------------------------------------
// Manifests, relative to MANIFESTS_DIR
// ---------------------------------------------------------------------------

pub const SERVICE_B_ACCESS: &str = "base/access/service-b-access.yaml";
pub const SERVICE_B_DEPLOYMENT: &str = "services/service-b/deployment.yaml";
pub const SERVICE_B_SERVICE: &str = "services/service-b/service.yaml";
pub const SERVICE_A_ACCESS: &str = "base/access/service-a-access.yaml";
pub const SERVICE_A_DEPLOYMENT: &str = "services/service-a/deployment.yaml";
pub const SERVICE_A_SERVICE: &str = "services/service-a/service.yaml";
pub const ISOLATION_POLICY: &str = "base/networkpolicy/block-service-a-to-b.yaml";
pub const INGRESS_MANIFEST: &str = "base/ingress/ingress.yaml";

/// Workload manifests in apply order. Service B comes up before service A,
/// and the isolation policy only once both tiers exist.
pub const WORKLOAD_MANIFESTS: [&str; 7] = [
    SERVICE_B_ACCESS,
    SERVICE_B_DEPLOYMENT,
    SERVICE_B_SERVICE,
    SERVICE_A_ACCESS,
    SERVICE_A_DEPLOYMENT,
    SERVICE_A_SERVICE,
    ISOLATION_POLICY,
];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn registry_module_dir(root: &Path) -> PathBuf {
    root.join(REGISTRY_MODULE_DIR)
}

pub fn cluster_module_dir(root: &Path) -> PathBuf {
    root.join(CLUSTER_MODULE_DIR)
}

pub fn app_dir(root: &Path) -> PathBuf {
    root.join(APP_DIR)
}

pub fn manifests_dir(root: &Path) -> PathBuf {
    root.join(MANIFESTS_DIR)
}
