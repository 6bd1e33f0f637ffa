use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// IngressConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngressConfig {
    #[serde(default = "default_ingress_name")]
    pub namespace: String,
    #[serde(default = "default_ingress_name")]
    pub release: String,
    #[serde(default = "default_chart")]
    pub chart: String,
    #[serde(default = "default_ingress_name")]
    pub repo_name: String,
    #[serde(default = "default_repo_url")]
    pub repo_url: String,
    /// Label selector for the controller pod watched by the readiness poller.
    #[serde(default = "default_controller_selector")]
    pub controller_selector: String,
}

fn default_ingress_name() -> String {
    "ingress-nginx".to_string()
}

fn default_chart() -> String {
    "ingress-nginx/ingress-nginx".to_string()
}

fn default_repo_url() -> String {
    "https://kubernetes.github.io/ingress-nginx".to_string()
}

fn default_controller_selector() -> String {
    "app.kubernetes.io/component=controller".to_string()
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            namespace: default_ingress_name(),
            release: default_ingress_name(),
            chart: default_chart(),
            repo_name: default_ingress_name(),
            repo_url: default_repo_url(),
            controller_selector: default_controller_selector(),
        }
    }
}

// ---------------------------------------------------------------------------
// ReadinessConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_readiness_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_readiness_interval")]
    pub interval_seconds: u64,
}

fn default_readiness_timeout() -> u64 {
    120
}

fn default_readiness_interval() -> u64 {
    5
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_readiness_timeout(),
            interval_seconds: default_readiness_interval(),
        }
    }
}

impl ReadinessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

// ---------------------------------------------------------------------------
// ProbeConfig
// ---------------------------------------------------------------------------

/// The throwaway pod used to test whether service A can reach service B.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_name")]
    pub name: String,
    #[serde(default = "default_probe_image")]
    pub image: String,
    #[serde(default = "default_probe_labels")]
    pub labels: String,
    #[serde(default = "default_probe_target")]
    pub target_url: String,
    #[serde(default = "default_probe_timeout")]
    pub timeout_seconds: u64,
}

fn default_probe_name() -> String {
    "test-a".to_string()
}

fn default_probe_image() -> String {
    "busybox".to_string()
}

fn default_probe_labels() -> String {
    "app=service-a".to_string()
}

fn default_probe_target() -> String {
    "http://service-b".to_string()
}

fn default_probe_timeout() -> u64 {
    3
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            name: default_probe_name(),
            image: default_probe_image(),
            labels: default_probe_labels(),
            target_url: default_probe_target(),
            timeout_seconds: default_probe_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_registry_name")]
    pub registry_name: String,
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,
    #[serde(default = "default_resource_group")]
    pub resource_group: String,
    #[serde(default = "default_image_repository")]
    pub image_repository: String,
    #[serde(default = "default_image_tag")]
    pub image_tag: String,
    #[serde(default)]
    pub ingress: IngressConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

fn default_registry_name() -> String {
    "orserviceaacr123456".to_string()
}

fn default_cluster_name() -> String {
    "orn-ha-cluster".to_string()
}

fn default_resource_group() -> String {
    "orn-ha-rg".to_string()
}

fn default_image_repository() -> String {
    "service-a".to_string()
}

fn default_image_tag() -> String {
    "latest".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_name: default_registry_name(),
            cluster_name: default_cluster_name(),
            resource_group: default_resource_group(),
            image_repository: default_image_repository(),
            image_tag: default_image_tag(),
            ingress: IngressConfig::default(),
            readiness: ReadinessConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

impl Config {
    /// Fully qualified image reference pushed to the registry,
    /// e.g. `orserviceaacr123456.azurecr.io/service-a:latest`.
    pub fn image_ref(&self) -> String {
        format!(
            "{}.azurecr.io/{}:{}",
            self.registry_name, self.image_repository, self.image_tag
        )
    }

    /// Load `rollout.yaml` from `root`. A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let required = [
            ("registry_name", &self.registry_name),
            ("cluster_name", &self.cluster_name),
            ("resource_group", &self.resource_group),
            ("image_repository", &self.image_repository),
            ("image_tag", &self.image_tag),
            ("ingress.namespace", &self.ingress.namespace),
            ("ingress.release", &self.ingress.release),
            ("ingress.chart", &self.ingress.chart),
            ("probe.name", &self.probe.name),
            ("probe.target_url", &self.probe.target_url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("'{field}' must not be empty"),
                });
            }
        }

        // Azure registry names: 5-50 alphanumeric characters.
        let name = &self.registry_name;
        if !name.is_empty()
            && (name.len() < 5 || name.len() > 50 || !name.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "registry_name '{name}' should be 5-50 alphanumeric characters"
                ),
            });
        }

        if self.readiness.interval_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "readiness.interval_seconds is 0: the controller will be polled without pause"
                    .to_string(),
            });
        }
        if self.readiness.interval_seconds > self.readiness.timeout_seconds {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "readiness.interval_seconds ({}) exceeds timeout_seconds ({}): only one poll will run",
                    self.readiness.interval_seconds, self.readiness.timeout_seconds
                ),
            });
        }
        if self.probe.timeout_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "probe.timeout_seconds must be at least 1".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
