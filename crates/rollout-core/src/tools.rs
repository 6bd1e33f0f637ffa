//! Resolution of the external command-line tools the pipeline drives.
//!
//! Every tool is looked up once at startup. The first missing tool aborts the
//! run before anything touches the cloud account.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, RolloutError};

/// The executables required for a deployment, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Az,
    Terraform,
    Docker,
    Kubectl,
    Helm,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Az,
        Tool::Terraform,
        Tool::Docker,
        Tool::Kubectl,
        Tool::Helm,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Az => "az",
            Tool::Terraform => "terraform",
            Tool::Docker => "docker",
            Tool::Kubectl => "kubectl",
            Tool::Helm => "helm",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Look `name` up on the current `PATH`.
pub fn on_search_path(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Immutable mapping from each required tool to its resolved path.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSet {
    paths: BTreeMap<Tool, PathBuf>,
}

impl ToolSet {
    /// Resolve every tool against the current `PATH`.
    pub fn resolve() -> Result<Self> {
        Self::resolve_with(on_search_path)
    }

    /// Resolve every tool against an explicit search path
    /// (same syntax as the `PATH` variable).
    pub fn resolve_in(search_path: impl AsRef<OsStr>) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let search_path = search_path.as_ref();
        Self::resolve_with(|name| which::which_in(name, Some(search_path), &cwd).ok())
    }

    /// Resolve only `required` against the current `PATH`. Used by commands
    /// that drive a single tool.
    pub fn resolve_only(required: &[Tool]) -> Result<Self> {
        Self::resolve_subset_with(required, on_search_path, |_, _| {})
    }

    /// Resolve every tool through `lookup`, stopping at the first miss.
    pub fn resolve_with<F>(lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<PathBuf>,
    {
        Self::resolve_subset_with(&Tool::ALL, lookup, |_, _| {})
    }

    /// Like [`ToolSet::resolve_with`], calling `found` for each tool as soon
    /// as it resolves, so tools located before a miss are still reported.
    pub fn resolve_reporting<F, G>(lookup: F, found: G) -> Result<Self>
    where
        F: FnMut(&str) -> Option<PathBuf>,
        G: FnMut(Tool, &Path),
    {
        Self::resolve_subset_with(&Tool::ALL, lookup, found)
    }

    fn resolve_subset_with<F, G>(required: &[Tool], mut lookup: F, mut found: G) -> Result<Self>
    where
        F: FnMut(&str) -> Option<PathBuf>,
        G: FnMut(Tool, &Path),
    {
        let mut paths = BTreeMap::new();
        for &tool in required {
            let path = lookup(tool.name()).ok_or_else(|| RolloutError::ToolNotFound {
                tool: tool.name().to_string(),
            })?;
            tracing::debug!(tool = %tool, path = %path.display(), "resolved tool");
            found(tool, &path);
            paths.insert(tool, path);
        }
        Ok(Self { paths })
    }

    /// A tool set that refers to every tool by bare name. Used to render a
    /// plan without requiring the tools to be installed.
    pub fn unresolved() -> Self {
        let paths = Tool::ALL
            .into_iter()
            .map(|t| (t, PathBuf::from(t.name())))
            .collect();
        Self { paths }
    }

    /// Resolved path of `tool`, or its bare name if it was not part of the
    /// resolved subset.
    pub fn path(&self, tool: Tool) -> &Path {
        self.paths
            .get(&tool)
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new(tool.name()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tool, &Path)> {
        self.paths.iter().map(|(t, p)| (*t, p.as_path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn tool_names_are_stable() {
        let names: Vec<&str> = Tool::ALL.iter().map(Tool::name).collect();
        assert_eq!(names, ["az", "terraform", "docker", "kubectl", "helm"]);
    }

    #[test]
    fn resolve_with_all_present() {
        let tools = ToolSet::resolve_with(|name| Some(PathBuf::from("/opt/bin").join(name))).unwrap();
        assert_eq!(tools.path(Tool::Kubectl), Path::new("/opt/bin/kubectl"));
        assert_eq!(tools.iter().count(), 5);
    }

    #[test]
    fn resolve_with_stops_at_first_missing_tool() {
        let mut asked = Vec::new();
        let err = ToolSet::resolve_with(|name| {
            asked.push(name.to_string());
            (name != "docker").then(|| PathBuf::from(name))
        })
        .unwrap_err();

        match err {
            RolloutError::ToolNotFound { tool } => assert_eq!(tool, "docker"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(asked, ["az", "terraform", "docker"]);
    }

    #[test]
    fn resolve_in_empty_directory_reports_az_missing() {
        let dir = TempDir::new().unwrap();
        let err = ToolSet::resolve_in(dir.path()).unwrap_err();
        assert!(matches!(err, RolloutError::ToolNotFound { ref tool } if tool == "az"));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_in_finds_executables() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        for tool in Tool::ALL {
            let path = dir.path().join(tool.name());
            std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let tools = ToolSet::resolve_in(dir.path()).unwrap();
        assert_eq!(tools.path(Tool::Helm), dir.path().join("helm"));
    }

    #[test]
    fn subset_only_checks_requested_tools() {
        let tools = ToolSet::resolve_subset_with(
            &[Tool::Kubectl],
            |name| (name == "kubectl").then(|| PathBuf::from("/bin/kubectl")),
            |_, _| {},
        )
        .unwrap();
        assert_eq!(tools.iter().count(), 1);
        assert_eq!(tools.path(Tool::Kubectl), Path::new("/bin/kubectl"));
        assert_eq!(tools.path(Tool::Az), Path::new("az"));
    }

    #[test]
    fn reporting_announces_tools_found_before_a_miss() {
        let mut found = Vec::new();
        let err = ToolSet::resolve_reporting(
            |name| (name != "kubectl").then(|| PathBuf::from("/opt/bin").join(name)),
            |tool, path| found.push(format!("{tool}: {}", path.display())),
        )
        .unwrap_err();

        assert!(matches!(err, RolloutError::ToolNotFound { ref tool } if tool == "kubectl"));
        assert_eq!(
            found,
            [
                "az: /opt/bin/az",
                "terraform: /opt/bin/terraform",
                "docker: /opt/bin/docker"
            ]
        );
    }

    #[test]
    fn unresolved_uses_bare_names() {
        let tools = ToolSet::unresolved();
        assert_eq!(tools.path(Tool::Terraform), Path::new("terraform"));
    }
}
