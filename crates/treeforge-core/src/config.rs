//! Editor configuration loading and management.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Workspace-relative location of the config file.
pub const CONFIG_PATH: &str = ".treeforge/config.yaml";

/// Editor configuration, loaded from .treeforge/config.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Config version
    pub version: Option<String>,

    /// Directory holding one document per project (relative to workspace)
    #[serde(default = "default_projects_dir")]
    pub projects_dir: PathBuf,

    /// Pretty-print exported JSON
    #[serde(default = "default_true")]
    pub pretty_json: bool,

    /// Maximum undo snapshots kept; unset means unbounded
    #[serde(default)]
    pub history_limit: Option<usize>,
}

fn default_projects_dir() -> PathBuf {
    PathBuf::from(".treeforge/projects")
}

fn default_true() -> bool {
    true
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: None,
            projects_dir: default_projects_dir(),
            pretty_json: true,
            history_limit: None,
        }
    }
}

impl EditorConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load from a workspace root (looks for .treeforge/config.yaml)
    pub fn load_from_workspace(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_PATH);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve paths relative to the workspace root
    pub fn resolve_paths(&mut self, root: &Path) {
        self.projects_dir = root.join(&self.projects_dir);
    }

    /// YAML written by `treeforge init`.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to render config")
    }
}
