use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{BundleName, RoutePromptPolarity};

pub const PROJECT_FILE: &str = "graphql-bundle.yml";

/// Optional `graphql-bundle.yml` at the project root. Relative paths are relative to the
/// project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub config_file: PathBuf,
    pub routing_file: PathBuf,
    pub kernel_file: PathBuf,
    pub bundles: Vec<BundleEntry>,
    /// When set, replaces routing discovery entirely.
    pub route_resources: Option<Vec<String>>,
    pub route_prompt: RoutePromptPolarity,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("app/config/config.yml"),
            routing_file: PathBuf::from("app/config/routing.yml"),
            kernel_file: PathBuf::from("app/AppKernel.php"),
            bundles: Vec::new(),
            route_resources: None,
            route_prompt: RoutePromptPolarity::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleEntry {
    pub name: BundleName,
    pub path: PathBuf,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: ProjectConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn path(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    pub fn config_file(&self) -> PathBuf {
        self.path(&self.config.config_file)
    }

    pub fn routing_file(&self) -> PathBuf {
        self.path(&self.config.routing_file)
    }

    pub fn kernel_file(&self) -> PathBuf {
        self.path(&self.config.kernel_file)
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }
}

pub fn project_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PROJECT_FILE)
}

pub fn parse_project_config(path: &Path, raw: &str) -> Result<ProjectConfig> {
    // An empty file deserializes to unit, not to a map.
    if raw.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }
    serde_yaml::from_str(raw).map_err(|source| Error::Project {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the project rooted at `project_dir`. A missing project file means defaults.
pub fn load_project(project_dir: &Path) -> Result<Project> {
    let path = project_file_path(project_dir);
    let config = match fs::read_to_string(&path) {
        Ok(raw) => parse_project_config(&path, &raw)?,
        Err(e) if e.kind() == ErrorKind::NotFound => ProjectConfig::default(),
        Err(e) => return Err(Error::io("read", path, e)),
    };
    tracing::debug!(root = %project_dir.display(), ?config, "loaded project");
    Ok(Project::new(project_dir, config))
}
