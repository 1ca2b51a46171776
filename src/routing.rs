use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::bundle::BundleResolver;
use crate::config::Project;
use crate::error::{Error, Result};
use crate::types::BundleName;

/// Lists the identifiers of every resource the router loads: routing files, controller
/// directories, controller files, or unresolved `@Bundle/...` references.
pub trait RouteResources {
    fn route_resources(&self) -> Result<Vec<String>>;
}

impl RouteResources for Vec<String> {
    fn route_resources(&self) -> Result<Vec<String>> {
        Ok(self.clone())
    }
}

/// Route resources of a project on disk: the explicit list from the project file, or
/// the closure of `resource:` imports reachable from the main routing file.
pub struct ProjectRoutes<'a> {
    project: &'a Project,
    bundles: &'a dyn BundleResolver,
}

impl<'a> ProjectRoutes<'a> {
    pub fn new(project: &'a Project, bundles: &'a dyn BundleResolver) -> Self {
        Self { project, bundles }
    }

    fn discover(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let root = self.project.routing_file();
        if root.is_file() {
            self.walk(&root, &mut seen, &mut out)?;
        } else {
            tracing::debug!(path = %root.display(), "no routing file");
        }
        Ok(out)
    }

    fn walk(&self, file: &Path, seen: &mut HashSet<PathBuf>, out: &mut Vec<String>) -> Result<()> {
        let key = fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
        if !seen.insert(key) {
            return Ok(());
        }
        out.push(file.display().to_string());

        let raw = fs::read_to_string(file).map_err(|e| Error::io("read", file, e))?;
        let doc: Value = match serde_yaml::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                // The router would refuse this file too; keep it listed, skip its imports.
                tracing::warn!(path = %file.display(), error = %e, "unparseable routing file");
                return Ok(());
            }
        };
        let Value::Mapping(routes) = doc else {
            return Ok(());
        };

        let base = file.parent().unwrap_or_else(|| Path::new(""));
        for (_, route) in routes {
            let Some(resource) = route.get("resource").and_then(Value::as_str) else {
                continue;
            };
            match self.locate(base, resource) {
                Some(path) if path.is_file() && is_yaml(&path) => self.walk(&path, seen, out)?,
                Some(path) if path.is_dir() => list_controllers(&path, out),
                Some(path) => out.push(path.display().to_string()),
                None => out.push(resource.to_string()),
            }
        }
        Ok(())
    }

    /// Maps a `resource:` value to a path. `@XBundle/...` goes through the bundle resolver;
    /// `None` when the bundle is unknown.
    fn locate(&self, base: &Path, resource: &str) -> Option<PathBuf> {
        match resource.strip_prefix('@') {
            Some(rest) => {
                let (bundle, sub) = rest.split_once('/').unwrap_or((rest, ""));
                let bundle = self.bundles.resolve(&BundleName::new(bundle))?;
                Some(bundle.root_path.join(sub))
            }
            None => Some(base.join(resource)),
        }
    }
}

impl RouteResources for ProjectRoutes<'_> {
    fn route_resources(&self) -> Result<Vec<String>> {
        match &self.project.config.route_resources {
            Some(list) => Ok(list
                .iter()
                .map(|r| {
                    if r.starts_with('@') {
                        r.clone()
                    } else {
                        self.project.path(Path::new(r)).display().to_string()
                    }
                })
                .collect()),
            None => self.discover(),
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yml") | Some("yaml")
    )
}

fn list_controllers(dir: &Path, out: &mut Vec<String>) {
    out.push(dir.display().to_string());
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut files: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("php"))
        .collect();
    files.sort();
    out.extend(files.iter().map(|p| p.display().to_string()));
}
