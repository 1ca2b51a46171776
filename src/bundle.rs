use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Project;
use crate::template::SCHEMA_CLASS_NAME;
use crate::types::BundleName;

const SEARCH_DEPTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
    pub name: BundleName,
    pub root_path: PathBuf,
    pub namespace: String,
}

impl Bundle {
    pub fn new(name: BundleName, root_path: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            name,
            root_path: root_path.into(),
            namespace: namespace.into(),
        }
    }

    pub fn graphql_dir(&self) -> PathBuf {
        self.root_path.join("GraphQL")
    }

    pub fn schema_namespace(&self) -> String {
        format!("{}\\GraphQL", self.namespace)
    }

    /// Fully-qualified name of the generated class, e.g. `AppBundle\GraphQL\Schema`.
    pub fn schema_class(&self) -> String {
        format!("{}\\{SCHEMA_CLASS_NAME}", self.schema_namespace())
    }

    pub fn schema_path(&self) -> PathBuf {
        self.graphql_dir().join(format!("{SCHEMA_CLASS_NAME}.php"))
    }
}

/// Finds the registered, active bundle for a name.
pub trait BundleResolver {
    fn resolve(&self, name: &BundleName) -> Option<Bundle>;
}

impl BundleResolver for Vec<Bundle> {
    fn resolve(&self, name: &BundleName) -> Option<Bundle> {
        self.iter().find(|b| &b.name == name).cloned()
    }
}

/// Resolves bundles declared in the project file first, then by looking for the bundle
/// class `src/**/<Name>.php`. Discovered bundles must also be registered in the kernel
/// when a kernel file exists.
#[derive(Debug, Clone)]
pub struct ProjectResolver<'a> {
    project: &'a Project,
}

impl<'a> ProjectResolver<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self { project }
    }

    fn declared(&self, name: &BundleName) -> Option<Bundle> {
        let entry = self.project.config.bundles.iter().find(|e| &e.name == name)?;
        let namespace = entry
            .namespace
            .clone()
            .unwrap_or_else(|| name.as_str().to_string());
        Some(Bundle::new(
            name.clone(),
            self.project.path(&entry.path),
            namespace,
        ))
    }

    fn discovered(&self, name: &BundleName) -> Option<Bundle> {
        let src = self.project.src_dir();
        let dir = find_bundle_dir(&src, name.as_str(), SEARCH_DEPTH)?;
        if !self.registered_in_kernel(name) {
            tracing::debug!(bundle = %name, "bundle found under src but not registered in kernel");
            return None;
        }
        let namespace = namespace_for(&src, &dir)?;
        Some(Bundle::new(name.clone(), dir, namespace))
    }

    fn registered_in_kernel(&self, name: &BundleName) -> bool {
        match fs::read_to_string(self.project.kernel_file()) {
            Ok(kernel) => kernel_registers(&kernel, name.as_str()),
            Err(_) => true,
        }
    }
}

impl BundleResolver for ProjectResolver<'_> {
    fn resolve(&self, name: &BundleName) -> Option<Bundle> {
        self.declared(name).or_else(|| self.discovered(name))
    }
}

fn find_bundle_dir(dir: &Path, name: &str, depth: usize) -> Option<PathBuf> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            children.push(path);
        }
    }
    children.sort();

    // The bundle class names the bundle; its directory may carry a shorter name
    // (`src/Acme/BlogBundle/AcmeBlogBundle.php`).
    for child in &children {
        if child.join(format!("{name}.php")).is_file() {
            return Some(child.clone());
        }
    }
    if depth == 0 {
        return None;
    }
    children
        .iter()
        .find_map(|child| find_bundle_dir(child, name, depth - 1))
}

/// True when the kernel instantiates `name` itself, not a bundle whose name ends with it.
fn kernel_registers(kernel: &str, name: &str) -> bool {
    let needle = format!("{name}(");
    kernel.match_indices(&needle).any(|(at, _)| {
        kernel[..at]
            .chars()
            .next_back()
            .is_none_or(|c| c == '\\' || c.is_whitespace())
    })
}

fn namespace_for(src: &Path, dir: &Path) -> Option<String> {
    let rel = dir.strip_prefix(src).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("\\"))
}
