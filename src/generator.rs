use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::bundle::{Bundle, BundleResolver};
use crate::error::Result;
use crate::fs::Filesystem;
use crate::routing::RouteResources;
use crate::template::{self, ROUTE_BLOCK, SCHEMA_CLASS_NAME};
use crate::types::{BundleName, RoutePromptPolarity};

pub const CONFIG_MARKER: &str = "graph_ql";
/// Any of these in a route resource identifier means the GraphQL controller is routed.
pub const ROUTE_MARKERS: &[&str] = &["GraphQLController.php", "@GraphQLBundle/Controller"];
pub const ROUTING_FILE_SUFFIX: &str = "routing.yml";

pub const ROUTE_PROMPT: &str = "Confirm adding GraphQL route? [Y/n]";

/// Interaction with whoever runs the generator.
pub trait Console {
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;

    /// A status line, emitted as soon as it is known.
    fn line(&mut self, _text: &str) {}

    /// Visual spacing after a group of status lines. Never part of the report.
    fn blank_line(&mut self) {}
}

/// Closures answer prompts and ignore status lines.
impl<F> Console for F
where
    F: FnMut(&str, bool) -> bool,
{
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        Ok(self(question, default))
    }
}

/// Takes the default answer of every prompt without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptDefaults;

impl Console for AcceptDefaults {
    fn confirm(&mut self, _question: &str, default: bool) -> Result<bool> {
        Ok(default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    BundleNotFound,
    UserDeclinedSchema,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub bundle: BundleName,
    pub schema_path: Option<PathBuf>,
    pub schema_created: bool,
    pub config_updated: bool,
    pub route_added: bool,
    pub terminated: Option<Termination>,
    pub messages: Vec<String>,
}

impl Report {
    fn say(&mut self, console: &mut dyn Console, text: String) {
        console.line(&text);
        self.messages.push(text);
    }
}

/// A block that must appear exactly once in a file, detected by `marker`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRegistration {
    pub marker: &'static str,
    pub payload: String,
    pub target_file: PathBuf,
}

impl ConfigRegistration {
    pub fn schema_class(bundle: &BundleName, target_file: impl Into<PathBuf>) -> Self {
        Self {
            marker: CONFIG_MARKER,
            payload: template::config_block(bundle.as_str(), SCHEMA_CLASS_NAME),
            target_file: target_file.into(),
        }
    }

    /// Puts the payload in front of the current content unless the marker is already
    /// there. Returns whether the file was written.
    pub fn prepend(&self, fs: &dyn Filesystem) -> Result<bool> {
        let current = fs.read_to_string(&self.target_file)?.unwrap_or_default();
        if current.contains(self.marker) {
            tracing::debug!(path = %self.target_file.display(), marker = self.marker, "config already registered");
            return Ok(false);
        }
        if let Some(parent) = self.target_file.parent()
            && !parent.as_os_str().is_empty()
            && !fs.exists(parent)
        {
            fs.create_dir_all(parent)?;
        }
        fs.write(&self.target_file, &format!("{}{current}", self.payload))?;
        tracing::info!(path = %self.target_file.display(), "registered schema class in config");
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRegistration {
    pub markers: &'static [&'static str],
    pub payload: &'static str,
}

impl Default for RouteRegistration {
    fn default() -> Self {
        Self {
            markers: ROUTE_MARKERS,
            payload: ROUTE_BLOCK,
        }
    }
}

impl RouteRegistration {
    fn matches(&self, text: &str) -> bool {
        self.markers.iter().any(|m| text.contains(m))
    }

    pub fn is_registered(&self, resources: &[String]) -> bool {
        resources.iter().any(|r| self.matches(r))
    }

    /// The main routing file: the first resource named `*routing.yml`.
    pub fn target(&self, resources: &[String]) -> Option<PathBuf> {
        resources
            .iter()
            .find(|r| r.ends_with(ROUTING_FILE_SUFFIX))
            .map(PathBuf::from)
    }

    /// Appends the payload unless the file content already routes the controller.
    pub fn append(&self, fs: &dyn Filesystem, target: &Path) -> Result<bool> {
        let current = fs.read_to_string(target)?.unwrap_or_default();
        if self.matches(&current) {
            return Ok(false);
        }
        fs.append(target, self.payload)?;
        tracing::info!(path = %target.display(), "appended GraphQL route");
        Ok(true)
    }
}

/// Scaffolds `<Bundle>/GraphQL/Schema.php` and registers it with the project.
pub struct Generator<'a> {
    bundles: &'a dyn BundleResolver,
    routes: &'a dyn RouteResources,
    fs: &'a dyn Filesystem,
    config_file: PathBuf,
    route: RouteRegistration,
    route_prompt: RoutePromptPolarity,
}

impl<'a> Generator<'a> {
    pub fn new(
        bundles: &'a dyn BundleResolver,
        routes: &'a dyn RouteResources,
        fs: &'a dyn Filesystem,
        config_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bundles,
            routes,
            fs,
            config_file: config_file.into(),
            route: RouteRegistration::default(),
            route_prompt: RoutePromptPolarity::default(),
        }
    }

    pub fn route_prompt(mut self, polarity: RoutePromptPolarity) -> Self {
        self.route_prompt = polarity;
        self
    }

    /// Runs the whole workflow once.
    ///
    /// `non_interactive` only silences "already there" notices; prompts are still asked.
    /// An unknown bundle or a declined schema prompt ends the run with `Ok` and a
    /// `terminated` reason. Filesystem failures end it with `Err`, leaving earlier writes
    /// of the same run in place.
    pub fn generate(
        &self,
        name: impl Into<BundleName>,
        non_interactive: bool,
        console: &mut dyn Console,
    ) -> Result<Report> {
        let name = name.into();
        let mut report = Report {
            bundle: name.clone(),
            ..Report::default()
        };

        let Some(bundle) = self.bundles.resolve(&name) else {
            tracing::debug!(bundle = %name, "bundle not resolved");
            report.say(console, format!("There is no active bundle: {name}"));
            report.terminated = Some(Termination::BundleNotFound);
            return Ok(report);
        };

        let schema_path = bundle.schema_path();
        report.schema_path = Some(schema_path.clone());

        if self.fs.exists(&schema_path) {
            if !non_interactive {
                report.say(
                    console,
                    format!("Schema class {} was found.", bundle.schema_class()),
                );
            }
        } else {
            let question = format!("Confirm creating class at {} ? [Y/n]", bundle.schema_class());
            if !console.confirm(&question, true)? {
                tracing::debug!(bundle = %name, "schema creation declined");
                report.terminated = Some(Termination::UserDeclinedSchema);
                return Ok(report);
            }
            self.write_schema(&bundle, &schema_path)?;
            report.schema_created = true;
            report.say(console, "Schema file has been created at".to_string());
            report.say(console, schema_path.display().to_string());
            console.blank_line();

            report.config_updated =
                ConfigRegistration::schema_class(&bundle.name, &self.config_file).prepend(self.fs)?;
        }

        self.register_route(non_interactive, console, &mut report)?;
        Ok(report)
    }

    fn write_schema(&self, bundle: &Bundle, schema_path: &Path) -> Result<()> {
        let dir = bundle.graphql_dir();
        if !self.fs.exists(&dir) {
            self.fs.create_dir_all(&dir)?;
        }
        let source = template::render_schema_class(&bundle.schema_namespace(), SCHEMA_CLASS_NAME);
        self.fs.write(schema_path, &source)?;
        tracing::info!(path = %schema_path.display(), "wrote schema class");
        Ok(())
    }

    fn register_route(
        &self,
        non_interactive: bool,
        console: &mut dyn Console,
        report: &mut Report,
    ) -> Result<()> {
        let resources = self.routes.route_resources()?;
        if self.route.is_registered(&resources) {
            if !non_interactive {
                report.say(console, "GraphQL default route was found.".to_string());
            }
            return Ok(());
        }

        let Some(target) = self.route.target(&resources) else {
            tracing::debug!(count = resources.len(), "no routing file among route resources");
            return Ok(());
        };

        let answer = console.confirm(ROUTE_PROMPT, true)?;
        if !self.route_prompt.should_append(answer) {
            tracing::debug!(answer, polarity = ?self.route_prompt, "route not added");
            return Ok(());
        }

        if self.route.append(self.fs, &target)? {
            report.route_added = true;
            report.say(console, format!("Config was added to {}", target.display()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    #[test]
    fn config_prepend_keeps_existing_content_after_block() {
        let fs = MemoryFs::new().with_file("/p/config.yml", "imports:\n    - { resource: a.yml }\n");
        let reg = ConfigRegistration::schema_class(&BundleName::new("App"), "/p/config.yml");
        assert!(reg.prepend(&fs).unwrap());

        let out = fs.file("/p/config.yml").unwrap();
        assert!(out.starts_with("graph_ql:\n    schema_class: \"AppBundle\\\\GraphQL\\\\Schema\"\n"));
        assert!(out.ends_with("\nimports:\n    - { resource: a.yml }\n"));
    }

    #[test]
    fn config_prepend_is_skipped_when_marker_present_anywhere() {
        let original = "framework: ~\n# graph_ql configured elsewhere\n";
        let fs = MemoryFs::new().with_file("/p/config.yml", original);
        let reg = ConfigRegistration::schema_class(&BundleName::new("App"), "/p/config.yml");
        assert!(!reg.prepend(&fs).unwrap());
        assert_eq!(fs.file("/p/config.yml").as_deref(), Some(original));
        assert_eq!(fs.mutations(), 0);
    }

    #[test]
    fn missing_config_file_is_created_with_block() {
        let fs = MemoryFs::new();
        let reg = ConfigRegistration::schema_class(&BundleName::new("App"), "/p/app/config/config.yml");
        assert!(reg.prepend(&fs).unwrap());
        assert!(fs.has_dir("/p/app/config"));
        assert_eq!(fs.file("/p/app/config/config.yml"), Some(reg.payload.clone()));
    }

    #[test]
    fn route_target_is_first_routing_yml() {
        let route = RouteRegistration::default();
        let resources = vec![
            "/p/src/AppBundle/Controller/".to_string(),
            "/p/app/config/routing_dev.yml".to_string(),
            "/p/app/config/routing.yml".to_string(),
            "/p/app/config/admin/routing.yml".to_string(),
        ];
        assert_eq!(
            route.target(&resources),
            Some(PathBuf::from("/p/app/config/routing.yml"))
        );
        assert!(!route.is_registered(&resources));
    }

    #[test]
    fn route_markers_match_controller_file_or_import() {
        let route = RouteRegistration::default();
        assert!(route.is_registered(&[
            "/p/vendor/youshido/graphql-bundle/Controller/GraphQLController.php".to_string()
        ]));
        assert!(route.is_registered(&["@GraphQLBundle/Controller/".to_string()]));
    }

    #[test]
    fn route_append_rechecks_file_content() {
        let fs = MemoryFs::new().with_file("/p/routing.yml", format!("app: ~\n{ROUTE_BLOCK}"));
        let route = RouteRegistration::default();
        assert!(!route.append(&fs, Path::new("/p/routing.yml")).unwrap());
        assert_eq!(fs.mutations(), 0);
    }
}
