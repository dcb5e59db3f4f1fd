//! # TOML Fixtures
//!
//! Human-written descriptions of a resolution outcome and of a module
//! descriptor, turned into recorder calls and metadata values.
//!
//! ## Result fixture
//!
//! ```toml
//! root = "app"
//! first_level = ["guava"]
//!
//! [[node]]
//! name = "app"
//! project = ":app"
//! configuration = "runtime"
//!
//! [[node]]
//! name = "guava"
//! module = "com.google.guava:guava:31.1"
//! requested = "com.google.guava:guava:31.+"
//!
//! [[edge]]
//! parent = "app"
//! child = "guava"
//! artifacts = ["guava-31.1.jar"]
//!
//! [[unresolved]]
//! parent = "app"
//! requested = "org.missing:gone:1.0"
//! reason = "Could not find org.missing:gone:1.0"
//! ```
//!
//! Selector strings: `group:module:version` is a module selector,
//! `:path` a build selector and `:path@library` a library selector.

use resgraph_core::{
    ArtifactName, ArtifactSet, BinaryStore, ComponentId, ComponentMetadata, ComponentSelector,
    ConfigurationDescriptor, ConfigurationMapping, DeclaredArtifacts, DependencyMetadata,
    ExcludeRule, GraphError, GraphRecorder, MappedContents, ModuleDescriptor, NodeKey,
    ROOT_BUILD, ResolutionFailure,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

const DEFAULT_CONFIGURATION: &str = "default";

fn invalid(message: String) -> GraphError {
    GraphError::DeserializationError(message)
}

fn default_configuration() -> String {
    DEFAULT_CONFIGURATION.to_string()
}

fn default_build() -> String {
    ROOT_BUILD.to_string()
}

fn default_wildcard() -> String {
    "*".to_string()
}

fn yes() -> bool {
    true
}

// =============================================================================
// STRING FORMS
// =============================================================================

/// Parse `group:module:version` into a component id.
pub fn parse_module_id(text: &str) -> Result<ComponentId, GraphError> {
    match text.split(':').collect::<Vec<_>>().as_slice() {
        [group, module, version] => ComponentId::module(*group, *module, *version),
        _ => Err(invalid(format!(
            "Expected group:module:version, found '{}'",
            text
        ))),
    }
}

/// Parse a selector string (see module docs).
pub fn parse_selector(text: &str) -> Result<ComponentSelector, GraphError> {
    if text.starts_with(':') {
        return match text.split_once('@') {
            Some((path, library)) => {
                ComponentSelector::library(path, Some(library.to_string()), None)
            }
            None => ComponentSelector::build(text),
        };
    }
    match text.split(':').collect::<Vec<_>>().as_slice() {
        [group, module, version] => ComponentSelector::module(*group, *module, *version),
        _ => Err(invalid(format!("Unrecognized selector '{}'", text))),
    }
}

fn artifact_set(files: &[String]) -> Result<ArtifactSet, GraphError> {
    files
        .iter()
        .map(|file| ArtifactName::from_file_name(file))
        .collect()
}

// =============================================================================
// RESULT FIXTURE
// =============================================================================

/// A resolved graph described by node aliases.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultFixture {
    pub root: String,
    #[serde(default)]
    pub first_level: Vec<String>,
    #[serde(default, rename = "node")]
    pub nodes: Vec<NodeFixture>,
    #[serde(default, rename = "edge")]
    pub edges: Vec<EdgeFixture>,
    #[serde(default)]
    pub unresolved: Vec<UnresolvedFixture>,
}

/// One node. Exactly one of `module` and `project` is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeFixture {
    pub name: String,
    pub module: Option<String>,
    pub project: Option<String>,
    #[serde(default = "default_build")]
    pub build: String,
    #[serde(default = "default_configuration")]
    pub configuration: String,
    /// What was asked for. Defaults to the exact selected id.
    pub requested: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeFixture {
    pub parent: String,
    pub child: String,
    #[serde(default)]
    pub artifacts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnresolvedFixture {
    pub parent: String,
    pub requested: String,
    pub reason: String,
}

impl NodeFixture {
    fn key(&self) -> Result<NodeKey, GraphError> {
        let component = match (&self.module, &self.project) {
            (Some(module), None) => parse_module_id(module)?,
            (None, Some(path)) => ComponentId::project(self.build.as_str(), path.as_str())?,
            _ => {
                return Err(invalid(format!(
                    "Node '{}' needs exactly one of module or project",
                    self.name
                )));
            }
        };
        NodeKey::new(component, self.configuration.as_str())
    }
}

fn lookup<'k>(keys: &'k BTreeMap<&str, NodeKey>, name: &str) -> Result<&'k NodeKey, GraphError> {
    keys.get(name)
        .ok_or_else(|| invalid(format!("Unknown node name '{}'", name)))
}

impl ResultFixture {
    pub fn parse(text: &str) -> Result<Self, GraphError> {
        toml::from_str(text).map_err(|e| invalid(format!("Invalid result fixture: {}", e)))
    }

    /// Feed the fixture through `recorder` and seal it with ROOT.
    ///
    /// Records are written in fixture order: nodes, edges, first-level
    /// entries, unresolved edges, then ROOT. Returns the contents tables
    /// the materializer needs.
    pub fn record<S: BinaryStore>(
        &self,
        recorder: &mut GraphRecorder<S>,
    ) -> Result<MappedContents, GraphError> {
        let mut contents = MappedContents::new();
        let mut keys: BTreeMap<&str, NodeKey> = BTreeMap::new();

        for node in &self.nodes {
            let key = node.key()?;
            let requested = match &node.requested {
                Some(text) => parse_selector(text)?,
                None => ComponentSelector::exact(key.component()),
            };
            recorder.node(&key)?;
            contents.insert_requested(key.clone(), requested);
            keys.insert(node.name.as_str(), key);
        }

        for edge in &self.edges {
            let handle = contents.register_artifacts(artifact_set(&edge.artifacts)?);
            recorder.parent_child(
                lookup(&keys, &edge.parent)?,
                lookup(&keys, &edge.child)?,
                handle,
            )?;
        }
        for name in &self.first_level {
            recorder.first_level(lookup(&keys, name)?)?;
        }
        for edge in &self.unresolved {
            recorder.unresolved(
                lookup(&keys, &edge.parent)?,
                &parse_selector(&edge.requested)?,
                &ResolutionFailure::new(edge.reason.as_str()),
            )?;
        }
        recorder.root(lookup(&keys, &self.root)?)?;

        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            records = recorder.records(),
            "fixture recorded"
        );
        Ok(contents)
    }
}

// =============================================================================
// MODULE FIXTURE
// =============================================================================

/// A module descriptor with its declared artifacts.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleFixture {
    /// `group:module:version`, or a project path starting with `:`.
    pub id: String,
    #[serde(default, rename = "configuration")]
    pub configurations: Vec<ConfigurationFixture>,
    #[serde(default, rename = "dependency")]
    pub dependencies: Vec<DependencyFixture>,
    #[serde(default, rename = "exclude")]
    pub excludes: Vec<ExcludeFixture>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactsFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigurationFixture {
    pub name: String,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default = "yes")]
    pub transitive: bool,
    #[serde(default = "yes")]
    pub visible: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyFixture {
    pub requested: String,
    /// Mapping expression such as `compile->default;runtime->runtime,master`.
    pub mapping: String,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default, rename = "exclude")]
    pub excludes: Vec<ExcludeFixture>,
    #[serde(default = "yes")]
    pub transitive: bool,
    #[serde(default)]
    pub changing: bool,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcludeFixture {
    #[serde(default = "default_wildcard")]
    pub group: String,
    #[serde(default = "default_wildcard")]
    pub module: String,
    pub configurations: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactsFixture {
    pub configuration: String,
    pub files: Vec<String>,
}

impl ExcludeFixture {
    fn rule(&self) -> Result<ExcludeRule, GraphError> {
        ExcludeRule::new(
            self.group.as_str(),
            self.module.as_str(),
            self.configurations.iter().map(String::as_str),
        )
    }
}

impl DependencyFixture {
    fn metadata(&self) -> Result<DependencyMetadata, GraphError> {
        let artifacts = self
            .artifacts
            .iter()
            .map(|file| ArtifactName::from_file_name(file))
            .collect::<Result<Vec<_>, _>>()?;
        let excludes = self
            .excludes
            .iter()
            .map(ExcludeFixture::rule)
            .collect::<Result<Vec<_>, _>>()?;
        let dependency = DependencyMetadata::new(
            parse_selector(&self.requested)?,
            ConfigurationMapping::parse(&self.mapping)?,
        )
        .artifacts(artifacts)
        .excludes(excludes)
        .transitive(self.transitive)
        .force(self.force);
        Ok(if self.changing {
            dependency.with_changing()
        } else {
            dependency
        })
    }
}

impl ModuleFixture {
    pub fn parse(text: &str) -> Result<Self, GraphError> {
        toml::from_str(text).map_err(|e| invalid(format!("Invalid module fixture: {}", e)))
    }

    pub fn component_id(&self) -> Result<ComponentId, GraphError> {
        if self.id.starts_with(':') {
            ComponentId::project(ROOT_BUILD, self.id.as_str())
        } else {
            parse_module_id(&self.id)
        }
    }

    /// Build the component view with memoized configurations.
    pub fn metadata(&self) -> Result<ComponentMetadata, GraphError> {
        let mut descriptor = ModuleDescriptor::new();
        for configuration in &self.configurations {
            descriptor.add_configuration(
                ConfigurationDescriptor::new(configuration.name.as_str())?
                    .extends(configuration.extends.iter().map(String::as_str))
                    .transitive(configuration.transitive)
                    .visible(configuration.visible),
            );
        }
        for dependency in &self.dependencies {
            descriptor.add_dependency(dependency.metadata()?);
        }
        for exclude in &self.excludes {
            descriptor.add_exclude(exclude.rule()?);
        }

        let mut artifacts = DeclaredArtifacts::new();
        for declared in &self.artifacts {
            artifacts.declare(declared.configuration.as_str(), &artifact_set(&declared.files)?);
        }

        Ok(ComponentMetadata::new(
            self.component_id()?,
            descriptor,
            Arc::new(artifacts),
        ))
    }
}

// =============================================================================
// TESTS
// =============================================================================
