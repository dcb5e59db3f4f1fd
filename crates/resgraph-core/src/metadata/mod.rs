//! # Configuration & Dependency Metadata
//!
//! A component's named configurations, their extension hierarchy, and the
//! dependencies, excludes and artifacts each configuration sees.
//!
//! `ModuleDescriptor` is the raw declaration. `ComponentMetadata` wraps it
//! with per-name memo tables: a configuration is computed on first access
//! and shared afterwards. Within a `ConfigurationMetadata`, the dependency
//! list, exclude set and artifact set are each computed lazily, once.
//!
//! Cycles in `extends` are an authoring error caught by the descriptor
//! validator upstream. Here they only stop the recursion.

pub mod dependency;

pub use dependency::{ConfigurationMapping, DependencyMetadata, ExcludeRule, includes};

use crate::{ArtifactSet, ComponentId, GraphError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

// =============================================================================
// DESCRIPTOR (raw declarations)
// =============================================================================

/// A declared configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationDescriptor {
    name: String,
    extends: Vec<String>,
    transitive: bool,
    visible: bool,
}

impl ConfigurationDescriptor {
    /// A transitive, visible configuration extending nothing.
    pub fn new(name: impl Into<String>) -> Result<Self, GraphError> {
        Ok(Self {
            name: crate::types::require_non_empty(name.into(), "configuration name")?,
            extends: Vec::new(),
            transitive: true,
            visible: true,
        })
    }

    #[must_use]
    pub fn extends<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extends = parents.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn transitive(mut self, transitive: bool) -> Self {
        self.transitive = transitive;
        self
    }

    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn extended(&self) -> &[String] {
        &self.extends
    }
}

/// Everything a module declares, before any per-configuration view.
#[derive(Debug, Clone, Default)]
pub struct ModuleDescriptor {
    configurations: BTreeMap<String, ConfigurationDescriptor>,
    dependencies: Vec<DependencyMetadata>,
    excludes: Vec<ExcludeRule>,
}

impl ModuleDescriptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a configuration. A later declaration with the same name replaces it.
    pub fn add_configuration(&mut self, configuration: ConfigurationDescriptor) {
        self.configurations
            .insert(configuration.name.clone(), configuration);
    }

    pub fn add_dependency(&mut self, dependency: DependencyMetadata) {
        self.dependencies.push(dependency);
    }

    pub fn add_exclude(&mut self, rule: ExcludeRule) {
        self.excludes.push(rule);
    }

    #[must_use]
    pub fn configuration(&self, name: &str) -> Option<&ConfigurationDescriptor> {
        self.configurations.get(name)
    }

    pub fn configuration_names(&self) -> impl Iterator<Item = &str> {
        self.configurations.keys().map(String::as_str)
    }

    #[must_use]
    pub fn dependencies(&self) -> &[DependencyMetadata] {
        &self.dependencies
    }

    #[must_use]
    pub fn excludes(&self) -> &[ExcludeRule] {
        &self.excludes
    }
}

// =============================================================================
// ARTIFACT SOURCE (external collaborator)
// =============================================================================

/// Maps a component configuration to the artifacts it publishes.
pub trait ArtifactSource: Send + Sync {
    fn artifacts(
        &self,
        component: &ComponentId,
        configuration: &str,
        hierarchy: &BTreeSet<String>,
    ) -> ArtifactSet;
}

/// Artifacts declared per configuration name.
///
/// A configuration publishes the artifacts of every configuration in its
/// hierarchy.
#[derive(Debug, Clone, Default)]
pub struct DeclaredArtifacts {
    by_configuration: BTreeMap<String, ArtifactSet>,
}

impl DeclaredArtifacts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, configuration: impl Into<String>, artifacts: &ArtifactSet) {
        self.by_configuration
            .entry(configuration.into())
            .or_default()
            .extend_from(artifacts);
    }
}

impl ArtifactSource for DeclaredArtifacts {
    fn artifacts(
        &self,
        _component: &ComponentId,
        _configuration: &str,
        hierarchy: &BTreeSet<String>,
    ) -> ArtifactSet {
        let mut all = ArtifactSet::new();
        for name in hierarchy {
            if let Some(set) = self.by_configuration.get(name) {
                all.extend_from(set);
            }
        }
        all
    }
}

// =============================================================================
// CONFIGURATION METADATA (computed view)
// =============================================================================

/// One configuration of one component, with lazily computed contents.
pub struct ConfigurationMetadata {
    component: ComponentId,
    name: String,
    hierarchy: Arc<BTreeSet<String>>,
    transitive: bool,
    visible: bool,
    descriptor: Arc<ModuleDescriptor>,
    artifact_source: Arc<dyn ArtifactSource>,
    dependencies: OnceLock<Vec<DependencyMetadata>>,
    excludes: OnceLock<Vec<ExcludeRule>>,
    artifacts: OnceLock<ArtifactSet>,
}

impl std::fmt::Debug for ConfigurationMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationMetadata")
            .field("component", &self.component)
            .field("name", &self.name)
            .field("hierarchy", &self.hierarchy)
            .field("transitive", &self.transitive)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

impl ConfigurationMetadata {
    #[must_use]
    pub fn component(&self) -> &ComponentId {
        &self.component
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This configuration plus everything it extends, transitively.
    #[must_use]
    pub fn hierarchy(&self) -> &BTreeSet<String> {
        &self.hierarchy
    }

    #[must_use]
    pub fn is_transitive(&self) -> bool {
        self.transitive
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Declared dependencies whose module-configuration patterns match this
    /// configuration's hierarchy, in declaration order.
    pub fn dependencies(&self) -> &[DependencyMetadata] {
        self.dependencies.get_or_init(|| {
            self.descriptor
                .dependencies()
                .iter()
                .filter(|dependency| dependency.included_in(&self.name, &self.hierarchy))
                .cloned()
                .collect()
        })
    }

    /// Descriptor-level exclude rules scoped to any configuration in the hierarchy.
    pub fn excludes(&self) -> &[ExcludeRule] {
        self.excludes.get_or_init(|| {
            dependency::excludes_in_scope(self.descriptor.excludes(), &self.hierarchy)
        })
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        self.artifacts.get_or_init(|| {
            self.artifact_source
                .artifacts(&self.component, &self.name, &self.hierarchy)
        })
    }
}

// =============================================================================
// COMPONENT METADATA (memo tables)
// =============================================================================

/// A component with its descriptor and per-configuration memo tables.
///
/// Safe to share between threads: lookups take a read lock, a miss computes
/// outside any lock and inserts under a write lock (first insert wins).
pub struct ComponentMetadata {
    id: ComponentId,
    descriptor: Arc<ModuleDescriptor>,
    artifact_source: Arc<dyn ArtifactSource>,
    configurations: RwLock<BTreeMap<String, Arc<ConfigurationMetadata>>>,
    hierarchies: RwLock<BTreeMap<String, Arc<BTreeSet<String>>>>,
}

impl std::fmt::Debug for ComponentMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentMetadata")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl ComponentMetadata {
    pub fn new(
        id: ComponentId,
        descriptor: ModuleDescriptor,
        artifact_source: Arc<dyn ArtifactSource>,
    ) -> Self {
        Self {
            id,
            descriptor: Arc::new(descriptor),
            artifact_source,
            configurations: RwLock::new(BTreeMap::new()),
            hierarchies: RwLock::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    #[must_use]
    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    /// The named configuration, or `None` if the descriptor does not declare it.
    #[must_use]
    pub fn configuration(&self, name: &str) -> Option<Arc<ConfigurationMetadata>> {
        if let Some(found) = self
            .configurations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Some(Arc::clone(found));
        }

        let declared = self.descriptor.configuration(name)?;
        let computed = Arc::new(ConfigurationMetadata {
            component: self.id.clone(),
            name: declared.name.clone(),
            hierarchy: self.hierarchy(name),
            transitive: declared.transitive,
            visible: declared.visible,
            descriptor: Arc::clone(&self.descriptor),
            artifact_source: Arc::clone(&self.artifact_source),
            dependencies: OnceLock::new(),
            excludes: OnceLock::new(),
            artifacts: OnceLock::new(),
        });

        let mut table = self
            .configurations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Some(Arc::clone(
            table.entry(name.to_string()).or_insert(computed),
        ))
    }

    /// Hierarchy of `name`: itself plus the hierarchies of what it extends.
    #[must_use]
    pub fn hierarchy(&self, name: &str) -> Arc<BTreeSet<String>> {
        let mut visiting = BTreeSet::new();
        self.hierarchy_of(name, &mut visiting)
    }

    fn hierarchy_of(&self, name: &str, visiting: &mut BTreeSet<String>) -> Arc<BTreeSet<String>> {
        if let Some(found) = self
            .hierarchies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(found);
        }

        let mut closure = BTreeSet::from([name.to_string()]);
        visiting.insert(name.to_string());
        if let Some(declared) = self.descriptor.configuration(name) {
            for parent in &declared.extends {
                if visiting.contains(parent) {
                    // cycle
                    closure.insert(parent.clone());
                    continue;
                }
                closure.extend(self.hierarchy_of(parent, visiting).iter().cloned());
            }
        }
        visiting.remove(name);

        let mut table = self
            .hierarchies
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            table
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(closure)),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::{ArtifactName, ComponentSelector};

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    fn dependency(module: &str, mapping: &str) -> DependencyMetadata {
        DependencyMetadata::new(
            ComponentSelector::module("org", module, "1.0").unwrap(),
            ConfigurationMapping::parse(mapping).unwrap(),
        )
    }

    fn component(descriptor: ModuleDescriptor) -> ComponentMetadata {
        let mut artifacts = DeclaredArtifacts::new();
        let main: ArtifactSet = [ArtifactName::new("app", "jar").unwrap()].into_iter().collect();
        let tests: ArtifactSet = [ArtifactName::new("app", "jar").unwrap().with_classifier("tests")]
            .into_iter()
            .collect();
        artifacts.declare("default", &main);
        artifacts.declare("test", &tests);
        ComponentMetadata::new(
            ComponentId::module("org", "app", "1.0").unwrap(),
            descriptor,
            Arc::new(artifacts),
        )
    }

    fn layered() -> ModuleDescriptor {
        let mut descriptor = ModuleDescriptor::new();
        descriptor.add_configuration(ConfigurationDescriptor::new("default").unwrap());
        descriptor.add_configuration(
            ConfigurationDescriptor::new("compile")
                .unwrap()
                .extends(["default"]),
        );
        descriptor.add_configuration(
            ConfigurationDescriptor::new("runtime")
                .unwrap()
                .extends(["compile"]),
        );
        descriptor.add_configuration(
            ConfigurationDescriptor::new("test")
                .unwrap()
                .extends(["compile"])
                .visible(false),
        );
        descriptor
    }

    #[test]
    fn hierarchy_is_transitive_closure() {
        let metadata = component(layered());
        let test = metadata.configuration("test").unwrap();
        assert_eq!(names(test.hierarchy()), vec!["compile", "default", "test"]);
        assert!(!test.is_visible());
        assert!(test.is_transitive());
    }

    #[test]
    fn unknown_configuration_is_none() {
        let metadata = component(layered());
        assert!(metadata.configuration("optional").is_none());
    }

    #[test]
    fn configuration_is_memoized() {
        let metadata = component(layered());
        let first = metadata.configuration("runtime").unwrap();
        let second = metadata.configuration("runtime").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn dependencies_filtered_by_hierarchy() {
        let mut descriptor = layered();
        descriptor.add_dependency(dependency("api", "compile->default"));
        descriptor.add_dependency(dependency("driver", "runtime->default"));
        descriptor.add_dependency(dependency("junit", "test->default"));
        descriptor.add_dependency(dependency("logging", "*,!test->default"));
        descriptor.add_dependency(dependency("annotations", "%->default"));
        let metadata = component(descriptor);

        let modules = |conf: &str| -> Vec<String> {
            metadata
                .configuration(conf)
                .unwrap()
                .dependencies()
                .iter()
                .map(|d| d.requested().to_string())
                .collect()
        };

        assert_eq!(
            modules("test"),
            vec!["org:api:1.0", "org:junit:1.0", "org:annotations:1.0"]
        );
        assert_eq!(
            modules("runtime"),
            vec![
                "org:api:1.0",
                "org:driver:1.0",
                "org:logging:1.0",
                "org:annotations:1.0"
            ]
        );
    }

    #[test]
    fn excludes_scoped_by_hierarchy() {
        let mut descriptor = layered();
        descriptor.add_exclude(ExcludeRule::new("commons-logging", "*", ["compile"]).unwrap());
        descriptor.add_exclude(ExcludeRule::new("log4j", "log4j", ["runtime"]).unwrap());
        let metadata = component(descriptor);

        let test = metadata.configuration("test").unwrap();
        assert_eq!(test.excludes().len(), 1);
        assert_eq!(test.excludes()[0].group(), "commons-logging");

        let runtime = metadata.configuration("runtime").unwrap();
        assert_eq!(runtime.excludes().len(), 2);

        let default = metadata.configuration("default").unwrap();
        assert!(default.excludes().is_empty());
    }

    #[test]
    fn artifacts_come_from_source_over_hierarchy() {
        let metadata = component(layered());
        let test = metadata.configuration("test").unwrap();
        assert_eq!(test.artifacts().len(), 2);
        let compile = metadata.configuration("compile").unwrap();
        assert_eq!(compile.artifacts().len(), 1);
    }

    #[test]
    fn extends_cycle_terminates() {
        let mut descriptor = ModuleDescriptor::new();
        descriptor.add_configuration(ConfigurationDescriptor::new("a").unwrap().extends(["b"]));
        descriptor.add_configuration(ConfigurationDescriptor::new("b").unwrap().extends(["a"]));
        let metadata = component(descriptor);
        let a = metadata.configuration("a").unwrap();
        assert_eq!(names(a.hierarchy()), vec!["a", "b"]);
    }

    #[test]
    fn concurrent_lookups_share_one_instance() {
        let metadata = Arc::new(component(layered()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metadata = Arc::clone(&metadata);
                std::thread::spawn(move || metadata.configuration("test").unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for result in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], result));
        }
    }
}
