//! # Dependency Edge Metadata
//!
//! A declared dependency: what it requests, which configurations of the
//! declaring module it belongs to, which configurations of the target it
//! pulls in, and the excludes and artifact overrides it carries.
//!
//! Edges are built once per declaration. Conflict resolution derives
//! variants with the `with_*` copy methods; copies share every unchanged
//! field through `Arc` and are otherwise immutable.

use crate::types::require_non_empty;
use crate::{ArtifactName, ComponentSelector, GraphError, ModuleVersionId, VersionConstraint};
use std::collections::BTreeSet;
use std::sync::Arc;

// =============================================================================
// INCLUDE PREDICATE
// =============================================================================

/// Token matching every configuration.
pub const ALL_CONFIGURATIONS: &str = "%";

/// Token matching every configuration not negated later in the list.
pub const WILDCARD: &str = "*";

/// Whether an edge declared for `patterns` belongs to configuration `name`.
///
/// Tokens are evaluated left to right; the first match wins:
/// - `%` always matches
/// - a token naming any configuration in `hierarchy` matches
/// - `*` matches unless a later `!name` token excludes this configuration
pub fn includes(patterns: &[&str], name: &str, hierarchy: &BTreeSet<String>) -> bool {
    for (index, token) in patterns.iter().enumerate() {
        if *token == ALL_CONFIGURATIONS || hierarchy.contains(*token) {
            return true;
        }
        if *token == WILDCARD {
            let negated = patterns[index + 1..]
                .iter()
                .any(|later| later.strip_prefix('!') == Some(name));
            if !negated {
                return true;
            }
        }
    }
    false
}

// =============================================================================
// EXCLUDE RULES
// =============================================================================

/// Excludes matching modules, scoped to a set of configurations.
///
/// `group` and `module` accept `*` as a wildcard. A rule with an empty
/// scope applies to no configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExcludeRule {
    group: String,
    module: String,
    configurations: BTreeSet<String>,
}

impl ExcludeRule {
    pub fn new<I, S>(
        group: impl Into<String>,
        module: impl Into<String>,
        configurations: I,
    ) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            group: require_non_empty(group.into(), "exclude group")?,
            module: require_non_empty(module.into(), "exclude module")?,
            configurations: configurations.into_iter().map(Into::into).collect(),
        })
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    pub fn configurations(&self) -> &BTreeSet<String> {
        &self.configurations
    }

    /// Whether this rule is in scope for a configuration hierarchy.
    #[must_use]
    pub fn applies_to(&self, hierarchy: &BTreeSet<String>) -> bool {
        !self.configurations.is_disjoint(hierarchy)
    }

    /// Whether this rule excludes `id`.
    #[must_use]
    pub fn excludes(&self, id: &ModuleVersionId) -> bool {
        let matches = |pattern: &str, value: &str| pattern == WILDCARD || pattern == value;
        matches(&self.group, id.group()) && matches(&self.module, id.module())
    }
}

/// Rules in scope for `hierarchy`, in declaration order, without duplicates.
pub fn excludes_in_scope<'a, I>(rules: I, hierarchy: &BTreeSet<String>) -> Vec<ExcludeRule>
where
    I: IntoIterator<Item = &'a ExcludeRule>,
{
    let mut seen = BTreeSet::new();
    rules
        .into_iter()
        .filter(|rule| rule.applies_to(hierarchy))
        .filter(|rule| seen.insert(*rule))
        .cloned()
        .collect()
}

// =============================================================================
// CONFIGURATION MAPPING
// =============================================================================

/// Maps configurations of the declaring module ("from") to configurations
/// of the target ("to"), in declaration order.
///
/// Textual form: `from1,from2->to1,to2;from3->to3`. A segment without
/// `->` maps each configuration to itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationMapping {
    entries: Vec<(String, Vec<String>)>,
}

impl ConfigurationMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add targets for one source configuration (or pattern token).
    #[must_use]
    pub fn map<I, S>(mut self, from: impl Into<String>, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let from = from.into();
        let to: Vec<String> = to.into_iter().map(Into::into).collect();
        match self.entries.iter_mut().find(|(name, _)| *name == from) {
            Some((_, targets)) => {
                for target in to {
                    if !targets.contains(&target) {
                        targets.push(target);
                    }
                }
            }
            None => self.entries.push((from, to)),
        }
        self
    }

    /// Parse the textual form. Empty names are rejected.
    pub fn parse(expression: &str) -> Result<Self, GraphError> {
        let mut mapping = Self::new();
        for segment in expression.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (from, to) = match segment.split_once("->") {
                Some((from, to)) => (from, Some(to)),
                None => (segment, None),
            };
            let targets: Vec<String> = match to {
                Some(to) => to
                    .split(',')
                    .map(|t| require_non_empty(t.trim().to_string(), "target configuration"))
                    .collect::<Result<_, _>>()?,
                None => Vec::new(),
            };
            for source in from.split(',') {
                let source = require_non_empty(source.trim().to_string(), "source configuration")?;
                let targets = if to.is_some() {
                    targets.clone()
                } else {
                    vec![source.clone()]
                };
                mapping = mapping.map(source, targets);
            }
        }
        Ok(mapping)
    }

    /// The source tokens in declaration order: the include pattern list.
    pub fn module_configurations(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(from, _)| from.as_str())
    }

    /// Target configurations when `from` is being resolved for `requested`.
    ///
    /// Looks up `from`, then `*`, then `%`. In targets, `@` stands for the
    /// source configuration and `#` for the requested configuration.
    #[must_use]
    pub fn targets(&self, from: &str, requested: &str) -> Vec<String> {
        let lookup = |name: &str| {
            self.entries
                .iter()
                .find(|(source, _)| source == name)
                .map(|(_, targets)| targets)
        };
        let Some(targets) = lookup(from)
            .or_else(|| lookup(WILDCARD))
            .or_else(|| lookup(ALL_CONFIGURATIONS))
        else {
            return Vec::new();
        };

        let mut resolved: Vec<String> = Vec::with_capacity(targets.len());
        for target in targets {
            let target = match target.as_str() {
                "@" => from.to_string(),
                "#" => requested.to_string(),
                other => other.to_string(),
            };
            if !resolved.contains(&target) {
                resolved.push(target);
            }
        }
        resolved
    }
}

// =============================================================================
// DEPENDENCY METADATA
// =============================================================================

/// One declared dependency edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyMetadata {
    requested: ComponentSelector,
    mapping: Arc<ConfigurationMapping>,
    artifacts: Arc<Vec<ArtifactName>>,
    excludes: Arc<Vec<ExcludeRule>>,
    transitive: bool,
    changing: bool,
    force: bool,
}

impl DependencyMetadata {
    /// A transitive, non-changing, non-forced edge without overrides.
    #[must_use]
    pub fn new(requested: ComponentSelector, mapping: ConfigurationMapping) -> Self {
        Self {
            requested,
            mapping: Arc::new(mapping),
            artifacts: Arc::new(Vec::new()),
            excludes: Arc::new(Vec::new()),
            transitive: true,
            changing: false,
            force: false,
        }
    }

    /// Set artifact overrides while building the edge.
    #[must_use]
    pub fn artifacts(mut self, artifacts: Vec<ArtifactName>) -> Self {
        self.artifacts = Arc::new(artifacts);
        self
    }

    /// Set edge-level exclude rules while building the edge.
    #[must_use]
    pub fn excludes(mut self, excludes: Vec<ExcludeRule>) -> Self {
        self.excludes = Arc::new(excludes);
        self
    }

    #[must_use]
    pub fn transitive(mut self, transitive: bool) -> Self {
        self.transitive = transitive;
        self
    }

    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn requested(&self) -> &ComponentSelector {
        &self.requested
    }

    #[must_use]
    pub fn mapping(&self) -> &ConfigurationMapping {
        &self.mapping
    }

    /// Artifact overrides. Empty means the target configuration's defaults.
    #[must_use]
    pub fn artifact_overrides(&self) -> &[ArtifactName] {
        &self.artifacts
    }

    /// Edge-level excludes in scope for a configuration hierarchy.
    #[must_use]
    pub fn excludes_for(&self, hierarchy: &BTreeSet<String>) -> Vec<ExcludeRule> {
        excludes_in_scope(self.excludes.iter(), hierarchy)
    }

    #[must_use]
    pub fn is_transitive(&self) -> bool {
        self.transitive
    }

    #[must_use]
    pub fn is_changing(&self) -> bool {
        self.changing
    }

    #[must_use]
    pub fn is_force(&self) -> bool {
        self.force
    }

    /// Whether this edge belongs to configuration `name` with `hierarchy`.
    #[must_use]
    pub fn included_in(&self, name: &str, hierarchy: &BTreeSet<String>) -> bool {
        let patterns: Vec<&str> = self.mapping.module_configurations().collect();
        includes(&patterns, name, hierarchy)
    }

    /// Copy with a new requested version. Project selectors have no version
    /// and are returned unchanged.
    pub fn with_requested_version(&self, version: impl Into<String>) -> Result<Self, GraphError> {
        let requested = match &self.requested {
            ComponentSelector::Module { group, module, .. } => ComponentSelector::Module {
                group: group.clone(),
                module: module.clone(),
                version: VersionConstraint::new(version)?,
            },
            other => other.clone(),
        };
        Ok(Self {
            requested,
            ..self.clone()
        })
    }

    /// Copy pointing at a different target.
    #[must_use]
    pub fn with_target(&self, target: ComponentSelector) -> Self {
        Self {
            requested: target,
            ..self.clone()
        }
    }

    /// Copy flagged as changing.
    #[must_use]
    pub fn with_changing(&self) -> Self {
        Self {
            changing: true,
            ..self.clone()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn hierarchy(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn percent_matches_everything() {
        assert!(includes(&["%"], "runtime", &hierarchy(&["runtime"])));
        assert!(includes(&["%"], "test", &hierarchy(&["test"])));
    }

    #[test]
    fn wildcard_with_negation() {
        let patterns = ["*", "!test"];
        assert!(includes(&patterns, "runtime", &hierarchy(&["runtime"])));
        assert!(!includes(&patterns, "test", &hierarchy(&["test", "runtime"])));
    }

    #[test]
    fn negation_only_counts_when_later() {
        // `!test` precedes the wildcard, so the wildcard still matches.
        assert!(includes(&["!test", "*"], "test", &hierarchy(&["test"])));
    }

    #[test]
    fn hierarchy_member_matches() {
        let h = hierarchy(&["test", "compile", "default"]);
        assert!(includes(&["compile"], "test", &h));
        assert!(!includes(&["runtime"], "test", &h));
        assert!(!includes(&[], "test", &h));
    }

    #[test]
    fn named_token_wins_before_negated_wildcard() {
        let h = hierarchy(&["test", "compile"]);
        assert!(includes(&["compile", "*", "!test"], "test", &h));
    }

    #[test]
    fn mapping_parse_and_targets() {
        let mapping =
            ConfigurationMapping::parse("compile->default; runtime,test->runtime,@").unwrap();
        let froms: Vec<&str> = mapping.module_configurations().collect();
        assert_eq!(froms, vec!["compile", "runtime", "test"]);
        assert_eq!(mapping.targets("compile", "compile"), vec!["default"]);
        assert_eq!(mapping.targets("test", "test"), vec!["runtime", "test"]);
        assert!(mapping.targets("other", "other").is_empty());
    }

    #[test]
    fn mapping_falls_back_to_wildcard_then_percent() {
        let mapping = ConfigurationMapping::parse("*->#;%->master").unwrap();
        assert_eq!(mapping.targets("runtime", "runtime"), vec!["runtime"]);

        let mapping = ConfigurationMapping::parse("%->master").unwrap();
        assert_eq!(mapping.targets("anything", "x"), vec!["master"]);
    }

    #[test]
    fn mapping_without_arrow_maps_to_self() {
        let mapping = ConfigurationMapping::parse("compile").unwrap();
        assert_eq!(mapping.targets("compile", "compile"), vec!["compile"]);
        assert!(ConfigurationMapping::parse("compile->").is_err());
    }

    #[test]
    fn exclude_scope_and_match() {
        let rule = ExcludeRule::new("org.slf4j", "*", ["runtime"]).unwrap();
        assert!(rule.applies_to(&hierarchy(&["test", "runtime"])));
        assert!(!rule.applies_to(&hierarchy(&["compile"])));
        assert!(rule.excludes(&ModuleVersionId::new("org.slf4j", "slf4j-api", "2.0").unwrap()));
        assert!(!rule.excludes(&ModuleVersionId::new("org.other", "slf4j-api", "2.0").unwrap()));

        let unscoped = ExcludeRule::new("org", "m", Vec::<String>::new()).unwrap();
        assert!(!unscoped.applies_to(&hierarchy(&["compile"])));
    }

    #[test]
    fn copies_share_unchanged_state() {
        let original = DependencyMetadata::new(
            ComponentSelector::module("org", "core", "1.0").unwrap(),
            ConfigurationMapping::parse("compile->default").unwrap(),
        )
        .artifacts(vec![ArtifactName::new("core", "jar").unwrap()]);

        let bumped = original.with_requested_version("2.0").unwrap();
        assert_eq!(bumped.requested().to_string(), "org:core:2.0");
        assert_eq!(original.requested().to_string(), "org:core:1.0");
        assert!(Arc::ptr_eq(&original.artifacts, &bumped.artifacts));
        assert!(Arc::ptr_eq(&original.mapping, &bumped.mapping));

        let changing = original.with_changing();
        assert!(changing.is_changing());
        assert!(!original.is_changing());

        let retargeted = original.with_target(ComponentSelector::build(":core").unwrap());
        assert_eq!(retargeted.requested(), &ComponentSelector::build(":core").unwrap());
        assert!(retargeted.is_transitive());
    }

    #[test]
    fn project_edges_ignore_version_override() {
        let edge = DependencyMetadata::new(
            ComponentSelector::build(":lib").unwrap(),
            ConfigurationMapping::parse("compile").unwrap(),
        );
        let copy = edge.with_requested_version("3.0").unwrap();
        assert_eq!(copy.requested(), edge.requested());
    }
}
