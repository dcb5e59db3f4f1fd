//! # Resolution Result Graph
//!
//! The in-memory resolved dependency DAG produced by materialization.
//!
//! All data structures use `BTreeMap`/`BTreeSet` for deterministic ordering.
//! The graph is immutable once built; the materializer is the only writer.

use crate::{ArtifactSet, ArtifactSetHandle, ComponentSelector, GraphError, NodeKey};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// CONTENTS MAPPING
// =============================================================================

/// Lookups owned by the resolution algorithm, supplied at load time.
///
/// The event stream only stores keys and numeric handles; this trait maps
/// them back to what was requested and which artifacts an edge carries.
pub trait ContentsMapping {
    /// The selector that requested the node, if known.
    fn requested(&self, key: &NodeKey) -> Option<ComponentSelector>;

    /// The artifact set registered under `handle`, if known.
    fn artifacts(&self, handle: ArtifactSetHandle) -> Option<ArtifactSet>;
}

/// A `ContentsMapping` backed by explicit tables.
#[derive(Debug, Clone, Default)]
pub struct MappedContents {
    requested: BTreeMap<NodeKey, ComponentSelector>,
    artifacts: BTreeMap<ArtifactSetHandle, ArtifactSet>,
    next_handle: u64,
}

impl MappedContents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the selector that requested `key`.
    pub fn insert_requested(&mut self, key: NodeKey, selector: ComponentSelector) {
        self.requested.insert(key, selector);
    }

    /// Register an artifact set and return its handle.
    ///
    /// Identical sets share one handle.
    pub fn register_artifacts(&mut self, artifacts: ArtifactSet) -> ArtifactSetHandle {
        if let Some((handle, _)) = self.artifacts.iter().find(|(_, set)| **set == artifacts) {
            return *handle;
        }
        let handle = ArtifactSetHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        self.artifacts.insert(handle, artifacts);
        handle
    }
}

impl ContentsMapping for MappedContents {
    fn requested(&self, key: &NodeKey) -> Option<ComponentSelector> {
        self.requested.get(key).cloned()
    }

    fn artifacts(&self, handle: ArtifactSetHandle) -> Option<ArtifactSet> {
        self.artifacts.get(&handle).cloned()
    }
}

// =============================================================================
// DEPENDENCY RESULT
// =============================================================================

/// Why a requested dependency has no selected component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResolutionFailure {
    pub message: String,
}

impl ResolutionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of one outgoing dependency edge.
///
/// Exactly one of `selected` and `failure` is present.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DependencyResult {
    requested: ComponentSelector,
    selected: Option<NodeKey>,
    failure: Option<ResolutionFailure>,
}

impl DependencyResult {
    #[must_use]
    pub fn resolved(requested: ComponentSelector, selected: NodeKey) -> Self {
        Self {
            requested,
            selected: Some(selected),
            failure: None,
        }
    }

    #[must_use]
    pub fn failed(requested: ComponentSelector, failure: ResolutionFailure) -> Self {
        Self {
            requested,
            selected: None,
            failure: Some(failure),
        }
    }

    #[must_use]
    pub fn requested(&self) -> &ComponentSelector {
        &self.requested
    }

    #[must_use]
    pub fn selected(&self) -> Option<&NodeKey> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&ResolutionFailure> {
        self.failure.as_ref()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.selected.is_some()
    }
}

// =============================================================================
// RESOLVED NODE
// =============================================================================

/// One resolved component within one configuration's graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    key: NodeKey,
    parents: BTreeSet<NodeKey>,
    children: BTreeSet<NodeKey>,
    /// Artifacts contributed through each parent edge.
    parent_artifacts: BTreeMap<NodeKey, ArtifactSet>,
    /// Outgoing edges in stream order, failed ones included.
    dependencies: Vec<DependencyResult>,
}

impl ResolvedNode {
    #[must_use]
    pub fn new(key: NodeKey) -> Self {
        Self {
            key,
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
            parent_artifacts: BTreeMap::new(),
            dependencies: Vec::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    pub fn parents(&self) -> impl Iterator<Item = &NodeKey> {
        self.parents.iter()
    }

    pub fn children(&self) -> impl Iterator<Item = &NodeKey> {
        self.children.iter()
    }

    /// Artifacts this node exposes through the edge from `parent`.
    #[must_use]
    pub fn artifacts_from(&self, parent: &NodeKey) -> Option<&ArtifactSet> {
        self.parent_artifacts.get(parent)
    }

    /// Union of the artifacts contributed through every parent edge.
    #[must_use]
    pub fn all_artifacts(&self) -> ArtifactSet {
        let mut all = ArtifactSet::new();
        for set in self.parent_artifacts.values() {
            all.extend_from(set);
        }
        all
    }

    #[must_use]
    pub fn dependencies(&self) -> &[DependencyResult] {
        &self.dependencies
    }

    pub(crate) fn add_parent(&mut self, parent: NodeKey, artifacts: &ArtifactSet) {
        self.parent_artifacts
            .entry(parent.clone())
            .or_default()
            .extend_from(artifacts);
        self.parents.insert(parent);
    }

    /// Returns `false` if the edge to `child` was already present.
    pub(crate) fn add_child(&mut self, child: NodeKey) -> bool {
        self.children.insert(child)
    }

    pub(crate) fn add_dependency(&mut self, result: DependencyResult) {
        self.dependencies.push(result);
    }
}

// =============================================================================
// RESOLUTION RESULT GRAPH
// =============================================================================

/// A materialized resolution: root, first-level dependencies, node table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResultGraph {
    root: NodeKey,
    first_level: BTreeMap<ComponentSelector, NodeKey>,
    nodes: BTreeMap<NodeKey, ResolvedNode>,
}

impl ResolutionResultGraph {
    /// Assemble a graph, checking that every reference resolves and that
    /// only the root is parentless.
    pub fn new(
        root: NodeKey,
        first_level: BTreeMap<ComponentSelector, NodeKey>,
        nodes: BTreeMap<NodeKey, ResolvedNode>,
    ) -> Result<Self, GraphError> {
        let known = |key: &NodeKey| -> Result<(), GraphError> {
            if nodes.contains_key(key) {
                Ok(())
            } else {
                Err(GraphError::UnexpectedId {
                    key: key.clone(),
                    known: nodes.keys().cloned().collect(),
                })
            }
        };

        known(&root)?;
        for key in first_level.values() {
            known(key)?;
        }
        for node in nodes.values() {
            for key in node.parents.iter().chain(node.children.iter()) {
                known(key)?;
            }
        }
        if let Some(orphan) = nodes
            .values()
            .find(|node| node.key != root && node.parents.is_empty())
        {
            return Err(GraphError::OrphanNode {
                key: orphan.key.clone(),
                known: nodes.keys().cloned().collect(),
            });
        }

        Ok(Self {
            root,
            first_level,
            nodes,
        })
    }

    #[must_use]
    pub fn root(&self) -> &ResolvedNode {
        // Presence is checked in `new`.
        &self.nodes[&self.root]
    }

    #[must_use]
    pub fn root_key(&self) -> &NodeKey {
        &self.root
    }

    #[must_use]
    pub fn node(&self, key: &NodeKey) -> Option<&ResolvedNode> {
        self.nodes.get(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ResolvedNode> {
        self.nodes.values()
    }

    #[must_use]
    pub fn first_level(&self) -> &BTreeMap<ComponentSelector, NodeKey> {
        &self.first_level
    }

    /// Node that satisfied a first-level request.
    #[must_use]
    pub fn first_level_node(&self, selector: &ComponentSelector) -> Option<&ResolvedNode> {
        self.first_level.get(selector).and_then(|key| self.nodes.get(key))
    }

    /// Outgoing dependency results of `key`, or empty if unknown.
    #[must_use]
    pub fn dependencies_of(&self, key: &NodeKey) -> &[DependencyResult] {
        self.nodes
            .get(key)
            .map(ResolvedNode::dependencies)
            .unwrap_or_default()
    }

    /// Artifacts `child` exposes through the edge from `parent`.
    #[must_use]
    pub fn parent_artifacts(&self, parent: &NodeKey, child: &NodeKey) -> Option<&ArtifactSet> {
        self.nodes.get(child)?.artifacts_from(parent)
    }

    /// Every failed dependency edge, with the node that declared it.
    pub fn unresolved(&self) -> impl Iterator<Item = (&NodeKey, &DependencyResult)> {
        self.nodes.values().flat_map(|node| {
            node.dependencies
                .iter()
                .filter(|result| !result.is_resolved())
                .map(move |result| (&node.key, result))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of parent to child edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.children.len()).sum()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::{ArtifactName, ComponentId};

    fn key(module: &str) -> NodeKey {
        NodeKey::new(ComponentId::module("org", module, "1.0").unwrap(), "default").unwrap()
    }

    fn jar(name: &str) -> ArtifactSet {
        [ArtifactName::new(name, "jar").unwrap()].into_iter().collect()
    }

    #[test]
    fn mapped_contents_reuses_handles_for_equal_sets() {
        let mut contents = MappedContents::new();
        let a = contents.register_artifacts(jar("x"));
        let b = contents.register_artifacts(jar("y"));
        let c = contents.register_artifacts(jar("x"));
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(contents.artifacts(b), Some(jar("y")));
        assert_eq!(contents.artifacts(ArtifactSetHandle(99)), None);
    }

    #[test]
    fn per_parent_artifacts_are_kept_apart() {
        let mut child = ResolvedNode::new(key("c"));
        child.add_parent(key("a"), &jar("x"));
        child.add_parent(key("b"), &jar("y"));
        child.add_parent(key("a"), &jar("z"));

        assert_eq!(child.parents().count(), 2);
        assert_eq!(child.artifacts_from(&key("a")).unwrap().len(), 2);
        assert_eq!(child.artifacts_from(&key("b")), Some(&jar("y")));
        assert_eq!(child.all_artifacts().len(), 3);
    }

    #[test]
    fn dangling_root_rejected() {
        let result = ResolutionResultGraph::new(key("a"), BTreeMap::new(), BTreeMap::new());
        assert!(matches!(result, Err(GraphError::UnexpectedId { .. })));
    }

    #[test]
    fn dangling_first_level_rejected() {
        let mut nodes = BTreeMap::new();
        nodes.insert(key("a"), ResolvedNode::new(key("a")));
        let mut first_level = BTreeMap::new();
        first_level.insert(
            ComponentSelector::module("org", "b", "1.0").unwrap(),
            key("b"),
        );
        let result = ResolutionResultGraph::new(key("a"), first_level, nodes);
        match result {
            Err(GraphError::UnexpectedId { key: missing, known }) => {
                assert_eq!(missing, key("b"));
                assert_eq!(known, vec![key("a")]);
            }
            other => panic!("expected unexpected id, got {other:?}"),
        }
    }

    #[test]
    fn parentless_non_root_rejected() {
        let mut nodes = BTreeMap::new();
        nodes.insert(key("a"), ResolvedNode::new(key("a")));
        nodes.insert(key("orphan"), ResolvedNode::new(key("orphan")));
        match ResolutionResultGraph::new(key("a"), BTreeMap::new(), nodes) {
            Err(GraphError::OrphanNode { key: orphan, known }) => {
                assert_eq!(orphan, key("orphan"));
                assert_eq!(known.len(), 2);
            }
            other => panic!("expected orphan node, got {other:?}"),
        }
    }

    #[test]
    fn add_child_reports_repeats() {
        let mut parent = ResolvedNode::new(key("a"));
        assert!(parent.add_child(key("b")));
        assert!(!parent.add_child(key("b")));
        assert_eq!(parent.children().count(), 1);
    }

    #[test]
    fn dependency_result_exposes_failure() {
        let requested = ComponentSelector::module("org", "gone", "1.0").unwrap();
        let failed = DependencyResult::failed(requested.clone(), ResolutionFailure::new("404"));
        assert!(!failed.is_resolved());
        assert_eq!(failed.failure().unwrap().message, "404");
        assert_eq!(failed.requested(), &requested);

        let resolved = DependencyResult::resolved(requested, key("gone"));
        assert!(resolved.is_resolved());
        assert!(resolved.failure().is_none());
    }
}
