//! # Graph Materializer
//!
//! The read side: decodes a sealed event stream back into a
//! `ResolutionResultGraph` in a single forward pass.
//!
//! ## Decode Rules
//!
//! - NEW_NODE inserts an empty node; a second NEW_NODE for the same key is corruption
//! - PARENT_CHILD, FIRST_LEVEL and UNRESOLVED must reference registered nodes
//! - A repeated PARENT_CHILD unions its artifacts but adds no second dependency
//! - ROOT assigns the root and ends the decode; trailing bytes are never read
//! - End of stream before ROOT is corruption
//! - A node other than the root without any parent is corruption
//!
//! Every corruption error carries enough context (offset, record count,
//! known ids) to diagnose a writer/reader contract violation.

use crate::formats::{Record, RecordReader};
use crate::graph::{ContentsMapping, DependencyResult, ResolutionFailure, ResolvedNode};
use crate::{ComponentSelector, GraphError, NodeKey, ResolutionResultGraph};
use std::collections::BTreeMap;
use std::io::Read;

/// Decode one sealed result stream.
pub fn materialize(
    reader: &mut dyn Read,
    mapping: &dyn ContentsMapping,
) -> Result<ResolutionResultGraph, GraphError> {
    let mut records = RecordReader::new(reader);
    let mut state = Materializer {
        mapping,
        nodes: BTreeMap::new(),
        first_level: BTreeMap::new(),
    };

    while let Some(record) = records.next_record()? {
        if let Some(root) = state.apply(record)? {
            let graph = state.finish(root)?;
            tracing::debug!(
                root = %graph.root_key(),
                nodes = graph.len(),
                edges = graph.edge_count(),
                first_level = graph.first_level().len(),
                records = records.records(),
                bytes = records.offset(),
                "resolution result materialized"
            );
            return Ok(graph);
        }
    }

    Err(GraphError::RootNotFound {
        records: records.records(),
    })
}

struct Materializer<'a> {
    mapping: &'a dyn ContentsMapping,
    nodes: BTreeMap<NodeKey, ResolvedNode>,
    first_level: BTreeMap<ComponentSelector, NodeKey>,
}

impl Materializer<'_> {
    /// Apply one record. Returns the root key when ROOT was read.
    fn apply(&mut self, record: Record) -> Result<Option<NodeKey>, GraphError> {
        match record {
            Record::NewNode(key) => {
                if self.nodes.contains_key(&key) {
                    return Err(GraphError::DuplicateNode(key));
                }
                self.nodes.insert(key.clone(), ResolvedNode::new(key));
            }
            Record::ParentChild {
                parent,
                child,
                artifacts,
            } => {
                self.require(&parent)?;
                self.require(&child)?;
                let artifacts = self
                    .mapping
                    .artifacts(artifacts)
                    .ok_or(GraphError::MissingArtifacts(artifacts))?;
                let requested = self
                    .mapping
                    .requested(&child)
                    .unwrap_or_else(|| ComponentSelector::exact(child.component()));

                // A repeated edge only widens the artifact set.
                if let Some(node) = self.nodes.get_mut(&parent) {
                    if node.add_child(child.clone()) {
                        node.add_dependency(DependencyResult::resolved(requested, child.clone()));
                    }
                }
                if let Some(node) = self.nodes.get_mut(&child) {
                    node.add_parent(parent, &artifacts);
                }
            }
            Record::FirstLevel(key) => {
                self.require(&key)?;
                let requested = self
                    .mapping
                    .requested(&key)
                    .ok_or_else(|| GraphError::MissingSelector(key.clone()))?;
                self.first_level.insert(requested, key);
            }
            Record::Unresolved {
                parent,
                requested,
                reason,
            } => {
                self.require(&parent)?;
                if let Some(node) = self.nodes.get_mut(&parent) {
                    node.add_dependency(DependencyResult::failed(
                        requested,
                        ResolutionFailure::new(reason),
                    ));
                }
            }
            Record::Root(key) => {
                self.require(&key)?;
                return Ok(Some(key));
            }
        }
        Ok(None)
    }

    fn require(&self, key: &NodeKey) -> Result<(), GraphError> {
        if self.nodes.contains_key(key) {
            return Ok(());
        }
        Err(GraphError::UnexpectedId {
            key: key.clone(),
            known: self.nodes.keys().cloned().collect(),
        })
    }

    fn finish(self, root: NodeKey) -> Result<ResolutionResultGraph, GraphError> {
        ResolutionResultGraph::new(root, self.first_level, self.nodes)
    }
}

// =============================================================================
// TESTS
// =============================================================================
