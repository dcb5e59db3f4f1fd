//! # Property-Based Tests
//!
//! Round-trip and determinism properties of the result stream.

#![allow(clippy::unwrap_used, clippy::panic)]

use proptest::collection::vec;
use proptest::prelude::*;
use resgraph_core::{
    ArtifactName, ArtifactSet, ComponentId, ComponentSelector, GraphRecorder, MappedContents,
    NodeKey, ResolutionResultGraph, ResultCache, StoreConfig,
};
use std::collections::BTreeSet;

fn key(index: usize) -> NodeKey {
    NodeKey::new(
        ComponentId::module("org", format!("m{index}"), "1.0").unwrap(),
        "default",
    )
    .unwrap()
}

/// Forward edges only, plus one edge into every non-root node from a lower
/// index, so the input is always a connected DAG rooted at node 0.
fn forward_edges(
    size: usize,
    raw: &[(usize, usize)],
    parents: &[usize],
) -> BTreeSet<(usize, usize)> {
    let spine = (1..size).map(|i| (parents.get(i).copied().unwrap_or(0) % i, i));
    raw.iter()
        .map(|&(a, b)| (a % size, b % size))
        .filter(|(a, b)| a < b)
        .chain(spine)
        .collect()
}

/// The artifacts carried by the edge `parent -> child`.
fn edge_artifacts(parent: usize, child: usize) -> ArtifactSet {
    [ArtifactName::new(format!("m{parent}-m{child}"), "jar").unwrap()]
        .into_iter()
        .collect()
}

fn record(
    size: usize,
    edges: &[(usize, usize)],
    first_level: &[usize],
    contents: &mut MappedContents,
    config: &StoreConfig,
) -> ResolutionResultGraph {
    let mut recorder = GraphRecorder::new(config.open_store());
    for i in 0..size {
        recorder.node(&key(i)).unwrap();
    }
    for &(parent, child) in edges {
        let jar = contents.register_artifacts(edge_artifacts(parent, child));
        recorder.parent_child(&key(parent), &key(child), jar).unwrap();
    }
    for &i in first_level {
        contents.insert_requested(key(i), ComponentSelector::exact(key(i).component()));
        recorder.first_level(&key(i)).unwrap();
    }
    recorder.root(&key(0)).unwrap();

    let cache = ResultCache::new(recorder.done().unwrap());
    let graph = cache.load(&*contents).unwrap();
    (*graph).clone()
}

fn in_memory(
    size: usize,
    edges: &[(usize, usize)],
    first_level: &[usize],
) -> ResolutionResultGraph {
    record(
        size,
        edges,
        first_level,
        &mut MappedContents::new(),
        &StoreConfig::in_memory(),
    )
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Every recorded edge comes back with its own artifacts on both sides.
    #[test]
    fn recorded_edges_round_trip(
        size in 1usize..40,
        raw in vec((0usize..64, 0usize..64), 0..120),
        parents in vec(0usize..64, 40),
    ) {
        let edges: Vec<_> = forward_edges(size, &raw, &parents).into_iter().collect();
        let graph = in_memory(size, &edges, &[]);

        prop_assert_eq!(graph.len(), size);
        prop_assert_eq!(graph.edge_count(), edges.len());
        prop_assert_eq!(graph.root_key(), &key(0));
        for &(parent, child) in &edges {
            let child_node = graph.node(&key(child)).unwrap();
            prop_assert!(child_node.parents().any(|p| *p == key(parent)));
            let parent_node = graph.node(&key(parent)).unwrap();
            prop_assert!(parent_node.children().any(|c| *c == key(child)));
            prop_assert_eq!(
                graph.parent_artifacts(&key(parent), &key(child)),
                Some(&edge_artifacts(parent, child))
            );
        }
        for i in 0..size {
            let out = edges.iter().filter(|&&(p, _)| p == i).count();
            prop_assert_eq!(graph.dependencies_of(&key(i)).len(), out);
        }
    }

    /// Reversing pre-ROOT edge order does not change the materialized graph.
    #[test]
    fn edge_order_does_not_matter(
        size in 2usize..30,
        raw in vec((0usize..64, 0usize..64), 0..80),
        parents in vec(0usize..64, 30),
    ) {
        let edges: Vec<_> = forward_edges(size, &raw, &parents).into_iter().collect();
        let reversed: Vec<_> = edges.iter().rev().copied().collect();
        let first_level = [size - 1];

        let forward = in_memory(size, &edges, &first_level);
        let backward = in_memory(size, &reversed, &first_level);

        prop_assert_eq!(forward.first_level(), backward.first_level());
        for node in forward.nodes() {
            let other = backward.node(node.key()).unwrap();
            prop_assert_eq!(
                node.parents().collect::<Vec<_>>(),
                other.parents().collect::<Vec<_>>()
            );
            prop_assert_eq!(
                node.children().collect::<Vec<_>>(),
                other.children().collect::<Vec<_>>()
            );
            prop_assert_eq!(node.all_artifacts(), other.all_artifacts());
            prop_assert_eq!(
                forward.dependencies_of(node.key()).len(),
                backward.dependencies_of(node.key()).len()
            );
        }
    }

    /// The spilling medium is transparent to the decoded graph.
    #[test]
    fn spilled_and_buffered_stores_agree(
        size in 1usize..30,
        raw in vec((0usize..64, 0usize..64), 0..60),
        parents in vec(0usize..64, 30),
    ) {
        let edges: Vec<_> = forward_edges(size, &raw, &parents).into_iter().collect();
        let buffered = in_memory(size, &edges, &[0]);
        let spilled = record(
            size,
            &edges,
            &[0],
            &mut MappedContents::new(),
            &StoreConfig::always_spill(),
        );

        prop_assert_eq!(buffered.len(), spilled.len());
        prop_assert_eq!(buffered.edge_count(), spilled.edge_count());
        prop_assert_eq!(buffered.first_level(), spilled.first_level());
        for &(parent, child) in &edges {
            prop_assert_eq!(
                buffered.parent_artifacts(&key(parent), &key(child)),
                spilled.parent_artifacts(&key(parent), &key(child))
            );
        }
    }
}

#[test]
fn lone_root_has_no_edges() {
    let graph = record(1, &[], &[], &mut MappedContents::new(), &StoreConfig::default());
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.root().children().count(), 0);
    assert!(graph.first_level().is_empty());
}
