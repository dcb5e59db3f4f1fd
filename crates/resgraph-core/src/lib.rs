//! # resgraph-core
//!
//! The resolved dependency graph of one build configuration: recorded while
//! an external resolver walks the graph, spilled to a compact forward-only
//! binary stream, and rehydrated exactly once for every consumer.
//!
//! ## Data Flow
//!
//! ```text
//!  resolver walk ──► GraphRecorder ──► BinaryStore ──(ROOT)──► ReadHandle
//!                                                                  │
//!  consumers ◄── Arc<ResolutionResultGraph> ◄── ResultCache ◄──────┘
//!                                               (materialize once)
//! ```
//!
//! ## Architectural Constraints
//!
//! - Version selection, downloads and descriptor parsing are NOT here;
//!   they reach this crate through `ContentsMapping` and `ArtifactSource`
//! - One store and one cache per resolution; nothing is process-global
//! - No async, no network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod cache;
pub mod config;
pub mod formats;
pub mod graph;
pub mod materializer;
pub mod metadata;
pub mod primitives;
pub mod recorder;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ArtifactName, ArtifactSet, ArtifactSetHandle, ComponentId, ComponentSelector, GraphError,
    ModuleVersionId, NodeKey, ProjectComponentId, ROOT_BUILD, VersionConstraint,
};

// =============================================================================
// RE-EXPORTS: Result Graph
// =============================================================================

pub use cache::ResultCache;
pub use config::StoreConfig;
pub use graph::{
    ContentsMapping, DependencyResult, MappedContents, ResolutionFailure, ResolutionResultGraph,
    ResolvedNode,
};
pub use materializer::materialize;
pub use recorder::GraphRecorder;
pub use storage::{BinaryStore, MemoryStore, ReadHandle, SpillHandle, SpillStore};

// =============================================================================
// RE-EXPORTS: Metadata
// =============================================================================

pub use metadata::{
    ArtifactSource, ComponentMetadata, ConfigurationDescriptor, ConfigurationMapping,
    ConfigurationMetadata, DeclaredArtifacts, DependencyMetadata, ExcludeRule, ModuleDescriptor,
};
