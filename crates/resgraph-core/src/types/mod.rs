//! # Core Type Definitions
//!
//! This module contains the value types shared by every layer:
//! - Component identifiers (`ModuleVersionId`, `ProjectComponentId`, `ComponentId`)
//! - The node identity inside one resolution (`NodeKey`)
//! - Opaque artifact values (`ArtifactName`, `ArtifactSet`, `ArtifactSetHandle`)
//! - Selectors (`ComponentSelector`, see [`selector`])
//! - Error types (`GraphError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Are immutable once constructed; constructors reject empty identifiers

pub mod selector;

pub use selector::{ComponentSelector, VersionConstraint, decode_selector, encode_selector};

use crate::formats::RecordKind;
use crate::primitives::MAX_DIAGNOSTIC_IDS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Reject empty or whitespace-only identifier parts.
pub(crate) fn require_non_empty(value: String, what: &'static str) -> Result<String, GraphError> {
    if value.trim().is_empty() {
        return Err(GraphError::InvalidIdentifier(what));
    }
    Ok(value)
}

// =============================================================================
// COMPONENT IDENTIFIERS
// =============================================================================

/// A resolved external module coordinate: `group:module:version`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleVersionId {
    group: String,
    module: String,
    version: String,
}

impl ModuleVersionId {
    /// Create a module coordinate. Every part is mandatory.
    pub fn new(
        group: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, GraphError> {
        Ok(Self {
            group: require_non_empty(group.into(), "module group")?,
            module: require_non_empty(module.into(), "module name")?,
            version: require_non_empty(version.into(), "module version")?,
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
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for ModuleVersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.module, self.version)
    }
}

/// Name of the build at the root of a build tree.
pub const ROOT_BUILD: &str = ":";

/// A project of a build that was selected as a component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectComponentId {
    build: String,
    path: String,
}

impl ProjectComponentId {
    /// Create a project id. `build` names the owning build, `path` the project in it.
    pub fn new(build: impl Into<String>, path: impl Into<String>) -> Result<Self, GraphError> {
        Ok(Self {
            build: require_non_empty(build.into(), "build name")?,
            path: require_non_empty(path.into(), "project path")?,
        })
    }

    #[must_use]
    pub fn build(&self) -> &str {
        &self.build
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ProjectComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.build == ROOT_BUILD {
            write!(f, "project {}", self.path)
        } else {
            write!(f, "project {}{}", self.build, self.path)
        }
    }
}

/// Identifier of a component that was actually selected by resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentId {
    /// An external module.
    Module(ModuleVersionId),
    /// A project of the current (or an included) build.
    Project(ProjectComponentId),
}

impl ComponentId {
    /// Shorthand for a module component id.
    pub fn module(
        group: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, GraphError> {
        ModuleVersionId::new(group, module, version).map(Self::Module)
    }

    /// Shorthand for a project component id.
    pub fn project(build: impl Into<String>, path: impl Into<String>) -> Result<Self, GraphError> {
        ProjectComponentId::new(build, path).map(Self::Project)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(id) => fmt::Display::fmt(id, f),
            Self::Project(id) => fmt::Display::fmt(id, f),
        }
    }
}

// =============================================================================
// NODE KEY
// =============================================================================

/// Identity of a resolved node: a component within one configuration.
///
/// Unique within one resolution. This is the only payload of the
/// NEW_NODE, ROOT and FIRST_LEVEL records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    component: ComponentId,
    configuration: String,
}

impl NodeKey {
    pub fn new(
        component: ComponentId,
        configuration: impl Into<String>,
    ) -> Result<Self, GraphError> {
        Ok(Self {
            component,
            configuration: require_non_empty(configuration.into(), "configuration name")?,
        })
    }

    #[must_use]
    pub fn component(&self) -> &ComponentId {
        &self.component
    }

    #[must_use]
    pub fn configuration(&self) -> &str {
        &self.configuration
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.component, self.configuration)
    }
}

// =============================================================================
// ARTIFACTS
// =============================================================================

/// Name of a published artifact. Opaque to this crate beyond ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactName {
    pub name: String,
    pub extension: String,
    pub classifier: Option<String>,
}

impl ArtifactName {
    /// Create an artifact name without classifier.
    pub fn new(name: impl Into<String>, extension: impl Into<String>) -> Result<Self, GraphError> {
        Ok(Self {
            name: require_non_empty(name.into(), "artifact name")?,
            extension: extension.into(),
            classifier: None,
        })
    }

    /// Attach a classifier (`sources`, `tests`, ...).
    #[must_use]
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// Split a file name such as `x.jar` at its last dot. Classifiers are not parsed.
    pub fn from_file_name(file_name: &str) -> Result<Self, GraphError> {
        match file_name.rsplit_once('.') {
            Some((name, ext)) => Self::new(name, ext),
            None => Self::new(file_name, ""),
        }
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(classifier) = &self.classifier {
            write!(f, "-{classifier}")?;
        }
        if !self.extension.is_empty() {
            write!(f, ".{}", self.extension)?;
        }
        Ok(())
    }
}

/// An ordered set of artifacts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ArtifactSet(BTreeSet<ArtifactName>);

impl ArtifactSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, artifact: ArtifactName) -> bool {
        self.0.insert(artifact)
    }

    /// Merge `other` into this set.
    pub fn extend_from(&mut self, other: &ArtifactSet) {
        self.0.extend(other.0.iter().cloned());
    }

    #[must_use]
    pub fn contains(&self, artifact: &ArtifactName) -> bool {
        self.0.contains(artifact)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArtifactName> {
        self.0.iter()
    }
}

impl FromIterator<ArtifactName> for ArtifactSet {
    fn from_iter<I: IntoIterator<Item = ArtifactName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Numeric handle carried by PARENT_CHILD records.
///
/// Resolved back to an `ArtifactSet` through `ContentsMapping` at load time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ArtifactSetHandle(pub u64);

impl fmt::Display for ArtifactSetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while recording, storing or materializing a result.
///
/// - I/O failures are fatal for one resolution only
/// - Stream corruption is fatal and never retried by callers
/// - Per-edge resolution failures are NOT errors; see `DependencyResult`
#[derive(Debug, Error)]
pub enum GraphError {
    /// A constructor received an empty identifier part.
    #[error("Invalid identifier: {0} must not be empty")]
    InvalidIdentifier(&'static str),

    /// Reading or writing the binary medium failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record field could not be encoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A record field could not be decoded.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// A write was attempted after the ROOT record sealed the stream.
    #[error("Result store is sealed: ROOT was already written")]
    StoreSealed,

    /// `done()` was called before any ROOT record was written.
    #[error("Result store cannot be sealed: no ROOT record was written")]
    MissingRoot,

    /// The recorder hit an I/O failure earlier and refuses further work.
    #[error("Recorder failed earlier in this session and accepts no more records")]
    RecorderFailed,

    /// A read handle was used after `close()`.
    #[error("Read handle is closed")]
    StoreClosed,

    /// An unknown record discriminant was found in the stream.
    #[error(
        "Corrupt result stream: unknown record type {tag} at byte {offset} after {records} records (last: {})",
        .last.map_or_else(|| "none".to_string(), |kind| kind.to_string())
    )]
    UnknownRecord {
        tag: u8,
        offset: u64,
        records: u64,
        last: Option<RecordKind>,
    },

    /// A record frame was cut short.
    #[error("Corrupt result stream: truncated {kind} record at byte {offset}")]
    TruncatedRecord { kind: RecordKind, offset: u64 },

    /// A record frame declared a body larger than any writer produces.
    #[error("Corrupt result stream: {kind} record at byte {offset} declares {len} body bytes")]
    OversizedRecord {
        kind: RecordKind,
        offset: u64,
        len: u32,
    },

    /// A record referenced a node that was never registered with NEW_NODE.
    #[error("Unexpected id {key}. Seen ids: {}", render_known(.known))]
    UnexpectedId { key: NodeKey, known: Vec<NodeKey> },

    /// A node other than the root was never reached through an edge.
    #[error(
        "Corrupt result stream: non-root node {key} has no parents. Seen ids: {}",
        render_known(.known)
    )]
    OrphanNode { key: NodeKey, known: Vec<NodeKey> },

    /// NEW_NODE was written twice for the same key.
    #[error("Corrupt result stream: node {0} registered twice")]
    DuplicateNode(NodeKey),

    /// The stream ended without a ROOT record.
    #[error("Corrupt result stream: no ROOT record after {records} records")]
    RootNotFound { records: u64 },

    /// An unknown or unsupported selector discriminant.
    #[error("Unsupported component selector type {0}")]
    UnsupportedSelector(u8),

    /// The contents mapping has no requested selector for a node.
    #[error("No requested selector known for {0}")]
    MissingSelector(NodeKey),

    /// The contents mapping has no artifact set for a handle.
    #[error("No artifact set known for handle {0}")]
    MissingArtifacts(ArtifactSetHandle),

    /// Another thread panicked while holding the result cache lock.
    #[error("Result cache lock poisoned")]
    CachePoisoned,
}

fn render_known(known: &[NodeKey]) -> String {
    let mut rendered: Vec<String> = known
        .iter()
        .take(MAX_DIAGNOSTIC_IDS)
        .map(ToString::to_string)
        .collect();
    if known.len() > MAX_DIAGNOSTIC_IDS {
        rendered.push(format!("... {} more", known.len() - MAX_DIAGNOSTIC_IDS));
    }
    format!("[{}]", rendered.join(", "))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifier_parts_rejected() {
        assert!(matches!(
            ModuleVersionId::new("", "core", "1.0"),
            Err(GraphError::InvalidIdentifier("module group"))
        ));
        assert!(ModuleVersionId::new("org", "  ", "1.0").is_err());
        assert!(ProjectComponentId::new(":", "").is_err());
        let id = ComponentId::module("org", "core", "1.0").expect("id");
        assert!(NodeKey::new(id, "").is_err());
    }

    #[test]
    fn node_key_equality_is_by_value() {
        let a = NodeKey::new(ComponentId::module("org", "core", "1.0").expect("id"), "compile")
            .expect("key");
        let b = NodeKey::new(ComponentId::module("org", "core", "1.0").expect("id"), "compile")
            .expect("key");
        let c = NodeKey::new(ComponentId::module("org", "core", "1.0").expect("id"), "runtime")
            .expect("key");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_formats() {
        let id = ComponentId::module("org", "core", "1.0").expect("id");
        assert_eq!(id.to_string(), "org:core:1.0");
        let key = NodeKey::new(id, "runtime").expect("key");
        assert_eq!(key.to_string(), "org:core:1.0 (runtime)");

        let artifact = ArtifactName::new("core", "jar")
            .expect("artifact")
            .with_classifier("sources");
        assert_eq!(artifact.to_string(), "core-sources.jar");

        let root_project = ComponentId::project(ROOT_BUILD, ":app").expect("id");
        assert_eq!(root_project.to_string(), "project :app");
        let included = ComponentId::project("tools", ":lint").expect("id");
        assert_eq!(included.to_string(), "project tools:lint");
    }

    #[test]
    fn artifact_from_file_name_splits_last_dot() {
        let artifact = ArtifactName::from_file_name("x.jar").expect("artifact");
        assert_eq!(artifact.name, "x");
        assert_eq!(artifact.extension, "jar");
        assert!(ArtifactName::from_file_name(".jar").is_err());
    }

    #[test]
    fn unexpected_id_message_is_capped() {
        let known: Vec<NodeKey> = (0..40)
            .map(|i| {
                NodeKey::new(
                    ComponentId::module("org", format!("m{i}"), "1").expect("id"),
                    "default",
                )
                .expect("key")
            })
            .collect();
        let key = known[0].clone();
        let message = GraphError::UnexpectedId { key, known }.to_string();
        assert!(message.starts_with("Unexpected id org:m0:1 (default)"));
        assert!(message.contains("... 8 more"));
    }

    #[test]
    fn frame_and_orphan_messages_name_the_culprit() {
        let message = GraphError::OversizedRecord {
            kind: RecordKind::Root,
            offset: 12,
            len: u32::MAX,
        }
        .to_string();
        assert!(message.contains("at byte 12"));
        assert!(message.contains(&u32::MAX.to_string()));
        assert!(!message.contains("truncated"));

        let orphan = NodeKey::new(
            ComponentId::module("org", "lost", "1").expect("id"),
            "default",
        )
        .expect("key");
        let message = GraphError::OrphanNode {
            key: orphan.clone(),
            known: vec![orphan],
        }
        .to_string();
        assert!(message.contains("non-root node org:lost:1 (default) has no parents"));
        assert!(message.ends_with("Seen ids: [org:lost:1 (default)]"));
    }
}
