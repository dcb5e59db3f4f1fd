//! # Graph Result Recorder
//!
//! The write side of a resolution result. The external graph walk calls the
//! recorder as it discovers nodes and edges, in whatever order the walk
//! produces them. Each call appends one framed record to the store.
//!
//! ## Writer Contract
//!
//! - A node must be registered (`node`) before any edge or first-level
//!   record references it
//! - `root` writes the terminal ROOT record and seals the session; any
//!   later append fails with `GraphError::StoreSealed`
//! - `done` without a prior `root` fails with `GraphError::MissingRoot`
//! - An I/O failure poisons the session: later calls fail with
//!   `GraphError::RecorderFailed`

use crate::formats::Record;
use crate::storage::BinaryStore;
use crate::{ArtifactSetHandle, ComponentSelector, GraphError, NodeKey, ResolutionFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Sealed,
    Failed,
}

/// Append-only, single-writer recorder over a binary store.
#[derive(Debug)]
pub struct GraphRecorder<S: BinaryStore> {
    store: S,
    state: State,
    records: u64,
}

impl<S: BinaryStore> GraphRecorder<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: State::Open,
            records: 0,
        }
    }

    /// Register a resolved node (NEW_NODE).
    pub fn node(&mut self, key: &NodeKey) -> Result<(), GraphError> {
        self.append(&Record::NewNode(key.clone()))
    }

    /// Mark a node as a first-level dependency of the root (FIRST_LEVEL).
    pub fn first_level(&mut self, key: &NodeKey) -> Result<(), GraphError> {
        self.append(&Record::FirstLevel(key.clone()))
    }

    /// Record an edge and the artifacts the child exposes through it (PARENT_CHILD).
    pub fn parent_child(
        &mut self,
        parent: &NodeKey,
        child: &NodeKey,
        artifacts: ArtifactSetHandle,
    ) -> Result<(), GraphError> {
        self.append(&Record::ParentChild {
            parent: parent.clone(),
            child: child.clone(),
            artifacts,
        })
    }

    /// Record a dependency of `parent` that did not resolve (UNRESOLVED).
    pub fn unresolved(
        &mut self,
        parent: &NodeKey,
        requested: &ComponentSelector,
        failure: &ResolutionFailure,
    ) -> Result<(), GraphError> {
        self.append(&Record::Unresolved {
            parent: parent.clone(),
            requested: requested.clone(),
            reason: failure.message.clone(),
        })
    }

    /// Write the terminal ROOT record and seal the session.
    pub fn root(&mut self, key: &NodeKey) -> Result<(), GraphError> {
        self.append(&Record::Root(key.clone()))?;
        self.state = State::Sealed;
        tracing::debug!(
            root = %key,
            records = self.records,
            bytes = self.store.bytes_written(),
            "resolution result sealed"
        );
        Ok(())
    }

    /// Number of records appended so far.
    #[must_use]
    pub fn records(&self) -> u64 {
        self.records
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.state == State::Sealed
    }

    /// Close the store for writing and hand back its read side.
    pub fn done(self) -> Result<S::Handle, GraphError> {
        match self.state {
            State::Sealed => self.store.done(),
            State::Open => Err(GraphError::MissingRoot),
            State::Failed => Err(GraphError::RecorderFailed),
        }
    }

    fn append(&mut self, record: &Record) -> Result<(), GraphError> {
        match self.state {
            State::Open => {}
            State::Sealed => return Err(GraphError::StoreSealed),
            State::Failed => return Err(GraphError::RecorderFailed),
        }

        let result = self.store.write(|writer| record.write_to(writer).map(|_| ()));
        match result {
            Ok(()) => {
                self.records = self.records.saturating_add(1);
                tracing::trace!(kind = %record.kind(), records = self.records, "record appended");
                Ok(())
            }
            Err(GraphError::Io(e)) => {
                self.state = State::Failed;
                tracing::warn!(error = %e, kind = %record.kind(), "result store append failed");
                Err(GraphError::Io(e))
            }
            Err(e) => Err(e),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
