//! # Result Cache
//!
//! At-most-once materialization of a sealed result store.
//!
//! Several consumers (compile classpath, runtime classpath, reports) ask for
//! the same resolved graph, possibly from different threads. The first
//! successful `load` decodes the store, caches the graph and releases the
//! store's read resource; every later call returns the same `Arc`.
//!
//! - One mutex per cache: concurrent callers wait instead of decoding twice
//! - A failed decode caches nothing and leaves the store open for a retry
//! - No invalidation: the cache lives and dies with one resolution

use crate::graph::ContentsMapping;
use crate::materializer::materialize;
use crate::storage::ReadHandle;
use crate::{GraphError, ResolutionResultGraph};
use std::sync::{Arc, Mutex, PoisonError};

struct CacheState<H> {
    handle: H,
    graph: Option<Arc<ResolutionResultGraph>>,
}

/// Decode-once cache over one sealed store.
pub struct ResultCache<H: ReadHandle> {
    state: Mutex<CacheState<H>>,
}

impl<H: ReadHandle> std::fmt::Debug for ResultCache<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl<H: ReadHandle> ResultCache<H> {
    #[must_use]
    pub fn new(handle: H) -> Self {
        Self {
            state: Mutex::new(CacheState {
                handle,
                graph: None,
            }),
        }
    }

    /// Return the resolved graph, decoding the store on first use.
    pub fn load(
        &self,
        mapping: &dyn ContentsMapping,
    ) -> Result<Arc<ResolutionResultGraph>, GraphError> {
        let mut state = self.state.lock().map_err(|_| GraphError::CachePoisoned)?;
        if let Some(graph) = &state.graph {
            tracing::trace!("resolution result served from cache");
            return Ok(Arc::clone(graph));
        }

        let graph = state
            .handle
            .read(|reader| materialize(reader, mapping))
            .inspect_err(|e| tracing::warn!(error = %e, "resolution result decode failed"))?;
        let graph = Arc::new(graph);
        state.graph = Some(Arc::clone(&graph));

        // The graph is cached either way; a failed release only leaks the medium.
        if let Err(e) = state.handle.close() {
            tracing::warn!(error = %e, "failed to release result store");
        }
        Ok(graph)
    }

    /// Whether a graph has been materialized.
    ///
    /// Reads through a poisoned lock: a graph cached before the panic is still reported.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .graph
            .is_some()
    }
}

// =============================================================================
// TESTS
// =============================================================================
