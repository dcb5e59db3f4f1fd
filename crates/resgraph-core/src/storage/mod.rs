//! # Binary Media
//!
//! The append/seal/read contract behind a recording session.
//!
//! A session appends bytes through [`BinaryStore::write`], then calls
//! [`BinaryStore::done`] to obtain a [`ReadHandle`]. The recorder decides
//! WHAT is written; a medium only decides WHERE the bytes live.
//!
//! Two media are provided:
//! - `MemoryStore`: a growable buffer, readable any number of times
//! - `SpillStore`: starts in memory, moves to an anonymous temp file
//!   once a configured threshold is crossed

mod memory;
mod spill;

pub use memory::{MemoryHandle, MemoryStore};
pub use spill::{SpillHandle, SpillStore};

use crate::GraphError;
use std::io::{Read, Write};

/// Write side of a medium. Single writer, append only.
pub trait BinaryStore {
    /// Handle produced by sealing the store.
    type Handle: ReadHandle;

    /// Run `action` against the append stream.
    fn write<F>(&mut self, action: F) -> Result<(), GraphError>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), GraphError>;

    /// Total bytes appended so far.
    fn bytes_written(&self) -> u64;

    /// Flush and close for appends, returning the read side.
    fn done(self) -> Result<Self::Handle, GraphError>;
}

/// Read side of a sealed medium.
///
/// Every `read` starts at the first byte. After `close`, reads fail with
/// `GraphError::StoreClosed` and the backing resource is released.
pub trait ReadHandle: Send {
    fn read<T, F>(&mut self, action: F) -> Result<T, GraphError>
    where
        F: FnOnce(&mut dyn Read) -> Result<T, GraphError>;

    /// Release the backing buffer or file. Idempotent.
    fn close(&mut self) -> Result<(), GraphError>;

    fn is_closed(&self) -> bool;
}
