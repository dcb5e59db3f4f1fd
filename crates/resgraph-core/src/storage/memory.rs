//! In-memory medium.

use super::{BinaryStore, ReadHandle};
use crate::GraphError;
use std::io::{Read, Write};

/// A store backed by a single `Vec<u8>`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buffer: Vec<u8>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BinaryStore for MemoryStore {
    type Handle = MemoryHandle;

    fn write<F>(&mut self, action: F) -> Result<(), GraphError>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), GraphError>,
    {
        action(&mut self.buffer)
    }

    fn bytes_written(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn done(self) -> Result<MemoryHandle, GraphError> {
        Ok(MemoryHandle::from_bytes(self.buffer))
    }
}

/// Sealed in-memory bytes.
#[derive(Debug)]
pub struct MemoryHandle {
    bytes: Option<Vec<u8>>,
}

impl MemoryHandle {
    /// Wrap raw bytes as a sealed stream.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes: Some(bytes) }
    }
}

impl ReadHandle for MemoryHandle {
    fn read<T, F>(&mut self, action: F) -> Result<T, GraphError>
    where
        F: FnOnce(&mut dyn Read) -> Result<T, GraphError>,
    {
        let mut slice = self.bytes.as_deref().ok_or(GraphError::StoreClosed)?;
        action(&mut slice)
    }

    fn close(&mut self) -> Result<(), GraphError> {
        self.bytes = None;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.bytes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_repeatable_until_closed() {
        let mut store = MemoryStore::new();
        store
            .write(|w| w.write_all(b"abc").map_err(GraphError::from))
            .expect("write");
        assert_eq!(store.bytes_written(), 3);

        let mut handle = store.done().expect("done");
        for _ in 0..2 {
            let content = handle
                .read(|r| {
                    let mut out = Vec::new();
                    r.read_to_end(&mut out)?;
                    Ok(out)
                })
                .expect("read");
            assert_eq!(content, b"abc");
        }

        handle.close().expect("close");
        assert!(handle.is_closed());
        assert!(matches!(handle.read(|_| Ok(())), Err(GraphError::StoreClosed)));
    }
}
