//! Spill-to-disk medium.
//!
//! Records are buffered in memory until `spill_threshold_bytes` is crossed,
//! then the buffer is flushed to an anonymous temporary file and all further
//! appends go straight to disk. The file has no name on disk and is removed
//! when the handle is closed or dropped.

use super::{BinaryStore, ReadHandle};
use crate::GraphError;
use crate::config::StoreConfig;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};

enum Medium {
    Buffer(Vec<u8>),
    File(BufWriter<File>),
}

/// A store that moves to disk once it grows past a threshold.
pub struct SpillStore {
    config: StoreConfig,
    medium: Medium,
    written: u64,
}

impl std::fmt::Debug for SpillStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpillStore")
            .field("spilled", &self.is_spilled())
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

impl SpillStore {
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            medium: Medium::Buffer(Vec::new()),
            written: 0,
        }
    }

    /// Whether records now live in a temporary file.
    #[must_use]
    pub fn is_spilled(&self) -> bool {
        matches!(self.medium, Medium::File(_))
    }

    fn spill_file(&self) -> std::io::Result<File> {
        match &self.config.spill_dir {
            Some(dir) => tempfile::tempfile_in(dir),
            None => tempfile::tempfile(),
        }
    }

    fn spill(&mut self) -> Result<(), GraphError> {
        let Medium::Buffer(buffer) = &self.medium else {
            return Ok(());
        };
        let mut writer = BufWriter::new(self.spill_file()?);
        writer.write_all(buffer)?;
        tracing::debug!(
            bytes = buffer.len(),
            threshold = self.config.spill_threshold_bytes,
            "result store spilled to disk"
        );
        self.medium = Medium::File(writer);
        Ok(())
    }
}

impl BinaryStore for SpillStore {
    type Handle = SpillHandle;

    fn write<F>(&mut self, action: F) -> Result<(), GraphError>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), GraphError>,
    {
        match &mut self.medium {
            Medium::Buffer(buffer) => {
                let before = buffer.len();
                action(buffer)?;
                self.written = self
                    .written
                    .saturating_add(buffer.len().saturating_sub(before) as u64);
                if self.written > self.config.spill_threshold_bytes {
                    self.spill()?;
                }
            }
            Medium::File(writer) => {
                let mut counting = CountingWriter {
                    inner: writer,
                    count: 0,
                };
                action(&mut counting)?;
                self.written = self.written.saturating_add(counting.count);
            }
        }
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.written
    }

    fn done(self) -> Result<SpillHandle, GraphError> {
        let sealed = match self.medium {
            Medium::Buffer(buffer) => Sealed::Buffer(buffer),
            Medium::File(writer) => {
                let file = writer.into_inner().map_err(|e| e.into_error())?;
                Sealed::File(file)
            }
        };
        Ok(SpillHandle {
            sealed: Some(sealed),
        })
    }
}

struct CountingWriter<'a, W: Write> {
    inner: &'a mut W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count = self.count.saturating_add(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[derive(Debug)]
enum Sealed {
    Buffer(Vec<u8>),
    File(File),
}

/// Sealed spill store. The file is rewound on every read.
#[derive(Debug)]
pub struct SpillHandle {
    sealed: Option<Sealed>,
}

impl SpillHandle {
    /// Whether the sealed bytes live on disk.
    #[must_use]
    pub fn is_on_disk(&self) -> bool {
        matches!(self.sealed, Some(Sealed::File(_)))
    }
}

impl ReadHandle for SpillHandle {
    fn read<T, F>(&mut self, action: F) -> Result<T, GraphError>
    where
        F: FnOnce(&mut dyn Read) -> Result<T, GraphError>,
    {
        match self.sealed.as_mut().ok_or(GraphError::StoreClosed)? {
            Sealed::Buffer(buffer) => {
                let mut slice = buffer.as_slice();
                action(&mut slice)
            }
            Sealed::File(file) => {
                file.seek(SeekFrom::Start(0))?;
                let mut reader = BufReader::new(file);
                action(&mut reader)
            }
        }
    }

    fn close(&mut self) -> Result<(), GraphError> {
        self.sealed = None;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.sealed.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn read_all(handle: &mut SpillHandle) -> Vec<u8> {
        handle
            .read(|r| {
                let mut out = Vec::new();
                r.read_to_end(&mut out)?;
                Ok(out)
            })
            .unwrap()
    }

    fn append(store: &mut SpillStore, bytes: &[u8]) {
        store
            .write(|w| w.write_all(bytes).map_err(GraphError::from))
            .unwrap();
    }

    #[test]
    fn stays_in_memory_below_threshold() {
        let mut store = StoreConfig::in_memory().open_store();
        append(&mut store, b"hello");
        assert!(!store.is_spilled());

        let mut handle = store.done().unwrap();
        assert!(!handle.is_on_disk());
        assert_eq!(read_all(&mut handle), b"hello");
    }

    #[test]
    fn spills_once_threshold_crossed() {
        let config = StoreConfig {
            spill_threshold_bytes: 4,
            spill_dir: None,
        };
        let mut store = config.open_store();
        append(&mut store, b"abc");
        assert!(!store.is_spilled());
        append(&mut store, b"de");
        assert!(store.is_spilled());
        append(&mut store, b"fgh");
        assert_eq!(store.bytes_written(), 8);

        let mut handle = store.done().unwrap();
        assert!(handle.is_on_disk());
        // Repeated reads rewind the file.
        assert_eq!(read_all(&mut handle), b"abcdefgh");
        assert_eq!(read_all(&mut handle), b"abcdefgh");

        handle.close().unwrap();
        assert!(matches!(handle.read(|_| Ok(())), Err(GraphError::StoreClosed)));
    }

    #[test]
    fn spill_dir_is_honoured() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            spill_threshold_bytes: 0,
            spill_dir: Some(dir.path().to_path_buf()),
        };
        let mut store = config.open_store();
        append(&mut store, b"x");
        assert!(store.is_spilled());
        let mut handle = store.done().unwrap();
        assert_eq!(read_all(&mut handle), b"x");
    }

    #[test]
    fn missing_spill_dir_is_an_io_error() {
        let config = StoreConfig {
            spill_threshold_bytes: 0,
            spill_dir: Some("/nonexistent/resgraph/spill".into()),
        };
        let mut store = config.open_store();
        let result = store.write(|w| w.write_all(b"x").map_err(GraphError::from));
        assert!(matches!(result, Err(GraphError::Io(_))));
    }
}
