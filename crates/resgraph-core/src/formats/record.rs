//! # Result Records
//!
//! Format: one frame per record, forward-only, no file header.
//! - 1 byte: record kind
//! - 4 bytes: body length (`u32`, little-endian)
//! - body: postcard-encoded fields, in declaration order
//!
//! | kind | record        | body                                   |
//! |------|---------------|----------------------------------------|
//! | 1    | NEW_NODE      | key                                    |
//! | 2    | ROOT          | key                                    |
//! | 3    | FIRST_LEVEL   | key                                    |
//! | 4    | PARENT_CHILD  | parent key, child key, artifact handle |
//! | 5    | UNRESOLVED    | parent key, selector, reason           |
//!
//! The length prefix lets the reader report exact offsets and reject
//! oversized bodies BEFORE allocating them.

use crate::primitives::{
    FIRST_LEVEL, FRAME_HEADER_LEN, MAX_RECORD_BODY, NEW_NODE, PARENT_CHILD, ROOT, UNRESOLVED,
};
use crate::types::{ArtifactSetHandle, ComponentSelector, GraphError, NodeKey};
use crate::types::{decode_selector, encode_selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{ErrorKind, Read, Write};

// =============================================================================
// RECORD KIND
// =============================================================================

/// Discriminant of a record frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    NewNode,
    Root,
    FirstLevel,
    ParentChild,
    Unresolved,
}

impl RecordKind {
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::NewNode => NEW_NODE,
            Self::Root => ROOT,
            Self::FirstLevel => FIRST_LEVEL,
            Self::ParentChild => PARENT_CHILD,
            Self::Unresolved => UNRESOLVED,
        }
    }

    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            NEW_NODE => Some(Self::NewNode),
            ROOT => Some(Self::Root),
            FIRST_LEVEL => Some(Self::FirstLevel),
            PARENT_CHILD => Some(Self::ParentChild),
            UNRESOLVED => Some(Self::Unresolved),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NewNode => "NEW_NODE",
            Self::Root => "ROOT",
            Self::FirstLevel => "FIRST_LEVEL",
            Self::ParentChild => "PARENT_CHILD",
            Self::Unresolved => "UNRESOLVED",
        })
    }
}

// =============================================================================
// RECORD
// =============================================================================

/// One graph event, as emitted by the recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    NewNode(NodeKey),
    Root(NodeKey),
    FirstLevel(NodeKey),
    ParentChild {
        parent: NodeKey,
        child: NodeKey,
        artifacts: ArtifactSetHandle,
    },
    Unresolved {
        parent: NodeKey,
        requested: ComponentSelector,
        reason: String,
    },
}

fn put<T: Serialize + ?Sized>(value: &T, body: &mut Vec<u8>) -> Result<(), GraphError> {
    let bytes =
        postcard::to_stdvec(value).map_err(|e| GraphError::SerializationError(e.to_string()))?;
    body.extend_from_slice(&bytes);
    Ok(())
}

fn take<'a, T: Deserialize<'a>>(
    kind: RecordKind,
    bytes: &'a [u8],
) -> Result<(T, &'a [u8]), GraphError> {
    postcard::take_from_bytes(bytes).map_err(|e| {
        GraphError::DeserializationError(format!("Failed to decode {} record: {}", kind, e))
    })
}

impl Record {
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::NewNode(_) => RecordKind::NewNode,
            Self::Root(_) => RecordKind::Root,
            Self::FirstLevel(_) => RecordKind::FirstLevel,
            Self::ParentChild { .. } => RecordKind::ParentChild,
            Self::Unresolved { .. } => RecordKind::Unresolved,
        }
    }

    /// Encode the record body (without frame header).
    pub fn encode_body(&self) -> Result<Vec<u8>, GraphError> {
        let mut body = Vec::new();
        match self {
            Self::NewNode(key) | Self::Root(key) | Self::FirstLevel(key) => put(key, &mut body)?,
            Self::ParentChild {
                parent,
                child,
                artifacts,
            } => {
                put(parent, &mut body)?;
                put(child, &mut body)?;
                put(&artifacts.0, &mut body)?;
            }
            Self::Unresolved {
                parent,
                requested,
                reason,
            } => {
                put(parent, &mut body)?;
                encode_selector(requested, &mut body)?;
                put(reason.as_str(), &mut body)?;
            }
        }
        Ok(body)
    }

    /// Decode a record body of the given kind. Trailing bytes are rejected.
    pub fn decode_body(kind: RecordKind, body: &[u8]) -> Result<Self, GraphError> {
        let (record, rest) = match kind {
            RecordKind::NewNode => {
                let (key, rest) = take(kind, body)?;
                (Self::NewNode(key), rest)
            }
            RecordKind::Root => {
                let (key, rest) = take(kind, body)?;
                (Self::Root(key), rest)
            }
            RecordKind::FirstLevel => {
                let (key, rest) = take(kind, body)?;
                (Self::FirstLevel(key), rest)
            }
            RecordKind::ParentChild => {
                let (parent, rest) = take(kind, body)?;
                let (child, rest) = take(kind, rest)?;
                let (handle, rest) = take::<u64>(kind, rest)?;
                (
                    Self::ParentChild {
                        parent,
                        child,
                        artifacts: ArtifactSetHandle(handle),
                    },
                    rest,
                )
            }
            RecordKind::Unresolved => {
                let (parent, rest) = take(kind, body)?;
                let (requested, rest) = decode_selector(rest)?;
                let (reason, rest) = take::<String>(kind, rest)?;
                (
                    Self::Unresolved {
                        parent,
                        requested,
                        reason,
                    },
                    rest,
                )
            }
        };

        if !rest.is_empty() {
            return Err(GraphError::DeserializationError(format!(
                "{} record has {} trailing bytes",
                kind,
                rest.len()
            )));
        }
        Ok(record)
    }

    /// Write the framed record. Returns the number of bytes written.
    pub fn write_to(&self, writer: &mut dyn Write) -> Result<u64, GraphError> {
        let body = self.encode_body()?;
        let len = u32::try_from(body.len())
            .ok()
            .filter(|len| *len <= MAX_RECORD_BODY)
            .ok_or_else(|| {
                GraphError::SerializationError(format!(
                    "{} record body of {} bytes exceeds the frame limit",
                    self.kind(),
                    body.len()
                ))
            })?;

        let mut header = [0u8; FRAME_HEADER_LEN];
        header[0] = self.kind().tag();
        header[1..].copy_from_slice(&len.to_le_bytes());
        writer.write_all(&header)?;
        writer.write_all(&body)?;
        Ok((FRAME_HEADER_LEN + body.len()) as u64)
    }
}

// =============================================================================
// RECORD READER
// =============================================================================

/// Forward-only frame reader that tracks position for diagnostics.
pub struct RecordReader<'a> {
    reader: &'a mut dyn Read,
    offset: u64,
    records: u64,
    last: Option<RecordKind>,
}

impl<'a> RecordReader<'a> {
    pub fn new(reader: &'a mut dyn Read) -> Self {
        Self {
            reader,
            offset: 0,
            records: 0,
            last: None,
        }
    }

    /// Byte offset of the next frame.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of records decoded so far.
    #[must_use]
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Kind of the last successfully decoded record.
    #[must_use]
    pub fn last(&self) -> Option<RecordKind> {
        self.last
    }

    /// Read the next record. `Ok(None)` means a clean end of stream.
    pub fn next_record(&mut self) -> Result<Option<Record>, GraphError> {
        let mut tag = [0u8; 1];
        loop {
            match self.reader.read(&mut tag) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        let kind = RecordKind::from_tag(tag[0]).ok_or(GraphError::UnknownRecord {
            tag: tag[0],
            offset: self.offset,
            records: self.records,
            last: self.last,
        })?;

        let mut len = [0u8; 4];
        self.read_frame_part(kind, &mut len)?;
        let len = u32::from_le_bytes(len);
        if len > MAX_RECORD_BODY {
            return Err(GraphError::OversizedRecord {
                kind,
                offset: self.offset,
                len,
            });
        }

        let mut body = vec![0u8; len as usize];
        self.read_frame_part(kind, &mut body)?;
        let record = Record::decode_body(kind, &body)?;

        self.offset = self
            .offset
            .saturating_add((FRAME_HEADER_LEN as u64).saturating_add(u64::from(len)));
        self.records = self.records.saturating_add(1);
        self.last = Some(kind);
        Ok(Some(record))
    }

    fn read_frame_part(&mut self, kind: RecordKind, buf: &mut [u8]) -> Result<(), GraphError> {
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                GraphError::TruncatedRecord {
                    kind,
                    offset: self.offset,
                }
            } else {
                GraphError::Io(e)
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
