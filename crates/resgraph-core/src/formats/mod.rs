//! # Stream Formats
//!
//! Record framing for the resolution result event stream.
//! Media (memory, spill file) live in `storage`; this module only turns
//! records into bytes and back.

pub mod record;

pub use record::{Record, RecordKind, RecordReader};
