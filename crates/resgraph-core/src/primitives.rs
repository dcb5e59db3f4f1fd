//! # Wire Primitives
//!
//! Fixed constants of the result event stream and selector encoding.
//!
//! The stream is private to one resolution session. These values are not a
//! stable on-disk format across builds and carry no magic header.

// =============================================================================
// RECORD DISCRIMINANTS
// =============================================================================

/// A node was registered: one `(component, configuration)` key.
pub const NEW_NODE: u8 = 1;

/// The graph root: one key. Always the terminal record of a stream.
pub const ROOT: u8 = 2;

/// A first-level dependency of the root: one key.
pub const FIRST_LEVEL: u8 = 3;

/// A parent to child edge: two keys followed by an artifact-set handle.
pub const PARENT_CHILD: u8 = 4;

/// A dependency that failed to resolve: parent key, requested selector, reason.
pub const UNRESOLVED: u8 = 5;

// =============================================================================
// SELECTOR DISCRIMINANTS
// =============================================================================

/// Selector pointing at another project of the owning build.
pub const SELECTOR_BUILD: u8 = 1;

/// Selector for an external module coordinate.
pub const SELECTOR_MODULE: u8 = 2;

/// Selector for a named library variant of a sub-component.
pub const SELECTOR_LIBRARY: u8 = 3;

/// Reserved for binary variants. Recognised but never produced.
pub const SELECTOR_BINARY_RESERVED: u8 = 4;

// =============================================================================
// LIMITS
// =============================================================================

/// Size of the record frame header: kind byte plus little-endian `u32` length.
pub const FRAME_HEADER_LEN: usize = 5;

/// Largest record body accepted by the decoder (16 MiB).
///
/// A length prefix above this is treated as corruption, not allocated.
pub const MAX_RECORD_BODY: u32 = 16 * 1024 * 1024;

/// Default number of buffered bytes before a `SpillStore` moves to disk.
pub const DEFAULT_SPILL_THRESHOLD: u64 = 1024 * 1024;

/// Number of known ids listed in an "unexpected id" diagnostic.
///
/// The full set is kept on the error value; only the rendered message is capped.
pub const MAX_DIAGNOSTIC_IDS: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_discriminants_are_distinct() {
        let kinds = [NEW_NODE, ROOT, FIRST_LEVEL, PARENT_CHILD, UNRESOLVED];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn selector_discriminants_match_layout() {
        assert_eq!(SELECTOR_BUILD, 1);
        assert_eq!(SELECTOR_MODULE, 2);
        assert_eq!(SELECTOR_LIBRARY, 3);
        assert_eq!(SELECTOR_BINARY_RESERVED, 4);
    }
}
