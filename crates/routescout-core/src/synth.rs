//! Route synthesis: entities to absolute URL paths.
//!
//! Each entity type maps to a static URL prefix; a route is the prefix plus
//! the entity's slug path, every segment percent-encoded independently so
//! Cyrillic and other non-ASCII slugs survive the round trip. Synthesis
//! never fails: an empty segment list yields the prefix-only path, which
//! callers may discard.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters escaped in a path segment.
///
/// Matches JavaScript's `encodeURIComponent`: alphanumerics and
/// `- _ . ! ~ * ' ( )` pass through, everything else (including `/`) is
/// escaped so a slug can never inject extra path segments.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single path segment.
#[must_use]
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Decode a percent-encoded segment. Invalid UTF-8 yields replacement
/// characters rather than an error.
#[must_use]
pub fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// Assemble an absolute route from a prefix and slug segments.
///
/// The prefix is normalized to a single leading `/` and no trailing `/`
/// before joining, so both `/produkt/` and `/produkt` configuration styles
/// produce identical routes.
#[must_use]
pub fn synthesize(prefix: &str, segments: &[String]) -> String {
    let trimmed = prefix.trim_end_matches('/');
    let base = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };

    if segments.is_empty() {
        return if base.is_empty() { "/".to_string() } else { base };
    }

    let encoded: Vec<String> = segments.iter().map(|s| encode_segment(s)).collect();
    format!("{base}/{}", encoded.join("/"))
}

/// Assemble a route for a flat entity from its bare slug.
#[must_use]
pub fn synthesize_flat(prefix: &str, slug: &str) -> String {
    synthesize(prefix, &[slug.to_string()])
}

/// Static mapping from entity type name to URL prefix.
///
/// Built once from configuration and read-only for the duration of a pass.
#[derive(Debug, Clone, Default)]
pub struct RoutePrefixTable {
    prefixes: BTreeMap<String, String>,
}

impl RoutePrefixTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the prefix for an entity type.
    pub fn insert(&mut self, entity_type: impl Into<String>, prefix: impl Into<String>) {
        self.prefixes.insert(entity_type.into(), prefix.into());
    }

    /// The prefix for an entity type, when configured.
    #[must_use]
    pub fn prefix_for(&self, entity_type: &str) -> Option<&str> {
        self.prefixes.get(entity_type).map(String::as_str)
    }

    /// Number of configured entity types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}
