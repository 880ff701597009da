//! Slug path reconstruction for hierarchical entities.
//!
//! A hierarchical node embeds its ancestry as nested `parent.node`
//! references. Resolution walks the chain upward iteratively, collecting
//! slugs, then reverses so the result reads root-to-leaf. Depth is
//! unbounded in the model (observed data stays at three levels or fewer),
//! so the walk carries a visited guard and a hard depth cap against
//! malformed, self-referential data.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::TermNode;

/// Hard cap on ancestor levels walked before assuming malformed data.
const MAX_ANCESTOR_DEPTH: usize = 32;

/// How to treat an ancestor link that is present but has no usable slug.
///
/// The lenient behavior matches the original pipeline: a slugless ancestor
/// is skipped and the path degrades to fewer segments. That can
/// under-qualify a path and collide with a sibling of the same leaf slug
/// under a different parent, so the strict alternative invalidates the
/// whole path instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AncestorPolicy {
    /// Skip slugless ancestors; the path keeps its remaining segments.
    #[default]
    Lenient,
    /// A slugless ancestor invalidates the path; the entity is excluded
    /// from discovery.
    Strict,
}

/// Reconstruct the root-to-leaf slug sequence for `node`.
///
/// Returns `None` when the node itself has no usable slug, or when `policy`
/// is [`AncestorPolicy::Strict`] and an ancestor link is broken. The leaf
/// slug is always the last segment.
#[must_use]
pub fn resolve_path(node: &TermNode, policy: AncestorPolicy) -> Option<Vec<String>> {
    let leaf = node.routable_slug()?;

    let mut segments = vec![leaf.to_string()];
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(leaf);

    let mut current = node.parent.as_ref().and_then(|edge| edge.node.as_deref());
    let mut depth = 0usize;

    while let Some(ancestor) = current {
        depth += 1;
        if depth > MAX_ANCESTOR_DEPTH {
            warn!(leaf, depth, "ancestor chain exceeds depth cap, truncating");
            break;
        }

        match ancestor.routable_slug() {
            Some(slug) => {
                if !visited.insert(slug) {
                    warn!(leaf, slug, "cycle in ancestor chain, truncating");
                    break;
                }
                segments.push(slug.to_string());
            },
            None => match policy {
                AncestorPolicy::Lenient => {
                    warn!(leaf, "ancestor without slug skipped");
                },
                AncestorPolicy::Strict => return None,
            },
        }

        current = ancestor.parent.as_ref().and_then(|edge| edge.node.as_deref());
    }

    segments.reverse();
    Some(segments)
}
