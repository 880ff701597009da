//! The shared route registry populated by a discovery pass.
//!
//! The registry is owned by the external build orchestrator; the engine
//! receives it mutably for the duration of one pass, merges the final route
//! set into it, and never re-reads it afterwards. Insertion is idempotent
//! and the backing set keeps a stable order so repeated builds schedule
//! identical route lists.

use std::collections::BTreeSet;

use tracing::warn;

/// A deduplicated, stably ordered set of absolute route paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRegistry {
    routes: BTreeSet<String>,
}

impl RouteRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with a baseline route list.
    ///
    /// Duplicates and non-absolute entries are handled the same way as in
    /// [`RouteRegistry::insert`].
    #[must_use]
    pub fn with_baseline<I, S>(baseline: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        registry.extend(baseline);
        registry
    }

    /// Add a route. Returns `false` when the route was already present or
    /// was rejected for not being an absolute path.
    ///
    /// Every member must begin with `/`; anything else is dropped with a
    /// warning rather than corrupting the set.
    pub fn insert(&mut self, route: impl Into<String>) -> bool {
        let route = route.into();
        if !route.starts_with('/') {
            warn!(route, "rejecting non-absolute route");
            return false;
        }
        self.routes.insert(route)
    }

    /// Add every route from `iter`. Adding an already-present path is a
    /// no-op.
    pub fn extend<I, S>(&mut self, iter: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for route in iter {
            self.insert(route);
        }
    }

    /// Whether `route` is already scheduled.
    #[must_use]
    pub fn contains(&self, route: &str) -> bool {
        self.routes.contains(route)
    }

    /// Number of scheduled routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterate routes in stable (lexicographic) order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(String::as_str)
    }

    /// The routes as an ordered vector, for hand-off to the build
    /// orchestrator.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.routes.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for RouteRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut registry = Self::new();
        registry.extend(iter);
        registry
    }
}
