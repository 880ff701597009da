//! # routescout-core
//!
//! Core functionality for routescout - route discovery for static storefront builds.
//!
//! This crate crawls a cursor-paginated content API ahead of a static-site
//! build, reconstructs hierarchical slug paths, and synthesizes the full
//! set of routes the build should prerender. A configured baseline of
//! static pages is always merged in, so a flaky content source degrades
//! coverage instead of failing the build.
//!
//! ## Architecture
//!
//! The crate is organized around several key components:
//!
//! - **Configuration**: Pass-wide settings and the per-entity-type table
//! - **Pagination**: Cursor-driven page draining with fail-safe termination
//! - **Retry**: Pass-wide attempt budgets with fixed or linear backoff
//! - **Synthesis**: Percent-encoded route assembly from slug paths
//! - **Error Handling**: Structured error types with recoverability hints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use routescout_core::{ContentClient, DiscoveryConfig, RouteRegistry, run_discovery};
//!
//! # async fn demo() -> routescout_core::Result<()> {
//! let config = DiscoveryConfig::storefront("https://admin.example.store/graphql");
//! let client = ContentClient::new(&config.endpoint)?;
//!
//! let mut registry = RouteRegistry::new();
//! let summary = run_discovery(&client, &config, &mut registry).await?;
//!
//! println!("{} routes scheduled", summary.total_routes);
//! for route in registry.iter() {
//!     println!("{route}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure Model
//!
//! Discovery never aborts the build. Each entity type runs against its own
//! attempt budget; when a type's budget runs out, its partial results are
//! kept, the outcome is marked truncated, and every other type (and the
//! baseline) still lands in the registry:
//!
//! ```rust,no_run
//! # use routescout_core::{ContentClient, DiscoveryConfig, RouteRegistry, run_discovery};
//! # async fn demo() -> routescout_core::Result<()> {
//! # let config = DiscoveryConfig::storefront("https://admin.example.store/graphql");
//! # let client = ContentClient::new(&config.endpoint)?;
//! # let mut registry = RouteRegistry::new();
//! let summary = run_discovery(&client, &config, &mut registry).await?;
//! if !summary.is_complete() {
//!     for name in summary.truncated_types() {
//!         eprintln!("partial discovery for {name}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// HTTP content client and the page source abstraction
pub mod client;
/// Pass configuration and the per-entity-type table
pub mod config;
/// Discovery orchestration across entity types
pub mod discover;
/// Error types and result aliases
pub mod error;
/// Cursor-based pagination over resource collections
pub mod paginate;
/// Slug path reconstruction for hierarchical entities
pub mod path;
/// The route registry populated by a discovery pass
pub mod registry;
/// Attempt budgets and retry policies
pub mod retry;
/// Route synthesis and percent-encoding
pub mod synth;
/// Wire-level data types for the content API
pub mod types;

// Re-export commonly used types
pub use client::{ContentClient, PageRequest, PageSource};
pub use config::{DiscoveryConfig, EntityKind, EntityTypeConfig, Fallback};
pub use discover::{DiscoverySummary, TypeOutcome, run_discovery};
pub use error::{Error, Result};
pub use paginate::{Collected, collect_all};
pub use path::{AncestorPolicy, resolve_path};
pub use registry::RouteRegistry;
pub use retry::{Attempt, AttemptBudget, Backoff, RetryPolicy};
pub use synth::{RoutePrefixTable, encode_segment, synthesize, synthesize_flat};
pub use types::{EntityPage, PageInfo, ParentEdge, TermNode};
