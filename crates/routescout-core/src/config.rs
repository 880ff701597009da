//! Discovery configuration: content source parameters and the per-entity
//! type table.
//!
//! Configuration is a static object supplied by the build orchestrator (or
//! loaded from TOML); nothing is reconfigured during a pass. Each entity
//! type carries its own pagination parameters, attempt budget, retry
//! pacing, and route prefix, so passes stay fully independent.
//!
//! ```toml
//! endpoint = "https://admin.example.store/graphql"
//! baseline_routes = ["/", "/magazin", "/blog"]
//! ancestor_policy = "lenient"
//!
//! [[entity_types]]
//! name = "product"
//! collection = "products"
//! kind = "flat"
//! page_size = 100
//! attempt_budget = 30
//! prefix = "/produkt/"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::PageRequest;
use crate::path::AncestorPolicy;
use crate::retry::{Backoff, RetryPolicy};
use crate::synth::RoutePrefixTable;
use crate::{Error, Result};

/// Whether an entity type's nodes form a hierarchy or a flat list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Nodes route by bare slug.
    #[default]
    Flat,
    /// Nodes carry an ancestor chain resolved into a slug path.
    Hierarchical,
}

/// Secondary discovery source used when the primary collection yields
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Extract brand terms embedded in product nodes with a single
    /// best-effort page fetch.
    ProductBrands,
}

/// Discovery parameters for one entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTypeConfig {
    /// Reporting name for this type (e.g. `product`).
    pub name: String,
    /// Wire name of the resource collection (e.g. `products`).
    pub collection: String,
    /// Flat or hierarchical routing.
    #[serde(default)]
    pub kind: EntityKind,
    /// Endpoint override; defaults to the shared base endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Maximum nodes per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Total fetch attempts allowed for this type's whole pass.
    #[serde(default = "default_attempt_budget")]
    pub attempt_budget: u32,
    /// Base delay between retries, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Delay escalation strategy.
    #[serde(default)]
    pub backoff: Backoff,
    /// URL prefix for synthesized routes (e.g. `/produkt/`).
    pub prefix: String,
    /// Ancestor levels embedded in the query selection for hierarchical
    /// types. The resolver itself handles arbitrary depth.
    #[serde(default = "default_ancestor_depth")]
    pub ancestor_depth: u32,
    /// Secondary source tried when the primary pass collects nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Fallback>,
}

const fn default_page_size() -> u32 {
    100
}

const fn default_attempt_budget() -> u32 {
    10
}

const fn default_retry_delay_ms() -> u64 {
    500
}

const fn default_ancestor_depth() -> u32 {
    3
}

impl EntityTypeConfig {
    /// Render the per-node field selection for this type's query.
    ///
    /// Hierarchical types embed `ancestor_depth` levels of nested
    /// `parent { node { ... } }`; flat types select the slug only.
    #[must_use]
    pub fn selection(&self) -> String {
        match self.kind {
            EntityKind::Flat => "slug".to_string(),
            EntityKind::Hierarchical => {
                let mut selection = "slug".to_string();
                for _ in 0..self.ancestor_depth {
                    selection = format!("slug parent {{ node {{ {selection} }} }}");
                }
                selection
            },
        }
    }

    /// The page request template for this type (cursor unset).
    #[must_use]
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            collection: self.collection.clone(),
            selection: self.selection(),
            page_size: self.page_size,
            cursor: None,
            endpoint: self.endpoint.clone(),
        }
    }

    /// The retry policy for this type.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            delay: Duration::from_millis(self.retry_delay_ms),
            backoff: self.backoff,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Config("entity type name must not be empty".into()));
        }
        if self.collection.is_empty() {
            return Err(Error::Config(format!(
                "entity type `{}`: collection must not be empty",
                self.name
            )));
        }
        if self.page_size == 0 {
            return Err(Error::Config(format!(
                "entity type `{}`: page_size must be at least 1",
                self.name
            )));
        }
        if self.attempt_budget == 0 {
            return Err(Error::Config(format!(
                "entity type `{}`: attempt_budget must be at least 1",
                self.name
            )));
        }
        if !self.prefix.starts_with('/') {
            return Err(Error::Config(format!(
                "entity type `{}`: prefix `{}` must start with '/'",
                self.name, self.prefix
            )));
        }
        Ok(())
    }
}

/// Full configuration for one discovery pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Shared base endpoint for the content source.
    pub endpoint: String,
    /// Bearer token passed through to the content source, when required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Statically configured routes always scheduled, discovered or not.
    #[serde(default)]
    pub baseline_routes: Vec<String>,
    /// Policy for broken ancestor chains.
    #[serde(default)]
    pub ancestor_policy: AncestorPolicy,
    /// Maximum entity types discovered concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// The entity types to discover.
    #[serde(default)]
    pub entity_types: Vec<EntityTypeConfig>,
}

const fn default_concurrency() -> usize {
    4
}

impl DiscoveryConfig {
    /// Configuration preset matching the storefront this engine was built
    /// for: products, hierarchical categories, tags, and brand terms, plus
    /// the static baseline pages.
    #[must_use]
    pub fn storefront(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth_token: None,
            baseline_routes: vec![
                "/".to_string(),
                "/magazin".to_string(),
                "/categories".to_string(),
                "/etiketi".to_string(),
                "/marki-produkti".to_string(),
                "/blog".to_string(),
            ],
            ancestor_policy: AncestorPolicy::Lenient,
            concurrency: default_concurrency(),
            entity_types: vec![
                EntityTypeConfig {
                    name: "product".to_string(),
                    collection: "products".to_string(),
                    kind: EntityKind::Flat,
                    endpoint: None,
                    page_size: 100,
                    attempt_budget: 30,
                    retry_delay_ms: 500,
                    backoff: Backoff::Fixed,
                    prefix: "/produkt/".to_string(),
                    ancestor_depth: 0,
                    fallback: None,
                },
                EntityTypeConfig {
                    name: "category".to_string(),
                    collection: "productCategories".to_string(),
                    kind: EntityKind::Hierarchical,
                    endpoint: None,
                    page_size: 500,
                    attempt_budget: 10,
                    retry_delay_ms: 500,
                    backoff: Backoff::Fixed,
                    prefix: "/product-cat/".to_string(),
                    ancestor_depth: 3,
                    fallback: None,
                },
                EntityTypeConfig {
                    name: "tag".to_string(),
                    collection: "productTags".to_string(),
                    kind: EntityKind::Flat,
                    endpoint: None,
                    page_size: 200,
                    attempt_budget: 10,
                    retry_delay_ms: 500,
                    backoff: Backoff::Fixed,
                    prefix: "/product-tag/".to_string(),
                    ancestor_depth: 0,
                    fallback: None,
                },
                EntityTypeConfig {
                    name: "brand".to_string(),
                    collection: "brandTerms".to_string(),
                    kind: EntityKind::Flat,
                    endpoint: None,
                    page_size: 200,
                    attempt_budget: 10,
                    retry_delay_ms: 500,
                    backoff: Backoff::Fixed,
                    prefix: "/marka-produkt/".to_string(),
                    ancestor_depth: 0,
                    fallback: Some(Fallback::ProductBrands),
                },
            ],
        }
    }

    /// Load configuration from a TOML document.
    pub fn from_toml(document: &str) -> Result<Self> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Check configuration invariants before a pass starts.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(Error::Config("endpoint must not be empty".into()));
        }
        for route in &self.baseline_routes {
            if !route.starts_with('/') {
                return Err(Error::Config(format!(
                    "baseline route `{route}` must start with '/'"
                )));
            }
        }
        for entity_type in &self.entity_types {
            entity_type.validate()?;
        }
        Ok(())
    }

    /// Build the prefix table from the entity type configurations.
    #[must_use]
    pub fn prefix_table(&self) -> RoutePrefixTable {
        let mut table = RoutePrefixTable::new();
        for entity_type in &self.entity_types {
            table.insert(entity_type.name.clone(), entity_type.prefix.clone());
        }
        table
    }
}
