//! Discovery orchestration across entity types.
//!
//! One pass runs every configured entity type with bounded concurrency.
//! Each type owns its pagination state and attempt budget, so a failing or
//! rate-limited collection can only truncate its own results: the other
//! types and the static baseline are always merged into the registry. The
//! engine holds no state once [`run_discovery`] returns.
//!
//! There is no cancellation surface; the only escape hatch is killing the
//! process, in which case nothing is merged.

use std::collections::BTreeSet;

use futures::StreamExt;
use tracing::{info, instrument, warn};

use crate::client::{PageRequest, PageSource};
use crate::config::{DiscoveryConfig, EntityKind, EntityTypeConfig, Fallback};
use crate::path::{AncestorPolicy, resolve_path};
use crate::registry::RouteRegistry;
use crate::retry::AttemptBudget;
use crate::synth::{synthesize, synthesize_flat};
use crate::{Result, paginate};

/// Result of one entity type's discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeOutcome {
    /// Reporting name of the entity type.
    pub entity_type: String,
    /// Entities collected before synthesis.
    pub collected: usize,
    /// Routes synthesized for this type (including fallback routes).
    pub routes: usize,
    /// Fetch attempts consumed, retries included.
    pub attempts_used: u32,
    /// Whether the pass ended early with partial results.
    pub truncated: bool,
}

/// Final report for a whole discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySummary {
    /// Per-type outcomes, in configuration order.
    pub outcomes: Vec<TypeOutcome>,
    /// Total routes in the registry after the merge, baseline included.
    pub total_routes: usize,
}

impl DiscoverySummary {
    /// Whether every entity type completed without truncation.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|outcome| !outcome.truncated)
    }

    /// Names of entity types that ended early.
    pub fn truncated_types(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.truncated)
            .map(|outcome| outcome.entity_type.as_str())
    }
}

/// Run a full discovery pass and merge the result into `registry`.
///
/// Entity types run with bounded concurrency (`config.concurrency`), each
/// against its own attempt budget. Partial failure is an ordinary outcome:
/// a truncated type contributes whatever it collected, and the baseline
/// routes are scheduled regardless. The only error this function returns
/// is invalid configuration, raised before any fetch.
#[instrument(skip_all, fields(entity_types = config.entity_types.len()))]
pub async fn run_discovery<S>(
    source: &S,
    config: &DiscoveryConfig,
    registry: &mut RouteRegistry,
) -> Result<DiscoverySummary>
where
    S: PageSource + ?Sized,
{
    config.validate()?;

    let ancestor_policy = config.ancestor_policy;
    let mut results: Vec<(usize, TypeOutcome, BTreeSet<String>)> =
        futures::stream::iter(config.entity_types.iter().enumerate())
            .map(|(index, type_config)| async move {
                let (outcome, routes) =
                    discover_entity_type(source, type_config, ancestor_policy).await;
                (index, outcome, routes)
            })
            .buffer_unordered(config.concurrency.max(1))
            .collect()
            .await;

    // Outcomes report in configuration order regardless of completion
    // order.
    results.sort_by_key(|(index, _, _)| *index);

    registry.extend(config.baseline_routes.iter().cloned());

    let mut outcomes = Vec::with_capacity(results.len());
    for (_, outcome, routes) in results {
        registry.extend(routes);
        outcomes.push(outcome);
    }

    let summary = DiscoverySummary {
        outcomes,
        total_routes: registry.len(),
    };
    info!(
        total_routes = summary.total_routes,
        complete = summary.is_complete(),
        "discovery pass finished"
    );
    Ok(summary)
}

/// Discover one entity type in isolation.
///
/// Never fails: budget exhaustion and unrecoverable fetch errors produce a
/// truncated outcome with whatever was collected.
async fn discover_entity_type<S>(
    source: &S,
    type_config: &EntityTypeConfig,
    ancestor_policy: AncestorPolicy,
) -> (TypeOutcome, BTreeSet<String>)
where
    S: PageSource + ?Sized,
{
    let mut budget = AttemptBudget::new(type_config.attempt_budget);
    let request = type_config.page_request();
    let collected = paginate::collect_all(
        source,
        &request,
        type_config.retry_policy(),
        &mut budget,
    )
    .await;

    let mut routes = BTreeSet::new();
    for node in &collected.nodes {
        match type_config.kind {
            EntityKind::Hierarchical => {
                if let Some(segments) = resolve_path(node, ancestor_policy) {
                    routes.insert(synthesize(&type_config.prefix, &segments));
                }
            },
            EntityKind::Flat => {
                if let Some(slug) = node.routable_slug() {
                    routes.insert(synthesize_flat(&type_config.prefix, slug));
                }
            },
        }
    }

    if collected.truncated
        && collected.nodes.is_empty()
        && type_config.fallback == Some(Fallback::ProductBrands)
    {
        apply_brand_fallback(source, type_config, &mut routes).await;
    }

    let outcome = TypeOutcome {
        entity_type: type_config.name.clone(),
        collected: collected.nodes.len(),
        routes: routes.len(),
        attempts_used: budget.used(),
        truncated: collected.truncated,
    };
    info!(
        entity_type = %outcome.entity_type,
        collected = outcome.collected,
        routes = outcome.routes,
        attempts_used = outcome.attempts_used,
        truncated = outcome.truncated,
        "entity type pass finished"
    );
    (outcome, routes)
}

/// Best-effort brand extraction from product nodes.
///
/// When the dedicated brand collection yields nothing, a single page of
/// products with embedded brand terms is fetched outside the (already
/// exhausted) budget. Failure here is logged and ignored.
async fn apply_brand_fallback<S>(
    source: &S,
    type_config: &EntityTypeConfig,
    routes: &mut BTreeSet<String>,
) where
    S: PageSource + ?Sized,
{
    let request = PageRequest {
        collection: "products".to_string(),
        selection: "slug pwbBrands { slug }".to_string(),
        page_size: type_config.page_size,
        cursor: None,
        endpoint: type_config.endpoint.clone(),
    };

    match source.fetch_page(&request).await {
        Ok(page) => {
            let before = routes.len();
            for node in &page.nodes {
                for brand in &node.brands {
                    if let Some(slug) = brand.routable_slug() {
                        routes.insert(synthesize_flat(&type_config.prefix, slug));
                    }
                }
            }
            info!(
                entity_type = %type_config.name,
                extracted = routes.len() - before,
                "brand fallback extracted routes from products"
            );
        },
        Err(e) => {
            warn!(entity_type = %type_config.name, error = %e, "brand fallback fetch failed");
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::Error;
    use crate::types::{EntityPage, ParentEdge, TermNode};

    /// Page source scripted per collection name.
    #[derive(Default)]
    struct CollectionSource {
        scripts: Mutex<HashMap<String, Vec<Result<EntityPage>>>>,
    }

    impl CollectionSource {
        fn script(mut self, collection: &str, responses: Vec<Result<EntityPage>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            self.scripts
                .get_mut()
                .unwrap()
                .insert(collection.to_string(), responses);
            self
        }
    }

    #[async_trait]
    impl PageSource for CollectionSource {
        async fn fetch_page(&self, request: &PageRequest) -> Result<EntityPage> {
            self.scripts
                .lock()
                .unwrap()
                .get_mut(&request.collection)
                .and_then(Vec::pop)
                .unwrap_or_else(|| Err(Error::Parse(format!("no `{}`", request.collection))))
        }
    }

    fn final_page(slugs: &[&str]) -> EntityPage {
        EntityPage {
            nodes: slugs.iter().map(|s| TermNode::from_slug(*s)).collect(),
            has_next: false,
            next_cursor: None,
        }
    }

    fn quick_config() -> DiscoveryConfig {
        let mut config = DiscoveryConfig::storefront("https://example.test/graphql");
        for entity_type in &mut config.entity_types {
            entity_type.retry_delay_ms = 1;
            entity_type.attempt_budget = 3;
        }
        config
    }

    fn category(leaf: &str, parent: &str) -> TermNode {
        TermNode {
            slug: Some(leaf.to_string()),
            parent: Some(ParentEdge {
                node: Some(Box::new(TermNode::from_slug(parent))),
            }),
            brands: Vec::new(),
        }
    }

    #[tokio::test]
    async fn one_failing_type_does_not_abort_the_others() {
        let source = CollectionSource::default()
            .script("products", vec![Ok(final_page(&["whey-gold"]))])
            .script(
                "productCategories",
                vec![
                    Err(Error::Api("down".to_string())),
                    Err(Error::Api("down".to_string())),
                    Err(Error::Api("down".to_string())),
                ],
            )
            .script("productTags", vec![Ok(final_page(&["new"]))])
            .script("brandTerms", vec![Ok(final_page(&["optimum"]))]);

        let config = quick_config();
        let mut registry = RouteRegistry::new();
        let summary = run_discovery(&source, &config, &mut registry)
            .await
            .unwrap();

        assert!(!summary.is_complete());
        assert_eq!(
            summary.truncated_types().collect::<Vec<_>>(),
            vec!["category"]
        );
        assert!(registry.contains("/produkt/whey-gold"));
        assert!(registry.contains("/product-tag/new"));
        assert!(registry.contains("/marka-produkt/optimum"));
        // Baseline pages are always scheduled.
        assert!(registry.contains("/"));
        assert!(registry.contains("/blog"));
    }

    #[tokio::test]
    async fn outcomes_keep_configuration_order() {
        let source = CollectionSource::default()
            .script("products", vec![Ok(final_page(&[]))])
            .script("productCategories", vec![Ok(final_page(&[]))])
            .script("productTags", vec![Ok(final_page(&[]))])
            .script("brandTerms", vec![Ok(final_page(&[]))]);

        let config = quick_config();
        let mut registry = RouteRegistry::new();
        let summary = run_discovery(&source, &config, &mut registry)
            .await
            .unwrap();

        let names: Vec<_> = summary
            .outcomes
            .iter()
            .map(|o| o.entity_type.as_str())
            .collect();
        assert_eq!(names, vec!["product", "category", "tag", "brand"]);
    }

    #[tokio::test]
    async fn hierarchical_routes_include_ancestor_segments() {
        let source = CollectionSource::default()
            .script("products", vec![Ok(final_page(&[]))])
            .script(
                "productCategories",
                vec![Ok(EntityPage {
                    nodes: vec![category("shoes", "sport"), TermNode::from_slug("root-cat")],
                    has_next: false,
                    next_cursor: None,
                })],
            )
            .script("productTags", vec![Ok(final_page(&[]))])
            .script("brandTerms", vec![Ok(final_page(&[]))]);

        let config = quick_config();
        let mut registry = RouteRegistry::new();
        run_discovery(&source, &config, &mut registry)
            .await
            .unwrap();

        assert!(registry.contains("/product-cat/sport/shoes"));
        assert!(registry.contains("/product-cat/root-cat"));
    }

    #[tokio::test]
    async fn discovered_routes_merge_with_baseline_without_duplicates() {
        let source = CollectionSource::default()
            .script("products", vec![Ok(final_page(&["a"]))])
            .script("productCategories", vec![Ok(final_page(&[]))])
            .script("productTags", vec![Ok(final_page(&[]))])
            .script("brandTerms", vec![Ok(final_page(&[]))]);

        let mut config = quick_config();
        config.baseline_routes = vec!["/".to_string(), "/blog".to_string()];

        // The registry already holds a route the baseline repeats.
        let mut registry = RouteRegistry::with_baseline(["/blog"]);
        let summary = run_discovery(&source, &config, &mut registry)
            .await
            .unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(summary.total_routes, 3);
        assert_eq!(registry.to_vec(), vec!["/", "/blog", "/produkt/a"]);
    }

    #[tokio::test]
    async fn brand_fallback_extracts_from_product_nodes() {
        let product_with_brands = TermNode {
            slug: Some("whey-gold".to_string()),
            parent: None,
            brands: vec![
                TermNode::from_slug("optimum"),
                TermNode::from_slug("myprotein"),
            ],
        };

        let source = CollectionSource::default()
            .script("products", vec![
                // Primary product pass.
                Ok(final_page(&["whey-gold"])),
                // Fallback fetch with brand selection.
                Ok(EntityPage {
                    nodes: vec![product_with_brands],
                    has_next: false,
                    next_cursor: None,
                }),
            ])
            .script("productCategories", vec![Ok(final_page(&[]))])
            .script("productTags", vec![Ok(final_page(&[]))])
            .script(
                "brandTerms",
                vec![
                    Err(Error::Api("no such collection".to_string())),
                    Err(Error::Api("no such collection".to_string())),
                    Err(Error::Api("no such collection".to_string())),
                ],
            );

        let mut config = quick_config();
        // Run sequentially so the product pass consumes its page before the
        // brand fallback reaches the products script.
        config.concurrency = 1;

        let mut registry = RouteRegistry::new();
        let summary = run_discovery(&source, &config, &mut registry)
            .await
            .unwrap();

        assert!(registry.contains("/marka-produkt/optimum"));
        assert!(registry.contains("/marka-produkt/myprotein"));

        let brand = summary
            .outcomes
            .iter()
            .find(|o| o.entity_type == "brand")
            .unwrap();
        assert!(brand.truncated);
        assert_eq!(brand.collected, 0);
        assert_eq!(brand.routes, 2);
    }

    #[tokio::test]
    async fn attempts_used_is_reported_per_type() {
        let source = CollectionSource::default()
            .script(
                "products",
                vec![
                    Err(Error::Api("hiccup".to_string())),
                    Ok(final_page(&["a"])),
                ],
            )
            .script("productCategories", vec![Ok(final_page(&[]))])
            .script("productTags", vec![Ok(final_page(&[]))])
            .script("brandTerms", vec![Ok(final_page(&[]))]);

        let config = quick_config();
        let mut registry = RouteRegistry::new();
        let summary = run_discovery(&source, &config, &mut registry)
            .await
            .unwrap();

        let product = summary
            .outcomes
            .iter()
            .find(|o| o.entity_type == "product")
            .unwrap();
        assert_eq!(product.attempts_used, 2);
        assert!(!product.truncated);
    }

    #[tokio::test]
    async fn invalid_config_fails_before_any_fetch() {
        let source = CollectionSource::default();
        let mut config = quick_config();
        config.endpoint = String::new();

        let mut registry = RouteRegistry::new();
        let err = run_discovery(&source, &config, &mut registry)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(registry.is_empty());
    }
}
