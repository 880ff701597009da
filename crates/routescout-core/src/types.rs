//! Wire-level data types for the content-source envelope.
//!
//! The content source answers a query descriptor with a response of the
//! shape `{ data: { <collection>: { pageInfo, nodes } }, errors: [...] }`.
//! A populated `errors` array marks the attempt as failed regardless of
//! HTTP status. Pagination metadata is deserialized leniently: a missing or
//! malformed `pageInfo` reads as "no next page" so a misbehaving source
//! terminates a pass instead of corrupting it.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// One node returned by a resource collection.
///
/// Every routable node carries a `slug`; hierarchical nodes additionally
/// carry a singly-linked ancestor chain through nested `parent.node`
/// references of arbitrary (but practically shallow) depth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermNode {
    /// URL segment for this node. A node without a slug cannot be routed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Link to the immediate ancestor, if any. A node with no parent is a
    /// root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentEdge>,
    /// Brand terms attached to a product node, used by the brand discovery
    /// fallback.
    #[serde(default, rename = "pwbBrands", skip_serializing_if = "Vec::is_empty")]
    pub brands: Vec<TermNode>,
}

impl TermNode {
    /// Construct a flat node from a slug. Test and fixture helper.
    #[must_use]
    pub fn from_slug(slug: impl Into<String>) -> Self {
        Self {
            slug: Some(slug.into()),
            ..Self::default()
        }
    }

    /// The node's slug, if present and non-empty.
    #[must_use]
    pub fn routable_slug(&self) -> Option<&str> {
        self.slug.as_deref().filter(|s| !s.is_empty())
    }
}

/// The `parent` relation wrapper used by the wire format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentEdge {
    /// The ancestor node itself. The wrapper may be present with a null
    /// node, which ends the chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<Box<TermNode>>,
}

/// Cursor pagination metadata for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether another page exists after this one.
    #[serde(default)]
    pub has_next_page: bool,
    /// Opaque cursor marking the end of this page; consumed by the next
    /// request.
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// One resource collection payload: pagination metadata plus nodes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Pagination metadata. Malformed or absent metadata degrades to the
    /// default ("no next page") rather than failing the page.
    #[serde(default, deserialize_with = "lenient_page_info")]
    pub page_info: PageInfo,
    /// Nodes on this page. May legitimately be empty mid-stream.
    #[serde(default)]
    pub nodes: Vec<TermNode>,
}

/// One page of entities as consumed by the paginator.
#[derive(Debug, Clone, Default)]
pub struct EntityPage {
    /// Entities on this page.
    pub nodes: Vec<TermNode>,
    /// Whether the collection reports more pages.
    pub has_next: bool,
    /// Cursor for the next request, when one exists.
    pub next_cursor: Option<String>,
}

impl From<Collection> for EntityPage {
    fn from(collection: Collection) -> Self {
        Self {
            nodes: collection.nodes,
            has_next: collection.page_info.has_next_page,
            next_cursor: collection.page_info.end_cursor,
        }
    }
}

/// An application-level error entry from the response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteError {
    /// Human-readable message supplied by the source.
    #[serde(default)]
    pub message: String,
}

/// The full response envelope returned by the content source.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    /// Payload keyed by collection name.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Application-level errors. Any entry here fails the attempt.
    #[serde(default)]
    pub errors: Vec<RemoteError>,
}

impl QueryResponse {
    /// Extract one collection's page from the envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the envelope carries errors (the attempt
    /// is retry-eligible), or [`Error::Parse`] when the collection payload
    /// is missing or structurally unusable (permanent for this pass).
    pub fn into_page(self, collection: &str) -> Result<EntityPage> {
        if !self.errors.is_empty() {
            let joined = self
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::Api(joined));
        }

        let payload = self
            .data
            .and_then(|mut data| data.get_mut(collection).map(serde_json::Value::take))
            .ok_or_else(|| Error::Parse(format!("response has no `{collection}` collection")))?;

        let parsed: Collection = serde_json::from_value(payload)
            .map_err(|e| Error::Parse(format!("malformed `{collection}` payload: {e}")))?;
        Ok(parsed.into())
    }
}

fn lenient_page_info<'de, D>(deserializer: D) -> std::result::Result<PageInfo, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}
