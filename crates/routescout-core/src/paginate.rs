//! Cursor-based pagination over one resource collection.
//!
//! Starting from an absent cursor, pages are requested until the source
//! reports no next page, the attempt budget runs out, or the stale-cursor
//! guard trips. The pass is finite by construction: every continuation
//! either advances the cursor or terminates.
//!
//! Termination is always fail-safe. Missing pagination metadata reads as
//! end-of-collection (handled in [`crate::types`]), a `hasNextPage` without
//! a cursor ends the pass, and an unchanged cursor between two consecutive
//! non-empty pages ends it rather than looping forever.

use tracing::{debug, instrument, warn};

use crate::client::{PageRequest, PageSource};
use crate::retry::{Attempt, AttemptBudget, RetryPolicy};
use crate::types::TermNode;

/// Everything one pagination pass produced.
#[derive(Debug, Default)]
pub struct Collected {
    /// All nodes accumulated across pages, in arrival order.
    pub nodes: Vec<TermNode>,
    /// Whether the pass ended early on budget exhaustion or an
    /// unrecoverable fetch failure. Partial results are retained.
    pub truncated: bool,
    /// Number of pages successfully fetched.
    pub pages: u32,
}

/// Drain a collection page by page until exhaustion or budget ceiling.
///
/// `request.cursor` is ignored; the pass always starts at the beginning of
/// the collection. The budget is shared across all pages of this pass and
/// is consumed by retries as well as first attempts.
#[instrument(skip_all, fields(collection = %request.collection))]
pub async fn collect_all<S>(
    source: &S,
    request: &PageRequest,
    policy: RetryPolicy,
    budget: &mut AttemptBudget,
) -> Collected
where
    S: PageSource + ?Sized,
{
    let mut collected = Collected::default();
    let mut cursor: Option<String> = None;
    let mut previous_page_nonempty = false;

    loop {
        let page_request = request.at_cursor(cursor.clone());
        let page = match crate::retry::attempt(policy, budget, || {
            source.fetch_page(&page_request)
        })
        .await
        {
            Attempt::Ok(page) => page,
            Attempt::Exhausted { last_error } => {
                warn!(
                    collection = %request.collection,
                    collected = collected.nodes.len(),
                    error = last_error.as_ref().map(ToString::to_string),
                    "pagination truncated"
                );
                collected.truncated = true;
                break;
            },
        };

        collected.pages += 1;
        let page_nonempty = !page.nodes.is_empty();
        collected.nodes.extend(page.nodes);
        debug!(
            total = collected.nodes.len(),
            page = collected.pages,
            "accumulated page"
        );

        if !page.has_next {
            break;
        }

        match page.next_cursor {
            // hasNextPage without a cursor cannot be followed; treat it as
            // end of collection.
            None => {
                warn!(collection = %request.collection, "next page advertised without a cursor");
                break;
            },
            Some(next) => {
                if cursor.as_deref() == Some(next.as_str())
                    && page_nonempty
                    && previous_page_nonempty
                {
                    warn!(
                        collection = %request.collection,
                        cursor = %next,
                        "cursor failed to advance, terminating pass"
                    );
                    break;
                }
                previous_page_nonempty = page_nonempty;
                cursor = Some(next);
            },
        }
    }

    collected
}
