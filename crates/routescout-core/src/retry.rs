//! Bounded retry with an explicit, pass-wide attempt budget.
//!
//! The budget counts every fetch attempt made during one entity type's
//! discovery pass, not per page: a pass that retries its first page three
//! times has three fewer attempts available for every later page. The
//! budget is threaded through calls and decremented explicitly so the
//! termination guarantee is independently testable.
//!
//! Exhaustion is an ordinary outcome, not an error: callers observe
//! [`Attempt::Exhausted`] and stop discovery for that entity type with
//! whatever was already collected.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Error;

/// Ceiling on total fetch attempts for one entity type's pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptBudget {
    limit: u32,
    used: u32,
}

impl AttemptBudget {
    /// Create a budget allowing `limit` attempts in total.
    #[must_use]
    pub const fn new(limit: u32) -> Self {
        Self { limit, used: 0 }
    }

    /// Consume one attempt. Returns `false` when the budget is already
    /// exhausted, in which case nothing is consumed.
    pub const fn try_consume(&mut self) -> bool {
        if self.used >= self.limit {
            return false;
        }
        self.used += 1;
        true
    }

    /// Attempts consumed so far.
    #[must_use]
    pub const fn used(&self) -> u32 {
        self.used
    }

    /// Attempts still available.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.limit - self.used
    }

    /// Whether no attempts remain.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }
}

/// Delay escalation strategy between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay before every retry.
    #[default]
    Fixed,
    /// Delay grows linearly with the number of attempts already made.
    Linear,
}

/// Retry pacing for failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Base delay before a retry.
    pub delay: Duration,
    /// How the delay escalates across retries.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Fixed delay between retries.
    #[must_use]
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            backoff: Backoff::Fixed,
        }
    }

    /// Linearly escalating delay: `delay`, `2 * delay`, `3 * delay`, ...
    #[must_use]
    pub const fn linear(delay: Duration) -> Self {
        Self {
            delay,
            backoff: Backoff::Linear,
        }
    }

    /// The delay to sleep before the attempt following `attempts_made`
    /// failed attempts.
    #[must_use]
    pub fn delay_for(&self, attempts_made: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Linear => self.delay.saturating_mul(attempts_made.max(1)),
        }
    }
}

/// Outcome of a retried operation.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The operation succeeded within the budget.
    Ok(T),
    /// The budget ran out, or the last failure was permanent for this pass.
    Exhausted {
        /// The error observed on the final attempt, when one was made.
        last_error: Option<Error>,
    },
}

impl<T> Attempt<T> {
    /// Whether this outcome carries a value.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// Run `op` until it succeeds or the budget is exhausted.
///
/// Each invocation consumes one attempt from `budget`. Recoverable failures
/// (transport errors, non-2xx statuses, remote error envelopes) sleep per
/// `policy` and retry while attempts remain; permanent failures stop the
/// pass immediately without burning the rest of the budget. The sleep is a
/// cooperative pause and never blocks unrelated passes.
pub async fn attempt<T, F, Fut>(
    policy: RetryPolicy,
    budget: &mut AttemptBudget,
    mut op: F,
) -> Attempt<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = crate::Result<T>>,
{
    let mut last_error = None;

    loop {
        if !budget.try_consume() {
            debug!(used = budget.used(), "attempt budget exhausted");
            return Attempt::Exhausted { last_error };
        }

        match op().await {
            Ok(value) => return Attempt::Ok(value),
            Err(e) if e.is_recoverable() => {
                warn!(
                    error = %e,
                    category = e.category(),
                    attempts_used = budget.used(),
                    remaining = budget.remaining(),
                    "fetch attempt failed"
                );
                last_error = Some(e);
                if budget.is_exhausted() {
                    return Attempt::Exhausted { last_error };
                }
                tokio::time::sleep(policy.delay_for(budget.used())).await;
            },
            Err(e) => {
                warn!(error = %e, category = e.category(), "permanent failure, not retrying");
                return Attempt::Exhausted {
                    last_error: Some(e),
                };
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn quick_policy() -> RetryPolicy {
        RetryPolicy::fixed(Duration::from_millis(1))
    }

    #[test]
    fn budget_counts_down_to_exhaustion() {
        let mut budget = AttemptBudget::new(2);
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(!budget.try_consume());
        assert!(budget.is_exhausted());
        assert_eq!(budget.used(), 2);
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn linear_backoff_escalates() {
        let policy = RetryPolicy::linear(Duration::from_millis(10));
        assert_eq!(policy.delay_for(1), Duration::from_millis(10));
        assert_eq!(policy.delay_for(3), Duration::from_millis(30));

        let fixed = RetryPolicy::fixed(Duration::from_millis(10));
        assert_eq!(fixed.delay_for(3), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn fails_twice_then_succeeds_within_budget() {
        let calls = Cell::new(0u32);
        let mut budget = AttemptBudget::new(3);

        let outcome = attempt(quick_policy(), &mut budget, || {
            let n = calls.get() + 1;
            calls.set(n);
            async move {
                if n < 3 {
                    Err(Error::Api("flaky".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        match outcome {
            Attempt::Ok(n) => assert_eq!(n, 3),
            Attempt::Exhausted { .. } => panic!("expected success on third attempt"),
        }
        assert_eq!(budget.used(), 3);
    }

    #[tokio::test]
    async fn budget_of_two_exhausts_without_panicking() {
        let mut budget = AttemptBudget::new(2);

        let outcome: Attempt<()> = attempt(quick_policy(), &mut budget, || async {
            Err(Error::Api("always down".to_string()))
        })
        .await;

        match outcome {
            Attempt::Exhausted { last_error } => {
                assert!(matches!(last_error, Some(Error::Api(_))));
            },
            Attempt::Ok(()) => panic!("expected exhaustion"),
        }
        assert!(budget.is_exhausted());
    }

    #[tokio::test]
    async fn budget_is_shared_across_calls() {
        let mut budget = AttemptBudget::new(3);

        let first = attempt(quick_policy(), &mut budget, || async { Ok(1u32) }).await;
        assert!(first.is_ok());
        assert_eq!(budget.used(), 1);

        // Two attempts remain for every later page of the same pass.
        let second: Attempt<u32> = attempt(quick_policy(), &mut budget, || async {
            Err(Error::Api("down".to_string()))
        })
        .await;
        assert!(!second.is_ok());
        assert_eq!(budget.used(), 3);

        let third = attempt(quick_policy(), &mut budget, || async { Ok(2u32) }).await;
        assert!(!third.is_ok(), "exhausted budget must not run the op");
    }

    #[tokio::test]
    async fn permanent_failure_stops_immediately() {
        let calls = Cell::new(0u32);
        let mut budget = AttemptBudget::new(5);

        let outcome: Attempt<()> = attempt(quick_policy(), &mut budget, || {
            calls.set(calls.get() + 1);
            async { Err(Error::Parse("no collection".to_string())) }
        })
        .await;

        assert!(!outcome.is_ok());
        assert_eq!(calls.get(), 1, "permanent failures are not retried");
        assert_eq!(budget.remaining(), 4);
    }
}
