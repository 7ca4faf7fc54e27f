//! Retry loop for calls the control plane may answer with "busy, try again later".
//!
//! A [`RetryPolicy`] maps each [`TransientKind`] an operation tolerates to a [`Budget`]:
//! how many attempts may be answered with that kind, and how long to sleep between them.
//! [`RetryPolicy::run`] drives one logical operation through that loop.
//!
//! # Example
//!
//! ```no_run
//! use cvs_client::client::retry::RetryPolicy;
//! use cvs_client::core::Request;
//! use rand::{rngs::StdRng, SeedableRng};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(client: cvs_client::Client) -> Result<(), cvs_client::Error> {
//! let prepared = Request::new("us-west2/Volumes/0b1c").remove();
//! let body = RetryPolicy::delete()
//!     .run("deleteVolume", &mut StdRng::from_os_rng(), &CancellationToken::new(), || {
//!         client.call(&prepared, "deleteVolume")
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
use std::{collections::BTreeMap, future::Future, time::Duration};

use cvs_core::{Outcome, TransientKind};
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// How often, and how patiently, one transient condition is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Total attempts that may be answered with the condition, the first one included
    pub max_attempts: u32,
    /// Shortest sleep before the next attempt
    pub min_delay: Duration,
    /// Longest sleep before the next attempt
    pub max_delay: Duration,
}

impl Budget {
    /// Budget for the "cannot spawn additional jobs" conditions.
    pub const JOB_EXHAUSTION: Budget = Budget {
        max_attempts: 10,
        min_delay: Duration::from_secs(30),
        max_delay: Duration::from_secs(50),
    };

    /// Budget for the internal deadline condition.
    pub const DEADLINE_EXCEEDED: Budget = Budget {
        max_attempts: 5,
        min_delay: Duration::from_secs(5),
        max_delay: Duration::from_secs(10),
    };

    /// A uniformly random whole number of seconds in `[min_delay, max_delay]`.
    pub fn delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let min = self.min_delay.as_secs();
        let max = self.max_delay.as_secs().max(min);
        Duration::from_secs(rng.random_range(min..=max))
    }
}

/// The transient conditions an operation retries, each with its own [`Budget`].
///
/// Conditions without a budget end the operation like any other API error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    budgets: BTreeMap<TransientKind, Budget>,
}

impl RetryPolicy {
    /// A policy that retries nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retry `kind` within `budget`.
    #[must_use]
    pub fn with_budget(mut self, kind: TransientKind, budget: Budget) -> Self {
        self.budgets.insert(kind, budget);
        self
    }

    /// Policy for volume creation.
    pub fn create() -> Self {
        Self::new()
            .with_budget(TransientKind::CreateJobExhaustion, Budget::JOB_EXHAUSTION)
            .with_budget(TransientKind::DeadlineExceeded, Budget::DEADLINE_EXCEEDED)
    }

    /// Policy for volume deletion.
    pub fn delete() -> Self {
        Self::new().with_budget(TransientKind::DeleteJobExhaustion, Budget::JOB_EXHAUSTION)
    }

    /// The budget for `kind`, if this policy retries it.
    pub fn budget(&self, kind: TransientKind) -> Option<&Budget> {
        self.budgets.get(&kind)
    }

    /// Run `attempt` until it succeeds, fails for good, or spends a budget.
    ///
    /// Every call to `attempt` must issue the same request. Cancellation is only
    /// observed before an attempt starts; an attempt in flight or a sleep in progress
    /// runs to completion. Errors from `attempt` itself (transport, credentials) are
    /// returned straight away.
    ///
    /// A resubmission answered with [`Outcome::Settled`] went through and its body is
    /// returned. On the first attempt that answer is an [`Error::Api`] with code 0.
    pub async fn run<R, F, Fut>(
        &self,
        operation: &str,
        rng: &mut R,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> Result<String>
    where
        R: Rng,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Outcome>>,
    {
        let mut answered: BTreeMap<TransientKind, u32> = BTreeMap::new();
        loop {
            if cancel.is_cancelled() {
                tracing::debug!(operation, "cancelled before attempt");
                return Err(Error::Cancelled);
            }
            let (kind, envelope) = match attempt().await? {
                Outcome::Settled(body) if !answered.is_empty() => {
                    tracing::debug!(operation, "resubmission reported code 0");
                    return Ok(body);
                }
                Outcome::Transient(kind, envelope) => (kind, envelope),
                outcome => return outcome.into_body().map_err(Error::Api),
            };
            let Some(budget) = self.budget(kind) else {
                tracing::debug!(operation, %kind, "transient condition not retried by this operation");
                return Err(Error::Api(envelope));
            };
            let count = answered.entry(kind).or_insert(0);
            *count += 1;
            if *count >= budget.max_attempts {
                tracing::warn!(operation, %kind, attempts = *count, "giving up");
                return Err(Error::RetryExhausted {
                    kind,
                    attempts: *count,
                    last: envelope,
                });
            }
            let delay = budget.delay(rng);
            tracing::warn!(
                operation,
                %kind,
                attempt = *count,
                delay_secs = delay.as_secs(),
                "control plane busy, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
