//! Wait - Polling for asynchronous remote operations
//!
//! Mutating calls against cloud management APIs are frequently asynchronous:
//! the request is accepted and the resource transitions through intermediate
//! states before settling. The [`Waiter`] owns the single polling loop used
//! after every such call: sleep an initial delay, then fetch the remote
//! status on a fixed interval until a caller-supplied predicate holds, the
//! fetch fails, or the overall deadline elapses.
//!
//! Status fetches are strictly sequential; a waiter never has more than one
//! fetch in flight.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};

use crate::provider::{ProviderError, ProviderResult};

/// Timing parameters for one wait cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Time before the first status check.
    pub initial_delay: Duration,
    /// Spacing between subsequent checks.
    pub poll_interval: Duration,
    /// Hard wall-clock budget for the whole wait.
    pub overall_timeout: Duration,
}

impl WaitConfig {
    pub const fn new(
        initial_delay: Duration,
        poll_interval: Duration,
        overall_timeout: Duration,
    ) -> Self {
        Self {
            initial_delay,
            poll_interval,
            overall_timeout,
        }
    }
}

/// Terminal result of a wait cycle.
#[derive(Debug)]
pub enum WaitOutcome<S> {
    /// The predicate matched; carries the status that matched. `None` when a
    /// not-found fetch completed a deletion-style wait.
    Reached(Option<S>),
    /// The overall deadline elapsed first. Carries the last observed status
    /// and fetch error for diagnostics. Polling timeout does not imply the
    /// remote operation failed; it may still complete after the wait gave up.
    TimedOut {
        operation: String,
        last_status: Option<S>,
        last_error: Option<ProviderError>,
    },
    /// A status fetch failed for a reason the wait cannot recover from.
    Failed(ProviderError),
}

impl<S> WaitOutcome<S> {
    pub fn is_reached(&self) -> bool {
        matches!(self, WaitOutcome::Reached(_))
    }
}

/// Polls a remote resource until a terminal condition is observed.
///
/// The status-fetch closure must be idempotent and side-effect-free; it is
/// invoked once per tick. Deletion-style waits opt into treating a
/// "resource not found" fetch error as successful completion via
/// [`Waiter::for_deletion`]; every other fetch error ends the wait
/// immediately. Internal re-fetching on transport errors is the job of the
/// HTTP client underneath the fetch closure, not of the waiter.
#[derive(Debug)]
pub struct Waiter {
    operation: String,
    config: WaitConfig,
    missing_is_terminal: bool,
}

impl Waiter {
    /// A waiter labelled with the operation it tracks (e.g., "cluster
    /// creation"). The label appears in log events and timeout diagnostics.
    pub fn new(operation: impl Into<String>, config: WaitConfig) -> Self {
        Self {
            operation: operation.into(),
            config,
            missing_is_terminal: false,
        }
    }

    /// Treat a not-found fetch error as the terminal success condition.
    ///
    /// During deletion polling the resource vanishing is the outcome being
    /// waited for, distinct from a "not yet deleted" in-progress status.
    pub fn for_deletion(mut self) -> Self {
        self.missing_is_terminal = true;
        self
    }

    /// Run the wait cycle to completion.
    pub async fn run<S, F, Fut, P>(&self, mut fetch_status: F, is_terminal: P) -> WaitOutcome<S>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<S>>,
        P: Fn(&S) -> bool,
    {
        let deadline = Instant::now() + self.config.overall_timeout;
        let mut delay = self.config.initial_delay;
        let mut last_status: Option<S> = None;
        let mut last_error: Option<ProviderError> = None;

        loop {
            let tick = Instant::now() + delay;
            if tick >= deadline {
                // The budget elapses before the next tick would fire.
                time::sleep_until(deadline).await;
                return self.timed_out(last_status, last_error);
            }
            time::sleep_until(tick).await;

            let fetched = tokio::select! {
                biased;
                result = fetch_status() => result,
                _ = time::sleep_until(deadline) => {
                    return self.timed_out(last_status, last_error);
                }
            };

            match fetched {
                Ok(status) => {
                    if is_terminal(&status) {
                        tracing::debug!(
                            operation = %self.operation,
                            "remote operation reached a terminal status"
                        );
                        return WaitOutcome::Reached(Some(status));
                    }
                    tracing::info!(
                        operation = %self.operation,
                        "waiting for {} to complete the execution",
                        self.operation
                    );
                    last_status = Some(status);
                }
                Err(err) if self.missing_is_terminal && err.is_not_found() => {
                    tracing::debug!(
                        operation = %self.operation,
                        "remote resource no longer exists; treating as completed"
                    );
                    return WaitOutcome::Reached(None);
                }
                Err(err) => return WaitOutcome::Failed(err),
            }

            delay = self.config.poll_interval;
        }
    }

    fn timed_out<S>(
        &self,
        last_status: Option<S>,
        last_error: Option<ProviderError>,
    ) -> WaitOutcome<S> {
        tracing::warn!(
            operation = %self.operation,
            "{} status transition timed out after initiation",
            self.operation
        );
        WaitOutcome::TimedOut {
            operation: self.operation.clone(),
            last_status,
            last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const FINAL_STATES: [&str; 3] = ["healthy", "failed", "destroyFailed"];

    fn config(initial: u64, interval: u64, overall: u64) -> WaitConfig {
        WaitConfig::new(
            Duration::from_secs(initial),
            Duration::from_secs(interval),
            Duration::from_secs(overall),
        )
    }

    /// A fetch stub returning a scripted sequence of statuses, repeating the
    /// last entry once exhausted.
    fn scripted<'a>(
        calls: &'a AtomicUsize,
        script: &'a [&'a str],
    ) -> impl FnMut() -> std::future::Ready<ProviderResult<String>> + 'a {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let status = script[n.min(script.len() - 1)];
            std::future::ready(Ok(status.to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reached_on_first_terminal_tick() {
        let calls = AtomicUsize::new(0);
        let waiter = Waiter::new("cluster creation", config(0, 3, 3600));
        let started = Instant::now();

        let outcome = waiter
            .run(
                scripted(&calls, &["pending", "pending", "pending", "healthy"]),
                |s: &String| FINAL_STATES.contains(&s.as_str()),
            )
            .await;

        match outcome {
            WaitOutcome::Reached(Some(status)) => assert_eq!(status, "healthy"),
            other => panic!("expected Reached, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // three non-terminal ticks, each followed by one poll interval
        assert_eq!(started.elapsed(), Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn never_matches_non_final_status() {
        let calls = AtomicUsize::new(0);
        let waiter = Waiter::new("cluster creation", config(0, 3, 10));

        let outcome = waiter
            .run(scripted(&calls, &["deploying"]), |s: &String| {
                FINAL_STATES.contains(&s.as_str())
            })
            .await;

        match outcome {
            WaitOutcome::TimedOut {
                operation,
                last_status,
                ..
            } => {
                assert_eq!(operation, "cluster creation");
                assert_eq!(last_status.as_deref(), Some("deploying"));
            }
            other => panic!("expected TimedOut, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn equality_predicate_matches_case_insensitively() {
        let calls = AtomicUsize::new(0);
        let waiter = Waiter::new("cluster on", config(0, 3, 3600));

        let outcome = waiter
            .run(scripted(&calls, &["turningOn", "HEALTHY"]), |s: &String| {
                s.eq_ignore_ascii_case("healthy")
            })
            .await;

        match outcome {
            WaitOutcome::Reached(Some(status)) => assert_eq!(status, "HEALTHY"),
            other => panic!("expected Reached, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn equality_predicate_rejects_other_states() {
        let calls = AtomicUsize::new(0);
        // Desired "on" means "healthy"; the cluster stays turned off.
        let waiter = Waiter::new("cluster on", config(0, 3, 7));

        let outcome = waiter
            .run(scripted(&calls, &["TurnedOff"]), |s: &String| {
                s.eq_ignore_ascii_case("healthy")
            })
            .await;

        assert!(matches!(outcome, WaitOutcome::TimedOut { .. }));
        // ticks at 0s, 3s, 6s; the 9s tick would overrun the 7s budget
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_before_first_tick_without_fetching() {
        let calls = AtomicUsize::new(0);
        // Initial delay far beyond the budget: the deadline wins untouched.
        let waiter = Waiter::new("app service on", config(120, 3, 1));
        let started = Instant::now();

        let outcome = waiter
            .run(scripted(&calls, &["TurnedOff"]), |s: &String| {
                s.eq_ignore_ascii_case("Healthy")
            })
            .await;

        match outcome {
            WaitOutcome::TimedOut {
                last_status,
                last_error,
                ..
            } => {
                assert!(last_status.is_none());
                assert!(last_error.is_none());
            }
            other => panic!("expected TimedOut, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_during_deletion_is_success() {
        let calls = AtomicUsize::new(0);
        let waiter = Waiter::new("cluster deletion", config(0, 3, 3600)).for_deletion();

        let outcome = waiter
            .run(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    std::future::ready(Err::<String, _>(ProviderError::not_found(
                        "cluster no longer exists",
                    )))
                },
                |s: &String| FINAL_STATES.contains(&s.as_str()),
            )
            .await;

        assert!(outcome.is_reached());
        assert!(matches!(outcome, WaitOutcome::Reached(None)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_during_creation_is_fatal() {
        let calls = AtomicUsize::new(0);
        let waiter = Waiter::new("cluster creation", config(0, 3, 3600));

        let outcome = waiter
            .run(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    std::future::ready(Err::<String, _>(ProviderError::not_found(
                        "cluster no longer exists",
                    )))
                },
                |s: &String| FINAL_STATES.contains(&s.as_str()),
            )
            .await;

        match outcome {
            WaitOutcome::Failed(err) => assert!(err.is_not_found()),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_error_is_fatal() {
        let waiter = Waiter::new("app service creation", config(0, 3, 3600));

        let outcome = waiter
            .run(
                || std::future::ready(Err::<String, _>(ProviderError::new("boom"))),
                |s: &String| FINAL_STATES.contains(&s.as_str()),
            )
            .await;

        match outcome {
            WaitOutcome::Failed(err) => assert_eq!(err.to_string(), "boom"),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn already_terminal_status_resolves_on_first_fetch_every_time() {
        let waiter = Waiter::new("cluster creation", config(0, 3, 3600));

        for _ in 0..2 {
            let calls = AtomicUsize::new(0);
            let outcome = waiter
                .run(scripted(&calls, &["healthy"]), |s: &String| {
                    FINAL_STATES.contains(&s.as_str())
                })
                .await;
            match outcome {
                WaitOutcome::Reached(Some(status)) => assert_eq!(status, "healthy"),
                other => panic!("expected Reached, got {:?}", other),
            }
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failure_final_state_still_counts_as_reached() {
        // The waiter reports that a terminal status was reached; deciding
        // whether "destroyFailed" is an error belongs to the caller.
        let calls = AtomicUsize::new(0);
        let waiter = Waiter::new("cluster creation", config(0, 3, 3600));

        let outcome = waiter
            .run(
                scripted(&calls, &["deploying", "destroyFailed"]),
                |s: &String| FINAL_STATES.contains(&s.as_str()),
            )
            .await;

        match outcome {
            WaitOutcome::Reached(Some(status)) => assert_eq!(status, "destroyFailed"),
            other => panic!("expected Reached, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn initial_delay_precedes_first_fetch() {
        let calls = AtomicUsize::new(0);
        let waiter = Waiter::new("cluster creation", config(120, 3, 3600));
        let started = Instant::now();

        let outcome = waiter
            .run(scripted(&calls, &["healthy"]), |s: &String| {
                FINAL_STATES.contains(&s.as_str())
            })
            .await;

        assert!(outcome.is_reached());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::from_secs(120));
    }
}
