//! Retry loop: run a closure until success or policy says stop.

use crate::error::RelayError;

use super::classify::classify;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `f` until it succeeds or the policy says to stop, sleeping for the
/// backoff delay between attempts. Blocking; use from `spawn_blocking`.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, RelayError>
where
    F: FnMut(u32) -> Result<T, RelayError>,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => match policy.decide(attempt, classify(&e)) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(d) => {
                    tracing::warn!(attempt, delay_ms = d.as_millis() as u64, "retrying after: {}", e);
                    std::thread::sleep(d);
                    attempt += 1;
                }
            },
        }
    }
}
