//! Caller-side retry policy.
//!
//! The fetch and upload operations never retry on their own. Callers that
//! want to (the CLI does) classify the returned [`crate::RelayError`] and
//! back off using a shared policy.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
