//! Transient-error retry combinator.
//!
//! Scattering a retry loop across every commit path invites drift; this
//! collapses retries into one combinator so precondition and permanent
//! errors bypass it by construction — only errors that opt in via
//! [`Transient::is_transient`] get a second try.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Implemented by error types that can classify themselves as worth a retry
/// (network hiccups, lock contention) versus not (stale epoch, bad input).
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Retry `op` up to `max_retries` additional times (so `max_retries + 1`
/// total attempts), sleeping `backoff` between attempts. Stops early on the
/// first non-transient error.
pub async fn retry_transient<T, E, F, Fut>(
    max_retries: u32,
    backoff: Duration,
    mut op: F,
) -> Result<T, E>
where
    E: Transient,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_retries => {
                attempt += 1;
                warn!(attempt, max_retries, "retrying after transient error");
                tokio::time::sleep(backoff).await;
            }
            Err(err) => return Err(err),
        }
    }
}
