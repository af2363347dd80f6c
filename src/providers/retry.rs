use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

pub(crate) const MAX_ATTEMPTS: usize = 2;
pub(crate) const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

const RETRYABLE_MARKERS: &[&str] = &["timeout", "connection", "503", "unavailable"];

/// Transient failures worth another attempt.
pub(crate) fn is_retryable(message: &str) -> bool {
    let lower = message.to_lowercase();
    RETRYABLE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Linear backoff: `base` after the first attempt, twice that after the
/// second.
pub(crate) fn backoff_for(base: Duration, attempt: usize) -> Duration {
    base.saturating_mul(attempt.max(1) as u32)
}

pub(crate) async fn wait_with_backoff(provider: &str, attempt: usize, base: Duration) {
    let wait = backoff_for(base, attempt);
    warn!(
        "{} request failed; retrying in {:.1}s (attempt {}/{})",
        provider,
        wait.as_secs_f32(),
        attempt,
        MAX_ATTEMPTS
    );
    if !wait.is_zero() {
        sleep(wait).await;
    }
}
