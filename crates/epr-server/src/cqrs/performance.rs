use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Awaits `fut` and warns when it took longer than `threshold`
pub async fn timed<T, Fut>(
    name: &'static str,
    payload: &serde_json::Value,
    threshold: Duration,
    fut: Fut,
) -> T
where
    Fut: Future<Output = T>,
{
    let started = Instant::now();
    let output = fut.await;
    let elapsed = started.elapsed();

    if elapsed > threshold {
        tracing::warn!(
            request = name,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            payload = %payload,
            "Long running request"
        );
    }
    output
}
