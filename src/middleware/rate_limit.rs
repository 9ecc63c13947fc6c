use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Semaphore;
use tracing::info;

// Metrics for rate limiting
static TOTAL_REQUESTS: AtomicU64 = AtomicU64::new(0);
static REJECTED_REQUESTS: AtomicU64 = AtomicU64::new(0);

// Global semaphore capping concurrent processing operations
pub static REQUEST_SEMAPHORE: Lazy<Semaphore> = Lazy::new(|| {
    let max_requests = std::env::var("MAX_CONCURRENT_REQUESTS")
        .unwrap_or_else(|_| "100".to_string())
        .parse::<usize>()
        .unwrap_or(100);

    info!(
        max_concurrent_requests = max_requests,
        "Initializing request semaphore"
    );
    Semaphore::new(max_requests)
});

pub fn record_request() -> u64 {
    TOTAL_REQUESTS.fetch_add(1, Ordering::Relaxed) + 1
}

pub fn record_rejection() -> u64 {
    REJECTED_REQUESTS.fetch_add(1, Ordering::Relaxed) + 1
}

/// Get rate limiting metrics: (total, rejected, available permits)
pub fn get_rate_limit_metrics() -> (u64, u64, usize) {
    let total = TOTAL_REQUESTS.load(Ordering::Relaxed);
    let rejected = REJECTED_REQUESTS.load(Ordering::Relaxed);
    let available = REQUEST_SEMAPHORE.available_permits();
    (total, rejected, available)
}
