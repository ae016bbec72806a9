use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::try_load;

const DEFAULT_TTL_SECS: &str = "300";

struct Entry<T> {
    fetched_at: Instant,
    value: T,
}

/// Last fetched value plus its age. Owned by whoever does the fetching;
/// `invalidate` is the reset point.
pub struct FeedCache<T> {
    ttl: Duration,
    entry: Mutex<Option<Entry<T>>>,
}

impl<T: Clone> FeedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// TTL from `FEED_CACHE_TTL_SECS`.
    pub fn from_env() -> Self {
        let secs: u64 = try_load("FEED_CACHE_TTL_SECS", DEFAULT_TTL_SECS).unwrap_or(300);
        Self::new(Duration::from_secs(secs))
    }

    /// Returns the cached value while fresh, otherwise runs `fetch`.
    /// Concurrent callers wait for a single fetch. Errors are not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut entry = self.entry.lock().await;
        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                debug!("Feed cache hit");
                return Ok(cached.value.clone());
            }
        }
        let value = fetch().await?;
        *entry = Some(Entry {
            fetched_at: Instant::now(),
            value: value.clone(),
        });
        Ok(value)
    }

    pub async fn invalidate(&self) {
        *self.entry.lock().await = None;
    }
}
