use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

use crate::query::QueryClient;

/// Background task that evicts cache entries nobody has used for the gc time
pub struct CacheJanitor {
    cache: QueryClient,
    interval: Duration,
}

impl CacheJanitor {
    pub fn new(cache: QueryClient, interval: Duration) -> Self {
        Self { cache, interval }
    }

    /// Sweep every `interval` until the shutdown channel flips to `true`
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("Cache janitor started, sweeping every {:?}", self.interval);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                _ = sleep(self.interval) => {
                    let evicted = self.cache.collect_garbage();
                    if evicted > 0 {
                        info!("Evicted {} unused cache entries ({} left)", evicted, self.cache.len());
                    } else {
                        debug!("Cache sweep found nothing to evict");
                    }
                }
                changed = shutdown_rx.changed() => {
                    // A dropped sender means nobody can ask us to stop again.
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Cache janitor stopped");
    }
}
