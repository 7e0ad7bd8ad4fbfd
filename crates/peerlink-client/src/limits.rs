//! Per-host bound on concurrent outbound requests

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

use crate::error::{ClientError, Result};

/// Caps in-flight requests per `host:port`, and with them the number of
/// connections the pool can open to that host.
#[derive(Debug, Clone)]
pub(crate) struct HostLimiter {
    max_per_host: usize,
    hosts: Arc<Mutex<HashMap<String, Arc<Semaphore>>>>,
}

impl HostLimiter {
    pub(crate) fn new(max_per_host: usize) -> Self {
        Self {
            max_per_host: max_per_host.max(1),
            hosts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn key(url: &Url) -> String {
        format!(
            "{}:{}",
            url.host_str().unwrap_or_default(),
            url.port_or_known_default().unwrap_or_default()
        )
    }

    fn semaphore(&self, url: &Url) -> Arc<Semaphore> {
        let mut hosts = self.hosts.lock();
        hosts
            .entry(Self::key(url))
            .or_insert_with(|| Arc::new(Semaphore::new(self.max_per_host)))
            .clone()
    }

    /// Wait for a slot to `url`'s host. The slot is released when the permit drops.
    pub(crate) async fn acquire(&self, url: &Url) -> Result<OwnedSemaphorePermit> {
        self.semaphore(url)
            .acquire_owned()
            .await
            .map_err(|_| ClientError::Transport("connection limiter closed".to_string()))
    }

    /// Free slots for `url`'s host
    #[cfg(test)]
    pub(crate) fn available(&self, url: &Url) -> usize {
        self.semaphore(url).available_permits()
    }
}
