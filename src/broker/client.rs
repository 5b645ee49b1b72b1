//! Pooled `Pulsar` client connections, cached per `(broker_url, token)`.
//!
//! Establishing a fresh client per request is a documented memory-leak
//! hazard; the cache keeps one long-lived client per credential pair and
//! hands out clones (the underlying client is reference-counted).

use dashmap::DashMap;
use pulsar::{Authentication, Pulsar, TokioExecutor};
use std::sync::Arc;

use crate::error::Error;

/// Key under which a client is cached: the broker URL and the token used to
/// authenticate against it.
type ClientKey = (String, String);

/// Cache of live `Pulsar` clients keyed by `(broker_url, token)`.
#[derive(Default)]
pub struct ClientCache {
    clients: DashMap<ClientKey, Arc<Pulsar<TokioExecutor>>>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self { clients: DashMap::new() }
    }

    /// Returns the cached client for `(broker_url, token)`, building and
    /// caching a new one on first use.
    pub async fn get_or_connect(
        &self,
        broker_url: &str,
        token: &str,
    ) -> Result<Arc<Pulsar<TokioExecutor>>, Error> {
        let key = (broker_url.to_string(), token.to_string());

        if let Some(client) = self.clients.get(&key) {
            return Ok(Arc::clone(&client));
        }

        let client = Arc::new(Self::connect(broker_url, token).await?);
        self.clients.insert(key, Arc::clone(&client));
        Ok(client)
    }

    async fn connect(broker_url: &str, token: &str) -> Result<Pulsar<TokioExecutor>, Error> {
        let mut builder = Pulsar::builder(broker_url, TokioExecutor);

        if !token.is_empty() {
            builder = builder.with_auth(Authentication {
                name: "token".to_string(),
                data: token.as_bytes().to_vec(),
            });
        }

        builder
            .build()
            .await
            .map_err(|e| Error::BrokerUnavailableProduce(e.to_string()))
    }

    /// Number of distinct `(broker_url, token)` pairs currently connected.
    /// Surfaced by the readiness probe.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cache_reports_empty() {
        let cache = ClientCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
    }
}
