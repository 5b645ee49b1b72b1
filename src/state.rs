//! Application state shared across handlers.

use std::sync::Arc;

use crate::broker::{ClientCache, ConsumerGateway, ProducerGateway};
use crate::config::Config;
use crate::worker_pool::WorkerPool;

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    worker_pool: WorkerPool,
    clients: Arc<ClientCache>,
    producers: Arc<ProducerGateway>,
    consumers: Arc<ConsumerGateway>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let worker_pool = WorkerPool::new(config.worker_pool.size, config.worker_pool.queue_capacity);
        let clients = Arc::new(ClientCache::new());
        let producers = Arc::new(ProducerGateway::new(Arc::clone(&clients)));
        let consumers = Arc::new(ConsumerGateway::new(Arc::clone(&clients)));

        Self {
            config: Arc::new(config),
            worker_pool,
            clients,
            producers,
            consumers,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn worker_pool(&self) -> &WorkerPool {
        &self.worker_pool
    }

    pub fn clients(&self) -> &ClientCache {
        &self.clients
    }

    pub fn producers(&self) -> &ProducerGateway {
        &self.producers
    }

    pub fn consumers(&self) -> &ConsumerGateway {
        &self.consumers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_state_has_no_live_clients() {
        let state = AppState::new(Config::default());
        assert!(state.clients().is_empty());
    }
}
