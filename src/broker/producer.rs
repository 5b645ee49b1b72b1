//! Producer Gateway: front-end to the broker client for producing,
//! supporting synchronous (wait-for-ack) and fire-and-forget dispatch.

use dashmap::DashMap;
use pulsar::producer::Message;
use pulsar::{Producer, TokioExecutor};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::broker::client::ClientCache;
use crate::error::Error;

type ProducerKey = (String, String, String);

/// Pooled single-topic producers keyed by `(broker_url, token, topic_fqn)`.
/// Producer handles are long-lived; a fresh client per request is a
/// documented memory-leak hazard.
pub struct ProducerGateway {
    clients: Arc<ClientCache>,
    producers: DashMap<ProducerKey, Arc<Mutex<Producer<TokioExecutor>>>>,
}

impl ProducerGateway {
    pub fn new(clients: Arc<ClientCache>) -> Self {
        Self { clients, producers: DashMap::new() }
    }

    async fn producer_for(
        &self,
        broker_url: &str,
        token: &str,
        topic_fqn: &str,
    ) -> Result<Arc<Mutex<Producer<TokioExecutor>>>, Error> {
        let key = (broker_url.to_string(), token.to_string(), topic_fqn.to_string());

        if let Some(producer) = self.producers.get(&key) {
            return Ok(Arc::clone(&producer));
        }

        let client = self.clients.get_or_connect(broker_url, token).await?;
        let producer = client
            .producer()
            .with_topic(topic_fqn)
            .build()
            .await
            .map_err(|e| Error::BrokerUnavailableProduce(e.to_string()))?;

        let producer = Arc::new(Mutex::new(producer));
        self.producers.insert(key, Arc::clone(&producer));
        Ok(producer)
    }

    /// Produces `payload` to `topic_fqn` over `broker_url` authenticated with
    /// `token`. In sync mode this blocks until the broker acknowledges; in
    /// async mode it returns once the send is enqueued, and delivery errors
    /// past that point are only logged, never surfaced to the caller.
    pub async fn produce(
        &self,
        broker_url: &str,
        token: &str,
        topic_fqn: &str,
        payload: Vec<u8>,
        async_mode: bool,
    ) -> Result<(), Error> {
        let producer = self.producer_for(broker_url, token, topic_fqn).await?;
        let message = Message { payload, ..Default::default() };
        let mut producer = producer.lock().await;

        if async_mode {
            let delivery = producer
                .send_non_blocking(message)
                .await
                .map_err(|e| Error::BrokerUnavailableProduce(e.to_string()))?;

            let topic = topic_fqn.to_string();
            tokio::spawn(async move {
                if let Err(e) = delivery.await {
                    tracing::warn!(topic = %topic, error = %e, "async produce delivery failed");
                }
            });

            Ok(())
        } else {
            producer
                .send(message)
                .await
                .map_err(|e| Error::BrokerUnavailableProduce(e.to_string()))?
                .await
                .map_err(|e| Error::BrokerUnavailableProduce(e.to_string()))?;

            Ok(())
        }
    }
}
