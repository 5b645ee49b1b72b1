//! Consumer Gateway: obtains per-request broker consumers and exposes the
//! message channel, ack, and subscription-lifecycle operations the Poll and
//! SSE handlers build on.

use futures::StreamExt;
use pulsar::consumer::{ConsumerOptions, InitialPosition as PulsarInitialPosition, Message};
use pulsar::{Consumer, SubType, TokioExecutor};
use std::sync::Arc;
use std::time::Duration;

use crate::broker::client::ClientCache;
use crate::error::Error;
use crate::topic::{ConsumedMessage, InitialPosition, SubscriptionType};

fn to_sub_type(t: SubscriptionType) -> SubType {
    match t {
        SubscriptionType::Exclusive => SubType::Exclusive,
        SubscriptionType::Shared => SubType::Shared,
        SubscriptionType::Failover => SubType::Failover,
    }
}

fn to_initial_position(p: InitialPosition) -> PulsarInitialPosition {
    match p {
        InitialPosition::Latest => PulsarInitialPosition::Latest,
        InitialPosition::Earliest => PulsarInitialPosition::Earliest,
    }
}

/// A consumer opened for a single request, owning its broker subscription
/// until the request releases it.
pub struct OpenConsumer {
    consumer: Consumer<Vec<u8>, TokioExecutor>,
    topic_fqn: String,
    sub_name: String,
}

impl OpenConsumer {
    /// Blocks until the next message arrives or the broker channel closes.
    /// Callers ack the returned message with [`OpenConsumer::ack`] before
    /// converting it with [`to_consumed`].
    pub async fn next(&mut self) -> Option<Result<Message<Vec<u8>>, Error>> {
        let msg = self.consumer.next().await?;
        Some(msg.map_err(|e| Error::BrokerUnavailableConsume(e.to_string())))
    }

    /// Acks a message previously returned by [`OpenConsumer::next`].
    pub async fn ack(&mut self, msg: &Message<Vec<u8>>) -> Result<(), Error> {
        self.consumer
            .ack(msg)
            .await
            .map_err(|e| Error::BrokerUnavailableConsume(e.to_string()))
    }

    /// Unsubscribes, permitted only for non-resumable (auto-generated)
    /// subscriptions per the subscription-lifecycle contract.
    pub async fn unsubscribe(&mut self) -> Result<(), Error> {
        self.consumer
            .unsubscribe()
            .await
            .map_err(|e| Error::BrokerUnavailableConsume(e.to_string()))
    }

    pub fn is_non_resumable(&self) -> bool {
        self.sub_name.starts_with(crate::topic::NON_RESUMABLE_PREFIX)
    }

    /// Releases the consumer and, if non-resumable, unsubscribes first.
    /// Non-resumable subscriptions are the only ones safe to remove; all
    /// others must persist in the broker.
    pub async fn close(mut self) -> Result<(), Error> {
        if self.is_non_resumable() {
            self.unsubscribe().await?;
        }
        tracing::debug!(topic = %self.topic_fqn, sub = %self.sub_name, "consumer closed");
        Ok(())
    }
}

/// Converts a raw broker message into the wire shape handlers emit,
/// sanitizing the id per the known broker stringification artifact.
pub fn to_consumed(msg: &Message<Vec<u8>>) -> ConsumedMessage {
    ConsumedMessage {
        id: ConsumedMessage::sanitize_id(format!("{:?}", msg.message_id())),
        payload: msg.payload.data.clone(),
    }
}

pub struct ConsumerGateway {
    clients: Arc<ClientCache>,
}

impl ConsumerGateway {
    pub fn new(clients: Arc<ClientCache>) -> Self {
        Self { clients }
    }

    /// Opens a consumer for `(broker_url, token, topic_fqn)` with the given
    /// subscription name, type, and initial position.
    pub async fn open(
        &self,
        broker_url: &str,
        token: &str,
        topic_fqn: &str,
        sub_name: &str,
        sub_type: SubscriptionType,
        init_pos: InitialPosition,
    ) -> Result<OpenConsumer, Error> {
        let client = self
            .clients
            .get_or_connect(broker_url, token)
            .await
            .map_err(|e| Error::BrokerUnavailableConsume(e.to_string()))?;

        let consumer = client
            .consumer()
            .with_topic(topic_fqn)
            .with_subscription_type(to_sub_type(sub_type))
            .with_subscription(sub_name)
            .with_options(ConsumerOptions {
                initial_position: to_initial_position(init_pos),
                ..Default::default()
            })
            .build::<Vec<u8>>()
            .await
            .map_err(|e| Error::BrokerUnavailableConsume(e.to_string()))?;

        Ok(OpenConsumer {
            consumer,
            topic_fqn: topic_fqn.to_string(),
            sub_name: sub_name.to_string(),
        })
    }

    /// Short-poll contract: always opens with `init_pos = earliest`
    /// regardless of the caller's request, acks every message it returns,
    /// and closes (unsubscribing non-resumable subscriptions) before
    /// returning.
    pub async fn poll_batch(
        &self,
        broker_url: &str,
        token: &str,
        topic_fqn: &str,
        sub_name: &str,
        sub_type: SubscriptionType,
        batch_size: usize,
        per_msg_timeout: Duration,
    ) -> Result<Vec<ConsumedMessage>, Error> {
        let mut open = self
            .open(broker_url, token, topic_fqn, sub_name, sub_type, InitialPosition::Earliest)
            .await?;

        let mut messages = Vec::with_capacity(batch_size);

        while messages.len() < batch_size {
            let next = tokio::time::timeout(per_msg_timeout, open.next()).await;
            let raw = match next {
                Ok(Some(msg)) => msg?,
                Ok(None) | Err(_) => break,
            };

            open.ack(&raw).await?;
            messages.push(to_consumed(&raw));
        }

        open.close().await?;

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_type_mapping_is_total() {
        assert!(matches!(to_sub_type(SubscriptionType::Exclusive), SubType::Exclusive));
        assert!(matches!(to_sub_type(SubscriptionType::Shared), SubType::Shared));
        assert!(matches!(to_sub_type(SubscriptionType::Failover), SubType::Failover));
    }
}
