//! Broker client plumbing: shared `Pulsar` client pooling, the Producer
//! Gateway, and the Consumer Gateway.

mod client;
mod consumer;
mod producer;

pub use client::ClientCache;
pub use consumer::{to_consumed, ConsumerGateway, OpenConsumer};
pub use producer::ProducerGateway;
