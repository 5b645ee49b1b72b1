//! The request-scoped data model: topic addresses, broker credentials, and
//! consumer parameters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Prefix marking an auto-generated subscription name as safe to unsubscribe
/// when its stream ends. Any other subscription is durable and must be left
/// intact in the broker.
pub const NON_RESUMABLE_PREFIX: &str = "non-resumable-";

/// Persistence mode of a topic, the scheme half of its fully-qualified name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    Persistent,
    NonPersistent,
}

impl Persistence {
    /// Parses the persistence token from a route variable. Accepts the
    /// long and short forms used in the wild: `persistent`/`p`,
    /// `non-persistent`/`nonpersistent`/`np`.
    pub fn parse(token: &str) -> Result<Self, Error> {
        match token {
            "persistent" | "p" => Ok(Self::Persistent),
            "non-persistent" | "nonpersistent" | "np" => Ok(Self::NonPersistent),
            other => Err(Error::BadTopic(format!("unknown persistence token: {other}"))),
        }
    }

    pub fn scheme(self) -> &'static str {
        match self {
            Self::Persistent => "persistent",
            Self::NonPersistent => "non-persistent",
        }
    }
}

/// A fully-qualified topic name: `{persistence}://{tenant}/{namespace}/{topic}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicAddress {
    pub persistence: Persistence,
    pub tenant: String,
    pub namespace: String,
    pub topic: String,
}

impl TopicAddress {
    /// Builds a topic address from route variables, validating that every
    /// component is present and non-empty.
    pub fn from_route_vars(
        persistence: &str,
        tenant: &str,
        namespace: &str,
        topic: &str,
    ) -> Result<Self, Error> {
        if tenant.is_empty() || namespace.is_empty() || topic.is_empty() {
            return Err(Error::BadRoute("tenant, namespace, and topic must be non-empty".into()));
        }
        Ok(Self {
            persistence: Persistence::parse(persistence)?,
            tenant: tenant.to_string(),
            namespace: namespace.to_string(),
            topic: topic.to_string(),
        })
    }

    /// Parses a topic FQN of the form `scheme://tenant/namespace/topic`, the
    /// shape carried by the `TopicFn` header.
    pub fn parse_fqn(fqn: &str) -> Result<Self, Error> {
        let (scheme, rest) = fqn
            .split_once("://")
            .ok_or_else(|| Error::BadTopic(format!("not a topic FQN: {fqn}")))?;
        let mut parts = rest.splitn(3, '/');
        let tenant = parts.next().unwrap_or_default();
        let namespace = parts.next().unwrap_or_default();
        let topic = parts.next().unwrap_or_default();
        Self::from_route_vars(scheme, tenant, namespace, topic)
    }

    /// Canonical wire form: `persistent://tenant/ns/topic`.
    pub fn fqn(&self) -> String {
        format!(
            "{}://{}/{}/{}",
            self.persistence.scheme(),
            self.tenant,
            self.namespace,
            self.topic
        )
    }

}

/// Broker URL and bearer token resolved for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrokerCredentials {
    pub broker_url: String,
    pub token: String,
}

/// Pulsar subscription type, mirroring `pulsar::SubType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SubscriptionType {
    Exclusive,
    Shared,
    Failover,
}

impl SubscriptionType {
    pub fn parse(s: &str) -> Self {
        match s {
            "Shared" | "shared" => Self::Shared,
            "Failover" | "failover" => Self::Failover,
            _ => Self::Exclusive,
        }
    }
}

/// Where a newly created subscription starts reading from, mirroring
/// `pulsar::consumer::InitialPosition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialPosition {
    Latest,
    Earliest,
}

impl InitialPosition {
    pub fn parse(s: &str) -> Self {
        match s {
            "earliest" | "Earliest" => Self::Earliest,
            _ => Self::Latest,
        }
    }
}

/// Consumer parameters resolved from the query string.
#[derive(Debug, Clone)]
pub struct ConsumerParams {
    pub sub_name: String,
    pub sub_type: SubscriptionType,
    pub init_pos: InitialPosition,
}

impl ConsumerParams {
    /// Builds consumer parameters from raw query values, generating a
    /// non-resumable subscription name when none is supplied.
    pub fn new(
        sub_name: Option<&str>,
        sub_type: Option<&str>,
        init_pos: Option<&str>,
    ) -> Result<Self, Error> {
        let sub_name = match sub_name {
            None | Some("") => format!("{NON_RESUMABLE_PREFIX}{}", Uuid::new_v4()),
            Some(name) if name.len() >= 5 => name.to_string(),
            Some(name) => {
                return Err(Error::BadSubName(format!(
                    "subscription name too short: {name}"
                )))
            }
        };

        Ok(Self {
            sub_name,
            sub_type: sub_type.map(SubscriptionType::parse).unwrap_or(SubscriptionType::Exclusive),
            init_pos: init_pos.map(InitialPosition::parse).unwrap_or(InitialPosition::Latest),
        })
    }

    /// Whether this subscription was auto-generated and is therefore safe
    /// to unsubscribe on stream termination.
    pub fn is_non_resumable(&self) -> bool {
        self.sub_name.starts_with(NON_RESUMABLE_PREFIX)
    }
}

/// A message read back from the broker, ready to serialize to JSON or an
/// SSE frame.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumedMessage {
    pub id: String,
    pub payload: Vec<u8>,
}

impl ConsumedMessage {
    /// Strips `&` from the stringified broker message id, working around a
    /// known artifact in how the broker's identifier stringifies.
    pub fn sanitize_id(raw_id: impl AsRef<str>) -> String {
        raw_id.as_ref().replace('&', "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fqn_round_trips_route_vars() {
        let addr = TopicAddress::from_route_vars("persistent", "t1", "ns", "topic").unwrap();
        assert_eq!(addr.fqn(), "persistent://t1/ns/topic");
    }

    #[test]
    fn non_persistent_short_token() {
        let addr = TopicAddress::from_route_vars("np", "t1", "ns", "topic").unwrap();
        assert_eq!(addr.fqn(), "non-persistent://t1/ns/topic");
    }

    #[test]
    fn empty_component_is_bad_route() {
        assert!(TopicAddress::from_route_vars("persistent", "", "ns", "topic").is_err());
    }

    #[test]
    fn unknown_persistence_token_is_bad_topic() {
        assert!(TopicAddress::from_route_vars("weird", "t1", "ns", "topic").is_err());
    }

    #[test]
    fn empty_sub_name_generates_non_resumable() {
        let params = ConsumerParams::new(None, None, None).unwrap();
        assert!(params.is_non_resumable());
    }

    #[test]
    fn short_sub_name_is_rejected() {
        assert!(ConsumerParams::new(Some("ab"), None, None).is_err());
    }

    #[test]
    fn sanitize_id_strips_ampersand() {
        assert_eq!(ConsumedMessage::sanitize_id("m1&a"), "m1a");
    }
}
