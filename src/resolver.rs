//! Header/route resolution: turns HTTP headers, route variables, and query
//! parameters into the `(token, broker_url, topic_fqn, consumer_params)`
//! tuple every data-plane handler is built on.

use axum::http::HeaderMap;
use std::collections::HashMap;

use crate::config::Config;
use crate::error::Error;
use crate::topic::{ConsumerParams, TopicAddress};

/// Header naming an explicit broker URL for this request.
pub const PULSAR_URL_HEADER: &str = "PulsarUrl";

/// Header naming an explicit topic FQN, overriding the route-derived one.
pub const TOPIC_FN_HEADER: &str = "TopicFn";

fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Extracts the bearer token (if any) and the broker URL for this request.
///
/// Token extraction follows `config.broker.token_header_name`: an empty name
/// disables forwarding entirely (the resolved token is always empty). A
/// `Bearer ` prefix is stripped when present; a bare token value is also
/// accepted.
///
/// `PulsarUrl`, when present, must be on the configured allow-list or
/// resolution fails with `UnauthorizedUrl`. Absent, the default broker URL
/// is used.
pub fn resolve_receiver(headers: &HeaderMap, config: &Config) -> Result<(String, String), Error> {
    let token = if config.broker.token_header_name.is_empty() {
        String::new()
    } else {
        first_header_value(headers, &config.broker.token_header_name)
            .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).to_string())
            .unwrap_or_default()
    };

    let broker_url = match first_header_value(headers, PULSAR_URL_HEADER) {
        Some(url) if !url.is_empty() => {
            if config.is_allowed_broker_url(url) {
                url.to_string()
            } else {
                return Err(Error::UnauthorizedUrl(url.to_string()));
            }
        }
        _ => config.broker.default_url.clone(),
    };

    Ok((token, broker_url))
}

/// Builds the topic FQN for this request: route variables unless overridden
/// by a non-empty `TopicFn` header. Rejects a persistence scheme not on
/// `config.persistence_filters`, when that allow-list is non-empty.
pub fn topic_from_route(
    vars: &HashMap<String, String>,
    headers: &HeaderMap,
    config: &Config,
) -> Result<TopicAddress, Error> {
    let addr = if let Some(fqn) = first_header_value(headers, TOPIC_FN_HEADER).filter(|v| !v.is_empty()) {
        TopicAddress::parse_fqn(fqn)?
    } else {
        let get = |name: &str| -> Result<&str, Error> {
            vars.get(name)
                .map(String::as_str)
                .ok_or_else(|| Error::BadRoute(format!("missing route variable: {name}")))
        };

        TopicAddress::from_route_vars(get("persistent")?, get("tenant")?, get("namespace")?, get("topic")?)?
    };

    if !config.persistence_filters.is_empty()
        && !config.persistence_filters.iter().any(|p| p == addr.persistence.scheme())
    {
        return Err(Error::BadTopic(format!(
            "persistence scheme not accepted by this deployment: {}",
            addr.persistence.scheme()
        )));
    }

    Ok(addr)
}

/// Resolves consumer parameters (`SubscriptionName`, `SubscriptionType`,
/// `SubscriptionInitialPosition`) from the query string.
pub fn consumer_params(query: &HashMap<String, String>) -> Result<ConsumerParams, Error> {
    ConsumerParams::new(
        query.get("SubscriptionName").map(String::as_str),
        query.get("SubscriptionType").map(String::as_str),
        query.get("SubscriptionInitialPosition").map(String::as_str),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (k, v) in pairs {
            headers.insert(
                axum::http::HeaderName::from_bytes(k.as_bytes()).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        headers
    }

    #[test]
    fn default_broker_url_when_header_absent() {
        let config = Config::default();
        let headers = headers_with(&[("Authorization", "Bearer abc")]);
        let (token, url) = resolve_receiver(&headers, &config).unwrap();
        assert_eq!(token, "abc");
        assert_eq!(url, config.broker.default_url);
    }

    #[test]
    fn unlisted_pulsar_url_is_rejected() {
        let mut config = Config::default();
        config.broker.allowed_urls = vec!["pulsar://allowed:6650".to_string()];
        let headers = headers_with(&[("PulsarUrl", "pulsar://not-allowed:6650")]);
        assert!(matches!(
            resolve_receiver(&headers, &config),
            Err(Error::UnauthorizedUrl(_))
        ));
    }

    #[test]
    fn listed_pulsar_url_is_used() {
        let mut config = Config::default();
        config.broker.allowed_urls = vec!["pulsar://allowed:6650".to_string()];
        let headers = headers_with(&[("PulsarUrl", "pulsar://allowed:6650")]);
        let (_, url) = resolve_receiver(&headers, &config).unwrap();
        assert_eq!(url, "pulsar://allowed:6650");
    }

    #[test]
    fn empty_token_header_name_disables_forwarding() {
        let mut config = Config::default();
        config.broker.token_header_name = String::new();
        let headers = headers_with(&[("Authorization", "Bearer abc")]);
        let (token, _) = resolve_receiver(&headers, &config).unwrap();
        assert_eq!(token, "");
    }

    #[test]
    fn topic_fn_header_overrides_route() {
        let vars = HashMap::from([
            ("persistent".to_string(), "persistent".to_string()),
            ("tenant".to_string(), "t1".to_string()),
            ("namespace".to_string(), "ns".to_string()),
            ("topic".to_string(), "a".to_string()),
        ]);
        let headers = headers_with(&[("TopicFn", "persistent://t2/ns2/b")]);
        let addr = topic_from_route(&vars, &headers, &Config::default()).unwrap();
        assert_eq!(addr.fqn(), "persistent://t2/ns2/b");
    }

    #[test]
    fn missing_route_var_is_bad_route() {
        let vars = HashMap::from([("tenant".to_string(), "t1".to_string())]);
        let headers = HeaderMap::new();
        assert!(topic_from_route(&vars, &headers, &Config::default()).is_err());
    }

    #[test]
    fn persistence_filter_rejects_unlisted_scheme() {
        let mut config = Config::default();
        config.persistence_filters = vec!["persistent".to_string()];
        let vars = HashMap::from([
            ("persistent".to_string(), "non-persistent".to_string()),
            ("tenant".to_string(), "t1".to_string()),
            ("namespace".to_string(), "ns".to_string()),
            ("topic".to_string(), "a".to_string()),
        ]);
        let headers = HeaderMap::new();
        assert!(matches!(topic_from_route(&vars, &headers, &config), Err(Error::BadTopic(_))));
    }

    #[test]
    fn persistence_filter_allows_listed_scheme() {
        let mut config = Config::default();
        config.persistence_filters = vec!["persistent".to_string()];
        let vars = HashMap::from([
            ("persistent".to_string(), "persistent".to_string()),
            ("tenant".to_string(), "t1".to_string()),
            ("namespace".to_string(), "ns".to_string()),
            ("topic".to_string(), "a".to_string()),
        ]);
        let headers = HeaderMap::new();
        assert!(topic_from_route(&vars, &headers, &config).is_ok());
    }
}
