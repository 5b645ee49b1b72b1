//! Data-plane HTTP handlers: ingestion, batch poll, and SSE streaming.

pub mod ingestion;
pub mod poll;
pub mod sse;

use serde::Deserialize;

use crate::authz::authorize;
use crate::config::Config;
use crate::error::Error;
use crate::middleware::token_subjects;
use crate::topic::TopicAddress;

/// Route variables shared by all three data-plane endpoints:
/// `/v2/{kind}/{persistent}/{tenant}/{namespace}/{topic}`.
#[derive(Debug, Deserialize)]
pub struct RouteVars {
    pub persistent: String,
    pub tenant: String,
    pub namespace: String,
    pub topic: String,
}

/// Resolves the caller's token subjects and authorizes them against the
/// topic's tenant, failing with `AuthFail` (bad token) or `ForbiddenTenant`
/// (wrong tenant).
pub(crate) fn authorize_topic(addr: &TopicAddress, token: &str, config: &Config) -> Result<(), Error> {
    let subjects = token_subjects(token, &config.auth)?;
    if authorize(&addr.tenant, &subjects, &config.auth.super_roles) {
        Ok(())
    } else {
        Err(Error::ForbiddenTenant(addr.tenant.clone()))
    }
}
