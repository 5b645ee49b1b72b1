//! Structured logging bootstrap.

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Result};

/// Initializes JSON-formatted tracing from `service.log_level`, overridable
/// via `RUST_LOG`.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.service.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().json().with_env_filter(filter).init();

    tracing::info!(service = %config.service.name, "tracing initialized");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_does_not_panic() {
        let config = Config::default();
        let _ = init_tracing(&config);
    }
}
