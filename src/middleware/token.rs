//! Bearer-token subject extraction.
//!
//! When a JWT public key is configured, the caller's token is verified and
//! its `sub` claim (a comma-separated list of token subjects, OR-ed by the
//! authorizer) is trusted. Without a configured key, the raw token value is
//! used directly as the subject list — a deployment that forwards opaque
//! pre-shared tokens rather than JWTs.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Comma-separated list of token subjects.
    pub sub: String,
    pub exp: i64,
}

/// Resolves the comma-separated subject list carried by `token`.
pub fn token_subjects(token: &str, auth: &AuthConfig) -> Result<String, Error> {
    if token.is_empty() {
        return Ok(String::new());
    }

    let Some(key_path) = &auth.jwt_public_key_path else {
        return Ok(token.to_string());
    };

    let key_pem = std::fs::read(key_path)
        .map_err(|e| Error::AuthFail(format!("failed to read JWT public key: {e}")))?;

    let algorithm = parse_algorithm(&auth.jwt_algorithm)?;
    let decoding_key = if algorithm_is_hmac(algorithm) {
        DecodingKey::from_secret(&key_pem)
    } else {
        DecodingKey::from_rsa_pem(&key_pem)?
    };

    let mut validation = Validation::new(algorithm);
    validation.validate_aud = false;

    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
    Ok(token_data.claims.sub)
}

fn algorithm_is_hmac(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

fn parse_algorithm(name: &str) -> Result<Algorithm, Error> {
    match name {
        "RS256" => Ok(Algorithm::RS256),
        "RS384" => Ok(Algorithm::RS384),
        "RS512" => Ok(Algorithm::RS512),
        "ES256" => Ok(Algorithm::ES256),
        "ES384" => Ok(Algorithm::ES384),
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(Error::AuthFail(format!("unsupported JWT algorithm: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_empty_subject_list() {
        let auth = AuthConfig { super_roles: vec![], jwt_public_key_path: None, jwt_algorithm: "RS256".into() };
        assert_eq!(token_subjects("", &auth).unwrap(), "");
    }

    #[test]
    fn no_key_configured_passes_token_through_as_subject() {
        let auth = AuthConfig { super_roles: vec![], jwt_public_key_path: None, jwt_algorithm: "RS256".into() };
        assert_eq!(token_subjects("acme-prod", &auth).unwrap(), "acme-prod");
    }

    #[test]
    fn unsupported_algorithm_is_rejected() {
        assert!(parse_algorithm("ROT13").is_err());
    }
}
