// Session lookup for the route gate
//
// The session provider turns the token carried by a request into the identifier
// of the signed-in user, or nothing when the token is absent or invalid.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::{debug, info};
use serde::Deserialize;

use crate::config::SessionConfig;

/// Resolves a session token to a user identifier
pub trait SessionProvider: Send + Sync {
    fn user_id(&self, token: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
}

/// Verifies signed session tokens (JWT) and returns their subject
pub struct JwtSessionProvider {
    key: Option<(DecodingKey, Validation)>,
}

impl JwtSessionProvider {
    /// RS256 tokens verified with a PEM encoded public key
    pub fn with_rsa_pem(pem: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())?;
        Ok(Self {
            key: Some((key, Validation::new(Algorithm::RS256))),
        })
    }

    /// HS256 tokens verified with a shared secret
    pub fn with_secret(secret: &str) -> Self {
        Self {
            key: Some((
                DecodingKey::from_secret(secret.as_bytes()),
                Validation::new(Algorithm::HS256),
            )),
        }
    }

    /// A provider that never recognizes a session
    pub fn disabled() -> Self {
        Self { key: None }
    }

    /// Build from configuration, preferring the public key over the shared secret
    pub fn from_config(config: &SessionConfig) -> Result<Self, jsonwebtoken::errors::Error> {
        if let Some(pem) = &config.jwt_public_key {
            return Self::with_rsa_pem(pem);
        }
        if let Some(secret) = &config.jwt_secret {
            return Ok(Self::with_secret(secret));
        }
        info!("No session verification key configured, all requests are treated as signed out");
        Ok(Self::disabled())
    }
}

impl SessionProvider for JwtSessionProvider {
    fn user_id(&self, token: &str) -> Option<String> {
        let (key, validation) = self.key.as_ref()?;
        match decode::<SessionClaims>(token, key, validation) {
            Ok(data) if !data.claims.sub.is_empty() => Some(data.claims.sub),
            Ok(_) => {
                debug!("Session token has an empty subject");
                None
            }
            Err(e) => {
                debug!("Session token rejected: {}", e);
                None
            }
        }
    }
}
