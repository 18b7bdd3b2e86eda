use std::sync::Arc;

use async_trait::async_trait;
use clerk_rs::ClerkConfiguration;
use clerk_rs::clerk::Clerk;
use clerk_rs::validators::authorizer::validate_jwt;
use clerk_rs::validators::jwks::MemoryCacheJwksProvider;

use crate::claims::SessionClaims;
use crate::error::AuthError;

/// Verifies a bearer token and returns its claims.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<SessionClaims, AuthError>;
}

/// Clerk JWKS verifier.
///
/// The `MemoryCacheJwksProvider` caches the public keys for an hour, so one
/// verifier should be built per process and shared.
pub struct ClerkVerifier {
    provider: Arc<MemoryCacheJwksProvider>,
}

impl ClerkVerifier {
    #[must_use]
    pub fn new(secret_key: &str) -> Self {
        let config = ClerkConfiguration::new(None, None, Some(secret_key.to_string()), None);
        let clerk = Clerk::new(config);
        Self {
            provider: Arc::new(MemoryCacheJwksProvider::new(clerk)),
        }
    }
}

#[async_trait]
impl TokenVerifier for ClerkVerifier {
    /// # Errors
    ///
    /// Returns `AuthError::JwksValidation` if the token is invalid or the
    /// JWKS endpoint is unreachable, `AuthError::TokenExpired` past `exp`.
    async fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let clerk_jwt = validate_jwt(token, self.provider.clone())
            .await
            .map_err(|e| AuthError::JwksValidation(e.to_string()))?;

        let expires_at = chrono::DateTime::from_timestamp(i64::from(clerk_jwt.exp), 0)
            .ok_or_else(|| AuthError::JwksValidation("invalid exp timestamp".into()))?;

        let claims = SessionClaims {
            user_id: clerk_jwt.sub,
            expires_at,
        };
        if claims.is_expired_at(chrono::Utc::now()) {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }
}
