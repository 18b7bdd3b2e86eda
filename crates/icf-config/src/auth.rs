//! Clerk authentication configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Clerk secret key, used to fetch the JWKS.
    #[serde(default)]
    pub secret_key: String,

    /// Publishable key, echoed to the frontend only.
    #[serde(default)]
    pub publishable_key: String,
}

impl AuthConfig {
    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        assert!(!AuthConfig::default().is_configured());
    }

    #[test]
    fn configured_with_secret_key() {
        let config = AuthConfig {
            secret_key: "sk_test_456".into(),
            ..Default::default()
        };
        assert!(config.is_configured());
    }
}
