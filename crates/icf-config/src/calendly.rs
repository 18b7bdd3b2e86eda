//! Calendly (scheduling provider) OAuth and webhook configuration.

use serde::{Deserialize, Serialize};

fn default_auth_base() -> String {
    String::from("https://auth.calendly.com")
}

fn default_api_base() -> String {
    String::from("https://api.calendly.com")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CalendlyConfig {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    /// OAuth redirect URI registered with the provider.
    #[serde(default)]
    pub redirect_uri: String,

    /// Signing key for `Calendly-Webhook-Signature`.
    #[serde(default)]
    pub webhook_signing_key: String,

    /// Public URL of `POST /api/webhooks/calendly`.
    #[serde(default)]
    pub webhook_url: String,

    #[serde(default = "default_auth_base")]
    pub auth_base: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for CalendlyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            webhook_signing_key: String::new(),
            webhook_url: String::new(),
            auth_base: default_auth_base(),
            api_base: default_api_base(),
        }
    }
}

impl CalendlyConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.redirect_uri.is_empty()
    }
}
