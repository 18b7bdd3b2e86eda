//! Web push (VAPID) configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PushConfig {
    /// URL-safe base64 public key, handed to browsers when subscribing.
    #[serde(default)]
    pub vapid_public_key: String,

    /// URL-safe base64 private key.
    #[serde(default)]
    pub vapid_private_key: String,

    /// `mailto:` or `https:` contact for the push service.
    #[serde(default)]
    pub subject: String,
}

impl PushConfig {
    pub fn is_configured(&self) -> bool {
        !self.vapid_public_key.is_empty()
            && !self.vapid_private_key.is_empty()
            && !self.subject.is_empty()
    }
}
