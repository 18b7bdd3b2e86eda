//! Transactional email (Resend) configuration.

use serde::{Deserialize, Serialize};

fn default_api_base() -> String {
    String::from("https://api.resend.com")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub api_key: String,

    /// Sender, e.g. `ICF Log <hello@icflog.app>`.
    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub reply_to: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            from: String::new(),
            reply_to: String::new(),
            api_base: default_api_base(),
        }
    }
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.from.is_empty()
    }
}
