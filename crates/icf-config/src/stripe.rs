//! Stripe (payment processor) configuration.

use serde::{Deserialize, Serialize};

const fn default_trial_days() -> u32 {
    14
}

fn default_api_base() -> String {
    String::from("https://api.stripe.com")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeConfig {
    #[serde(default)]
    pub secret_key: String,

    /// Endpoint secret (`whsec_...`) for `Stripe-Signature` verification.
    #[serde(default)]
    pub webhook_secret: String,

    #[serde(default)]
    pub monthly_price_id: String,

    #[serde(default)]
    pub annual_price_id: String,

    /// Trial length applied to new checkouts. 0 disables the trial.
    #[serde(default = "default_trial_days")]
    pub trial_days: u32,

    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            webhook_secret: String::new(),
            monthly_price_id: String::new(),
            annual_price_id: String::new(),
            trial_days: default_trial_days(),
            api_base: default_api_base(),
        }
    }
}

impl StripeConfig {
    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty() && !self.webhook_secret.is_empty()
    }
}
