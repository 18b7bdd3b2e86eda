//! # icf-config
//!
//! Layered configuration loading for ICF Log using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`ICFLOG_*` prefix, `__` as separator)
//! 2. Working-directory `icflog.toml`
//! 3. User-level `~/.config/icflog/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `ICFLOG_STRIPE__SECRET_KEY` -> `stripe.secret_key`,
//! `ICFLOG_STORAGE__ACCOUNT_ID` -> `storage.account_id`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use icf_config::IcfConfig;
//!
//! let config = IcfConfig::load_with_dotenv().expect("config");
//! if config.stripe.is_configured() {
//!     println!("billing enabled");
//! }
//! ```

mod auth;
mod calendly;
mod database;
mod email;
mod error;
mod notifications;
mod push;
mod server;
mod storage;
mod stripe;

pub use auth::AuthConfig;
pub use calendly::CalendlyConfig;
pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::ConfigError;
pub use notifications::NotificationsConfig;
pub use push::PushConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;
pub use stripe::StripeConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix for all settings.
pub const ENV_PREFIX: &str = "ICFLOG_";

/// Project-local config file name.
pub const LOCAL_CONFIG_FILE: &str = "icflog.toml";

/// Presigned S3 URLs cannot outlive seven days.
const MAX_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IcfConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub stripe: StripeConfig,
    #[serde(default)]
    pub calendly: CalendlyConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl IcfConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] when a source cannot be parsed, or
    /// [`ConfigError::InvalidValue`] when a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Range checks serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notifications.trial_warning_days < 0 {
            return Err(ConfigError::invalid(
                "notifications.trial_warning_days",
                "must not be negative",
            ));
        }
        if !(1..=MAX_URL_EXPIRY_SECS).contains(&self.storage.url_expiry_secs) {
            return Err(ConfigError::invalid(
                "storage.url_expiry_secs",
                format!("must be between 1 and {MAX_URL_EXPIRY_SECS}"),
            ));
        }
        Ok(())
    }

    /// Load `.env` from the current directory, then [`Self::load`].
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("icflog").join("config.toml"))
    }
}
