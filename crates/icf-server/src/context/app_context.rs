use std::sync::Arc;

use anyhow::Context;
use icf_auth::{ClerkVerifier, TokenVerifier};
use icf_config::{DatabaseConfig, IcfConfig};
use icf_db::service::IcfService;
use icf_notify::{Notifier, NotifySettings};
use icf_providers::{
    CalendlyClient, DocumentStore, EmailSender, PushSender, ResendClient, StripeClient,
    WebPushSender,
};

/// Shared application resources initialized once at startup.
///
/// Third-party clients are `None` when their config section is incomplete;
/// the routes that need them answer 503.
pub struct AppContext {
    pub service: Arc<IcfService>,
    pub config: IcfConfig,
    pub verifier: Option<Arc<dyn TokenVerifier>>,
    pub stripe: Option<StripeClient>,
    pub calendly: Option<CalendlyClient>,
    pub storage: Option<DocumentStore>,
    pub notifier: Notifier,
}

impl AppContext {
    /// Open the database and build every configured client.
    pub async fn init(config: IcfConfig) -> anyhow::Result<Self> {
        let service = open_service(&config.database).await?;
        let verifier = config.auth.is_configured().then(|| {
            Arc::new(ClerkVerifier::new(&config.auth.secret_key)) as Arc<dyn TokenVerifier>
        });
        Self::with_service(Arc::new(service), config, verifier)
    }

    /// Build the provider clients around an already opened database.
    pub fn with_service(
        service: Arc<IcfService>,
        config: IcfConfig,
        verifier: Option<Arc<dyn TokenVerifier>>,
    ) -> anyhow::Result<Self> {
        let stripe = if config.stripe.is_configured() {
            Some(StripeClient::from_config(&config.stripe).context("failed to build stripe client")?)
        } else {
            None
        };
        let calendly = if config.calendly.is_configured() {
            Some(
                CalendlyClient::from_config(&config.calendly)
                    .context("failed to build calendly client")?,
            )
        } else {
            None
        };
        let storage = if config.storage.is_configured() {
            Some(
                DocumentStore::from_config(&config.storage)
                    .context("failed to build document store")?,
            )
        } else {
            None
        };
        let email: Option<Arc<dyn EmailSender>> = if config.email.is_configured() {
            Some(Arc::new(
                ResendClient::from_config(&config.email).context("failed to build email client")?,
            ))
        } else {
            None
        };
        let push: Option<Arc<dyn PushSender>> = if config.push.is_configured() {
            Some(Arc::new(
                WebPushSender::from_config(&config.push).context("failed to build push sender")?,
            ))
        } else {
            None
        };

        tracing::info!(
            auth = verifier.is_some(),
            stripe = stripe.is_some(),
            calendly = calendly.is_some(),
            storage = storage.is_some(),
            email = email.is_some(),
            push = push.is_some(),
            "providers initialized"
        );

        let notifier = Notifier::new(
            Arc::clone(&service),
            email,
            push,
            NotifySettings::from_config(&config),
        );
        Ok(Self {
            service,
            config,
            verifier,
            stripe,
            calendly,
            storage,
            notifier,
        })
    }
}

/// Remote libSQL when a URL and token are set, otherwise the local file.
pub async fn open_service(config: &DatabaseConfig) -> anyhow::Result<IcfService> {
    if config.is_remote() {
        IcfService::new_remote(&config.url, &config.auth_token)
            .await
            .with_context(|| format!("failed to open remote database at {}", config.url))
    } else {
        IcfService::new_local(&config.path)
            .await
            .with_context(|| format!("failed to open database at {}", config.path))
    }
}
