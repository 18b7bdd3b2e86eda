//! # icf-providers
//!
//! HTTP clients for the third-party services ICF Log depends on:
//! - Stripe: subscription checkout, billing portal, subscription lookup, webhook event shapes
//! - Resend: transactional email ([`EmailSender`])
//! - Calendly: OAuth, webhook subscriptions, scheduled events and invitees
//! - Web push: VAPID-signed, aes128gcm-encrypted notifications ([`PushSender`])
//! - R2 / S3: presigned document upload URLs
//!
//! Every client is built from its `icf-config` section and refuses to build
//! when that section is not configured.

pub mod calendly;
pub mod email;
pub mod push;
pub mod storage;
pub mod stripe;

mod error;
mod http;

pub use calendly::CalendlyClient;
pub use email::{EmailMessage, EmailSender, ResendClient};
pub use error::ProviderError;
pub use push::{PushMessage, PushSender, WebPushSender};
pub use storage::{DocumentKind, DocumentStore, SignedUpload};
pub use stripe::StripeClient;
