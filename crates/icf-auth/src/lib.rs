//! # icf-auth
//!
//! Request authentication for ICF Log.
//!
//! - Bearer JWTs are validated against the Clerk JWKS (`clerk-rs`) behind the
//!   [`TokenVerifier`] trait; the `sub` claim is the caller's user id.
//! - Webhook bodies are checked with timestamped HMAC-SHA256 signatures.
//! - Batch routes may present the shared cron secret instead of a JWT.
//!
//! Role and subscription checks run against the stored profile in the server.

pub mod bearer;
pub mod claims;
pub mod error;
pub mod jwks;
pub mod webhook_signature;

pub use bearer::{bearer_token, matches_cron_secret};
pub use claims::SessionClaims;
pub use error::AuthError;
pub use jwks::{ClerkVerifier, TokenVerifier};
