use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("token expired")]
    TokenExpired,

    #[error("JWKS validation failed: {0}")]
    JwksValidation(String),

    #[error("admin role required")]
    Forbidden,

    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("webhook timestamp outside tolerance")]
    StaleSignature,

    #[error("{0}")]
    Other(String),
}
