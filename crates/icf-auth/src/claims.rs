use chrono::{DateTime, Utc};

/// Verified bearer token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Auth platform user ID (`sub` claim). Primary key of `profiles`.
    pub user_id: String,
    /// Token expiration time (from `exp` claim).
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
