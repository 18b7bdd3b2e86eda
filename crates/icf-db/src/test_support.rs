//! Shared test utilities for icf-db repository tests.

use icf_core::entities::Profile;

use crate::IcfDb;
use crate::service::IcfService;

/// In-memory service with migrations applied.
pub async fn test_service() -> IcfService {
    let db = IcfDb::open_local(":memory:").await.unwrap();
    IcfService::from_db(db)
}

/// Insert a coach profile and return it.
pub async fn seed_profile(svc: &IcfService, user_id: &str) -> Profile {
    svc.ensure_profile(user_id, &format!("{user_id}@example.com"), Some("Test Coach"))
        .await
        .unwrap()
}
