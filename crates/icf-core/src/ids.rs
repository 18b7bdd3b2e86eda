//! ID prefixes for generated row identifiers.
//!
//! IDs are produced in SQL as `<prefix>-<8 hex chars>`, e.g. `ses-a3f8b2c1`.
//! Profiles are keyed by the auth platform's user ID and have no prefix.

pub const PREFIX_CLIENT: &str = "cli";
pub const PREFIX_SESSION: &str = "ses";
pub const PREFIX_CPD: &str = "cpd";
pub const PREFIX_MENTORING: &str = "men";
pub const PREFIX_SCHEDULED_EMAIL: &str = "eml";
pub const PREFIX_PUSH_SUBSCRIPTION: &str = "psh";
pub const PREFIX_NOTIFICATION: &str = "ntf";

/// Every prefix, for exhaustive tests.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_CLIENT,
    PREFIX_SESSION,
    PREFIX_CPD,
    PREFIX_MENTORING,
    PREFIX_SCHEDULED_EMAIL,
    PREFIX_PUSH_SUBSCRIPTION,
    PREFIX_NOTIFICATION,
];

/// Check that `id` has the shape `<prefix>-<8 lowercase hex>`.
#[must_use]
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| {
            hex.len() == 8 && hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        })
}
