use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{CredentialLevel, Role, SubscriptionStatus};

/// A coach's account row, keyed by the auth platform user ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub user_id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub credential_level: Option<CredentialLevel>,
    pub subscription: SubscriptionState,
    pub notifications: NotificationPreferences,
    pub calendly: CalendlyConnection,
    pub last_reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the subscription currently grants write access.
    #[must_use]
    pub const fn has_access(&self) -> bool {
        self.subscription.status.has_access()
    }

    /// First word of the full name, falling back to the email local part.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.full_name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
            .unwrap_or_else(|| self.email.split('@').next().unwrap_or(&self.email))
    }
}

/// Subscription fields mirrored from the payment processor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionState {
    pub status: SubscriptionStatus,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub price_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub trial_ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationPreferences {
    pub email_reminders: bool,
    pub push_reminders: bool,
    pub reminder_frequency_days: i64,
    pub marketing_emails: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email_reminders: true,
            push_reminders: false,
            reminder_frequency_days: 7,
            marketing_emails: true,
        }
    }
}

/// Scheduling provider OAuth link. Tokens never leave the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendlyConnection {
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing)]
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub user_uri: Option<String>,
    pub organization_uri: Option<String>,
    pub webhook_uri: Option<String>,
}

impl CalendlyConnection {
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.access_token.is_some() && self.user_uri.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(full_name: Option<&str>) -> Profile {
        Profile {
            user_id: "user_1".into(),
            email: "jane.doe@example.com".into(),
            full_name: full_name.map(String::from),
            role: Role::Coach,
            credential_level: None,
            subscription: SubscriptionState::default(),
            notifications: NotificationPreferences::default(),
            calendly: CalendlyConnection::default(),
            last_reminder_sent_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn first_name_from_full_name() {
        assert_eq!(profile(Some("Jane Doe")).first_name(), "Jane");
    }

    #[test]
    fn first_name_falls_back_to_email() {
        assert_eq!(profile(None).first_name(), "jane.doe");
        assert_eq!(profile(Some("   ")).first_name(), "jane.doe");
    }

    #[test]
    fn calendly_tokens_are_not_serialized() {
        let mut p = profile(None);
        p.calendly.access_token = Some("secret-access".into());
        p.calendly.refresh_token = Some("secret-refresh".into());
        p.calendly.user_uri = Some("https://api.calendly.com/users/AAA".into());
        let json = serde_json::to_string(&p).unwrap();
        assert!(!json.contains("secret-access"));
        assert!(!json.contains("secret-refresh"));
        assert!(json.contains("users/AAA"));
    }

    #[test]
    fn default_preferences() {
        let prefs = NotificationPreferences::default();
        assert!(prefs.email_reminders);
        assert!(!prefs.push_reminders);
        assert_eq!(prefs.reminder_frequency_days, 7);
    }
}
