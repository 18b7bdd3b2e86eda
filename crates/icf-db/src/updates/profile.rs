//! Profile update builders: user-editable settings and the
//! processor-mirrored subscription fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use icf_core::enums::{CredentialLevel, SubscriptionStatus};

use super::{SetClauses, double_option};
use crate::helpers::opt_datetime_value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub credential_level: Option<Option<CredentialLevel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_reminders: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_reminders: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_frequency_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_emails: Option<bool>,
}

impl ProfileUpdate {
    pub(crate) fn to_set_clauses(&self) -> SetClauses {
        let mut sets = SetClauses::default();
        if let Some(ref full_name) = self.full_name {
            sets.push_opt("full_name", full_name.clone());
        }
        if let Some(level) = self.credential_level {
            sets.push_opt("credential_level", level.map(|l| l.as_str()));
        }
        if let Some(v) = self.email_reminders {
            sets.push("email_reminders", i64::from(v));
        }
        if let Some(v) = self.push_reminders {
            sets.push("push_reminders", i64::from(v));
        }
        if let Some(v) = self.reminder_frequency_days {
            sets.push("reminder_frequency_days", v);
        }
        if let Some(v) = self.marketing_emails {
            sets.push("marketing_emails", i64::from(v));
        }
        sets
    }
}

pub struct ProfileUpdateBuilder(ProfileUpdate);

impl ProfileUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ProfileUpdate::default())
    }

    #[must_use]
    pub fn full_name(mut self, full_name: Option<String>) -> Self {
        self.0.full_name = Some(full_name);
        self
    }

    #[must_use]
    pub fn credential_level(mut self, level: Option<CredentialLevel>) -> Self {
        self.0.credential_level = Some(level);
        self
    }

    #[must_use]
    pub const fn email_reminders(mut self, enabled: bool) -> Self {
        self.0.email_reminders = Some(enabled);
        self
    }

    #[must_use]
    pub const fn push_reminders(mut self, enabled: bool) -> Self {
        self.0.push_reminders = Some(enabled);
        self
    }

    #[must_use]
    pub const fn reminder_frequency_days(mut self, days: i64) -> Self {
        self.0.reminder_frequency_days = Some(days);
        self
    }

    #[must_use]
    pub const fn marketing_emails(mut self, enabled: bool) -> Self {
        self.0.marketing_emails = Some(enabled);
        self
    }

    #[must_use]
    pub fn build(self) -> ProfileUpdate {
        self.0
    }
}

impl Default for ProfileUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscription fields written from payment processor events.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubscriptionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_at_period_end: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_ends_at: Option<Option<DateTime<Utc>>>,
}

impl SubscriptionUpdate {
    #[must_use]
    pub fn status(status: SubscriptionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn to_set_clauses(&self) -> SetClauses {
        let mut sets = SetClauses::default();
        if let Some(status) = self.status {
            sets.push("subscription_status", status.as_str());
        }
        if let Some(ref id) = self.stripe_customer_id {
            sets.push("stripe_customer_id", id.clone());
        }
        if let Some(ref id) = self.stripe_subscription_id {
            sets.push("stripe_subscription_id", id.clone());
        }
        if let Some(ref price) = self.price_id {
            sets.push_opt("subscription_price_id", price.clone());
        }
        if let Some(end) = self.current_period_end {
            sets.push("current_period_end", opt_datetime_value(end));
        }
        if let Some(cancel) = self.cancel_at_period_end {
            sets.push("cancel_at_period_end", i64::from(cancel));
        }
        if let Some(trial) = self.trial_ends_at {
            sets.push("trial_ends_at", opt_datetime_value(trial));
        }
        sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_body_distinguishes_null_from_missing() {
        let update: ProfileUpdate =
            serde_json::from_str(r#"{"full_name": null, "push_reminders": true}"#).unwrap();
        assert_eq!(update.full_name, Some(None));
        assert_eq!(update.credential_level, None);
        assert_eq!(update.push_reminders, Some(true));
    }

    #[test]
    fn builder_sets_fields() {
        let update = ProfileUpdateBuilder::new()
            .credential_level(Some(CredentialLevel::Pcc))
            .reminder_frequency_days(14)
            .build();
        assert_eq!(update.credential_level, Some(Some(CredentialLevel::Pcc)));
        assert_eq!(update.reminder_frequency_days, Some(14));
        assert!(update.email_reminders.is_none());
    }
}
