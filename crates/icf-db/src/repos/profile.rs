//! Profile repository: ensure/read/update, subscription mirror, scheduling
//! provider link, and the batch queries used by notifications.

use chrono::{DateTime, Utc};

use icf_core::entities::{CalendlyConnection, NotificationPreferences, Profile, SubscriptionState};
use icf_core::enums::{EmailAudience, Role, SubscriptionStatus};

use crate::error::DatabaseError;
use crate::helpers::{
    collect_rows, get_bool, get_opt_string, opt_datetime_value, opt_string_value,
    parse_datetime, parse_enum, parse_optional_datetime,
};
use crate::service::IcfService;
use crate::updates::profile::{ProfileUpdate, SubscriptionUpdate};

const SELECT_COLS: &str = "user_id, email, full_name, role, credential_level, \
    stripe_customer_id, stripe_subscription_id, subscription_status, subscription_price_id, \
    current_period_end, cancel_at_period_end, trial_ends_at, \
    email_reminders, push_reminders, reminder_frequency_days, marketing_emails, \
    calendly_access_token, calendly_refresh_token, calendly_token_expires_at, \
    calendly_user_uri, calendly_organization_uri, calendly_webhook_uri, \
    last_reminder_sent_at, created_at, updated_at";

/// Statuses that count as a lapsed subscriber.
const LAPSED_STATUSES: [SubscriptionStatus; 5] = [
    SubscriptionStatus::Canceled,
    SubscriptionStatus::PastDue,
    SubscriptionStatus::Unpaid,
    SubscriptionStatus::IncompleteExpired,
    SubscriptionStatus::Paused,
];

fn row_to_profile(row: &libsql::Row) -> Result<Profile, DatabaseError> {
    let credential_level = get_opt_string(row, 4)?
        .map(|s| parse_enum(&s))
        .transpose()?;
    Ok(Profile {
        user_id: row.get(0)?,
        email: row.get(1)?,
        full_name: get_opt_string(row, 2)?,
        role: parse_enum(&row.get::<String>(3)?)?,
        credential_level,
        subscription: SubscriptionState {
            stripe_customer_id: get_opt_string(row, 5)?,
            stripe_subscription_id: get_opt_string(row, 6)?,
            status: parse_enum(&row.get::<String>(7)?)?,
            price_id: get_opt_string(row, 8)?,
            current_period_end: parse_optional_datetime(get_opt_string(row, 9)?.as_deref())?,
            cancel_at_period_end: get_bool(row, 10)?,
            trial_ends_at: parse_optional_datetime(get_opt_string(row, 11)?.as_deref())?,
        },
        notifications: NotificationPreferences {
            email_reminders: get_bool(row, 12)?,
            push_reminders: get_bool(row, 13)?,
            reminder_frequency_days: row.get(14)?,
            marketing_emails: get_bool(row, 15)?,
        },
        calendly: CalendlyConnection {
            access_token: get_opt_string(row, 16)?,
            refresh_token: get_opt_string(row, 17)?,
            token_expires_at: parse_optional_datetime(get_opt_string(row, 18)?.as_deref())?,
            user_uri: get_opt_string(row, 19)?,
            organization_uri: get_opt_string(row, 20)?,
            webhook_uri: get_opt_string(row, 21)?,
        },
        last_reminder_sent_at: parse_optional_datetime(get_opt_string(row, 22)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(23)?)?,
        updated_at: parse_datetime(&row.get::<String>(24)?)?,
    })
}

impl IcfService {
    /// Create the caller's profile if missing; refresh the email if it changed.
    ///
    /// A name is only written when the profile has none yet.
    pub async fn ensure_profile(
        &self,
        user_id: &str,
        email: &str,
        full_name: Option<&str>,
    ) -> Result<Profile, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        self.db()
            .conn()
            .execute(
                "INSERT INTO profiles (user_id, email, full_name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                    email = excluded.email,
                    full_name = COALESCE(profiles.full_name, excluded.full_name),
                    updated_at = CASE WHEN profiles.email = excluded.email
                        THEN profiles.updated_at ELSE excluded.updated_at END",
                libsql::params![user_id, email, full_name, now],
            )
            .await?;
        self.get_profile(user_id).await
    }

    pub async fn find_profile(&self, user_id: &str) -> Result<Option<Profile>, DatabaseError> {
        self.find_profile_where("user_id = ?1", user_id).await
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Profile, DatabaseError> {
        self.find_profile(user_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("profile", user_id))
    }

    pub async fn find_profile_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<Profile>, DatabaseError> {
        self.find_profile_where("stripe_customer_id = ?1", customer_id)
            .await
    }

    pub async fn find_profile_by_calendly_user(
        &self,
        user_uri: &str,
    ) -> Result<Option<Profile>, DatabaseError> {
        self.find_profile_where("calendly_user_uri = ?1", user_uri)
            .await
    }

    async fn find_profile_where(
        &self,
        condition: &str,
        value: &str,
    ) -> Result<Option<Profile>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM profiles WHERE {condition} LIMIT 1"),
                [value],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_profile(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, DatabaseError> {
        if let Some(days) = update.reminder_frequency_days {
            if days < 1 {
                return Err(DatabaseError::InvalidState(
                    "reminder_frequency_days must be at least 1".into(),
                ));
            }
        }
        let sets = update.to_set_clauses();
        if sets.is_empty() {
            return self.get_profile(user_id).await;
        }
        let now = Utc::now().to_rfc3339();
        let (sql, params) = sets.into_statement("profiles", "user_id", user_id, user_id, &now);
        let changed = self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("profile", user_id));
        }
        self.get_profile(user_id).await
    }

    /// Write subscription fields mirrored from the payment processor.
    pub async fn update_subscription(
        &self,
        user_id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<Profile, DatabaseError> {
        let sets = update.to_set_clauses();
        if sets.is_empty() {
            return self.get_profile(user_id).await;
        }
        let now = Utc::now().to_rfc3339();
        let (sql, params) = sets.into_statement("profiles", "user_id", user_id, user_id, &now);
        let changed = self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("profile", user_id));
        }
        self.get_profile(user_id).await
    }

    /// Store (or, with `CalendlyConnection::default()`, clear) the scheduling
    /// provider link.
    pub async fn save_calendly_connection(
        &self,
        user_id: &str,
        connection: &CalendlyConnection,
    ) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE profiles SET
                    calendly_access_token = ?1,
                    calendly_refresh_token = ?2,
                    calendly_token_expires_at = ?3,
                    calendly_user_uri = ?4,
                    calendly_organization_uri = ?5,
                    calendly_webhook_uri = ?6,
                    updated_at = ?7
                 WHERE user_id = ?8",
                libsql::params_from_iter([
                    opt_string_value(connection.access_token.clone()),
                    opt_string_value(connection.refresh_token.clone()),
                    opt_datetime_value(connection.token_expires_at),
                    opt_string_value(connection.user_uri.clone()),
                    opt_string_value(connection.organization_uri.clone()),
                    opt_string_value(connection.webhook_uri.clone()),
                    Utc::now().to_rfc3339().into(),
                    user_id.to_string().into(),
                ]),
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("profile", user_id));
        }
        Ok(())
    }

    pub async fn mark_reminder_sent(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE profiles SET last_reminder_sent_at = ?1 WHERE user_id = ?2",
                libsql::params![at.to_rfc3339(), user_id],
            )
            .await?;
        Ok(())
    }

    /// Roles are granted out of band (CLI), never through the API.
    pub async fn set_role(&self, user_id: &str, role: Role) -> Result<Profile, DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE profiles SET role = ?1, updated_at = ?2 WHERE user_id = ?3",
                libsql::params![role.as_str(), Utc::now().to_rfc3339(), user_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("profile", user_id));
        }
        self.get_profile(user_id).await
    }

    /// Admin listing, newest first.
    pub async fn list_profiles(&self) -> Result<Vec<Profile>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM profiles ORDER BY created_at DESC"),
                (),
            )
            .await?;
        collect_rows(rows, row_to_profile).await
    }

    /// Profiles with any reminder channel on and an access-granting status.
    pub async fn list_reminder_candidates(&self) -> Result<Vec<Profile>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM profiles
                     WHERE (email_reminders = 1 OR push_reminders = 1)
                       AND subscription_status IN (?1, ?2)
                     ORDER BY user_id"
                ),
                [
                    SubscriptionStatus::Trialing.as_str(),
                    SubscriptionStatus::Active.as_str(),
                ],
            )
            .await?;
        collect_rows(rows, row_to_profile).await
    }

    /// Trialing profiles whose trial ends between `now` and `until`.
    pub async fn list_trials_ending(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Profile>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM profiles
                     WHERE subscription_status = ?1
                       AND trial_ends_at IS NOT NULL
                       AND trial_ends_at > ?2 AND trial_ends_at <= ?3
                     ORDER BY trial_ends_at"
                ),
                libsql::params![
                    SubscriptionStatus::Trialing.as_str(),
                    now.to_rfc3339(),
                    until.to_rfc3339()
                ],
            )
            .await?;
        collect_rows(rows, row_to_profile).await
    }

    /// Recipients for a broadcast audience. Marketing opt-outs are excluded;
    /// `custom` audiences are resolved by the caller from the stored list.
    pub async fn list_audience(
        &self,
        audience: EmailAudience,
    ) -> Result<Vec<Profile>, DatabaseError> {
        let filter = match audience {
            EmailAudience::All => String::new(),
            EmailAudience::ActiveSubscribers => {
                format!("AND subscription_status = '{}'", SubscriptionStatus::Active.as_str())
            }
            EmailAudience::Trialing => {
                format!("AND subscription_status = '{}'", SubscriptionStatus::Trialing.as_str())
            }
            EmailAudience::Lapsed => {
                let statuses: Vec<String> = LAPSED_STATUSES
                    .iter()
                    .map(|status| format!("'{}'", status.as_str()))
                    .collect();
                format!("AND subscription_status IN ({})", statuses.join(", "))
            }
            EmailAudience::Custom => return Ok(Vec::new()),
        };
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM profiles
                     WHERE marketing_emails = 1 {filter}
                     ORDER BY email"
                ),
                (),
            )
            .await?;
        collect_rows(rows, row_to_profile).await
    }

    /// Most recent time the user logged anything (session, CPD or mentoring).
    pub async fn latest_activity_at(
        &self,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT MAX(ts) FROM (
                    SELECT MAX(created_at) AS ts FROM coaching_sessions WHERE user_id = ?1
                    UNION ALL
                    SELECT MAX(created_at) FROM cpd_entries WHERE user_id = ?1
                    UNION ALL
                    SELECT MAX(created_at) FROM mentoring_sessions WHERE user_id = ?1
                 )",
                [user_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        parse_optional_datetime(get_opt_string(&row, 0)?.as_deref())
    }
}
