//! Insert payloads for the per-user entities.
//!
//! These are the validated shapes the repos write; HTTP handlers and the
//! import/calendly paths build them from their own inputs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use icf_core::enums::{
    CpdType, EmailAudience, LearningMethod, MentoringKind, PaymentType, SessionSource, SessionType,
};
use icf_core::errors::CoreError;
use icf_core::numeric::MAX_SESSION_MINUTES;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewClient {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` when the name is blank.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("client name is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCoachingSession {
    pub client_id: Option<String>,
    pub client_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub session_type: SessionType,
    pub payment_type: PaymentType,
    pub notes: Option<String>,
    pub source: SessionSource,
    pub calendly_event_uri: Option<String>,
    pub calendly_invitee_uri: Option<String>,
}

impl NewCoachingSession {
    /// Build a session from a time range, deriving the duration.
    #[must_use]
    pub fn from_range(
        client_name: impl Into<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        source: SessionSource,
    ) -> Self {
        Self {
            client_id: None,
            client_name: client_name.into(),
            started_at,
            ended_at,
            duration_minutes: (ended_at - started_at).num_minutes(),
            session_type: SessionType::default(),
            payment_type: PaymentType::default(),
            notes: None,
            source,
            calendly_event_uri: None,
            calendly_invitee_uri: None,
        }
    }

    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a blank client name, an inverted
    /// range, or a duration outside one minute to 24 hours.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.client_name.trim().is_empty() {
            return Err(CoreError::Validation("client name is required".into()));
        }
        if self.ended_at < self.started_at {
            return Err(CoreError::Validation(
                "session end must not be before its start".into(),
            ));
        }
        if self.duration_minutes <= 0 {
            return Err(CoreError::Validation(
                "session duration must be positive".into(),
            ));
        }
        if self.duration_minutes > MAX_SESSION_MINUTES {
            return Err(CoreError::Validation(
                "session duration must be at most 24 hours".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCpdEntry {
    pub title: String,
    pub activity_date: NaiveDate,
    pub hours: f64,
    pub cpd_type: CpdType,
    #[serde(default)]
    pub learning_method: LearningMethod,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub competencies: Vec<String>,
    #[serde(default)]
    pub document_path: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewCpdEntry {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a blank title or non-positive hours.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("title is required".into()));
        }
        if !self.hours.is_finite() || self.hours <= 0.0 {
            return Err(CoreError::Validation("hours must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMentoringSession {
    pub kind: MentoringKind,
    pub session_date: NaiveDate,
    pub duration_minutes: i64,
    #[serde(default)]
    pub is_group: bool,
    pub provider_name: String,
    #[serde(default)]
    pub provider_credential: Option<String>,
    #[serde(default)]
    pub focus_area: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub document_path: Option<String>,
}

impl NewMentoringSession {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a blank provider or non-positive duration.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.provider_name.trim().is_empty() {
            return Err(CoreError::Validation("provider name is required".into()));
        }
        if self.duration_minutes <= 0 {
            return Err(CoreError::Validation("duration must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewScheduledEmail {
    pub subject: String,
    pub content: String,
    pub audience: EmailAudience,
    #[serde(default)]
    pub custom_recipients: Vec<String>,
    pub scheduled_for: DateTime<Utc>,
}

impl NewScheduledEmail {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for blank subject/content, or a
    /// `custom` audience with no recipients.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.subject.trim().is_empty() || self.content.trim().is_empty() {
            return Err(CoreError::Validation(
                "subject and content are required".into(),
            ));
        }
        if self.audience == EmailAudience::Custom && self.custom_recipients.is_empty() {
            return Err(CoreError::Validation(
                "custom audience needs at least one recipient".into(),
            ));
        }
        if self
            .custom_recipients
            .iter()
            .any(|r| !r.contains('@') || r.trim() != r)
        {
            return Err(CoreError::Validation(
                "custom recipients must be email addresses".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPushSubscription {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    #[serde(default)]
    pub user_agent: Option<String>,
}
