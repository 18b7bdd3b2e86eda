//! Roles, statuses, and categories for ICF Log.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`,
//! and `as_str()` returns the same string used in SQL storage.
//! `ScheduledEmailStatus` provides `allowed_next_states()` to enforce
//! valid transitions at the application layer.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Account role. Admins can schedule broadcast emails and push notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Coach,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coach => "coach",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CredentialLevel
// ---------------------------------------------------------------------------

/// ICF credential a coach holds or is working towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialLevel {
    /// Associate Certified Coach.
    Acc,
    /// Professional Certified Coach.
    Pcc,
    /// Master Certified Coach.
    Mcc,
}

impl CredentialLevel {
    pub const ALL: [Self; 3] = [Self::Acc, Self::Pcc, Self::Mcc];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acc => "acc",
            Self::Pcc => "pcc",
            Self::Mcc => "mcc",
        }
    }
}

impl fmt::Display for CredentialLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SubscriptionStatus
// ---------------------------------------------------------------------------

/// Subscription state mirrored from the payment processor.
///
/// `None` means the user never started a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    None,
    Trialing,
    Active,
    PastDue,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Unpaid,
    Paused,
}

impl SubscriptionStatus {
    /// Whether the subscription grants access to write features.
    #[must_use]
    pub const fn has_access(self) -> bool {
        matches!(self, Self::Trialing | Self::Active)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Unpaid => "unpaid",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Session categories
// ---------------------------------------------------------------------------

/// Coaching format. ICF counts group and team hours the same as individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    Individual,
    Group,
    Team,
}

impl SessionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Group => "group",
            Self::Team => "team",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the session was paid. ICF credentials require a minimum of paid hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    #[default]
    Paid,
    ProBono,
}

impl PaymentType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::ProBono => "pro_bono",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a session row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    #[default]
    Manual,
    Calendly,
    Import,
}

impl SessionSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Calendly => "calendly",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for SessionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CPD categories
// ---------------------------------------------------------------------------

/// ICF CCEU category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpdType {
    #[default]
    CoreCompetency,
    ResourceDevelopment,
}

impl CpdType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CoreCompetency => "core_competency",
            Self::ResourceDevelopment => "resource_development",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CoreCompetency => "Core Competency",
            Self::ResourceDevelopment => "Resource Development",
        }
    }
}

impl fmt::Display for CpdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the CPD activity was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningMethod {
    #[default]
    Course,
    Workshop,
    Webinar,
    Conference,
    Reading,
    SelfStudy,
    Other,
}

impl LearningMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Workshop => "workshop",
            Self::Webinar => "webinar",
            Self::Conference => "conference",
            Self::Reading => "reading",
            Self::SelfStudy => "self_study",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for LearningMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MentoringKind
// ---------------------------------------------------------------------------

/// Mentor coaching (credential requirement) or coaching supervision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentoringKind {
    #[default]
    Mentoring,
    Supervision,
}

impl MentoringKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mentoring => "mentoring",
            Self::Supervision => "supervision",
        }
    }
}

impl fmt::Display for MentoringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Scheduled email
// ---------------------------------------------------------------------------

/// Who receives a scheduled broadcast email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailAudience {
    /// Every profile that accepts marketing emails.
    All,
    /// Profiles with an `active` subscription.
    ActiveSubscribers,
    /// Profiles currently in a trial.
    Trialing,
    /// Profiles whose subscription ended or never started.
    Lapsed,
    /// An explicit list of addresses.
    Custom,
}

impl EmailAudience {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::ActiveSubscribers => "active_subscribers",
            Self::Trialing => "trialing",
            Self::Lapsed => "lapsed",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for EmailAudience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a scheduled email.
///
/// ```text
/// pending → sending → sent
///                   → failed
/// pending → cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledEmailStatus {
    Pending,
    Sending,
    Sent,
    Failed,
    Cancelled,
}

impl ScheduledEmailStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Sending, Self::Cancelled],
            Self::Sending => &[Self::Sent, Self::Failed],
            Self::Sent | Self::Failed | Self::Cancelled => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ScheduledEmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// "You haven't logged anything in a while."
    LoggingReminder,
    /// Trial is about to end.
    TrialEnding,
    /// Admin-initiated push or email.
    Broadcast,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoggingReminder => "logging_reminder",
            Self::TrialEnding => "trial_ending",
            Self::Broadcast => "broadcast",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Push,
}

impl NotificationChannel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn as_str_matches_serde() {
        let json = serde_json::to_value(SubscriptionStatus::PastDue).unwrap();
        assert_eq!(json, serde_json::json!(SubscriptionStatus::PastDue.as_str()));

        let json = serde_json::to_value(LearningMethod::SelfStudy).unwrap();
        assert_eq!(json, serde_json::json!("self_study"));

        let json = serde_json::to_value(EmailAudience::ActiveSubscribers).unwrap();
        assert_eq!(json, serde_json::json!(EmailAudience::ActiveSubscribers.as_str()));
    }

    #[test]
    fn only_trialing_and_active_have_access() {
        assert!(SubscriptionStatus::Trialing.has_access());
        assert!(SubscriptionStatus::Active.has_access());
        assert!(!SubscriptionStatus::PastDue.has_access());
        assert!(!SubscriptionStatus::Canceled.has_access());
        assert!(!SubscriptionStatus::None.has_access());
    }

    #[test]
    fn scheduled_email_transitions() {
        use ScheduledEmailStatus::*;
        assert!(Pending.can_transition_to(Sending));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Sending.can_transition_to(Sent));
        assert!(Sending.can_transition_to(Failed));
        assert!(!Sending.can_transition_to(Cancelled));
        assert!(!Sent.can_transition_to(Pending));
        assert!(Cancelled.allowed_next_states().is_empty());
    }

    #[test]
    fn unknown_stripe_status_is_rejected() {
        let parsed: Result<SubscriptionStatus, _> = serde_json::from_str("\"lifetime\"");
        assert!(parsed.is_err());
    }
}
