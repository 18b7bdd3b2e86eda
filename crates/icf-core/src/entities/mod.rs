//! Entity structs for all ICF Log domain objects.
//!
//! Each entity maps to a table in the libSQL database (see `icf-db/migrations`).
//! All structs derive `Serialize` and `Deserialize` so handlers can return
//! them as JSON directly.

mod client;
mod cpd;
mod mentoring;
mod notification;
mod profile;
mod push;
mod scheduled_email;
mod session;

pub use client::Client;
pub use cpd::CpdEntry;
pub use mentoring::MentoringSession;
pub use notification::NotificationLogEntry;
pub use profile::{CalendlyConnection, NotificationPreferences, Profile, SubscriptionState};
pub use push::PushSubscription;
pub use scheduled_email::ScheduledEmail;
pub use session::CoachingSession;
