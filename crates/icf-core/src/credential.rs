//! ICF credential progress.
//!
//! Totals coaching, mentoring and CPD hours and compares them with the
//! published ACC / PCC / MCC thresholds and the three-year renewal
//! requirement (40 CCEUs, 24 of them core competency).

use std::collections::HashSet;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::entities::{CoachingSession, CpdEntry, MentoringSession};
use crate::enums::{CpdType, CredentialLevel, MentoringKind, PaymentType};

/// Minimum experience for a credential level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CredentialRequirement {
    pub level: CredentialLevel,
    pub coaching_hours: f64,
    pub paid_hours: f64,
    pub clients: usize,
    pub mentoring_hours: f64,
}

pub const ACC: CredentialRequirement = CredentialRequirement {
    level: CredentialLevel::Acc,
    coaching_hours: 100.0,
    paid_hours: 75.0,
    clients: 8,
    mentoring_hours: 10.0,
};

pub const PCC: CredentialRequirement = CredentialRequirement {
    level: CredentialLevel::Pcc,
    coaching_hours: 500.0,
    paid_hours: 450.0,
    clients: 25,
    mentoring_hours: 10.0,
};

pub const MCC: CredentialRequirement = CredentialRequirement {
    level: CredentialLevel::Mcc,
    coaching_hours: 2500.0,
    paid_hours: 2250.0,
    clients: 35,
    mentoring_hours: 10.0,
};

/// CCEUs needed per renewal window.
pub const RENEWAL_CPD_HOURS: f64 = 40.0;
/// Of which core competency.
pub const RENEWAL_CORE_HOURS: f64 = 24.0;
pub const RENEWAL_WINDOW_MONTHS: u32 = 36;

impl CredentialRequirement {
    #[must_use]
    pub const fn for_level(level: CredentialLevel) -> Self {
        match level {
            CredentialLevel::Acc => ACC,
            CredentialLevel::Pcc => PCC,
            CredentialLevel::Mcc => MCC,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressTotals {
    pub session_count: usize,
    pub coaching_hours: f64,
    pub paid_hours: f64,
    pub pro_bono_hours: f64,
    pub distinct_clients: usize,
    pub mentoring_hours: f64,
    pub supervision_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub requirement: CredentialRequirement,
    pub coaching_hours_met: bool,
    pub paid_hours_met: bool,
    pub clients_met: bool,
    pub mentoring_met: bool,
    pub eligible: bool,
    pub remaining_coaching_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalProgress {
    pub window_start: NaiveDate,
    pub cpd_hours: f64,
    pub core_competency_hours: f64,
    pub resource_development_hours: f64,
    pub remaining_hours: f64,
    pub remaining_core_hours: f64,
    pub met: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub totals: ProgressTotals,
    pub levels: Vec<LevelProgress>,
    pub renewal: RenewalProgress,
}

/// Aggregate session, mentoring and CPD rows into a progress report.
///
/// Clients are counted by `client_id` when linked, otherwise by the
/// case-insensitive trimmed `client_name`. Only `mentoring` rows count
/// towards the mentor coaching requirement.
#[must_use]
pub fn progress_report(
    sessions: &[CoachingSession],
    cpd: &[CpdEntry],
    mentoring: &[MentoringSession],
    today: NaiveDate,
) -> ProgressReport {
    let mut totals = ProgressTotals::default();
    let mut clients = HashSet::new();

    for session in sessions {
        let hours = session.hours();
        totals.session_count += 1;
        totals.coaching_hours += hours;
        match session.payment_type {
            PaymentType::Paid => totals.paid_hours += hours,
            PaymentType::ProBono => totals.pro_bono_hours += hours,
        }
        let key = session
            .client_id
            .clone()
            .unwrap_or_else(|| format!("name:{}", session.client_name.trim().to_lowercase()));
        clients.insert(key);
    }
    totals.distinct_clients = clients.len();

    for entry in mentoring {
        match entry.kind {
            MentoringKind::Mentoring => totals.mentoring_hours += entry.hours(),
            MentoringKind::Supervision => totals.supervision_hours += entry.hours(),
        }
    }

    let levels = CredentialLevel::ALL
        .iter()
        .map(|level| level_progress(&totals, CredentialRequirement::for_level(*level)))
        .collect();

    ProgressReport {
        renewal: renewal_progress(cpd, today),
        totals,
        levels,
    }
}

fn level_progress(totals: &ProgressTotals, requirement: CredentialRequirement) -> LevelProgress {
    let coaching_hours_met = totals.coaching_hours >= requirement.coaching_hours;
    let paid_hours_met = totals.paid_hours >= requirement.paid_hours;
    let clients_met = totals.distinct_clients >= requirement.clients;
    let mentoring_met = totals.mentoring_hours >= requirement.mentoring_hours;
    LevelProgress {
        requirement,
        coaching_hours_met,
        paid_hours_met,
        clients_met,
        mentoring_met,
        eligible: coaching_hours_met && paid_hours_met && clients_met && mentoring_met,
        remaining_coaching_hours: (requirement.coaching_hours - totals.coaching_hours).max(0.0),
    }
}

fn renewal_progress(cpd: &[CpdEntry], today: NaiveDate) -> RenewalProgress {
    let window_start = today
        .checked_sub_months(Months::new(RENEWAL_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MIN);

    let mut core = 0.0;
    let mut resource = 0.0;
    for entry in cpd
        .iter()
        .filter(|e| e.activity_date >= window_start && e.activity_date <= today)
    {
        match entry.cpd_type {
            CpdType::CoreCompetency => core += entry.hours,
            CpdType::ResourceDevelopment => resource += entry.hours,
        }
    }
    let total: f64 = core + resource;

    RenewalProgress {
        window_start,
        cpd_hours: total,
        core_competency_hours: core,
        resource_development_hours: resource,
        remaining_hours: (RENEWAL_CPD_HOURS - total).max(0.0),
        remaining_core_hours: (RENEWAL_CORE_HOURS - core).max(0.0),
        met: total >= RENEWAL_CPD_HOURS && core >= RENEWAL_CORE_HOURS,
    }
}
