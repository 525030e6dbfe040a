//! Filter criteria and pure filtering over a projection snapshot.
//!
//! Filtering is conjunctive: a case must pass all four predicates
//! (search, status, type, date window). The criteria value is replaced
//! wholesale on each console input event, never partially mutated.

use chrono::{DateTime, Duration, Utc};
use std::{fmt, str::FromStr};

use crate::model::Case;

/// Status predicate: match everything or one exact status label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Exact(String),
}

/// Request-type predicate. Leak reports pass it vacuously.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Exact(String),
}

/// Named submission-date windows offered by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateWindow {
    #[default]
    All,
    Today,
    Last7Days,
    Last30Days,
    Last90Days,
}

/// Error returned when parsing an unknown date window string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownWindow {
    pub raw: String,
}

impl fmt::Display for UnknownWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown date window '{}': expected one of all, today, 7d, 30d, 90d",
            self.raw
        )
    }
}

impl std::error::Error for UnknownWindow {}

impl DateWindow {
    /// Inclusive lower bound on `submitted_at`, or `None` for match-all.
    #[must_use]
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::All => None,
            Self::Today => now.date_naive().and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
            Self::Last7Days => Some(now - Duration::days(7)),
            Self::Last30Days => Some(now - Duration::days(30)),
            Self::Last90Days => Some(now - Duration::days(90)),
        }
    }
}

impl FromStr for DateWindow {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "7d" => Ok(Self::Last7Days),
            "30d" => Ok(Self::Last30Days),
            "90d" => Ok(Self::Last90Days),
            _ => Err(UnknownWindow { raw: s.to_string() }),
        }
    }
}

impl StatusFilter {
    /// Parse the console's string form: `"all"` (or blank) matches all.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Exact(trimmed.to_ascii_lowercase())
        }
    }
}

impl TypeFilter {
    /// Parse the console's string form: `"all"` (or blank) matches all.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Exact(trimmed.to_string())
        }
    }
}

/// The console's filter state. A value object: replaced on every input
/// event. `Default` is the identity criteria (matches everything).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub search: String,
    pub status: StatusFilter,
    pub type_filter: TypeFilter,
    pub date_range: DateWindow,
}

/// Whether one case passes all four predicates.
#[must_use]
pub fn matches(case: &Case, criteria: &FilterCriteria, now: DateTime<Utc>) -> bool {
    matches_search(case, &criteria.search)
        && matches_status(case, &criteria.status)
        && matches_type(case, &criteria.type_filter)
        && matches_window(case, criteria.date_range, now)
}

/// Filter a projection snapshot, preserving input order. Pure: the same
/// inputs always yield the same view.
#[must_use]
pub fn apply(cases: &[Case], criteria: &FilterCriteria, now: DateTime<Utc>) -> Vec<Case> {
    cases
        .iter()
        .filter(|case| matches(case, criteria, now))
        .cloned()
        .collect()
}

fn matches_search(case: &Case, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let fields: [&str; 4] = match case {
        Case::Request(r) => [&r.service_id, &r.account_number, &r.subject, &r.email],
        Case::Leak(l) => [&l.account_number, &l.address, &l.description, &l.unique_user_id],
    };
    fields.iter().any(|f| f.to_lowercase().contains(&needle))
}

fn matches_status(case: &Case, filter: &StatusFilter) -> bool {
    match filter {
        StatusFilter::All => true,
        StatusFilter::Exact(status) => case.status_label() == status,
    }
}

fn matches_type(case: &Case, filter: &TypeFilter) -> bool {
    match (filter, case) {
        (TypeFilter::All, _) | (TypeFilter::Exact(_), Case::Leak(_)) => true,
        (TypeFilter::Exact(ty), Case::Request(r)) => r.request_type == *ty,
    }
}

fn matches_window(case: &Case, window: DateWindow, now: DateTime<Utc>) -> bool {
    window
        .cutoff(now)
        .is_none_or(|cutoff| case.submitted_at() >= cutoff)
}
