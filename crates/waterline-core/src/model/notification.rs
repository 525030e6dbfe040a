use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::case::CaseKind;

/// An account-scoped event describing the outcome of a transition.
///
/// Created exactly once per confirmed transition and never mutated by the
/// engine; a separate flow owned by the customer-facing app may mark it
/// read later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub account_number: String,
    pub record_id: String,
    pub description: String,
    pub status: String,
    pub kind: CaseKind,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    /// Build the notification for a confirmed transition. `read` starts
    /// false; the description carries the operator's remarks when given.
    #[must_use]
    pub fn new(
        account_number: &str,
        record_id: &str,
        kind: CaseKind,
        status: &str,
        remarks: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let description = match remarks.filter(|r| !r.trim().is_empty()) {
            Some(r) => format!("Your {} is now {status}. Remarks: {r}", kind.noun()),
            None => format!("Your {} is now {status}.", kind.noun()),
        };
        Self {
            account_number: account_number.to_string(),
            record_id: record_id.to_string(),
            description,
            status: status.to_string(),
            kind,
            timestamp,
            read: false,
        }
    }
}
