use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The two kinds of case tracked by the console.
///
/// The wire string for leak reports is `"report"`, matching the
/// `kind` field of notification documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseKind {
    #[serde(rename = "request")]
    Request,
    #[serde(rename = "report")]
    Leak,
}

impl CaseKind {
    pub const ALL: [Self; 2] = [Self::Request, Self::Leak];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Leak => "report",
        }
    }

    /// Human noun used in notification descriptions.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Request => "service request",
            Self::Leak => "leak report",
        }
    }
}

/// Lifecycle states for a service request.
///
/// Any state may transition to any other state — support staff can always
/// override. The enumeration itself is the only constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl RequestStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::InProgress, Self::Completed, Self::Rejected];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }
}

/// Lifecycle states for a leak report.
///
/// The remote store encodes this as a pair of `resolved`/`rejected`
/// booleans; the enum makes their mutual exclusivity structural.
/// `resolved` and `rejected` are terminal in the console UI only — the
/// engine does not forbid transitioning out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeakStatus {
    Pending,
    Resolved,
    Rejected,
}

impl LeakStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Resolved, Self::Rejected];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }

    /// Decode the remote flag pair. Total: the invalid both-true
    /// combination resolves to `Rejected` (rejected wins).
    #[must_use]
    pub const fn from_flags(resolved: bool, rejected: bool) -> Self {
        match (resolved, rejected) {
            (_, true) => Self::Rejected,
            (true, false) => Self::Resolved,
            (false, false) => Self::Pending,
        }
    }

    /// Encode back to the remote `(resolved, rejected)` flag pair.
    #[must_use]
    pub const fn flags(self) -> (bool, bool) {
        match self {
            Self::Pending => (false, false),
            Self::Resolved => (true, false),
            Self::Rejected => (false, true),
        }
    }
}

/// A customer-submitted service request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: String,
    pub account_number: String,
    pub service_id: String,
    pub email: String,
    pub subject: String,
    pub description: String,
    #[serde(rename = "type")]
    pub request_type: String,
    pub status: RequestStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// A customer-submitted leak report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakReport {
    pub id: String,
    pub account_number: String,
    pub address: String,
    pub image_url: String,
    pub description: String,
    pub unique_user_id: String,
    pub status: LeakStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// A case record held in the projection: either variant shares the
/// identity, account, and submission fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Case {
    #[serde(rename = "request")]
    Request(ServiceRequest),
    #[serde(rename = "report")]
    Leak(LeakReport),
}

impl Case {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Request(r) => &r.id,
            Self::Leak(l) => &l.id,
        }
    }

    #[must_use]
    pub fn account_number(&self) -> &str {
        match self {
            Self::Request(r) => &r.account_number,
            Self::Leak(l) => &l.account_number,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> CaseKind {
        match self {
            Self::Request(_) => CaseKind::Request,
            Self::Leak(_) => CaseKind::Leak,
        }
    }

    /// Wire-form status label (`"pending"`, `"in-progress"`, ...).
    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        match self {
            Self::Request(r) => r.status.as_str(),
            Self::Leak(l) => l.status.as_str(),
        }
    }

    #[must_use]
    pub const fn submitted_at(&self) -> DateTime<Utc> {
        match self {
            Self::Request(r) => r.submitted_at,
            Self::Leak(l) => l.submitted_at,
        }
    }

    #[must_use]
    pub fn remarks(&self) -> Option<&str> {
        match self {
            Self::Request(r) => r.remarks.as_deref(),
            Self::Leak(l) => l.remarks.as_deref(),
        }
    }
}

/// Error returned when parsing a status value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} status: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseStatusError {}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LeakStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for CaseKind {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "request" => Ok(Self::Request),
            "report" => Ok(Self::Leak),
            _ => Err(ParseStatusError {
                expected: "kind",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for RequestStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseStatusError {
                expected: "request",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for LeakStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "pending" => Ok(Self::Pending),
            "resolved" => Ok(Self::Resolved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseStatusError {
                expected: "leak report",
                got: s.to_string(),
            }),
        }
    }
}
