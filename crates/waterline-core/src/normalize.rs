//! Total normalization of raw remote documents into [`Case`] records.
//!
//! This is the chokepoint between the loosely-shaped remote payloads and
//! the typed projection: it never fails, fills missing fields with
//! documented defaults, and deterministically corrects impossible
//! combinations (logging them as anomalies).

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::str::FromStr;

use crate::model::{Case, CaseKind, LeakReport, LeakStatus, RequestStatus, ServiceRequest};

/// Fallback shown when a leak report arrives without an address.
pub const MISSING_ADDRESS: &str = "Address not available";

/// Normalize one raw document of the given kind.
#[must_use]
pub fn normalize(kind: CaseKind, id: &str, data: &Value, now: DateTime<Utc>) -> Case {
    match kind {
        CaseKind::Request => Case::Request(normalize_request(id, data, now)),
        CaseKind::Leak => Case::Leak(normalize_leak(id, data, now)),
    }
}

/// Normalize a raw `requests` document. Total: missing text fields become
/// empty strings, an unknown status becomes `pending`, and a missing or
/// unparseable timestamp becomes `now`.
#[must_use]
pub fn normalize_request(id: &str, data: &Value, now: DateTime<Utc>) -> ServiceRequest {
    let status = match data.get("status").and_then(Value::as_str) {
        None | Some("") => RequestStatus::Pending,
        Some(raw) => RequestStatus::from_str(raw).unwrap_or_else(|_| {
            tracing::debug!(record_id = id, status = raw, "unknown request status, defaulting to pending");
            RequestStatus::Pending
        }),
    };

    ServiceRequest {
        id: id.to_string(),
        account_number: text(data, "accountNumber"),
        service_id: text(data, "serviceId"),
        email: text(data, "email"),
        subject: text(data, "subject"),
        description: text(data, "description"),
        request_type: text(data, "type"),
        status,
        submitted_at: coerce_timestamp(data.get("timestamp"), now),
        attachment_uri: opt_text(data, "attachmentUri"),
        remarks: opt_text(data, "remarks"),
    }
}

/// Normalize a raw `leaks` document. A record with both `resolved` and
/// `rejected` set is corrected to rejected and logged as an anomaly.
#[must_use]
pub fn normalize_leak(id: &str, data: &Value, now: DateTime<Utc>) -> LeakReport {
    let resolved = flag(data, "resolved");
    let rejected = flag(data, "rejected");
    if resolved && rejected {
        tracing::warn!(
            record_id = id,
            code = %crate::error::ErrorCode::NormalizationAnomaly,
            "leak report has both resolved and rejected set; keeping rejected"
        );
    }

    LeakReport {
        id: id.to_string(),
        account_number: text(data, "accountNumber"),
        address: text_or(data, "address", MISSING_ADDRESS),
        image_url: text(data, "imageUrl"),
        description: text(data, "leakDescription"),
        unique_user_id: text(data, "uniqueUserId"),
        status: LeakStatus::from_flags(resolved, rejected),
        submitted_at: coerce_timestamp(data.get("timestamp"), now),
        remarks: opt_text(data, "remarks"),
    }
}

/// Coerce a timestamp-like value. Accepted shapes: RFC 3339 strings,
/// integer epoch seconds, integer/float epoch milliseconds (magnitude
/// `>= 1e12`), and `{seconds, nanoseconds}` maps. Anything else yields
/// `fallback`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coerce_timestamp(value: Option<&Value>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

    match value {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map_or(fallback, |dt| dt.with_timezone(&Utc)),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                let parsed = if i.abs() >= MILLIS_THRESHOLD {
                    DateTime::from_timestamp_millis(i)
                } else {
                    DateTime::from_timestamp(i, 0)
                };
                parsed.unwrap_or(fallback)
            } else if let Some(f) = n.as_f64() {
                let parsed = if f.abs() >= 1.0e12 {
                    DateTime::from_timestamp_millis(f as i64)
                } else {
                    DateTime::from_timestamp(f.trunc() as i64, (f.fract() * 1.0e9) as u32)
                };
                parsed.unwrap_or(fallback)
            } else {
                fallback
            }
        }
        Some(Value::Object(map)) => match map.get("seconds").and_then(Value::as_i64) {
            Some(seconds) => {
                let nanos = map.get("nanoseconds").and_then(Value::as_i64).unwrap_or(0);
                DateTime::from_timestamp(seconds, nanos.clamp(0, 999_999_999) as u32)
                    .unwrap_or(fallback)
            }
            None => fallback,
        },
        _ => fallback,
    }
}

fn text(data: &Value, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn text_or(data: &Value, key: &str, default: &str) -> String {
    match data.get(key).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

fn opt_text(data: &Value, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ToString::to_string)
}

fn flag(data: &Value, key: &str) -> bool {
    data.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{MISSING_ADDRESS, coerce_timestamp, normalize, normalize_leak, normalize_request};
    use crate::model::{Case, CaseKind, LeakStatus, RequestStatus};
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 10, 0, 0).unwrap()
    }

    #[test]
    fn request_happy_path() {
        let raw = json!({
            "serviceId": "SR-100",
            "accountNumber": "123456789",
            "type": "new-connection",
            "subject": "Connection request",
            "description": "New meter at 5 Dock St",
            "email": "c@example.com",
            "status": "in-progress",
            "timestamp": "2026-07-30T08:30:00Z",
            "attachmentUri": "gs://bucket/a.pdf",
            "remarks": "surveyed"
        });
        let req = normalize_request("r-1", &raw, now());
        assert_eq!(req.service_id, "SR-100");
        assert_eq!(req.status, RequestStatus::InProgress);
        assert_eq!(req.request_type, "new-connection");
        assert_eq!(
            req.submitted_at,
            Utc.with_ymd_and_hms(2026, 7, 30, 8, 30, 0).unwrap()
        );
        assert_eq!(req.attachment_uri.as_deref(), Some("gs://bucket/a.pdf"));
        assert_eq!(req.remarks.as_deref(), Some("surveyed"));
    }

    #[test]
    fn request_fills_defaults_for_missing_fields() {
        let req = normalize_request("r-2", &json!({}), now());
        assert_eq!(req.id, "r-2");
        assert_eq!(req.account_number, "");
        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.submitted_at, now());
        assert!(req.remarks.is_none());
        assert!(req.attachment_uri.is_none());
    }

    #[test]
    fn unknown_request_status_defaults_to_pending() {
        let req = normalize_request("r-3", &json!({"status": "archived"}), now());
        assert_eq!(req.status, RequestStatus::Pending);
    }

    #[test]
    fn leak_missing_address_uses_fallback() {
        let leak = normalize_leak("l-1", &json!({"accountNumber": "42"}), now());
        assert_eq!(leak.address, MISSING_ADDRESS);
        assert_eq!(leak.status, LeakStatus::Pending);
    }

    #[test]
    fn leak_blank_address_uses_fallback() {
        let leak = normalize_leak("l-2", &json!({"address": "   "}), now());
        assert_eq!(leak.address, MISSING_ADDRESS);
    }

    #[test]
    fn leak_both_flags_corrects_to_rejected() {
        let leak = normalize_leak("l-3", &json!({"resolved": true, "rejected": true}), now());
        assert_eq!(leak.status, LeakStatus::Rejected);
    }

    #[test]
    fn leak_reads_remote_description_field() {
        let leak = normalize_leak("l-4", &json!({"leakDescription": "pooling water"}), now());
        assert_eq!(leak.description, "pooling water");
    }

    #[test]
    fn normalize_dispatches_by_kind() {
        let case = normalize(CaseKind::Leak, "l-5", &json!({"resolved": true}), now());
        match case {
            Case::Leak(l) => assert_eq!(l.status, LeakStatus::Resolved),
            Case::Request(_) => panic!("expected a leak report"),
        }
    }

    #[test]
    fn timestamp_epoch_seconds() {
        let ts = coerce_timestamp(Some(&json!(1_753_862_400)), now());
        assert_eq!(ts, Utc.timestamp_opt(1_753_862_400, 0).unwrap());
    }

    #[test]
    fn timestamp_epoch_millis() {
        let ts = coerce_timestamp(Some(&json!(1_753_862_400_123_i64)), now());
        assert_eq!(ts, Utc.timestamp_millis_opt(1_753_862_400_123).unwrap());
    }

    #[test]
    fn timestamp_seconds_nanoseconds_map() {
        let ts = coerce_timestamp(
            Some(&json!({"seconds": 1_753_862_400, "nanoseconds": 500_000_000})),
            now(),
        );
        assert_eq!(ts, Utc.timestamp_opt(1_753_862_400, 500_000_000).unwrap());
    }

    #[test]
    fn timestamp_garbage_falls_back_to_now() {
        assert_eq!(coerce_timestamp(Some(&json!("yesterday")), now()), now());
        assert_eq!(coerce_timestamp(Some(&json!(["no"])), now()), now());
        assert_eq!(coerce_timestamp(None, now()), now());
    }
}
