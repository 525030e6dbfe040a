//! Aggregate statistics over a projection snapshot.
//!
//! Pure: `now` is a parameter, nothing is retained between calls. The
//! console recomputes this on every projection or criteria change.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::Case;

/// Length of the daily submission series shown on the dashboard.
pub const DEFAULT_SERIES_DAYS: usize = 30;

/// One labelled count with its share of the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// One calendar day of the submission series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPoint {
    pub date: NaiveDate,
    pub label: String,
    pub count: usize,
}

/// Statistics summary for a case set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseStats {
    pub total: usize,
    pub by_status: Vec<Bucket>,
    pub by_type: Vec<Bucket>,
    pub daily: Vec<DayPoint>,
}

/// Summarize with the default series length.
#[must_use]
pub fn summarize(cases: &[Case], now: DateTime<Utc>) -> CaseStats {
    summarize_with_series(cases, now, DEFAULT_SERIES_DAYS)
}

/// Summarize a case set: counts and percentage-of-total per status and
/// per request type, plus a zero-filled series of `series_days`
/// contiguous calendar days ending on `now`'s UTC date, oldest first.
///
/// An empty case set yields all-zero percentages, never NaN.
#[must_use]
pub fn summarize_with_series(cases: &[Case], now: DateTime<Utc>, series_days: usize) -> CaseStats {
    let total = cases.len();

    let mut by_status: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    for case in cases {
        *by_status.entry(case.status_label()).or_insert(0) += 1;
        if let Case::Request(r) = case {
            *by_type.entry(r.request_type.clone()).or_insert(0) += 1;
        }
    }

    CaseStats {
        total,
        by_status: by_status
            .into_iter()
            .map(|(label, count)| bucket(label.to_string(), count, total))
            .collect(),
        by_type: by_type
            .into_iter()
            .map(|(label, count)| bucket(label, count, total))
            .collect(),
        daily: daily_series(cases, now, series_days),
    }
}

#[allow(clippy::cast_precision_loss)]
fn bucket(label: String, count: usize, total: usize) -> Bucket {
    let percent = if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64) * 100.0
    };
    Bucket { label, count, percent }
}

#[allow(clippy::cast_possible_wrap)]
fn daily_series(cases: &[Case], now: DateTime<Utc>, series_days: usize) -> Vec<DayPoint> {
    if series_days == 0 {
        return Vec::new();
    }

    let today = now.date_naive();
    let start = today - Duration::days(series_days as i64 - 1);

    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for case in cases {
        let day = case.submitted_at().date_naive();
        if day >= start && day <= today {
            *per_day.entry(day).or_insert(0) += 1;
        }
    }

    (0..series_days)
        .map(|offset| {
            let date = start + Duration::days(offset as i64);
            DayPoint {
                date,
                label: date.format("%b %d").to_string(),
                count: per_day.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_SERIES_DAYS, summarize, summarize_with_series};
    use crate::model::{Case, LeakReport, LeakStatus, RequestStatus, ServiceRequest};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap()
    }

    fn request(id: &str, ty: &str, status: RequestStatus, days_ago: i64) -> Case {
        Case::Request(ServiceRequest {
            id: id.to_string(),
            account_number: "1".to_string(),
            service_id: String::new(),
            email: String::new(),
            subject: String::new(),
            description: String::new(),
            request_type: ty.to_string(),
            status,
            submitted_at: now() - Duration::days(days_ago),
            attachment_uri: None,
            remarks: None,
        })
    }

    fn leak(id: &str, days_ago: i64) -> Case {
        Case::Leak(LeakReport {
            id: id.to_string(),
            account_number: "2".to_string(),
            address: String::new(),
            image_url: String::new(),
            description: String::new(),
            unique_user_id: String::new(),
            status: LeakStatus::Pending,
            submitted_at: now() - Duration::days(days_ago),
            remarks: None,
        })
    }

    #[test]
    fn empty_set_yields_zeroes_not_nan() {
        let stats = summarize(&[], now());
        assert_eq!(stats.total, 0);
        assert!(stats.by_status.is_empty());
        assert_eq!(stats.daily.len(), DEFAULT_SERIES_DAYS);
        assert!(stats.daily.iter().all(|d| d.count == 0));
    }

    #[test]
    fn status_counts_sum_to_total() {
        let cases = vec![
            request("a", "repair", RequestStatus::Pending, 0),
            request("b", "repair", RequestStatus::Completed, 1),
            request("c", "billing", RequestStatus::Pending, 2),
            leak("d", 0),
        ];
        let stats = summarize(&cases, now());
        assert_eq!(stats.total, 4);
        let counted: usize = stats.by_status.iter().map(|b| b.count).sum();
        assert_eq!(counted, 4);

        let pending = stats.by_status.iter().find(|b| b.label == "pending").unwrap();
        assert_eq!(pending.count, 3);
        assert!((pending.percent - 75.0).abs() < 1e-9);
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let cases = vec![
            request("a", "repair", RequestStatus::Pending, 0),
            request("b", "repair", RequestStatus::Completed, 0),
            leak("c", 0),
        ];
        let stats = summarize(&cases, now());
        let sum: f64 = stats.by_status.iter().map(|b| b.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn type_buckets_cover_requests_only() {
        let cases = vec![
            request("a", "repair", RequestStatus::Pending, 0),
            request("b", "billing", RequestStatus::Pending, 0),
            leak("c", 0),
        ];
        let stats = summarize(&cases, now());
        let labels: Vec<&str> = stats.by_type.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["billing", "repair"]);
        let counted: usize = stats.by_type.iter().map(|b| b.count).sum();
        assert_eq!(counted, 2);
    }

    #[test]
    fn series_is_contiguous_oldest_first_and_zero_filled() {
        let cases = vec![request("a", "repair", RequestStatus::Pending, 3), leak("b", 0)];
        let stats = summarize(&cases, now());
        assert_eq!(stats.daily.len(), 30);
        assert_eq!(stats.daily[29].date, now().date_naive());
        for window in stats.daily.windows(2) {
            assert_eq!(window[1].date - window[0].date, Duration::days(1));
        }
        assert_eq!(stats.daily[29].count, 1);
        assert_eq!(stats.daily[26].count, 1);
        assert_eq!(stats.daily[25].count, 0);
    }

    #[test]
    fn series_excludes_records_outside_the_window() {
        let cases = vec![request("old", "repair", RequestStatus::Pending, 31)];
        let stats = summarize(&cases, now());
        let counted: usize = stats.daily.iter().map(|d| d.count).sum();
        assert_eq!(counted, 0);
        assert_eq!(stats.total, 1, "the record still counts toward totals");
    }

    #[test]
    fn series_length_is_injectable() {
        let stats = summarize_with_series(&[], now(), 7);
        assert_eq!(stats.daily.len(), 7);
        let stats = summarize_with_series(&[], now(), 0);
        assert!(stats.daily.is_empty());
    }

    #[test]
    fn day_labels_render_month_and_day() {
        let stats = summarize(&[], now());
        assert_eq!(stats.daily[29].label, "Aug 06");
    }
}
