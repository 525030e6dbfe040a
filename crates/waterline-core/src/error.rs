use std::fmt;

/// Machine-readable error codes for console and operator tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    SubscriptionLost,
    ConfigParseError,
    RecordNotFound,
    InvalidStatusValue,
    TransitionInFlight,
    RemoteWriteFailed,
    NotificationWriteFailed,
    NormalizationAnomaly,
}

impl ErrorCode {
    /// Stable code identifier (`W####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::SubscriptionLost => "W1001",
            Self::ConfigParseError => "W1002",
            Self::RecordNotFound => "W2001",
            Self::InvalidStatusValue => "W2002",
            Self::TransitionInFlight => "W2003",
            Self::RemoteWriteFailed => "W3001",
            Self::NotificationWriteFailed => "W3002",
            Self::NormalizationAnomaly => "W4001",
        }
    }

    /// Short human-facing summary for logs and console output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::SubscriptionLost => "Record feed subscription lost",
            Self::ConfigParseError => "Config file parse error",
            Self::RecordNotFound => "Case record not found",
            Self::InvalidStatusValue => "Invalid status value",
            Self::TransitionInFlight => "Transition already in flight",
            Self::RemoteWriteFailed => "Remote status update failed",
            Self::NotificationWriteFailed => "Notification write failed",
            Self::NormalizationAnomaly => "Remote record required correction",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::SubscriptionLost => {
                Some("The console keeps showing the last received snapshot. Check store connectivity.")
            }
            Self::ConfigParseError => Some("Fix syntax in the engine config file and retry."),
            Self::RecordNotFound => None,
            Self::InvalidStatusValue => {
                Some("Use one of the documented statuses for the record's kind.")
            }
            Self::TransitionInFlight => {
                Some("Wait for the pending status change on this record to complete.")
            }
            Self::RemoteWriteFailed => {
                Some("The record was not changed. The operator may retry the transition.")
            }
            Self::NotificationWriteFailed => {
                Some("The status change was applied but the customer was not notified.")
            }
            Self::NormalizationAnomaly => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 8] = [
        ErrorCode::SubscriptionLost,
        ErrorCode::ConfigParseError,
        ErrorCode::RecordNotFound,
        ErrorCode::InvalidStatusValue,
        ErrorCode::TransitionInFlight,
        ErrorCode::RemoteWriteFailed,
        ErrorCode::NotificationWriteFailed,
        ErrorCode::NormalizationAnomaly,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let rendered = code.code();
            assert_eq!(rendered.len(), 5);
            assert!(rendered.starts_with('W'));
            assert!(rendered.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(ErrorCode::RecordNotFound.to_string(), "W2001");
    }
}
