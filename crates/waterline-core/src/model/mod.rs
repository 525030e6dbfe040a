//! Canonical record schema for the console engine.

pub mod case;
pub mod notification;

pub use case::{Case, CaseKind, LeakReport, LeakStatus, ParseStatusError, RequestStatus, ServiceRequest};
pub use notification::Notification;
