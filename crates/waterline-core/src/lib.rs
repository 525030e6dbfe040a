//! waterline-core library.
//!
//! Canonical record schema, normalization, filtering, and aggregation for
//! the waterline operations console.
//!
//! # Conventions
//!
//! - **Errors**: typed error values mapped to [`error::ErrorCode`];
//!   `anyhow::Result` only at orchestration edges (config loading).
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`).
//! - **Purity**: functions in [`filter`], [`stats`], and [`normalize`]
//!   take `now` as a parameter and never read the clock themselves.

pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod normalize;
pub mod stats;

pub use model::{
    Case, CaseKind, LeakReport, LeakStatus, Notification, RequestStatus, ServiceRequest,
};
