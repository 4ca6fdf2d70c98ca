//! # checkdesk
//!
//! Postgres-backed work desk for manual verification of provider records.
//!
//! Hands each operator an exclusive provider to verify, records per-address
//! and per-phone verdicts, enforces spacing between follow-up calls, and
//! scores sessions on completion. Observability via OpenTelemetry.

pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod event;
pub mod ids;
pub mod model;
pub mod telemetry;
