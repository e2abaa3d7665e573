//! Core domain types and shared logic for the Bastion admin service.
//!
//! This crate defines the data model used across all other crates:
//! - Health probe results and aggregated snapshots
//! - Traffic time series and derived rates
//! - Configuration for backends, probes, and endpoints

pub mod config;
pub mod error;
pub mod health;
pub mod traffic;

pub use error::{Error, Result};
pub use health::{HealthSnapshot, HealthStatus, ModuleKind, ModuleStatus, ProbeStatus};
pub use traffic::{
    Granularity, TrafficCounters, TrafficPoint, TrafficRates, TrafficSummary, TrafficTotals,
};
