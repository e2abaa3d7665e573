//! HTTP API server for the Bastion admin dashboard.
//!
//! This crate provides:
//! - The storage and database wipe
//! - System health aggregation and stored snapshots
//! - The edge traffic proxy
//! - Configuration loading and Prometheus exposition

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod health;
pub mod metrics;
pub mod routes;
pub mod snapshots;
pub mod state;
pub mod wipe;

pub use auth::TraceId;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
