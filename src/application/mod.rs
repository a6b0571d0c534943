//! Application layer - orchestration of domain logic.
//!
//! This layer composes the domain pieces into the telemetry pipeline:
//! - Circuit breaker (failure isolation)
//! - Rate limiter (sliding-window admission)
//! - Telemetry worker (the gating pipeline itself)
//! - Statistics, runtime switch and deferred startup messages
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod circuit_breaker;
pub mod config;
pub mod deferred;
pub mod ports;
pub mod rate_limiter;
pub mod stats;
pub mod switch;
pub mod worker;
