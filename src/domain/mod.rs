//! Domain layer - pure telemetry logic with no I/O and no clock of its own.
//!
//! This layer contains the core concepts of the pipeline:
//! - Error events and their categories
//! - Sliding-window admission counting
//! - Deterministic sampling
//! - Privacy scrubbing and URL/IP anonymization
//! - Diagnostic reports built from scrubbed events
//!
//! All types in this layer are pure and easily testable.

pub mod category;
pub mod event;
pub mod privacy;
pub mod report;
pub mod sampler;
pub mod window;
