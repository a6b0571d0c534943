//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Storage implementations (sharded maps)
//! - Transports (tracing output)
//! - The in-process event bus (feature `async`)

#[cfg(feature = "async")]
pub mod bus;
pub mod clock;
pub mod storage;
pub mod transport;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides a controllable clock, a recording
/// transport and a tracing capture layer.
///
/// To use these mocks in another crate's tests, add to its `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// error-telemetry = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
