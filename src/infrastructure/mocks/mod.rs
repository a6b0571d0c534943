//! Test doubles for the infrastructure adapters.
//!
//! Available in this crate's own tests, and to dependents through the
//! `test-helpers` feature.

pub mod clock;
pub mod layer;
pub mod transport;

pub use clock::MockClock;
pub use layer::{CapturedEvent, MockCaptureLayer};
pub use transport::MockTransport;
