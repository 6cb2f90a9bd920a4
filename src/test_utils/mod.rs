//! Test doubles shared by unit and integration tests.
//!
//! Compiled for unit tests and, through the `test-util` feature, for the
//! integration tests under `tests/`.

mod collecting_reporter;
mod recording_transport;

pub use collecting_reporter::CollectingReporter;
pub use recording_transport::RecordingTransport;
