//! Telemetry sink abstraction
//!
//! Session state transitions and periodic performance statistics are
//! reported to a telemetry sink. Reporting is fire-and-forget: the sink
//! must never block or fail the caller.

use crate::error::ClientError;
use crate::protocol::PerfStats;
use crate::session::SessionState;

/// Receives session lifecycle and performance reports.
pub trait TelemetrySink: Send + Sync {
    /// Records a session state transition, with the current error if any.
    ///
    /// Called unconditionally for every transition, including ones whose
    /// error was suppressed from the UI.
    fn log_session_state_change(&self, state: SessionState, error: Option<&ClientError>);

    /// Records a snapshot of transport performance statistics.
    fn log_statistics(&self, stats: &PerfStats);

    /// Records the connection type in use for a channel (direct, relay, ...).
    fn set_connection_type(&self, connection_type: &str);
}

/// A sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {
    fn log_session_state_change(&self, _state: SessionState, _error: Option<&ClientError>) {}

    fn log_statistics(&self, _stats: &PerfStats) {}

    fn set_connection_type(&self, _connection_type: &str) {}
}
