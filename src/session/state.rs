//! Session states and state translation
//!
//! Part of the state space mirrors what the transport plugin reports;
//! the rest is synthesized locally for transitions that have no plugin
//! equivalent. Translation from a reported transition to the final
//! state depends on the previous state.

use std::fmt;

use crate::error::ErrorTag;

/// State of a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Session object created, nothing started yet (local only)
    Created,
    /// Unrecognized plugin state (local only)
    Unknown,
    /// The plugin is initializing
    Initializing,
    /// Signaling handshake in progress
    Connecting,
    /// The host accepted the connection; channels are being set up
    Authenticated,
    /// The session is fully established
    Connected,
    /// The session ended gracefully
    Closed,
    /// The session ended with an error
    Failed,
    /// Closed before ever reaching connected (local only)
    ConnectionCanceled,
    /// Was connected, then failed (local only)
    ConnectionDropped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Created => write!(f, "Created"),
            SessionState::Unknown => write!(f, "Unknown"),
            SessionState::Initializing => write!(f, "Initializing"),
            SessionState::Connecting => write!(f, "Connecting"),
            SessionState::Authenticated => write!(f, "Authenticated"),
            SessionState::Connected => write!(f, "Connected"),
            SessionState::Closed => write!(f, "Closed"),
            SessionState::Failed => write!(f, "Failed"),
            SessionState::ConnectionCanceled => write!(f, "ConnectionCanceled"),
            SessionState::ConnectionDropped => write!(f, "ConnectionDropped"),
        }
    }
}

impl SessionState {
    /// Returns true if this is a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            SessionState::Closed | SessionState::Failed | SessionState::ConnectionDropped
        )
    }

    /// Returns true if the plugin may report this state.
    ///
    /// The remaining states are synthesized by [`translate_state`] and
    /// must never arrive from the transport.
    pub fn is_plugin_reportable(&self) -> bool {
        matches!(
            self,
            SessionState::Initializing
                | SessionState::Connecting
                | SessionState::Authenticated
                | SessionState::Connected
                | SessionState::Closed
                | SessionState::Failed
        )
    }
}

/// Translates a reported state transition into the final session state.
///
/// Pure function of its inputs:
/// - A close before the session ever connected is a cancellation, not a
///   close.
/// - A host-offline failure before connecting is also a cancellation
///   when the caller opted into suppression (retry-with-cached-address
///   flows).
/// - A failure after the session was connected is a drop.
pub fn translate_state(
    previous: SessionState,
    reported: SessionState,
    error_tag: Option<ErrorTag>,
    suppress_host_offline: bool,
) -> SessionState {
    match previous {
        SessionState::Connecting | SessionState::Authenticated => {
            if reported == SessionState::Closed {
                return SessionState::ConnectionCanceled;
            }
            if reported == SessionState::Failed
                && error_tag == Some(ErrorTag::HostIsOffline)
                && suppress_host_offline
            {
                return SessionState::ConnectionCanceled;
            }
            reported
        }
        SessionState::Connected if reported == SessionState::Failed => {
            SessionState::ConnectionDropped
        }
        _ => reported,
    }
}
