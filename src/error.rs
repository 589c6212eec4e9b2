//! Error types for the remote client core
//!
//! This module defines the application-level error taxonomy. Raw
//! transport-reported codes and HTTP statuses are resolved to a single
//! tagged error at the boundary where they occur; nothing downstream of
//! the connector or activities ever sees a raw code.

use thiserror::Error;

/// Connection failure reason as reported by the transport plugin.
///
/// These mirror the plugin's own error codes and are translated into a
/// [`ClientError`] before they reach the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionError {
    /// Unrecognized error code
    Unknown,
    /// No error
    None,
    /// The host is not connected to the signaling network
    HostIsOffline,
    /// The host rejected the session (bad access code or pairing)
    SessionRejected,
    /// Client and host speak incompatible protocol versions
    IncompatibleProtocol,
    /// Peer-to-peer transport could not be established
    NetworkFailure,
    /// The host has too many active sessions
    HostOverload,
}

/// Application-level error tag, carrying a localizable message key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorTag {
    /// The user cancelled the operation (not displayed as an error)
    #[error("the operation was cancelled")]
    Cancelled,

    /// The access code was malformed or not recognized
    #[error("invalid access code")]
    InvalidAccessCode,

    /// The identity provider rejected the request
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The host is offline
    #[error("the host is offline")]
    HostIsOffline,

    /// Incompatible protocol versions between client and host
    #[error("incompatible protocol version")]
    IncompatibleProtocol,

    /// Peer-to-peer connection failure
    #[error("peer-to-peer connection failed")]
    P2pFailure,

    /// Generic network failure (no HTTP response, DNS, etc.)
    #[error("network failure")]
    NetworkFailure,

    /// The host has reached its session limit
    #[error("the host is overloaded")]
    HostOverload,

    /// A backend service is temporarily unavailable
    #[error("service unavailable")]
    ServiceUnavailable,

    /// Anything that does not fit the categories above
    #[error("unexpected error")]
    Unexpected,
}

impl ErrorTag {
    /// Returns the stable localization key for this tag.
    ///
    /// UI layers look these up in their message catalogs; the keys must
    /// never change once shipped.
    pub fn message_key(&self) -> &'static str {
        match self {
            ErrorTag::Cancelled => "ERROR_CANCELLED",
            ErrorTag::InvalidAccessCode => "ERROR_INVALID_ACCESS_CODE",
            ErrorTag::AuthenticationFailed => "ERROR_AUTHENTICATION_FAILED",
            ErrorTag::HostIsOffline => "ERROR_HOST_IS_OFFLINE",
            ErrorTag::IncompatibleProtocol => "ERROR_INCOMPATIBLE_PROTOCOL",
            ErrorTag::P2pFailure => "ERROR_P2P_FAILURE",
            ErrorTag::NetworkFailure => "ERROR_NETWORK_FAILURE",
            ErrorTag::HostOverload => "ERROR_HOST_OVERLOAD",
            ErrorTag::ServiceUnavailable => "ERROR_SERVICE_UNAVAILABLE",
            ErrorTag::Unexpected => "ERROR_UNEXPECTED",
        }
    }
}

/// Application-level error: a tag plus optional diagnostic detail.
///
/// The detail is for logs only and never shown to the user; the UI
/// localizes from [`ErrorTag::message_key`].
#[derive(Debug, Clone)]
pub struct ClientError {
    tag: ErrorTag,
    detail: Option<String>,
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.tag)
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.tag, detail),
            None => write!(f, "{}", self.tag),
        }
    }
}

impl ClientError {
    /// Creates an error with the given tag.
    pub fn new(tag: ErrorTag) -> Self {
        Self { tag, detail: None }
    }

    /// Creates an error with a tag and diagnostic detail.
    pub fn with_detail(tag: ErrorTag, detail: impl Into<String>) -> Self {
        Self {
            tag,
            detail: Some(detail.into()),
        }
    }

    /// Creates an [`ErrorTag::Unexpected`] error.
    pub fn unexpected() -> Self {
        Self::new(ErrorTag::Unexpected)
    }

    /// Creates an [`ErrorTag::Unexpected`] error with diagnostic detail.
    pub fn unexpected_with(detail: impl Into<String>) -> Self {
        Self::with_detail(ErrorTag::Unexpected, detail)
    }

    /// Returns the error tag.
    pub fn tag(&self) -> ErrorTag {
        self.tag
    }

    /// Returns true if this error carries the given tag.
    pub fn has_tag(&self, tag: ErrorTag) -> bool {
        self.tag == tag
    }

    /// Returns the localization key for this error.
    pub fn message_key(&self) -> &'static str {
        self.tag.message_key()
    }

    /// Returns the diagnostic detail, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Maps a transport-reported connection error to an application error.
    ///
    /// Used by the session state machine when the plugin reports a
    /// transition to the failed state.
    pub fn from_connection_error(error: ConnectionError) -> Self {
        match error {
            ConnectionError::HostIsOffline => Self::new(ErrorTag::HostIsOffline),
            ConnectionError::SessionRejected => Self::new(ErrorTag::InvalidAccessCode),
            ConnectionError::IncompatibleProtocol => Self::new(ErrorTag::IncompatibleProtocol),
            ConnectionError::NetworkFailure => Self::new(ErrorTag::P2pFailure),
            ConnectionError::HostOverload => Self::new(ErrorTag::HostOverload),
            other => Self::unexpected_with(format!("connection error {other:?}")),
        }
    }

    /// Maps a generic HTTP status to an application error.
    ///
    /// Status 0 means the request never produced a response.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            0 => Self::new(ErrorTag::NetworkFailure),
            401 => Self::new(ErrorTag::AuthenticationFailed),
            500..=599 => Self::new(ErrorTag::ServiceUnavailable),
            other => Self::unexpected_with(format!("HTTP status {other}")),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read or parse the configuration file
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    /// Failed to serialize or write the configuration file
    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    /// A configuration value failed validation
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// The platform configuration directory could not be determined
    #[error("Configuration directory not found: {0}")]
    DirectoryNotFound(String),

    /// The configuration directory could not be created
    #[error("Failed to create configuration directory: {0}")]
    DirectoryCreationFailed(String),
}

/// Type alias for Results using ClientError
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Type alias for Config Results
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
