//! Transport plugin contract
//!
//! The plugin performs the actual audio/video/input streaming once a
//! session is authenticated. The session layer never drives it directly
//! beyond initiating the handshake; everything else arrives as
//! asynchronous [`PluginEvent`]s.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{ClientResult, ConnectionError};
use crate::session::{CredentialsProvider, Host, SessionState};

/// Performance statistics collected by the transport plugin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerfStats {
    /// Video bandwidth in bits per second
    pub video_bandwidth: f64,
    /// Video frame rate
    pub video_frame_rate: f64,
    /// Capture latency in milliseconds
    pub capture_latency: f64,
    /// Encode latency in milliseconds
    pub encode_latency: f64,
    /// Decode latency in milliseconds
    pub decode_latency: f64,
    /// Render latency in milliseconds
    pub render_latency: f64,
    /// Round-trip latency in milliseconds
    pub roundtrip_latency: f64,
}

/// Asynchronous notification from the transport plugin.
#[derive(Debug, Clone)]
pub enum PluginEvent {
    /// The plugin's connection status changed.
    ///
    /// Only externally-mirrored states are ever reported here; the
    /// session layer synthesizes the remaining ones.
    StatusUpdate {
        /// Reported state
        state: SessionState,
        /// Reported error, `ConnectionError::None` unless failed
        error: ConnectionError,
    },
    /// The plugin wants to send a signaling stanza.
    OutgoingIq(String),
    /// Client-host capability negotiation completed.
    SetCapabilities(Vec<String>),
    /// The connection became ready (or not) for video.
    ConnectionReady(bool),
    /// The connection type for a channel changed.
    RouteChanged {
        /// Channel name (video, control, ...)
        channel: String,
        /// Connection type (direct, stun, relay, ...)
        connection_type: String,
    },
}

/// Handle to the transport plugin.
#[async_trait]
pub trait ClientPlugin: Send + Sync {
    /// Registers the channel on which the plugin delivers its events.
    ///
    /// Must be called before [`ClientPlugin::connect`]; events emitted
    /// with no sink registered are lost.
    fn set_event_sink(&self, sink: mpsc::UnboundedSender<PluginEvent>);

    /// Initiates the connection handshake with the given host.
    ///
    /// Progress and failure are reported through
    /// [`PluginEvent::StatusUpdate`]; an immediate error here means the
    /// handshake could not even be started.
    async fn connect(
        &self,
        host: &Host,
        local_jid: &str,
        credentials: &CredentialsProvider,
    ) -> ClientResult<()>;

    /// Delivers an incoming signaling stanza to the plugin.
    fn on_incoming_iq(&self, iq: &str);

    /// Returns a snapshot of current performance statistics.
    fn perf_stats(&self) -> PerfStats;
}
