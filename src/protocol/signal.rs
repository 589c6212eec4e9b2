//! Signaling channel contract
//!
//! The signaling channel carries session-setup stanzas between client
//! and host before (and alongside) the direct transport. The session
//! layer checks the channel state before every send; stanzas queued
//! while the channel is down are dropped with a logged warning.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ClientResult;

/// Connection state of the signaling channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    /// The channel is being established
    Connecting,
    /// The channel is up; messages may be sent
    Connected,
    /// The channel was closed gracefully
    Closed,
    /// The channel failed
    Failed,
}

/// Out-of-band signaling channel.
#[async_trait]
pub trait SignalStrategy: Send + Sync {
    /// Establishes the channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be brought up; the
    /// connector maps this to a connection failure.
    async fn connect(&self) -> ClientResult<()>;

    /// Sends a raw XML stanza. Fire-and-forget.
    fn send_message(&self, xml: &str);

    /// Returns the current channel state.
    fn state(&self) -> SignalingState;

    /// Returns the local signaling address (JID).
    fn local_jid(&self) -> String;

    /// Registers the channel on which incoming stanzas are delivered.
    fn set_incoming_sink(&self, sink: mpsc::UnboundedSender<String>);
}
