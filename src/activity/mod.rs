//! Top-level use-case coordinators
//!
//! An activity drives one way of establishing a session end to end:
//! obtain a credential, resolve the target host, hand off to the
//! connector, and relay session events to the UI layer. Variants
//! implement the same contract independently; there is no shared base
//! type.

pub mod app_remoting;
pub mod it2me;

use std::sync::Arc;

use async_trait::async_trait;

pub use app_remoting::AppRemotingActivity;
pub use it2me::It2MeActivity;

/// Lifecycle contract of an activity.
///
/// Concrete activities also implement
/// [`crate::session::SessionEventHandler`] to receive session
/// lifecycle callbacks.
#[async_trait]
pub trait Activity: Send + Sync {
    /// Starts a new connection flow, disposing any prior one.
    async fn start(self: Arc<Self>);

    /// Disconnects the in-flight session, if any.
    async fn stop(&self);
}
