//! UI surface abstraction
//!
//! Rendering is out of scope for this crate. Activities drive the UI
//! through a small fixed set of entry points: switch to a named mode,
//! prompt for an access code, display a localized error. The embedding
//! application implements [`UiDelegate`] however it likes.

use async_trait::async_trait;

use crate::error::{ClientError, ClientResult};

/// Top-level UI modes an activity can switch the application into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    /// Idle home screen
    Home,
    /// A connection attempt is in progress
    Connecting,
    /// A connection attempt failed; an error is displayed
    ConnectionFailed,
    /// A previously connected session has ended
    SessionFinished,
}

/// A live view bound to a connected session.
///
/// Created by the UI when a session connects and closed (then dropped)
/// before the session handle is released during cleanup.
pub trait ConnectedView: Send {
    /// Tears down the view. Called at most once, before drop.
    fn close(&mut self);
}

/// Entry points the session core uses to drive the UI.
#[async_trait]
pub trait UiDelegate: Send + Sync {
    /// Prompts the user for an access code.
    ///
    /// # Errors
    ///
    /// Resolves to [`crate::ErrorTag::Cancelled`] if the user dismisses
    /// the prompt; activities route that back to [`UiMode::Home`]
    /// silently.
    async fn prompt_access_code(&self) -> ClientResult<String>;

    /// Switches the application to the given mode.
    fn set_mode(&self, mode: UiMode);

    /// Displays a localized error message, keyed by the error's tag.
    fn show_error(&self, error: &ClientError);

    /// Creates the view for a newly connected session.
    fn create_connected_view(&self) -> Box<dyn ConnectedView>;
}
