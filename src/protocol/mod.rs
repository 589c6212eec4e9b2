//! Contracts for the external protocol collaborators
//!
//! The transport plugin, the signaling channel and the directory REST
//! endpoint are opaque collaborators owned by the embedding application.
//! This module defines their contracts; the session layer depends only
//! on these traits.

pub mod directory;
pub mod plugin;
pub mod signal;

pub use directory::{DirectoryClient, HttpResponse, RestDirectoryClient};
pub use plugin::{ClientPlugin, PerfStats, PluginEvent};
pub use signal::{SignalStrategy, SignalingState};
