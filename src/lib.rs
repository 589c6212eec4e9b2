//! Remote desktop client session core
//!
//! This library drives the client side of a remote desktop connection:
//! - Session lifecycle state machine and event fan-out
//! - Connector orchestrating signaling, handshake, and teardown
//! - Connection activities (It2Me assistance, hosted applications)
//! - Error model shared across transport, directory, and UI layers
//!
//! # Examples
//!
//! ```no_run
//! use remote_client::logging;
//! use remote_client::config::ConfigManager;
//! use remote_client::protocol::RestDirectoryClient;
//!
//! // Initialize logging
//! logging::init_default_logging();
//!
//! // Load configuration and build the directory client
//! let config_manager = ConfigManager::new().unwrap();
//! let settings = config_manager.load_or_create_default().unwrap();
//! let directory = RestDirectoryClient::new(settings).unwrap();
//! # let _ = directory;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod activity;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod telemetry;
pub mod ui;

// Re-export commonly used types at crate root
pub use error::{ClientError, ClientResult, ConnectionError, ErrorTag};
pub use session::{ClientSession, SessionConnector, SessionState};
