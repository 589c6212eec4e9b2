//! Session connector
//!
//! Orchestrates the steps to establish one session: validate the
//! target, bring up the signaling channel, construct the client
//! session, initiate the plugin handshake, and relay session lifecycle
//! events to the caller's handler. A connector serves exactly one
//! attempt; callers obtain a fresh one per attempt from a
//! [`SessionConnectorFactory`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::error::{ClientError, ErrorTag};
use crate::protocol::plugin::ClientPlugin;
use crate::protocol::signal::SignalStrategy;
use crate::session::client::ClientSession;
use crate::session::credentials::CredentialsProvider;
use crate::session::events::SessionEvent;
use crate::session::host::Host;
use crate::session::state::SessionState;
use crate::telemetry::TelemetrySink;

/// How the target host is addressed and authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Ad-hoc assistance session against a short-lived support host
    It2Me,
    /// Persistent pairing with one of the user's own hosts
    Me2Me,
    /// Server-provisioned hosted application instance
    AppRemoting,
}

/// Everything a handler needs about a newly connected session.
#[derive(Clone)]
pub struct ConnectionInfo {
    /// The live session; valid until disconnect or error
    pub session: Arc<Mutex<ClientSession>>,
    /// The mode this session was established in
    pub mode: ConnectionMode,
}

/// Receiver of session lifecycle notifications.
///
/// ```text
/// [connect]-------> [on_connected] ------> [on_disconnected]
///     |                                |
///     |-----> [on_connection_failed]   |----> [on_error]
/// ```
pub trait SessionEventHandler: Send + Sync {
    /// The session reached the connected state.
    fn on_connected(&self, info: ConnectionInfo);

    /// The attempt failed before ever connecting.
    fn on_connection_failed(&self, error: &ClientError);

    /// A connected session ended without a displayable error.
    fn on_disconnected(&self);

    /// A connected session ended with an error to display.
    fn on_error(&self, error: &ClientError);
}

/// Creates one connector per connection attempt.
///
/// The factory owns whatever it takes to produce fresh signaling and
/// plugin instances (socket factories, plugin loaders, ...).
pub trait SessionConnectorFactory: Send + Sync {
    /// Creates a connector wired to the given handler.
    fn create_connector(&self, handler: Arc<dyn SessionEventHandler>) -> SessionConnector;
}

/// Establishes a single session.
pub struct SessionConnector {
    signal: Arc<dyn SignalStrategy>,
    plugin: Arc<dyn ClientPlugin>,
    telemetry: Arc<dyn TelemetrySink>,
    handler: Arc<dyn SessionEventHandler>,
    attempted: AtomicBool,
    session: Mutex<Option<Arc<Mutex<ClientSession>>>>,
    tasks: std::sync::Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl SessionConnector {
    /// Creates a connector from its collaborators.
    pub fn new(
        signal: Arc<dyn SignalStrategy>,
        plugin: Arc<dyn ClientPlugin>,
        telemetry: Arc<dyn TelemetrySink>,
        handler: Arc<dyn SessionEventHandler>,
    ) -> Self {
        Self {
            signal,
            plugin,
            telemetry,
            handler,
            attempted: AtomicBool::new(false),
            session: Mutex::new(None),
            tasks: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Establishes a session with `host` in the given mode.
    ///
    /// All outcomes are reported through the handler; this method never
    /// panics on failure. At most one attempt is allowed per connector:
    /// a second call reports `Unexpected` without touching the first
    /// attempt.
    pub async fn connect(
        &self,
        mode: ConnectionMode,
        host: Host,
        credentials: CredentialsProvider,
    ) {
        if self.attempted.swap(true, Ordering::SeqCst) {
            error!("connect() called twice on one connector");
            self.handler.on_connection_failed(&ClientError::unexpected_with(
                "connector already used; dispose and create a new one",
            ));
            return;
        }

        if let Err(error) = validate_request(mode, &host, &credentials) {
            warn!("Rejecting connection request: {}", error);
            self.handler.on_connection_failed(&error);
            return;
        }

        let attempt_id = uuid::Uuid::new_v4();
        info!(
            "Connection attempt {} to host {} ({:?})",
            attempt_id, host.host_id, mode
        );

        if let Err(error) = self.signal.connect().await {
            warn!("Signaling connection failed: {}", error);
            self.handler.on_connection_failed(&error);
            return;
        }

        // Plugin events must have somewhere to go before the handshake
        // can start.
        let (plugin_tx, mut plugin_rx) = mpsc::unbounded_channel();
        self.plugin.set_event_sink(plugin_tx);

        let mut session = ClientSession::new(
            Arc::clone(&self.plugin),
            host.clone(),
            Arc::clone(&self.signal),
            Arc::clone(&self.telemetry),
        );
        let mut session_events = session.subscribe();
        let session = Arc::new(Mutex::new(session));
        *self.session.lock().await = Some(Arc::clone(&session));

        // Lifecycle monitor: translates session state changes into
        // handler callbacks, exactly once each.
        let monitor_session = Arc::clone(&session);
        let monitor_handler = Arc::clone(&self.handler);
        let monitor = tokio::spawn(async move {
            let mut connected = false;
            while let Some(event) = session_events.recv().await {
                let change = match event {
                    SessionEvent::StateChanged(change) => change,
                    SessionEvent::VideoChannelStateChanged(_) => continue,
                };
                match change.current {
                    SessionState::Connected if !connected => {
                        connected = true;
                        monitor_handler.on_connected(ConnectionInfo {
                            session: Arc::clone(&monitor_session),
                            mode,
                        });
                    }
                    SessionState::Closed | SessionState::ConnectionCanceled => {
                        monitor_handler.on_disconnected();
                        break;
                    }
                    SessionState::Failed | SessionState::ConnectionDropped => {
                        let error = monitor_session
                            .lock()
                            .await
                            .error()
                            .cloned()
                            .unwrap_or_else(ClientError::unexpected);
                        if connected {
                            monitor_handler.on_error(&error);
                        } else {
                            monitor_handler.on_connection_failed(&error);
                        }
                        break;
                    }
                    _ => {}
                }
            }
            debug!("Session lifecycle monitor finished");
        });

        // Event pump: plugin callbacks drive the state machine in
        // arrival order.
        let pump_session = Arc::clone(&session);
        let pump = tokio::spawn(async move {
            while let Some(event) = plugin_rx.recv().await {
                pump_session.lock().await.handle_plugin_event(event);
            }
            debug!("Plugin event pump finished");
        });

        {
            let mut tasks = self.tasks.lock().expect("connector task list poisoned");
            tasks.push(monitor);
            tasks.push(pump);
        }

        let local_jid = self.signal.local_jid();
        if let Err(error) = self.plugin.connect(&host, &local_jid, &credentials).await {
            warn!("Transport handshake could not be started: {}", error);
            session.lock().await.dispose();
            self.handler.on_connection_failed(&error);
        }
    }

    /// Returns the in-flight session, if any.
    pub async fn session(&self) -> Option<Arc<Mutex<ClientSession>>> {
        self.session.lock().await.clone()
    }

    /// Tears down the attempt's background tasks and session.
    pub async fn dispose(&self) {
        for task in self.tasks.lock().expect("connector task list poisoned").drain(..) {
            task.abort();
        }
        if let Some(session) = self.session.lock().await.take() {
            session.lock().await.dispose();
        }
    }
}

impl Drop for SessionConnector {
    fn drop(&mut self) {
        for task in self.tasks.lock().expect("connector task list poisoned").drain(..) {
            task.abort();
        }
    }
}

/// Checks that the host and credentials fit the requested mode.
fn validate_request(
    mode: ConnectionMode,
    host: &Host,
    credentials: &CredentialsProvider,
) -> Result<(), ClientError> {
    if host.jabber_id.is_empty() {
        return Err(ClientError::with_detail(
            ErrorTag::Unexpected,
            "host has no signaling address",
        ));
    }

    match mode {
        ConnectionMode::It2Me => {
            if host.public_key.is_none() {
                return Err(ClientError::with_detail(
                    ErrorTag::Unexpected,
                    "It2Me host has no public key",
                ));
            }
            if credentials.access_code().is_none() {
                return Err(ClientError::with_detail(
                    ErrorTag::Unexpected,
                    "It2Me requires an access code credential",
                ));
            }
        }
        ConnectionMode::AppRemoting => {
            if matches!(credentials, CredentialsProvider::AccessCode(_)) {
                return Err(ClientError::with_detail(
                    ErrorTag::Unexpected,
                    "app remoting requires a third-party token credential",
                ));
            }
        }
        // The pairing flow accepts either shape.
        ConnectionMode::Me2Me => {}
    }

    Ok(())
}
