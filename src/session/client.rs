//! Client session lifecycle
//!
//! `ClientSession` owns the state machine for a single
//! established-or-failing session: it translates plugin status reports
//! into final states, relays signaling both ways, reports statistics
//! while connected, and tears everything down when the session
//! finishes. It never touches rendering surfaces; interested parties
//! subscribe to its events.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::error::{ClientError, ConnectionError};
use crate::protocol::plugin::{ClientPlugin, PluginEvent};
use crate::protocol::signal::{SignalStrategy, SignalingState};
use crate::session::events::{EventHub, SessionEvent, StateChange};
use crate::session::host::Host;
use crate::session::state::{translate_state, SessionState};
use crate::telemetry::TelemetrySink;

/// Interval between statistics reports while connected
const STATS_REPORT_INTERVAL: Duration = Duration::from_millis(1000);

/// Capability tokens negotiated between client and host.
pub mod capability {
    /// Client sends its screen resolution once connected
    pub const SEND_INITIAL_RESOLUTION: &str = "sendInitialResolution";
    /// Host rate-limits desktop-resize requests
    pub const RATE_LIMIT_RESIZE_REQUESTS: &str = "rateLimitResizeRequests";
    /// Host-side storage service integration
    pub const GOOGLE_DRIVE: &str = "googleDrive";
    /// Video frame-recording extension
    pub const VIDEO_RECORDER: &str = "videoRecorder";
    /// Casting the video stream to a cast-enabled device
    pub const CAST: &str = "casting";
}

/// State machine for one client session.
pub struct ClientSession {
    /// Current (translated) state
    state: SessionState,
    /// Current error; set only when the session failed
    current_error: Option<ClientError>,
    /// The remote endpoint
    host: Host,
    /// Session id, captured from the outgoing session-initiate stanza
    session_id: String,
    /// Whether a video frame has arrived yet
    has_received_frame: bool,
    /// When false, host-offline failures before connecting are
    /// translated to a cancellation instead of a hard failure
    log_host_offline_errors: bool,
    /// Negotiated capability set; None until negotiation completes
    capabilities: Option<Vec<String>>,
    plugin: Arc<dyn ClientPlugin>,
    signal: Arc<dyn SignalStrategy>,
    telemetry: Arc<dyn TelemetrySink>,
    events: EventHub,
    /// Periodic statistics reporter; live only while connected
    stats_task: Option<JoinHandle<()>>,
    /// Forwards incoming signaling stanzas to the plugin
    incoming_task: Option<JoinHandle<()>>,
    disposed: bool,
}

impl ClientSession {
    /// Creates a session bound to an already-connected signaling
    /// channel and a plugin whose handshake is about to start.
    ///
    /// The session starts in `Created` and immediately moves to
    /// `Initializing`.
    pub fn new(
        plugin: Arc<dyn ClientPlugin>,
        host: Host,
        signal: Arc<dyn SignalStrategy>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        debug_assert_eq!(signal.state(), SignalingState::Connected);

        // Incoming stanzas go straight to the plugin. The task is
        // aborted on dispose so a late stanza cannot reach a plugin
        // that is being torn down.
        let (incoming_tx, mut incoming_rx) = mpsc::unbounded_channel::<String>();
        signal.set_incoming_sink(incoming_tx);
        let plugin_for_incoming = Arc::clone(&plugin);
        let incoming_task = tokio::spawn(async move {
            while let Some(stanza) = incoming_rx.recv().await {
                plugin_for_incoming.on_incoming_iq(&stanza);
            }
        });

        let mut session = Self {
            state: SessionState::Created,
            current_error: None,
            host,
            session_id: String::new(),
            has_received_frame: false,
            log_host_offline_errors: true,
            capabilities: None,
            plugin,
            signal,
            telemetry,
            events: EventHub::new(),
            stats_task: None,
            incoming_task: Some(incoming_task),
            disposed: false,
        };
        session.set_state(SessionState::Initializing);
        session
    }

    /// Returns the current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the current error, if the session has one.
    pub fn error(&self) -> Option<&ClientError> {
        self.current_error.as_ref()
    }

    /// Returns the session id extracted from the session-initiate
    /// stanza, or an empty string if none was sent yet.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns the host this session is connected to.
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Returns true once the session reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Returns whether a video frame has been received.
    pub fn has_received_frame(&self) -> bool {
        self.has_received_frame
    }

    /// Subscribes to session events.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Returns true if the given capability was negotiated.
    ///
    /// Always false before negotiation completes.
    pub fn has_capability(&self, token: &str) -> bool {
        match &self.capabilities {
            Some(capabilities) => capabilities.iter().any(|c| c == token),
            None => false,
        }
    }

    /// Enables or disables surfacing of host-offline errors.
    ///
    /// Disable when retrying with a cached host address: a stale
    /// address should not reach the user as a hard failure. The error
    /// is still sent to telemetry either way.
    pub fn log_host_offline_errors(&mut self, enable: bool) {
        self.log_host_offline_errors = enable;
    }

    /// Dispatches a plugin event to the appropriate handler.
    pub fn handle_plugin_event(&mut self, event: PluginEvent) {
        if self.disposed {
            return;
        }
        match event {
            PluginEvent::StatusUpdate { state, error } => {
                self.on_connection_status_update(state, error)
            }
            PluginEvent::OutgoingIq(iq) => self.send_iq(&iq),
            PluginEvent::SetCapabilities(capabilities) => self.on_set_capabilities(capabilities),
            PluginEvent::ConnectionReady(ready) => self.on_connection_ready(ready),
            PluginEvent::RouteChanged {
                channel,
                connection_type,
            } => self.on_route_changed(&channel, &connection_type),
        }
    }

    /// Sole driver of state changes after construction.
    ///
    /// Maps a failed report's raw error to an application error, then
    /// translates the transition against the previous state.
    pub fn on_connection_status_update(
        &mut self,
        reported: SessionState,
        error: ConnectionError,
    ) {
        if self.disposed {
            return;
        }
        if !reported.is_plugin_reportable() {
            warn!("Plugin reported non-reportable state {}", reported);
        }
        if reported == SessionState::Failed {
            self.current_error = Some(ClientError::from_connection_error(error));
        }
        self.set_state(reported);
    }

    /// Called when the client receives its first video frame.
    pub fn on_first_frame_received(&mut self) {
        self.has_received_frame = true;
    }

    /// Disconnects the session with the given error.
    ///
    /// Sends a best-effort session-terminate stanza, then moves to
    /// `Closed` (no error) or `Failed`. Does nothing once the session
    /// is already finished; a finished session never transitions
    /// backward.
    pub fn disconnect(&mut self, error: Option<ClientError>) {
        if self.is_finished() {
            debug!("disconnect() called on a finished session; ignoring");
            return;
        }

        let stanza = format!(
            concat!(
                r#"<cli:iq to="{}" type="set" id="session-terminate" xmlns:cli="jabber:client">"#,
                r#"<jingle xmlns="urn:xmpp:jingle:1" action="session-terminate" sid="{}">"#,
                r#"<reason><success/></reason></jingle></cli:iq>"#
            ),
            self.host.jabber_id, self.session_id
        );
        self.send_iq(&stanza);

        let state = if error.is_none() {
            SessionState::Closed
        } else {
            SessionState::Failed
        };
        self.current_error = error;
        self.set_state(state);
    }

    /// Releases per-connection resources. Idempotent.
    ///
    /// After this returns no background task of this session runs, so
    /// late transport callbacks cannot resurrect its state.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.stop_stats_reporting();
        if let Some(task) = self.incoming_task.take() {
            task.abort();
        }
    }

    /// Relays an outgoing stanza over signaling.
    ///
    /// Captures the session id from the session-initiate stanza so the
    /// session can be terminated later. Stanzas are dropped with a
    /// warning if signaling is not connected.
    fn send_iq(&mut self, iq: &str) {
        if let Some(sid) = session_initiate_sid(iq) {
            self.session_id = sid;
        }

        if self.signal.state() != SignalingState::Connected {
            warn!("Dropping outgoing stanza because signaling is not connected");
            return;
        }
        self.signal.send_message(iq);
    }

    /// Records the negotiated capability set.
    ///
    /// The set is negotiated exactly once; a repeated call is reported
    /// and ignored.
    fn on_set_capabilities(&mut self, capabilities: Vec<String>) {
        if self.capabilities.is_some() {
            error!("Capabilities negotiated more than once; keeping the original set");
            return;
        }
        info!("Negotiated capabilities: {:?}", capabilities);
        self.capabilities = Some(capabilities);
    }

    fn on_connection_ready(&mut self, ready: bool) {
        debug!("Video channel {}ready", if ready { "" } else { "not " });
        self.events
            .emit(SessionEvent::VideoChannelStateChanged(ready));
    }

    fn on_route_changed(&mut self, channel: &str, connection_type: &str) {
        info!("Channel {} using {} connection", channel, connection_type);
        self.telemetry.set_connection_type(connection_type);
    }

    /// Applies a reported state, translating it against the previous
    /// one, managing the statistics reporter, and notifying telemetry
    /// and subscribers.
    fn set_state(&mut self, reported: SessionState) {
        let previous = self.state;
        let current = translate_state(
            previous,
            reported,
            self.current_error.as_ref().map(|e| e.tag()),
            !self.log_host_offline_errors,
        );
        if reported == SessionState::Failed && current == SessionState::ConnectionCanceled {
            info!("Suppressing host-offline error");
        }
        self.state = current;

        if reported == SessionState::Connected {
            self.start_stats_reporting();
        } else if self.is_finished() {
            self.stop_stats_reporting();
        }

        // Telemetry sees every transition, including suppressed ones.
        self.telemetry
            .log_session_state_change(current, self.current_error.as_ref());

        info!("Session state: {} -> {}", previous, current);
        self.events
            .emit(SessionEvent::StateChanged(StateChange { previous, current }));
    }

    fn start_stats_reporting(&mut self) {
        if self.stats_task.is_some() {
            return;
        }
        let plugin = Arc::clone(&self.plugin);
        let telemetry = Arc::clone(&self.telemetry);
        self.stats_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(STATS_REPORT_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately;
            // reporting starts one interval after connecting.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                telemetry.log_statistics(&plugin.perf_stats());
            }
        }));
    }

    fn stop_stats_reporting(&mut self) {
        if let Some(task) = self.stats_task.take() {
            task.abort();
        }
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Extracts the `sid` attribute from a session-initiate jingle stanza.
fn session_initiate_sid(iq: &str) -> Option<String> {
    if !iq.contains(r#"action="session-initiate""#) {
        return None;
    }
    let start = iq.find(r#"sid=""#)? + 5;
    let rest = &iq[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorTag;
    use crate::telemetry::NullTelemetrySink;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakePlugin;

    #[async_trait]
    impl ClientPlugin for FakePlugin {
        fn set_event_sink(&self, _sink: mpsc::UnboundedSender<PluginEvent>) {}

        async fn connect(
            &self,
            _host: &Host,
            _local_jid: &str,
            _credentials: &crate::session::CredentialsProvider,
        ) -> crate::error::ClientResult<()> {
            Ok(())
        }

        fn on_incoming_iq(&self, _iq: &str) {}

        fn perf_stats(&self) -> crate::protocol::PerfStats {
            crate::protocol::PerfStats::default()
        }
    }

    #[derive(Default)]
    struct FakeSignal {
        sent: Mutex<Vec<String>>,
        connected: Mutex<bool>,
    }

    #[async_trait]
    impl SignalStrategy for FakeSignal {
        async fn connect(&self) -> crate::error::ClientResult<()> {
            *self.connected.lock().unwrap() = true;
            Ok(())
        }

        fn send_message(&self, xml: &str) {
            self.sent.lock().unwrap().push(xml.to_string());
        }

        fn state(&self) -> SignalingState {
            if *self.connected.lock().unwrap() {
                SignalingState::Connected
            } else {
                SignalingState::Closed
            }
        }

        fn local_jid(&self) -> String {
            "client@example.com/res".to_string()
        }

        fn set_incoming_sink(&self, _sink: mpsc::UnboundedSender<String>) {}
    }

    fn new_session(signal: Arc<FakeSignal>) -> ClientSession {
        *signal.connected.lock().unwrap() = true;
        ClientSession::new(
            Arc::new(FakePlugin),
            Host::new("1234567", "host@example.com/chromoting"),
            signal,
            Arc::new(NullTelemetrySink),
        )
    }

    fn drive(session: &mut ClientSession, states: &[SessionState]) {
        for state in states {
            session.on_connection_status_update(*state, ConnectionError::None);
        }
    }

    #[tokio::test]
    async fn test_initial_state_is_initializing() {
        let mut session = new_session(Arc::new(FakeSignal::default()));
        assert_eq!(session.state(), SessionState::Initializing);
        assert!(!session.is_finished());
        session.dispose();
    }

    #[tokio::test]
    async fn test_failed_error_mapping_is_stored() {
        let mut session = new_session(Arc::new(FakeSignal::default()));
        drive(&mut session, &[SessionState::Connecting]);
        session.on_connection_status_update(
            SessionState::Failed,
            ConnectionError::SessionRejected,
        );

        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(
            session.error().unwrap().tag(),
            ErrorTag::InvalidAccessCode
        );
        session.dispose();
    }

    #[tokio::test]
    async fn test_host_offline_suppression_flag() {
        let mut session = new_session(Arc::new(FakeSignal::default()));
        session.log_host_offline_errors(false);
        drive(&mut session, &[SessionState::Connecting]);
        session.on_connection_status_update(
            SessionState::Failed,
            ConnectionError::HostIsOffline,
        );

        assert_eq!(session.state(), SessionState::ConnectionCanceled);
        assert!(!session.is_finished());
        session.dispose();
    }

    #[tokio::test]
    async fn test_dropped_after_connected() {
        let mut session = new_session(Arc::new(FakeSignal::default()));
        drive(
            &mut session,
            &[SessionState::Connecting, SessionState::Connected],
        );
        session.on_connection_status_update(
            SessionState::Failed,
            ConnectionError::NetworkFailure,
        );

        assert_eq!(session.state(), SessionState::ConnectionDropped);
        assert!(session.is_finished());
        assert_eq!(session.error().unwrap().tag(), ErrorTag::P2pFailure);
        session.dispose();
    }

    #[tokio::test]
    async fn test_capabilities_set_once() {
        let mut session = new_session(Arc::new(FakeSignal::default()));
        assert!(!session.has_capability(capability::CAST));

        session.handle_plugin_event(PluginEvent::SetCapabilities(vec![
            capability::CAST.to_string(),
            capability::GOOGLE_DRIVE.to_string(),
        ]));
        assert!(session.has_capability(capability::CAST));
        assert!(session.has_capability(capability::GOOGLE_DRIVE));
        assert!(!session.has_capability(capability::VIDEO_RECORDER));

        // A second negotiation must leave the original set unchanged.
        session.handle_plugin_event(PluginEvent::SetCapabilities(vec![
            capability::VIDEO_RECORDER.to_string(),
        ]));
        assert!(session.has_capability(capability::CAST));
        assert!(!session.has_capability(capability::VIDEO_RECORDER));
        session.dispose();
    }

    #[tokio::test]
    async fn test_disconnect_gracefully_from_connected() {
        let signal = Arc::new(FakeSignal::default());
        let mut session = new_session(Arc::clone(&signal));
        drive(
            &mut session,
            &[SessionState::Connecting, SessionState::Connected],
        );

        session.disconnect(None);
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.error().is_none());

        let sent = signal.sent.lock().unwrap();
        assert!(sent
            .last()
            .unwrap()
            .contains(r#"action="session-terminate""#));
        drop(sent);
        session.dispose();
    }

    #[tokio::test]
    async fn test_disconnect_with_error_retains_it() {
        let mut session = new_session(Arc::new(FakeSignal::default()));
        drive(&mut session, &[SessionState::Connecting]);

        session.disconnect(Some(ClientError::new(ErrorTag::P2pFailure)));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.error().unwrap().tag(), ErrorTag::P2pFailure);
        session.dispose();
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent_once_finished() {
        let mut session = new_session(Arc::new(FakeSignal::default()));
        drive(
            &mut session,
            &[SessionState::Connecting, SessionState::Connected],
        );
        session.disconnect(None);
        assert_eq!(session.state(), SessionState::Closed);

        // Must not transition backward or overwrite the error.
        session.disconnect(Some(ClientError::new(ErrorTag::Unexpected)));
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.error().is_none());
        session.dispose();
    }

    #[tokio::test]
    async fn test_stanzas_dropped_when_signaling_down() {
        let signal = Arc::new(FakeSignal::default());
        let mut session = new_session(Arc::clone(&signal));
        drive(&mut session, &[SessionState::Connecting]);

        *signal.connected.lock().unwrap() = false;
        session.disconnect(None);
        assert!(signal.sent.lock().unwrap().is_empty());
        // The local state change happens regardless.
        assert_eq!(session.state(), SessionState::ConnectionCanceled);
        session.dispose();
    }

    #[tokio::test]
    async fn test_session_id_captured_from_initiate() {
        let signal = Arc::new(FakeSignal::default());
        let mut session = new_session(Arc::clone(&signal));

        session.handle_plugin_event(PluginEvent::OutgoingIq(
            r#"<cli:iq to="host@example.com" type="set" xmlns:cli="jabber:client"><jingle xmlns="urn:xmpp:jingle:1" action="session-initiate" sid="abc123"/></cli:iq>"#
                .to_string(),
        ));
        assert_eq!(session.session_id(), "abc123");
        session.dispose();
    }

    #[tokio::test]
    async fn test_events_emitted_in_order() {
        let mut session = new_session(Arc::new(FakeSignal::default()));
        let mut rx = session.subscribe();
        drive(
            &mut session,
            &[SessionState::Connecting, SessionState::Connected],
        );

        let expect = [
            (SessionState::Initializing, SessionState::Connecting),
            (SessionState::Connecting, SessionState::Connected),
        ];
        for (previous, current) in expect {
            match rx.recv().await.unwrap() {
                SessionEvent::StateChanged(change) => {
                    assert_eq!(change.previous, previous);
                    assert_eq!(change.current, current);
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
        session.dispose();
    }

    #[test]
    fn test_session_initiate_sid_extraction() {
        let iq = r#"<jingle action="session-initiate" sid="s-42"/>"#;
        assert_eq!(session_initiate_sid(iq).as_deref(), Some("s-42"));

        let terminate = r#"<jingle action="session-terminate" sid="s-42"/>"#;
        assert_eq!(session_initiate_sid(terminate), None);

        assert_eq!(session_initiate_sid("not xml"), None);
    }
}
