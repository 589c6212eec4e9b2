//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use remote_client::error::{ClientError, ClientResult, ErrorTag};
use remote_client::identity::IdentityProvider;
use remote_client::protocol::directory::{DirectoryClient, HttpResponse};
use remote_client::protocol::plugin::{ClientPlugin, PerfStats, PluginEvent};
use remote_client::protocol::signal::{SignalStrategy, SignalingState};
use remote_client::session::{
    CredentialsProvider, Host, SessionConnector, SessionConnectorFactory, SessionEventHandler,
    SessionState,
};
use remote_client::telemetry::TelemetrySink;
use remote_client::ui::{ConnectedView, UiDelegate, UiMode};

/// Lets spawned pump and monitor tasks drain their queues.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// A plugin that replays a scripted event sequence when `connect` is
/// called, and can emit further events afterwards.
#[derive(Default)]
pub struct FakePlugin {
    sink: Mutex<Option<mpsc::UnboundedSender<PluginEvent>>>,
    script: Mutex<Vec<PluginEvent>>,
    connect_calls: Mutex<Vec<String>>,
    fail_connect: AtomicBool,
}

impl FakePlugin {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues events to be emitted when `connect` is called.
    pub fn script(&self, events: Vec<PluginEvent>) {
        *self.script.lock().unwrap() = events;
    }

    /// Makes the next `connect` call fail outright.
    pub fn fail_connect(&self) {
        self.fail_connect.store(true, Ordering::SeqCst);
    }

    /// Emits an event through the registered sink.
    pub fn emit(&self, event: PluginEvent) {
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            let _ = sink.send(event);
        }
    }

    /// Convenience for a status-update event.
    pub fn report(&self, state: SessionState, error: remote_client::ConnectionError) {
        self.emit(PluginEvent::StatusUpdate { state, error });
    }

    /// Debug renderings of the credentials each `connect` call received.
    pub fn connect_calls(&self) -> Vec<String> {
        self.connect_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClientPlugin for FakePlugin {
    fn set_event_sink(&self, sink: mpsc::UnboundedSender<PluginEvent>) {
        *self.sink.lock().unwrap() = Some(sink);
    }

    async fn connect(
        &self,
        _host: &Host,
        _local_jid: &str,
        credentials: &CredentialsProvider,
    ) -> ClientResult<()> {
        self.connect_calls
            .lock()
            .unwrap()
            .push(format!("{credentials:?}"));
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ClientError::with_detail(
                ErrorTag::Unexpected,
                "scripted connect failure",
            ));
        }
        for event in self.script.lock().unwrap().drain(..) {
            self.emit(event);
        }
        Ok(())
    }

    fn on_incoming_iq(&self, _iq: &str) {}

    fn perf_stats(&self) -> PerfStats {
        PerfStats {
            video_frame_rate: 30.0,
            ..PerfStats::default()
        }
    }
}

/// An in-memory signaling channel.
#[derive(Default)]
pub struct FakeSignal {
    connected: AtomicBool,
    fail_connect: AtomicBool,
    sent: Mutex<Vec<String>>,
}

impl FakeSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_connect(&self) {
        self.fail_connect.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignalStrategy for FakeSignal {
    async fn connect(&self) -> ClientResult<()> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ClientError::new(ErrorTag::NetworkFailure));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn send_message(&self, xml: &str) {
        self.sent.lock().unwrap().push(xml.to_string());
    }

    fn state(&self) -> SignalingState {
        if self.connected.load(Ordering::SeqCst) {
            SignalingState::Connected
        } else {
            SignalingState::Closed
        }
    }

    fn local_jid(&self) -> String {
        "client@example.com/resource".to_string()
    }

    fn set_incoming_sink(&self, _sink: mpsc::UnboundedSender<String>) {}
}

/// What a telemetry sink was told, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryRecord {
    State(SessionState, Option<ErrorTag>),
    Statistics,
    ConnectionType(String),
}

#[derive(Default)]
pub struct RecordingTelemetry {
    records: Mutex<Vec<TelemetryRecord>>,
}

impl RecordingTelemetry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn statistics_count(&self) -> usize {
        self.records()
            .iter()
            .filter(|r| matches!(r, TelemetryRecord::Statistics))
            .count()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn log_session_state_change(&self, state: SessionState, error: Option<&ClientError>) {
        self.records
            .lock()
            .unwrap()
            .push(TelemetryRecord::State(state, error.map(|e| e.tag())));
    }

    fn log_statistics(&self, _stats: &PerfStats) {
        self.records.lock().unwrap().push(TelemetryRecord::Statistics);
    }

    fn set_connection_type(&self, connection_type: &str) {
        self.records
            .lock()
            .unwrap()
            .push(TelemetryRecord::ConnectionType(connection_type.to_string()));
    }
}

/// An identity provider with fixed answers.
pub struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn get_token(&self) -> ClientResult<String> {
        Ok("oauth-token".to_string())
    }

    async fn get_email(&self) -> ClientResult<String> {
        Ok("user@example.com".to_string())
    }
}

/// A directory client replaying canned responses.
#[derive(Default)]
pub struct FakeDirectory {
    support_response: Mutex<Option<HttpResponse>>,
    run_response: Mutex<Option<HttpResponse>>,
    support_calls: Mutex<Vec<String>>,
    run_calls: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_support_response(&self, response: HttpResponse) {
        *self.support_response.lock().unwrap() = Some(response);
    }

    pub fn set_run_response(&self, response: HttpResponse) {
        *self.run_response.lock().unwrap() = Some(response);
    }

    pub fn support_calls(&self) -> Vec<String> {
        self.support_calls.lock().unwrap().clone()
    }

    pub fn run_calls(&self) -> Vec<String> {
        self.run_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn support_host_info(
        &self,
        support_id: &str,
        _oauth_token: &str,
    ) -> ClientResult<HttpResponse> {
        self.support_calls.lock().unwrap().push(support_id.to_string());
        Ok(self
            .support_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| HttpResponse::new(500, "")))
    }

    async fn run_application(
        &self,
        application_id: &str,
        _oauth_token: &str,
    ) -> ClientResult<HttpResponse> {
        self.run_calls.lock().unwrap().push(application_id.to_string());
        Ok(self
            .run_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| HttpResponse::new(500, "")))
    }
}

pub struct FakeView {
    closed: Arc<AtomicBool>,
}

impl ConnectedView for FakeView {
    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// A UI recording every mode switch and error it is shown.
pub struct FakeUi {
    access_code: Mutex<Option<ClientResult<String>>>,
    modes: Mutex<Vec<UiMode>>,
    errors: Mutex<Vec<ErrorTag>>,
    views_created: AtomicUsize,
    last_view_closed: Arc<AtomicBool>,
}

impl FakeUi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            access_code: Mutex::new(None),
            modes: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            views_created: AtomicUsize::new(0),
            last_view_closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn set_access_code(&self, code: &str) {
        *self.access_code.lock().unwrap() = Some(Ok(code.to_string()));
    }

    pub fn cancel_access_code_prompt(&self) {
        *self.access_code.lock().unwrap() = Some(Err(ClientError::new(ErrorTag::Cancelled)));
    }

    pub fn modes(&self) -> Vec<UiMode> {
        self.modes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<ErrorTag> {
        self.errors.lock().unwrap().clone()
    }

    pub fn views_created(&self) -> usize {
        self.views_created.load(Ordering::SeqCst)
    }

    pub fn last_view_closed(&self) -> bool {
        self.last_view_closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UiDelegate for FakeUi {
    async fn prompt_access_code(&self) -> ClientResult<String> {
        self.access_code
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(ClientError::new(ErrorTag::Cancelled)))
    }

    fn set_mode(&self, mode: UiMode) {
        self.modes.lock().unwrap().push(mode);
    }

    fn show_error(&self, error: &ClientError) {
        self.errors.lock().unwrap().push(error.tag());
    }

    fn create_connected_view(&self) -> Box<dyn ConnectedView> {
        self.views_created.fetch_add(1, Ordering::SeqCst);
        self.last_view_closed.store(false, Ordering::SeqCst);
        Box::new(FakeView {
            closed: Arc::clone(&self.last_view_closed),
        })
    }
}

/// A factory handing out connectors over one shared fake stack.
pub struct FakeConnectorFactory {
    pub plugin: Arc<FakePlugin>,
    pub signal: Arc<FakeSignal>,
    pub telemetry: Arc<RecordingTelemetry>,
}

impl FakeConnectorFactory {
    pub fn new(
        plugin: Arc<FakePlugin>,
        signal: Arc<FakeSignal>,
        telemetry: Arc<RecordingTelemetry>,
    ) -> Arc<Self> {
        Arc::new(Self {
            plugin,
            signal,
            telemetry,
        })
    }
}

impl SessionConnectorFactory for FakeConnectorFactory {
    fn create_connector(&self, handler: Arc<dyn SessionEventHandler>) -> SessionConnector {
        SessionConnector::new(
            Arc::clone(&self.signal) as _,
            Arc::clone(&self.plugin) as _,
            Arc::clone(&self.telemetry) as _,
            handler,
        )
    }
}
