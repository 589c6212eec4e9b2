//! App-remoting activity: server-provisioned hosted applications
//!
//! Instead of a user-entered code, the client asks the app-remoting
//! service to run an application instance. A "done" response carries
//! the provisioned host's signaling address plus server-issued
//! credentials; those are echoed into the handshake through a
//! [`StaticTokenFetcher`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::activity::Activity;
use crate::error::{ClientError, ClientResult, ErrorTag};
use crate::identity::IdentityProvider;
use crate::protocol::directory::{AppHostResponse, DirectoryClient, HttpResponse};
use crate::session::{
    ClientSession, ConnectionInfo, ConnectionMode, CredentialsProvider, Host, SessionConnector,
    SessionConnectorFactory, SessionEventHandler, StaticTokenFetcher,
};
use crate::ui::{ConnectedView, UiDelegate, UiMode};

/// Per-attempt resources owned by the activity.
#[derive(Default)]
struct Inner {
    connector: Option<Arc<SessionConnector>>,
    session: Option<Arc<tokio::sync::Mutex<ClientSession>>>,
    connected_view: Option<Box<dyn ConnectedView>>,
}

/// Coordinates a connection to a hosted application instance.
pub struct AppRemotingActivity {
    application_id: String,
    ui: Arc<dyn UiDelegate>,
    identity: Arc<dyn IdentityProvider>,
    directory: Arc<dyn DirectoryClient>,
    connector_factory: Arc<dyn SessionConnectorFactory>,
    inner: std::sync::Mutex<Inner>,
}

impl AppRemotingActivity {
    /// Creates the activity for one application id.
    pub fn new(
        application_id: impl Into<String>,
        ui: Arc<dyn UiDelegate>,
        identity: Arc<dyn IdentityProvider>,
        directory: Arc<dyn DirectoryClient>,
        connector_factory: Arc<dyn SessionConnectorFactory>,
    ) -> Arc<Self> {
        Arc::new(Self {
            application_id: application_id.into(),
            ui,
            identity,
            directory,
            connector_factory,
            inner: std::sync::Mutex::new(Inner::default()),
        })
    }

    async fn run_connection_flow(self: &Arc<Self>) -> ClientResult<()> {
        self.ui.set_mode(UiMode::Connecting);

        let token = self.identity.get_token().await?;
        let response = self
            .directory
            .run_application(&self.application_id, &token)
            .await?;
        let (host, credentials) = parse_app_host(&response)?;

        info!(
            "Application {} provisioned on host {}",
            self.application_id, host.host_id
        );
        self.connect(host, credentials).await;
        Ok(())
    }

    async fn connect(self: &Arc<Self>, host: Host, credentials: CredentialsProvider) {
        // Only one attempt may be live; drop any prior one first.
        self.cleanup();

        let handler: Arc<dyn SessionEventHandler> = Arc::clone(self) as _;
        let connector = Arc::new(self.connector_factory.create_connector(handler));
        self.inner.lock().expect("activity state poisoned").connector =
            Some(Arc::clone(&connector));

        connector
            .connect(ConnectionMode::AppRemoting, host, credentials)
            .await;
    }

    /// Releases per-attempt resources: view first, then session handle,
    /// then the connector. Idempotent.
    fn cleanup(&self) {
        let mut inner = self.inner.lock().expect("activity state poisoned");
        if let Some(mut view) = inner.connected_view.take() {
            view.close();
        }
        inner.session = None;
        inner.connector = None;
    }
}

#[async_trait]
impl Activity for AppRemotingActivity {
    async fn start(self: Arc<Self>) {
        if let Err(error) = self.run_connection_flow().await {
            error!("App-remoting connection flow failed: {}", error);
            self.ui.show_error(&error);
            self.ui.set_mode(UiMode::ConnectionFailed);
        }
    }

    async fn stop(&self) {
        let (session, connector) = {
            let inner = self.inner.lock().expect("activity state poisoned");
            (inner.session.clone(), inner.connector.clone())
        };
        // Before the connected callback fires, the session only lives
        // inside the connector; a stop during that window must still
        // reach it.
        let session = match session {
            Some(session) => Some(session),
            None => match connector {
                Some(connector) => connector.session().await,
                None => None,
            },
        };
        if let Some(session) = session {
            session.lock().await.disconnect(None);
        }
    }
}

impl SessionEventHandler for AppRemotingActivity {
    fn on_connected(&self, info: ConnectionInfo) {
        let mut inner = self.inner.lock().expect("activity state poisoned");
        inner.session = Some(info.session);
        inner.connected_view = Some(self.ui.create_connected_view());
    }

    fn on_connection_failed(&self, error: &ClientError) {
        self.on_error(error);
    }

    fn on_disconnected(&self) {
        self.cleanup();
        self.ui.set_mode(UiMode::SessionFinished);
    }

    fn on_error(&self, error: &ClientError) {
        error!("App-remoting session failed: {}", error);
        self.ui.show_error(error);
        self.ui.set_mode(UiMode::ConnectionFailed);
        self.cleanup();
    }
}

/// Turns a run-application response into a host and credentials.
fn parse_app_host(response: &HttpResponse) -> ClientResult<(Host, CredentialsProvider)> {
    if response.status != 200 {
        return Err(ClientError::from_http_status(response.status));
    }

    let parsed: AppHostResponse = serde_json::from_str(&response.body)
        .map_err(|_| ClientError::unexpected_with("invalid run-application response"))?;

    match parsed.status.as_deref() {
        Some("done") => {}
        Some("pending") => {
            // The instance is still spinning up; the caller may retry.
            warn!("Application host not yet provisioned");
            return Err(ClientError::new(ErrorTag::ServiceUnavailable));
        }
        other => {
            error!("Unrecognized provisioning status {:?}", other);
            return Err(ClientError::unexpected_with(
                "run-application response has no usable status",
            ));
        }
    }

    let host_jid = parsed.host_jid.as_deref().unwrap_or_default();
    let authorization_code = parsed.authorization_code.as_deref().unwrap_or_default();
    let shared_secret = parsed.shared_secret.as_deref().unwrap_or_default();
    let host_id = parsed
        .host
        .as_ref()
        .and_then(|h| h.host_id.as_deref())
        .unwrap_or_default();

    if host_jid.is_empty() || authorization_code.is_empty() || shared_secret.is_empty()
        || host_id.is_empty()
    {
        error!("Run-application response is missing fields");
        return Err(ClientError::unexpected_with(
            "run-application response missing fields",
        ));
    }

    let host = Host::new(host_id, host_jid)
        .with_authorization_code(authorization_code)
        .with_shared_secret(shared_secret);
    let credentials = CredentialsProvider::ThirdParty(Arc::new(StaticTokenFetcher::new(
        authorization_code,
        shared_secret,
    )));

    Ok((host, credentials))
}
