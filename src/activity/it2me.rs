//! It2Me activity: ad-hoc assistance via a short access code
//!
//! The user enters an access code consisting of a support-id prefix
//! and a host secret. The support id keys a directory lookup that
//! yields the host's signaling address and public key; the full code
//! is the credential for the handshake.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::activity::Activity;
use crate::error::{ClientError, ClientResult, ErrorTag};
use crate::identity::IdentityProvider;
use crate::protocol::directory::{DirectoryClient, HttpResponse, SupportHostsResponse};
use crate::session::{
    ClientSession, ConnectionInfo, ConnectionMode, CredentialsProvider, Host, SessionConnector,
    SessionConnectorFactory, SessionEventHandler,
};
use crate::ui::{ConnectedView, UiDelegate, UiMode};

/// Digits in the support-id prefix of an access code
const SUPPORT_ID_LENGTH: usize = 7;
/// Digits in the host-secret suffix of an access code
const HOST_SECRET_LENGTH: usize = 5;
/// Total access code length after whitespace stripping
const ACCESS_CODE_LENGTH: usize = SUPPORT_ID_LENGTH + HOST_SECRET_LENGTH;

/// Per-attempt resources owned by the activity.
#[derive(Default)]
struct Inner {
    connector: Option<Arc<SessionConnector>>,
    session: Option<Arc<tokio::sync::Mutex<ClientSession>>>,
    connected_view: Option<Box<dyn ConnectedView>>,
}

/// Coordinates an It2Me connection attempt.
pub struct It2MeActivity {
    ui: Arc<dyn UiDelegate>,
    identity: Arc<dyn IdentityProvider>,
    directory: Arc<dyn DirectoryClient>,
    connector_factory: Arc<dyn SessionConnectorFactory>,
    inner: std::sync::Mutex<Inner>,
}

impl It2MeActivity {
    /// Creates the activity with its collaborators.
    pub fn new(
        ui: Arc<dyn UiDelegate>,
        identity: Arc<dyn IdentityProvider>,
        directory: Arc<dyn DirectoryClient>,
        connector_factory: Arc<dyn SessionConnectorFactory>,
    ) -> Arc<Self> {
        Arc::new(Self {
            ui,
            identity,
            directory,
            connector_factory,
            inner: std::sync::Mutex::new(Inner::default()),
        })
    }

    async fn run_connection_flow(self: &Arc<Self>) -> ClientResult<()> {
        let access_code = self.ui.prompt_access_code().await?;
        self.ui.set_mode(UiMode::Connecting);

        let (support_id, pass_code) = verify_access_code(&access_code)?;
        let token = self.identity.get_token().await?;

        let response = self
            .directory
            .support_host_info(&support_id, &token)
            .await?;
        let host = parse_support_host(&support_id, &response)?;

        info!("Resolved support host {}", host.host_id);
        self.connect(host, pass_code).await;
        Ok(())
    }

    async fn connect(self: &Arc<Self>, host: Host, pass_code: String) {
        // Only one attempt may be live; drop any prior one first.
        self.cleanup();

        let handler: Arc<dyn SessionEventHandler> = Arc::clone(self) as _;
        let connector = Arc::new(self.connector_factory.create_connector(handler));
        self.inner.lock().expect("activity state poisoned").connector =
            Some(Arc::clone(&connector));

        connector
            .connect(
                ConnectionMode::It2Me,
                host,
                CredentialsProvider::AccessCode(pass_code),
            )
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
impl Activity for It2MeActivity {
    async fn start(self: Arc<Self>) {
        if let Err(error) = self.run_connection_flow().await {
            if error.has_tag(ErrorTag::Cancelled) {
                // User dismissed the prompt; back to idle, silently.
                debug!("Access code prompt cancelled");
                self.ui.set_mode(UiMode::Home);
            } else {
                error!("It2Me connection flow failed: {}", error);
                self.ui.show_error(&error);
                self.ui.set_mode(UiMode::ConnectionFailed);
            }
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

impl SessionEventHandler for It2MeActivity {
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
        error!("It2Me session failed: {}", error);
        self.ui.show_error(error);
        self.ui.set_mode(UiMode::ConnectionFailed);
        self.cleanup();
    }
}

/// Validates an access code and splits off the support id.
///
/// Whitespace is stripped before the length check; no network traffic
/// happens before a code passes here.
fn verify_access_code(access_code: &str) -> ClientResult<(String, String)> {
    let normalized: String = access_code
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if normalized.len() != ACCESS_CODE_LENGTH {
        return Err(ClientError::new(ErrorTag::InvalidAccessCode));
    }
    let support_id = normalized[..SUPPORT_ID_LENGTH].to_string();
    Ok((support_id, normalized))
}

/// Turns a support-hosts lookup response into a `Host`.
fn parse_support_host(support_id: &str, response: &HttpResponse) -> ClientResult<Host> {
    if response.status != 200 {
        return Err(translate_support_hosts_error(response.status));
    }

    let parsed: SupportHostsResponse = serde_json::from_str(&response.body)
        .map_err(|_| ClientError::unexpected_with("invalid support-hosts response"))?;
    let data = parsed.data.as_ref();
    match (
        data.and_then(|d| d.jabber_id.as_deref()),
        data.and_then(|d| d.public_key.as_deref()),
    ) {
        (Some(jabber_id), Some(public_key)) if !jabber_id.is_empty() && !public_key.is_empty() => {
            Ok(Host::new(support_id, jabber_id).with_public_key(public_key))
        }
        _ => {
            error!("Invalid support-hosts response from server");
            Err(ClientError::unexpected_with(
                "support-hosts response missing fields",
            ))
        }
    }
}

/// Maps a support-hosts HTTP status to an application error.
fn translate_support_hosts_error(status: u16) -> ClientError {
    match status {
        0 => ClientError::new(ErrorTag::NetworkFailure),
        404 => ClientError::new(ErrorTag::InvalidAccessCode),
        502 | 503 => ClientError::new(ErrorTag::ServiceUnavailable),
        other => ClientError::unexpected_with(format!("support-hosts HTTP status {other}")),
    }
}
