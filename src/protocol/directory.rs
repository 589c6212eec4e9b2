//! Directory / host-lookup HTTP endpoint
//!
//! Two REST calls matter to this crate: looking up a support host by
//! its short id (It2Me) and asking the app-remoting service to run a
//! hosted application. The trait keeps activities testable; the
//! reqwest-backed implementation is the production client.
//!
//! Status-code-to-error translation is intentionally NOT done here: the
//! activities own those tables, because the same status means different
//! things per endpoint (a 404 from support-hosts is a bad access code).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::Settings;
use crate::error::{ClientError, ClientResult, ErrorTag};

/// A raw HTTP response: status code plus body text.
///
/// Status 0 is the conventional "no response at all" marker (network
/// failure before any status line was received).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code, or 0 if the request never completed
    pub status: u16,
    /// Response body
    pub body: String,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Payload of a successful support-hosts lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct SupportHostsResponse {
    /// Host record, absent on malformed responses
    pub data: Option<SupportHostData>,
}

/// Host fields returned by the support-hosts endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportHostData {
    /// Signaling address of the host
    pub jabber_id: Option<String>,
    /// Host public key (DER, base64)
    pub public_key: Option<String>,
}

/// Payload of a run-application request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppHostResponse {
    /// "done" when the host instance is ready, "pending" otherwise
    pub status: Option<String>,
    /// Signaling address of the provisioned host
    pub host_jid: Option<String>,
    /// Server-issued authorization code
    pub authorization_code: Option<String>,
    /// Server-issued shared secret
    pub shared_secret: Option<String>,
    /// Identity of the provisioned host
    pub host: Option<AppHostIdentity>,
}

/// Identity block of an [`AppHostResponse`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppHostIdentity {
    /// Stable host id
    pub host_id: Option<String>,
    /// Application id running on the host
    pub application_id: Option<String>,
}

/// Directory and app-remoting REST endpoint.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Looks up a support host by its short support id.
    ///
    /// # Errors
    ///
    /// Returns an error only when the request could not be issued at
    /// all; HTTP-level failures come back as an [`HttpResponse`] for the
    /// caller to translate.
    async fn support_host_info(
        &self,
        support_id: &str,
        oauth_token: &str,
    ) -> ClientResult<HttpResponse>;

    /// Asks the app-remoting service to provision and run a hosted
    /// application instance.
    async fn run_application(
        &self,
        application_id: &str,
        oauth_token: &str,
    ) -> ClientResult<HttpResponse>;
}

/// Production directory client over reqwest.
pub struct RestDirectoryClient {
    http: reqwest::Client,
    settings: Settings,
}

impl RestDirectoryClient {
    /// Creates a client from application settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(settings: Settings) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.directory.request_timeout_secs))
            .build()
            .map_err(|e| ClientError::unexpected_with(format!("HTTP client init: {e}")))?;

        Ok(Self { http, settings })
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> ClientResult<HttpResponse> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_connect() || e.is_timeout() => {
                // No status line ever arrived; report it as status 0 so
                // the activity-level tables map it uniformly.
                debug!("Directory request failed before a response: {}", e);
                return Ok(HttpResponse::new(0, ""));
            }
            Err(e) => {
                return Err(ClientError::with_detail(
                    ErrorTag::NetworkFailure,
                    e.to_string(),
                ))
            }
        };

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::with_detail(ErrorTag::NetworkFailure, e.to_string()))?;

        Ok(HttpResponse::new(status, body))
    }
}

#[async_trait]
impl DirectoryClient for RestDirectoryClient {
    async fn support_host_info(
        &self,
        support_id: &str,
        oauth_token: &str,
    ) -> ClientResult<HttpResponse> {
        let url = format!(
            "{}/support-hosts/{}",
            self.settings.directory.api_base_url, support_id
        );
        debug!("Looking up support host {}", support_id);

        self.execute(self.http.get(url).bearer_auth(oauth_token))
            .await
    }

    async fn run_application(
        &self,
        application_id: &str,
        oauth_token: &str,
    ) -> ClientResult<HttpResponse> {
        let url = format!(
            "{}/applications/{}/run",
            self.settings.app_remoting.api_base_url, application_id
        );
        debug!("Requesting application host for {}", application_id);

        self.execute(self.http.post(url).bearer_auth(oauth_token))
            .await
    }
}
