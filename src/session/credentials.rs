//! Authentication material for a connection attempt
//!
//! Exactly one credential mode is active per session: either a short
//! user-supplied access code (It2Me), or a fetcher able to exchange a
//! host-issued token URL and scope for a third-party token (app
//! remoting, Me2Me pairing). The provider is built once per activity
//! attempt and consumed by the connector during the handshake.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ClientResult;

/// Parameters of a third-party token exchange, as issued by the host.
#[derive(Debug, Clone)]
pub struct ThirdPartyTokenRequest {
    /// Token-issue URL received from the host
    pub token_url: String,
    /// Host public key (DER, base64)
    pub host_public_key: String,
    /// OAuth scope to request the token for
    pub scope: String,
}

/// Result of a third-party token exchange.
#[derive(Debug, Clone)]
pub struct ThirdPartyToken {
    /// The authentication token
    pub token: String,
    /// Shared secret proving possession to the host
    pub shared_secret: String,
}

/// Exchanges a host-issued token request for an authentication token.
#[async_trait]
pub trait ThirdPartyTokenFetcher: Send + Sync {
    /// Performs the exchange.
    async fn fetch(&self, request: ThirdPartyTokenRequest) -> ClientResult<ThirdPartyToken>;
}

/// A fetcher that echoes pre-issued credentials.
///
/// The app-remoting server hands the client an authorization code and
/// shared secret up front; no real third-party exchange takes place.
pub struct StaticTokenFetcher {
    authorization_code: String,
    shared_secret: String,
}

impl StaticTokenFetcher {
    /// Creates a fetcher returning the given credentials.
    pub fn new(authorization_code: impl Into<String>, shared_secret: impl Into<String>) -> Self {
        Self {
            authorization_code: authorization_code.into(),
            shared_secret: shared_secret.into(),
        }
    }
}

#[async_trait]
impl ThirdPartyTokenFetcher for StaticTokenFetcher {
    async fn fetch(&self, _request: ThirdPartyTokenRequest) -> ClientResult<ThirdPartyToken> {
        Ok(ThirdPartyToken {
            token: self.authorization_code.clone(),
            shared_secret: self.shared_secret.clone(),
        })
    }
}

/// Authentication material passed into the connector.
#[derive(Clone)]
pub enum CredentialsProvider {
    /// A user-entered access code (It2Me)
    AccessCode(String),
    /// A third-party token fetcher (app remoting, Me2Me)
    ThirdParty(Arc<dyn ThirdPartyTokenFetcher>),
}

impl CredentialsProvider {
    /// Returns the access code, if this provider carries one.
    pub fn access_code(&self) -> Option<&str> {
        match self {
            CredentialsProvider::AccessCode(code) => Some(code),
            CredentialsProvider::ThirdParty(_) => None,
        }
    }

    /// Runs the third-party exchange, if this provider supports it.
    pub async fn fetch_third_party_token(
        &self,
        request: ThirdPartyTokenRequest,
    ) -> Option<ClientResult<ThirdPartyToken>> {
        match self {
            CredentialsProvider::AccessCode(_) => None,
            CredentialsProvider::ThirdParty(fetcher) => Some(fetcher.fetch(request).await),
        }
    }
}

impl std::fmt::Debug for CredentialsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the actual material.
        match self {
            CredentialsProvider::AccessCode(_) => f.write_str("CredentialsProvider::AccessCode"),
            CredentialsProvider::ThirdParty(_) => f.write_str("CredentialsProvider::ThirdParty"),
        }
    }
}
