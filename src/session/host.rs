//! Remote host record
//!
//! A `Host` identifies one remote endpoint for the duration of a single
//! connection attempt. It is assembled by whichever activity resolved
//! the host (directory lookup, app-remoting provisioning) and is not
//! mutated after the connector takes it.

use serde::{Deserialize, Serialize};

/// A remote endpoint to connect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// Stable host identifier
    pub host_id: String,
    /// Signaling address (JID) of the host
    pub jabber_id: String,
    /// Display name, usually derived from the signaling address
    pub host_name: Option<String>,
    /// Host public key (DER, base64); required for It2Me
    pub public_key: Option<String>,
    /// Server-issued authorization code (app remoting)
    pub authorization_code: Option<String>,
    /// Server-issued shared secret (app remoting)
    pub shared_secret: Option<String>,
}

impl Host {
    /// Creates a host with the given id and signaling address.
    pub fn new(host_id: impl Into<String>, jabber_id: impl Into<String>) -> Self {
        let jabber_id = jabber_id.into();
        // The bare JID (before the resource part) doubles as a readable name.
        let host_name = jabber_id.split('/').next().map(str::to_string);
        Self {
            host_id: host_id.into(),
            jabber_id,
            host_name,
            public_key: None,
            authorization_code: None,
            shared_secret: None,
        }
    }

    /// Sets the host public key.
    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    /// Sets the server-issued authorization code.
    pub fn with_authorization_code(mut self, code: impl Into<String>) -> Self {
        self.authorization_code = Some(code.into());
        self
    }

    /// Sets the server-issued shared secret.
    pub fn with_shared_secret(mut self, secret: impl Into<String>) -> Self {
        self.shared_secret = Some(secret.into());
        self
    }
}
