//! Session lifecycle: state machine, connector, and supporting types

pub mod client;
pub mod connector;
pub mod credentials;
pub mod events;
pub mod host;
pub mod state;

pub use client::{capability, ClientSession};
pub use connector::{
    ConnectionInfo, ConnectionMode, SessionConnector, SessionConnectorFactory,
    SessionEventHandler,
};
pub use credentials::{
    CredentialsProvider, StaticTokenFetcher, ThirdPartyToken, ThirdPartyTokenFetcher,
    ThirdPartyTokenRequest,
};
pub use events::{EventHub, SessionEvent, StateChange};
pub use host::Host;
pub use state::{translate_state, SessionState};
