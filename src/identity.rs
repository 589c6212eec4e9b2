//! Identity provider abstraction
//!
//! Token retrieval is owned by the embedding application (OAuth flows,
//! account pickers and so on live outside this crate). The session core
//! only needs a way to ask for a fresh token.

use async_trait::async_trait;

use crate::error::ClientResult;

/// Provides OAuth tokens and account information for the signed-in user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns a fresh access token.
    ///
    /// # Errors
    ///
    /// Returns an error if no user is signed in or the token refresh
    /// fails; the caller maps this to a displayable error.
    async fn get_token(&self) -> ClientResult<String>;

    /// Returns the signed-in user's email address.
    async fn get_email(&self) -> ClientResult<String>;
}
