//! Authenticated-identity lifecycle
//!
//! The [`SessionManager`] keeps two things in lockstep: the in-memory
//! [`Session`] and the token in the [`TokenStore`]. A session exists exactly
//! when a token is stored; every operation updates both or neither.

pub mod identity;
pub mod mock;
pub mod store;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{AuthError, Result};

pub use identity::LocalIdentityService;
pub use store::{open_token_store, FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};

/// Who a token belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub owner_id: String,
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub niche: Option<String>,
}

/// A token together with the identity it resolves to
pub struct AuthGrant {
    pub token: SecretString,
    pub identity: Identity,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub niche: Option<String>,
}

/// The currently authenticated identity
///
/// Passed explicitly to every service call; services never look up a
/// "current user" on their own.
pub struct Session {
    token: SecretString,
    identity: Identity,
}

impl Session {
    pub fn new(token: SecretString, identity: Identity) -> Self {
        Self { token, identity }
    }

    pub fn owner_id(&self) -> &str {
        &self.identity.owner_id
    }

    pub fn display_name(&self) -> &str {
        &self.identity.display_name
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            token: SecretString::from(self.token.expose_secret().to_string()),
            identity: self.identity.clone(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("identity", &self.identity)
            .finish()
    }
}

/// External identity provider
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Exchange credentials for a fresh token
    async fn authenticate(&self, request: &LoginRequest) -> std::result::Result<AuthGrant, AuthError>;

    /// Create an identity and return a token for it
    async fn register(&self, request: &SignupRequest) -> std::result::Result<AuthGrant, AuthError>;

    /// Resolve a token, `None` when it is unknown or expired
    async fn lookup(&self, token: &SecretString) -> std::result::Result<Option<Identity>, AuthError>;

    /// Invalidate a token server-side
    async fn revoke(&self, token: &SecretString) -> std::result::Result<(), AuthError>;
}

/// Keeps the in-memory session and the stored token consistent
pub struct SessionManager {
    identity: Arc<dyn IdentityService>,
    store: Box<dyn TokenStore>,
    current: Option<Session>,
}

impl SessionManager {
    pub fn new(identity: Arc<dyn IdentityService>, store: Box<dyn TokenStore>) -> Self {
        Self {
            identity,
            store,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The current session, or `NotLoggedIn`
    pub fn require(&self) -> Result<&Session> {
        self.current
            .as_ref()
            .ok_or_else(|| AuthError::NotLoggedIn.into())
    }

    pub fn store_backend(&self) -> &str {
        self.store.backend_name()
    }

    pub async fn login(&mut self, request: LoginRequest) -> Result<&Session> {
        let grant = self.identity.authenticate(&request).await?;
        self.establish(grant).await
    }

    pub async fn signup(&mut self, request: SignupRequest) -> Result<&Session> {
        let grant = self.identity.register(&request).await?;
        self.establish(grant).await
    }

    /// Persist the token first; only then does the session exist
    ///
    /// When the token cannot be saved the new grant is revoked and any prior
    /// session is logged out, so neither side is left holding a token.
    async fn establish(&mut self, grant: AuthGrant) -> Result<&Session> {
        if let Err(e) = self.store.save(&grant.token) {
            tracing::error!("Could not persist session token: {}", e);
            if let Err(revoke_err) = self.identity.revoke(&grant.token).await {
                tracing::warn!("Could not revoke unsaved session token: {}", revoke_err);
            }
            self.logout().await;
            return Err(e);
        }

        tracing::info!("Logged in as {}", grant.identity.username);
        Ok(&*self.current.insert(Session::new(grant.token, grant.identity)))
    }

    /// Restore the session from the stored token
    ///
    /// Returns `None` without contacting the identity service when nothing is
    /// stored. A rejected token, or any failure to validate it, clears the
    /// stored token and yields `None`.
    pub async fn hydrate(&mut self) -> Option<&Session> {
        self.current = None;

        let token = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Could not read stored session token: {}", e);
                self.discard_stored_token();
                return None;
            }
        };

        match self.identity.lookup(&token).await {
            Ok(Some(identity)) => {
                tracing::debug!("Restored session for {}", identity.username);
                Some(&*self.current.insert(Session::new(token, identity)))
            }
            Ok(None) => {
                tracing::info!("Stored session token was rejected; please log in again");
                self.discard_stored_token();
                None
            }
            Err(e) => {
                tracing::warn!("Could not validate stored session token: {}", e);
                self.discard_stored_token();
                None
            }
        }
    }

    /// Like [`hydrate`](Self::hydrate), but a missing session is `NotLoggedIn`
    pub async fn resume(&mut self) -> Result<&Session> {
        self.hydrate()
            .await
            .ok_or_else(|| AuthError::NotLoggedIn.into())
    }

    /// End the session
    ///
    /// Idempotent and infallible: revocation and store failures are logged.
    pub async fn logout(&mut self) {
        let token = match self.current.take() {
            Some(session) => Some(session.token),
            None => self.store.load().ok().flatten(),
        };

        if let Some(token) = token {
            if let Err(e) = self.identity.revoke(&token).await {
                tracing::warn!("Could not revoke session token: {}", e);
            }
        }

        self.discard_stored_token();
    }

    fn discard_stored_token(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Could not clear stored session token: {}", e);
        }
    }
}
