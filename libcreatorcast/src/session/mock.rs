//! Mock identity service for testing
//!
//! Issues tokens from memory and can simulate rejected credentials or an
//! unreachable identity provider. Call counters let tests assert which
//! operations actually reached the service.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::AuthError;

use super::{AuthGrant, Identity, IdentityService, LoginRequest, SignupRequest};

#[derive(Debug, Default)]
struct CallCounts {
    authenticate: usize,
    register: usize,
    lookup: usize,
    revoke: usize,
}

pub struct MockIdentity {
    reject_credentials: bool,
    unreachable: bool,
    tokens: Mutex<HashMap<String, Identity>>,
    registered_emails: Mutex<Vec<String>>,
    calls: Arc<Mutex<CallCounts>>,
}

impl Default for MockIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIdentity {
    /// A service that accepts any credentials
    pub fn new() -> Self {
        Self {
            reject_credentials: false,
            unreachable: false,
            tokens: Mutex::new(HashMap::new()),
            registered_emails: Mutex::new(Vec::new()),
            calls: Arc::new(Mutex::new(CallCounts::default())),
        }
    }

    /// Every login fails with `InvalidCredentials`
    pub fn rejecting_credentials(mut self) -> Self {
        self.reject_credentials = true;
        self
    }

    /// Every call fails with `Network`
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Mint a valid token for `owner_id` without going through login
    pub fn issue_token(&self, owner_id: &str) -> String {
        let token = format!("mock-token-{}", uuid::Uuid::new_v4());
        let identity = Identity {
            owner_id: owner_id.to_string(),
            username: owner_id.to_string(),
            display_name: capitalize(owner_id),
            niche: None,
        };
        self.tokens
            .lock()
            .unwrap()
            .insert(token.clone(), identity);
        token
    }

    /// Invalidate a token as if it had expired server-side
    pub fn expire(&self, token: &str) {
        self.tokens.lock().unwrap().remove(token);
    }

    /// Tokens that would still pass `lookup`
    pub fn active_tokens(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn authenticate_calls(&self) -> usize {
        self.calls.lock().unwrap().authenticate
    }

    pub fn register_calls(&self) -> usize {
        self.calls.lock().unwrap().register
    }

    pub fn lookup_calls(&self) -> usize {
        self.calls.lock().unwrap().lookup
    }

    pub fn revoke_calls(&self) -> usize {
        self.calls.lock().unwrap().revoke
    }

    fn check_reachable(&self) -> Result<(), AuthError> {
        if self.unreachable {
            return Err(AuthError::Network("mock identity service is offline".to_string()));
        }
        Ok(())
    }

    fn grant(&self, identity: Identity) -> AuthGrant {
        let token = format!("mock-token-{}", uuid::Uuid::new_v4());
        self.tokens
            .lock()
            .unwrap()
            .insert(token.clone(), identity.clone());
        AuthGrant {
            token: SecretString::from(token),
            identity,
        }
    }
}

#[async_trait]
impl IdentityService for MockIdentity {
    async fn authenticate(&self, request: &LoginRequest) -> Result<AuthGrant, AuthError> {
        self.calls.lock().unwrap().authenticate += 1;
        self.check_reachable()?;

        if self.reject_credentials {
            return Err(AuthError::InvalidCredentials);
        }

        let username = request
            .email
            .split('@')
            .next()
            .unwrap_or(&request.email)
            .to_string();

        Ok(self.grant(Identity {
            owner_id: username.clone(),
            display_name: capitalize(&username),
            username,
            niche: None,
        }))
    }

    async fn register(&self, request: &SignupRequest) -> Result<AuthGrant, AuthError> {
        self.calls.lock().unwrap().register += 1;
        self.check_reachable()?;

        {
            let mut emails = self.registered_emails.lock().unwrap();
            if emails.contains(&request.email) {
                return Err(AuthError::DuplicateIdentity(format!(
                    "email {}",
                    request.email
                )));
            }
            emails.push(request.email.clone());
        }

        Ok(self.grant(Identity {
            owner_id: request.username.clone(),
            username: request.username.clone(),
            display_name: request.username.clone(),
            niche: request.niche.clone(),
        }))
    }

    async fn lookup(&self, token: &SecretString) -> Result<Option<Identity>, AuthError> {
        self.calls.lock().unwrap().lookup += 1;
        self.check_reachable()?;

        Ok(self.tokens.lock().unwrap().get(token.expose_secret()).cloned())
    }

    async fn revoke(&self, token: &SecretString) -> Result<(), AuthError> {
        self.calls.lock().unwrap().revoke += 1;
        self.check_reachable()?;

        self.tokens.lock().unwrap().remove(token.expose_secret());
        Ok(())
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
