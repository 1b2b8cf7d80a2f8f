//! Identity service backed by the local database
//!
//! Stands in for an external identity provider on a single machine.
//! Passwords are stored as one round of salted SHA-256. That is not a password
//! KDF and offers little against offline guessing if the database leaks.
//! Bearer tokens are 32 random bytes, URL-safe base64 encoded; only their
//! SHA-256 digest is persisted, so a copy of the database cannot be replayed as
//! a session.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use crate::db::{Database, UserRecord};
use crate::error::AuthError;

use super::{AuthGrant, Identity, IdentityService, LoginRequest, SignupRequest};

const MIN_PASSWORD_LEN: usize = 8;

pub struct LocalIdentityService {
    db: Database,
    token_ttl_secs: i64,
}

impl LocalIdentityService {
    pub fn new(db: Database, token_ttl_hours: i64) -> Self {
        Self {
            db,
            token_ttl_secs: token_ttl_hours * 3600,
        }
    }

    async fn issue_token(&self, user: &UserRecord) -> Result<SecretString, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let token = URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>());

        self.db
            .insert_auth_token(&digest(&token), &user.id, now, now + self.token_ttl_secs)
            .await
            .map_err(storage_error)?;

        // Opportunistic cleanup; a failure here does not affect the new token
        if let Err(e) = self.db.purge_expired_tokens(now).await {
            tracing::debug!("Could not purge expired tokens: {}", e);
        }

        Ok(SecretString::from(token))
    }
}

#[async_trait]
impl IdentityService for LocalIdentityService {
    async fn authenticate(&self, request: &LoginRequest) -> Result<AuthGrant, AuthError> {
        let email = normalize_email(&request.email);
        let user = self
            .db
            .find_user_by_email(&email)
            .await
            .map_err(storage_error)?
            .ok_or(AuthError::InvalidCredentials)?;

        if hash_password(&user.password_salt, &request.password) != user.password_hash {
            tracing::debug!("Password mismatch for {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user).await?;
        Ok(AuthGrant {
            token,
            identity: identity_of(&user),
        })
    }

    async fn register(&self, request: &SignupRequest) -> Result<AuthGrant, AuthError> {
        let username = request.username.trim();
        let email = normalize_email(&request.email);

        if username.is_empty() {
            return Err(AuthError::InvalidSignup("Username cannot be empty".to_string()));
        }
        if !email.contains('@') {
            return Err(AuthError::InvalidSignup(format!(
                "'{}' is not an email address",
                request.email
            )));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidSignup(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        if self
            .db
            .find_user_by_email(&email)
            .await
            .map_err(storage_error)?
            .is_some()
        {
            return Err(AuthError::DuplicateIdentity(format!("email {}", email)));
        }
        if self
            .db
            .find_user_by_username(username)
            .await
            .map_err(storage_error)?
            .is_some()
        {
            return Err(AuthError::DuplicateIdentity(format!("username {}", username)));
        }

        let salt = URL_SAFE_NO_PAD.encode(rand::random::<[u8; 16]>());
        let user = UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            email,
            display_name: username.to_string(),
            niche: request
                .niche
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            password_hash: hash_password(&salt, &request.password),
            password_salt: salt,
            created_at: chrono::Utc::now().timestamp(),
        };

        // A concurrent signup can claim the name between the checks and here
        if !self.db.insert_user(&user).await.map_err(storage_error)? {
            return Err(AuthError::DuplicateIdentity(format!(
                "username {} or email {}",
                user.username, user.email
            )));
        }
        tracing::info!("Registered new identity {}", user.username);

        let token = self.issue_token(&user).await?;
        Ok(AuthGrant {
            token,
            identity: identity_of(&user),
        })
    }

    async fn lookup(&self, token: &SecretString) -> Result<Option<Identity>, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let user = self
            .db
            .find_user_by_token(&digest(token.expose_secret()), now)
            .await
            .map_err(storage_error)?;

        Ok(user.as_ref().map(identity_of))
    }

    async fn revoke(&self, token: &SecretString) -> Result<(), AuthError> {
        self.db
            .delete_auth_token(&digest(token.expose_secret()))
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}

fn identity_of(user: &UserRecord) -> Identity {
    Identity {
        owner_id: user.id.clone(),
        username: user.username.clone(),
        display_name: user.display_name.clone(),
        niche: user.niche.clone(),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Single salted SHA-256 round, not a key-derivation function
fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

// The identity store is reached the way a remote provider would be; storage
// failures surface as the provider being unavailable.
fn storage_error(e: crate::error::CreatorcastError) -> AuthError {
    AuthError::Network(e.to_string())
}
