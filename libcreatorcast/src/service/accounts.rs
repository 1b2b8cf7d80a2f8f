//! Connected platform accounts
//!
//! One profile URL per owner and platform. Connecting again replaces the
//! stored URL; disconnecting something that was never connected is a no-op.

use chrono::Utc;
use std::sync::Arc;
use url::Url;

use super::events::{Event, EventBus};
use crate::error::{CreatorcastError, Result};
use crate::session::Session;
use crate::types::{ConnectedAccount, Platform};
use crate::Database;

#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub platform: Platform,
    pub profile_url: String,
}

pub struct AccountRegistry {
    db: Arc<Database>,
    events: EventBus,
}

impl AccountRegistry {
    pub fn new(db: Arc<Database>, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Connect (or re-connect) a platform
    ///
    /// Returns the owner's full set of connected accounts.
    ///
    /// # Errors
    ///
    /// `InvalidUrl` unless the URL is absolute http(s) with a host.
    pub async fn connect(&self, session: &Session, request: ConnectRequest) -> Result<Vec<ConnectedAccount>> {
        let profile_url = validate_profile_url(&request.profile_url)?;
        let owner_id = session.owner_id();

        let replaced = self
            .db
            .get_connected_account(owner_id, request.platform)
            .await?
            .is_some();

        self.db
            .upsert_connected_account(&ConnectedAccount {
                owner_id: owner_id.to_string(),
                platform: request.platform,
                profile_url,
                connected_at: Utc::now().timestamp(),
            })
            .await?;

        tracing::info!(
            "{} {} account",
            if replaced { "Updated" } else { "Connected" },
            request.platform.display_name()
        );
        self.events.emit(Event::AccountConnected {
            platform: request.platform,
            replaced,
        });

        self.list(session).await
    }

    /// Remove a platform connection
    ///
    /// Posts already scheduled for the platform are left in place.
    pub async fn disconnect(&self, session: &Session, platform: Platform) -> Result<Vec<ConnectedAccount>> {
        let owner_id = session.owner_id();

        if self.db.delete_connected_account(owner_id, platform).await? {
            let pending_posts = self.db.count_scheduled_posts(owner_id, Some(platform)).await?;
            if pending_posts > 0 {
                tracing::warn!(
                    "Disconnected {} with {} scheduled post(s) still targeting it",
                    platform.display_name(),
                    pending_posts
                );
            }

            self.events.emit(Event::AccountDisconnected {
                platform,
                pending_posts,
            });
        } else {
            tracing::debug!("{} was not connected", platform.display_name());
        }

        self.list(session).await
    }

    /// Connected accounts, ordered by platform
    pub async fn list(&self, session: &Session) -> Result<Vec<ConnectedAccount>> {
        self.db.list_connected_accounts(session.owner_id()).await
    }

    pub async fn is_connected(&self, session: &Session, platform: Platform) -> Result<bool> {
        Ok(self
            .db
            .get_connected_account(session.owner_id(), platform)
            .await?
            .is_some())
    }
}

/// Normalize and check a profile URL
fn validate_profile_url(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CreatorcastError::InvalidUrl(
            "Profile URL cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(input)
        .map_err(|e| CreatorcastError::InvalidUrl(format!("'{}': {}", input, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CreatorcastError::InvalidUrl(format!(
            "'{}': scheme must be http or https",
            input
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url.to_string()),
        _ => Err(CreatorcastError::InvalidUrl(format!(
            "'{}': missing host",
            input
        ))),
    }
}
