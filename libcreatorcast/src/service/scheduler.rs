//! Scheduler: the only writer of content status
//!
//! Every transition takes the database's transition lock and then runs as a
//! single transaction whose status flip is conditional on the current status.
//! The lock serializes callers in this process; the conditional update keeps
//! the guarantee when several processes share one database file.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::events::{Event, EventBus};
use crate::error::{CreatorcastError, Result};
use crate::session::Session;
use crate::types::{ContentStatus, Platform, PublishedPost, ScheduledPost};
use crate::Database;

#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub draft_id: String,
    pub platform: Platform,
    pub scheduled_at: DateTime<Utc>,
}

pub struct Scheduler {
    db: Arc<Database>,
    events: EventBus,
}

impl Scheduler {
    pub fn new(db: Arc<Database>, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Schedule a draft for publication
    ///
    /// Preconditions are checked in order: the item is the caller's draft,
    /// the platform is connected, the time is in the future.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the item is missing, foreign, or not a draft
    /// - `PlatformNotConnected` if the owner has no account for `platform`
    /// - `InvalidSchedule` if `scheduled_at` is not after now
    pub async fn schedule_post(&self, session: &Session, request: ScheduleRequest) -> Result<ScheduledPost> {
        let _guard = self.db.lock_transitions().await;
        let owner_id = session.owner_id();

        let item = self
            .db
            .get_content_item(owner_id, &request.draft_id)
            .await?
            .ok_or_else(|| {
                CreatorcastError::InvalidState(format!(
                    "Draft {} not found",
                    request.draft_id
                ))
            })?;

        if !item.status.can_transition_to(ContentStatus::Scheduled) {
            return Err(CreatorcastError::InvalidState(format!(
                "Content item {} is {}, only drafts can be scheduled",
                item.id, item.status
            )));
        }

        if self
            .db
            .get_connected_account(owner_id, request.platform)
            .await?
            .is_none()
        {
            return Err(CreatorcastError::PlatformNotConnected(request.platform));
        }

        let now = Utc::now();
        if request.scheduled_at.timestamp() <= now.timestamp() {
            return Err(CreatorcastError::InvalidSchedule(format!(
                "{} is not in the future",
                request.scheduled_at.format("%Y-%m-%d %H:%M:%S UTC")
            )));
        }

        let post = ScheduledPost {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            draft_id: item.id.clone(),
            platform: request.platform,
            scheduled_at: request.scheduled_at.timestamp(),
            content: item.snapshot(),
            created_at: now.timestamp(),
        };

        if !self.db.insert_scheduled_post(&post).await? {
            return Err(CreatorcastError::InvalidState(format!(
                "Content item {} is no longer a draft",
                item.id
            )));
        }

        tracing::info!(
            "Scheduled draft {} for {} at {}",
            post.draft_id,
            post.platform.display_name(),
            request.scheduled_at.to_rfc3339()
        );
        self.events.emit(Event::PostScheduled {
            post_id: post.id.clone(),
            draft_id: post.draft_id.clone(),
            platform: post.platform,
            scheduled_at: post.scheduled_at,
        });

        Ok(post)
    }

    /// Remove a scheduled post and return its item to draft
    ///
    /// Returns the cancelled post. A second cancel of the same id is `NotFound`.
    pub async fn cancel(&self, session: &Session, post_id: &str) -> Result<ScheduledPost> {
        let _guard = self.db.lock_transitions().await;

        let post = self
            .db
            .delete_scheduled_post_and_revert(session.owner_id(), post_id)
            .await?
            .ok_or_else(|| not_found(post_id))?;

        tracing::info!("Cancelled scheduled post {}", post.id);
        self.events.emit(Event::PostCancelled {
            post_id: post.id.clone(),
            draft_id: post.draft_id.clone(),
        });

        Ok(post)
    }

    /// Record that the platform integration published a scheduled post
    ///
    /// Consumes the scheduled post, marks the item published and creates the
    /// published-post row analytics reads from.
    pub async fn mark_published(&self, session: &Session, post_id: &str) -> Result<PublishedPost> {
        let _guard = self.db.lock_transitions().await;

        let published = self
            .db
            .publish_scheduled_post(session.owner_id(), post_id, Utc::now().timestamp())
            .await?
            .ok_or_else(|| not_found(post_id))?;

        tracing::info!(
            "Draft {} published to {}",
            published.draft_id,
            published.platform.display_name()
        );
        self.events.emit(Event::PostPublished {
            post_id: published.id.clone(),
            draft_id: published.draft_id.clone(),
            platform: published.platform,
        });

        Ok(published)
    }

    /// Scheduled posts, soonest first
    pub async fn list(&self, session: &Session) -> Result<Vec<ScheduledPost>> {
        self.db.list_scheduled_posts(session.owner_id()).await
    }

    pub async fn get(&self, session: &Session, post_id: &str) -> Result<ScheduledPost> {
        self.db
            .get_scheduled_post(session.owner_id(), post_id)
            .await?
            .ok_or_else(|| not_found(post_id))
    }

    /// Published posts at or after `since` (unix seconds), newest first
    pub async fn list_published(&self, session: &Session, since: i64) -> Result<Vec<PublishedPost>> {
        self.db.list_published_posts(session.owner_id(), since).await
    }
}

fn not_found(post_id: &str) -> CreatorcastError {
    CreatorcastError::NotFound(format!("Scheduled post {}", post_id))
}
