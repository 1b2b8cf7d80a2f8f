//! Draft store: the authoritative collection of content items
//!
//! Owns every field of a content item except `status`, which only the
//! scheduler writes. AI enrichment lives here too: one generation call per
//! request, and the target field is replaced only when that call succeeds.

use std::sync::Arc;

use super::events::{Event, EventBus};
use crate::assistant::Generator;
use crate::error::{CreatorcastError, Result};
use crate::session::Session;
use crate::types::{ContentItem, ContentStatus, DraftUpdate, GenerationKind, NewDraft, Platform};
use crate::Database;

/// Request to fill a draft's caption or script
///
/// `idea` and `platform` default to the draft's own values.
#[derive(Debug, Clone)]
pub struct EnrichRequest {
    pub draft_id: String,
    pub idea: Option<String>,
    pub platform: Option<Platform>,
}

impl EnrichRequest {
    pub fn for_draft(draft_id: impl Into<String>) -> Self {
        Self {
            draft_id: draft_id.into(),
            idea: None,
            platform: None,
        }
    }
}

pub struct DraftStore {
    db: Arc<Database>,
    generator: Arc<dyn Generator>,
    events: EventBus,
}

impl DraftStore {
    pub fn new(db: Arc<Database>, generator: Arc<dyn Generator>, events: EventBus) -> Self {
        Self {
            db,
            generator,
            events,
        }
    }

    /// Create a draft; the idea is required
    pub async fn create(&self, session: &Session, draft: NewDraft) -> Result<ContentItem> {
        let item = ContentItem::from_new(session.owner_id(), draft)?;
        self.db.insert_content_item(&item).await?;

        tracing::debug!("Created draft {} for {}", item.id, item.platform);
        self.events.emit(Event::DraftCreated {
            draft_id: item.id.clone(),
            platform: item.platform,
        });

        Ok(item)
    }

    pub async fn get(&self, session: &Session, id: &str) -> Result<ContentItem> {
        self.db
            .get_content_item(session.owner_id(), id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Apply a partial update
    ///
    /// Fields left out are untouched; status cannot be part of an update.
    pub async fn update(&self, session: &Session, id: &str, update: DraftUpdate) -> Result<ContentItem> {
        let mut item = self.get(session, id).await?;

        if update.is_empty() {
            return Ok(item);
        }

        item.apply(update)?;

        if !self.db.save_content_fields(&item).await? {
            return Err(not_found(id));
        }

        self.events.emit(Event::DraftUpdated {
            draft_id: item.id.clone(),
        });
        Ok(item)
    }

    pub async fn enrich_caption(&self, session: &Session, request: EnrichRequest) -> Result<ContentItem> {
        self.enrich(session, GenerationKind::Caption, request).await
    }

    pub async fn enrich_script(&self, session: &Session, request: EnrichRequest) -> Result<ContentItem> {
        self.enrich(session, GenerationKind::Script, request).await
    }

    /// Generate and store one enrichment field
    ///
    /// Exactly one generation attempt. On failure nothing is written and the
    /// error is returned as is.
    pub async fn enrich(
        &self,
        session: &Session,
        kind: GenerationKind,
        request: EnrichRequest,
    ) -> Result<ContentItem> {
        let mut item = self.get(session, &request.draft_id).await?;

        let idea = request.idea.unwrap_or_else(|| item.idea.clone());
        let platform = request.platform.unwrap_or(item.platform);

        let generated = match self.generator.generate(kind, &idea, platform).await {
            Ok(text) if text.trim().is_empty() => Err(CreatorcastError::Generation(format!(
                "{} returned an empty {}",
                self.generator.name(),
                kind
            ))),
            other => other,
        };

        let text = match generated {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Generating {} for draft {} failed: {}", kind, item.id, e);
                self.events.emit(Event::EnrichmentFailed {
                    draft_id: item.id.clone(),
                    kind,
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let replaced = item.enrichment(kind).is_some();
        if !self
            .db
            .replace_enrichment(session.owner_id(), &item.id, kind, &text)
            .await?
        {
            return Err(not_found(&item.id));
        }

        match kind {
            GenerationKind::Caption => item.caption = Some(text),
            GenerationKind::Script => item.script = Some(text),
        }

        self.events.emit(Event::EnrichmentCompleted {
            draft_id: item.id.clone(),
            kind,
            replaced,
        });
        Ok(item)
    }

    /// Delete an item, cancelling any post scheduled from it in the same
    /// transaction. Returns how many scheduled posts were cancelled.
    pub async fn delete(&self, session: &Session, id: &str) -> Result<usize> {
        let _guard = self.db.lock_transitions().await;

        let cancelled = self
            .db
            .delete_content_item(session.owner_id(), id)
            .await?
            .ok_or_else(|| not_found(id))?;

        if !cancelled.is_empty() {
            tracing::info!(
                "Deleting draft {} cancelled {} scheduled post(s)",
                id,
                cancelled.len()
            );
        }

        self.events.emit(Event::DraftDeleted {
            draft_id: id.to_string(),
            cancelled_posts: cancelled.len(),
        });
        Ok(cancelled.len())
    }

    /// The owner's items, newest first, optionally filtered by status
    pub async fn list(&self, session: &Session, status: Option<ContentStatus>) -> Result<Vec<ContentItem>> {
        self.db.list_content_items(session.owner_id(), status).await
    }

    /// Drafts that can be handed to the scheduler
    pub async fn schedulable(&self, session: &Session) -> Result<Vec<ContentItem>> {
        self.list(session, Some(ContentStatus::Draft)).await
    }
}

fn not_found(id: &str) -> CreatorcastError {
    CreatorcastError::NotFound(format!("Draft {}", id))
}
