//! Core types for Creatorcast

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{CreatorcastError, Result};

/// Target social platform of a content item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Tiktok,
    Twitter,
    Instagram,
    Linkedin,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Youtube,
        Platform::Tiktok,
        Platform::Twitter,
        Platform::Instagram,
        Platform::Linkedin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Tiktok => "tiktok",
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
            Self::Linkedin => "linkedin",
        }
    }

    /// Human-readable name for prompts and reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Youtube => "YouTube",
            Self::Tiktok => "TikTok",
            Self::Twitter => "Twitter",
            Self::Instagram => "Instagram",
            Self::Linkedin => "LinkedIn",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CreatorcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "youtube" => Ok(Self::Youtube),
            "tiktok" => Ok(Self::Tiktok),
            "twitter" | "x" => Ok(Self::Twitter),
            "instagram" => Ok(Self::Instagram),
            "linkedin" => Ok(Self::Linkedin),
            other => Err(CreatorcastError::Validation(format!(
                "Unknown platform '{}'. Supported platforms: youtube, tiktok, twitter, instagram, linkedin",
                other
            ))),
        }
    }
}

/// Lifecycle status of a content item
///
/// Items advance `Draft -> Scheduled -> Published` and may retreat exactly one
/// step, `Scheduled -> Draft`, through cancellation. Nothing else is legal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Scheduled,
    Published,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Published => "published",
        }
    }

    /// Whether moving from `self` to `next` is a legal lifecycle transition
    pub fn can_transition_to(&self, next: ContentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Scheduled)
                | (Self::Scheduled, Self::Published)
                | (Self::Scheduled, Self::Draft)
        )
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = CreatorcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "published" => Ok(Self::Published),
            other => Err(CreatorcastError::Validation(format!(
                "Unknown status '{}'. Valid statuses: draft, scheduled, published",
                other
            ))),
        }
    }
}

/// A unit of content moving through the idea -> published lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub platform: Platform,
    pub idea: String,
    pub caption: Option<String>,
    pub script: Option<String>,
    pub status: ContentStatus,
    pub created_at: i64,
}

impl ContentItem {
    /// Build a fresh draft from a validated request
    pub fn from_new(owner_id: &str, draft: NewDraft) -> Result<Self> {
        draft.validate()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: draft.title.trim().to_string(),
            platform: draft.platform,
            idea: draft.idea,
            caption: non_blank(draft.caption),
            script: non_blank(draft.script),
            status: ContentStatus::Draft,
            created_at: chrono::Utc::now().timestamp(),
        })
    }

    /// Text snapshot stored on a scheduled post for display
    pub fn snapshot(&self) -> String {
        let body = self
            .caption
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(&self.idea);

        if self.title.is_empty() {
            body.to_string()
        } else {
            format!("{}: {}", self.title, body)
        }
    }

    /// Apply a partial update in place
    ///
    /// Fields left as `None` are untouched. An empty caption or script clears it.
    pub fn apply(&mut self, update: DraftUpdate) -> Result<()> {
        if let Some(idea) = &update.idea {
            validate_idea(idea)?;
        }

        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(idea) = update.idea {
            self.idea = idea;
        }
        if let Some(platform) = update.platform {
            self.platform = platform;
        }
        if let Some(caption) = update.caption {
            self.caption = non_blank(Some(caption));
        }
        if let Some(script) = update.script {
            self.script = non_blank(Some(script));
        }
        Ok(())
    }

    /// Current value of an enrichment field
    pub fn enrichment(&self, kind: GenerationKind) -> Option<&str> {
        match kind {
            GenerationKind::Caption => self.caption.as_deref(),
            GenerationKind::Script => self.script.as_deref(),
        }
    }
}

/// Request to create a draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDraft {
    #[serde(default)]
    pub title: String,
    pub idea: String,
    pub platform: Platform,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
}

impl NewDraft {
    pub fn new(title: impl Into<String>, idea: impl Into<String>, platform: Platform) -> Self {
        Self {
            title: title.into(),
            idea: idea.into(),
            platform,
            caption: None,
            script: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_idea(&self.idea)
    }
}

/// Partial update of a draft's editable fields
///
/// There is deliberately no `status` field: status is owned by the scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DraftUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idea: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

impl DraftUpdate {
    /// Parse a JSON patch as sent by a client
    ///
    /// A patch that tries to set `status` is rejected, as is any unknown field.
    pub fn from_json(patch: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(patch)
            .map_err(|e| CreatorcastError::Validation(format!("Malformed update: {}", e)))?;

        if value.get("status").is_some() {
            return Err(CreatorcastError::Validation(
                "Status cannot be set directly; schedule or cancel the post instead".to_string(),
            ));
        }

        serde_json::from_value(value)
            .map_err(|e| CreatorcastError::Validation(format!("Invalid update: {}", e)))
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Which enrichment field a generation call fills
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    Caption,
    Script,
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Caption => "caption",
            Self::Script => "script",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored reference to an external platform profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectedAccount {
    pub owner_id: String,
    pub platform: Platform,
    pub profile_url: String,
    pub connected_at: i64,
}

/// A time- and platform-bound commitment to publish a content item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledPost {
    pub id: String,
    pub owner_id: String,
    pub draft_id: String,
    pub platform: Platform,
    pub scheduled_at: i64,
    pub content: String,
    pub created_at: i64,
}

/// Record of a post the platform integration reported as published
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishedPost {
    pub id: String,
    pub owner_id: String,
    pub draft_id: String,
    pub platform: Platform,
    pub published_at: i64,
}

/// Engagement counters reported for a published post
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostMetrics {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

impl PostMetrics {
    /// Largest counter the metrics table can hold
    pub const MAX_COUNT: u64 = i64::MAX as u64;

    pub fn engagement(&self) -> u64 {
        self.likes
            .saturating_add(self.comments)
            .saturating_add(self.shares)
    }

    /// Reject counters the database cannot store exactly
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("views", self.views),
            ("likes", self.likes),
            ("comments", self.comments),
            ("shares", self.shares),
        ] {
            if value > Self::MAX_COUNT {
                return Err(CreatorcastError::Validation(format!(
                    "{} must be at most {}, got {}",
                    name,
                    Self::MAX_COUNT,
                    value
                )));
            }
        }
        Ok(())
    }
}

/// Summary statistics over the published posts of one window
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsTotals {
    /// Human-readable window, "YYYY-MM-DD to YYYY-MM-DD"
    pub period: String,
    pub total_posts: u64,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_shares: u64,
    pub posts_by_platform: BTreeMap<Platform, u64>,
    /// Mean of likes + comments + shares per post, 0.0 with no posts
    pub average_engagement: f64,
}

/// Derived report: totals plus a narrative summary
///
/// Computed on demand and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsReport {
    #[serde(flatten)]
    pub analytics: AnalyticsTotals,
    /// Empty when the narrative could not be produced
    pub summary: String,
}

fn validate_idea(idea: &str) -> Result<()> {
    if idea.trim().is_empty() {
        return Err(CreatorcastError::Validation(
            "Idea cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse_and_display() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
            assert_eq!(platform.to_string(), platform.as_str());
        }
        assert_eq!("YouTube".parse::<Platform>().unwrap(), Platform::Youtube);
        assert_eq!("x".parse::<Platform>().unwrap(), Platform::Twitter);
    }

    #[test]
    fn test_platform_parse_unknown() {
        let err = "myspace".parse::<Platform>().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("myspace"));
    }

    #[test]
    fn test_platform_serializes_lowercase() {
        let json = serde_json::to_string(&Platform::Linkedin).unwrap();
        assert_eq!(json, r#""linkedin""#);
    }

    #[test]
    fn test_status_transitions_allowed() {
        use ContentStatus::*;
        assert!(Draft.can_transition_to(Scheduled));
        assert!(Scheduled.can_transition_to(Published));
        assert!(Scheduled.can_transition_to(Draft));
    }

    #[test]
    fn test_status_transitions_rejected() {
        use ContentStatus::*;
        let all = [Draft, Scheduled, Published];
        let legal = [(Draft, Scheduled), (Scheduled, Published), (Scheduled, Draft)];

        for from in all {
            for to in all {
                if !legal.contains(&(from, to)) {
                    assert!(
                        !from.can_transition_to(to),
                        "{} -> {} should be rejected",
                        from,
                        to
                    );
                }
            }
        }
    }

    #[test]
    fn test_new_draft_defaults() {
        let item =
            ContentItem::from_new("owner-1", NewDraft::new("Launch", "launch video", Platform::Youtube))
                .unwrap();

        assert_eq!(item.status, ContentStatus::Draft);
        assert_eq!(item.owner_id, "owner-1");
        assert!(item.caption.is_none());
        assert!(item.script.is_none());
        assert!(Uuid::parse_str(&item.id).is_ok());
    }

    #[test]
    fn test_new_draft_requires_idea() {
        let result = ContentItem::from_new("owner-1", NewDraft::new("Title", "   ", Platform::Tiktok));
        assert!(matches!(result, Err(CreatorcastError::Validation(_))));
    }

    #[test]
    fn test_new_draft_blank_caption_is_none() {
        let mut draft = NewDraft::new("", "idea", Platform::Twitter);
        draft.caption = Some("  ".to_string());
        let item = ContentItem::from_new("owner-1", draft).unwrap();
        assert!(item.caption.is_none());
    }

    #[test]
    fn test_apply_partial_update() {
        let mut item =
            ContentItem::from_new("o", NewDraft::new("Old", "idea", Platform::Youtube)).unwrap();
        item.caption = Some("keep me".to_string());

        item.apply(DraftUpdate {
            title: Some("New".to_string()),
            script: Some("A script".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(item.title, "New");
        assert_eq!(item.idea, "idea");
        assert_eq!(item.caption.as_deref(), Some("keep me"));
        assert_eq!(item.script.as_deref(), Some("A script"));
    }

    #[test]
    fn test_apply_rejects_empty_idea_without_mutating() {
        let mut item =
            ContentItem::from_new("o", NewDraft::new("Old", "idea", Platform::Youtube)).unwrap();
        let before = item.clone();

        let result = item.apply(DraftUpdate {
            title: Some("New".to_string()),
            idea: Some("".to_string()),
            ..Default::default()
        });

        assert!(result.is_err());
        assert_eq!(item, before);
    }

    #[test]
    fn test_update_from_json_rejects_status() {
        let err = DraftUpdate::from_json(r#"{"title":"x","status":"published"}"#).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Status cannot be set"));
    }

    #[test]
    fn test_update_from_json_rejects_unknown_fields() {
        let err = DraftUpdate::from_json(r#"{"owner_id":"someone-else"}"#).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_update_from_json_partial() {
        let update = DraftUpdate::from_json(r#"{"caption":"Hello","platform":"tiktok"}"#).unwrap();
        assert_eq!(update.caption.as_deref(), Some("Hello"));
        assert_eq!(update.platform, Some(Platform::Tiktok));
        assert!(update.title.is_none());
        assert!(!update.is_empty());
        assert!(DraftUpdate::from_json("{}").unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_prefers_caption() {
        let mut item =
            ContentItem::from_new("o", NewDraft::new("Launch", "launch video", Platform::Youtube))
                .unwrap();
        assert_eq!(item.snapshot(), "Launch: launch video");

        item.caption = Some("We're live!".to_string());
        assert_eq!(item.snapshot(), "Launch: We're live!");

        item.title.clear();
        assert_eq!(item.snapshot(), "We're live!");
    }

    #[test]
    fn test_metrics_engagement() {
        let metrics = PostMetrics {
            views: 1000,
            likes: 40,
            comments: 5,
            shares: 3,
        };
        assert_eq!(metrics.engagement(), 48);
    }

    #[test]
    fn test_metrics_engagement_saturates() {
        let metrics = PostMetrics {
            views: 0,
            likes: u64::MAX,
            comments: 1,
            shares: 1,
        };
        assert_eq!(metrics.engagement(), u64::MAX);
    }

    #[test]
    fn test_metrics_validate_bounds() {
        let at_limit = PostMetrics {
            views: PostMetrics::MAX_COUNT,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());

        let too_large = PostMetrics {
            shares: PostMetrics::MAX_COUNT + 1,
            ..Default::default()
        };
        let err = too_large.validate().unwrap_err();
        assert!(matches!(err, CreatorcastError::Validation(_)));
        assert!(err.to_string().contains("shares"));
    }
}
