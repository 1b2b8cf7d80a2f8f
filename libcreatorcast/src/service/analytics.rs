//! Analytics aggregation over published posts
//!
//! Reports are derived on demand and never stored. Posts without recorded
//! metrics are left out of a report rather than counted as zero.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::assistant::Summarizer;
use crate::error::{CreatorcastError, Result};
use crate::session::Session;
use crate::types::{AnalyticsReport, AnalyticsTotals, Platform, PostMetrics};
use crate::Database;

/// Where per-post engagement counters come from
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Latest counters for a published post, `None` if nothing was recorded
    async fn metrics(&self, post_id: &str) -> Result<Option<PostMetrics>>;
}

#[async_trait]
impl MetricsSource for Database {
    async fn metrics(&self, post_id: &str) -> Result<Option<PostMetrics>> {
        self.get_metrics(post_id).await
    }
}

pub struct AnalyticsAggregator {
    db: Arc<Database>,
    metrics: Arc<dyn MetricsSource>,
    summarizer: Arc<dyn Summarizer>,
    window_days: i64,
}

impl AnalyticsAggregator {
    pub fn new(
        db: Arc<Database>,
        metrics: Arc<dyn MetricsSource>,
        summarizer: Arc<dyn Summarizer>,
        window_days: i64,
    ) -> Self {
        Self {
            db,
            metrics,
            summarizer,
            window_days,
        }
    }

    /// Totals and narrative for the trailing window ending now
    ///
    /// A failing summarizer does not fail the report; the summary is left
    /// empty instead.
    pub async fn weekly_report(&self, session: &Session) -> Result<AnalyticsReport> {
        self.report_at(session, Utc::now()).await
    }

    async fn report_at(&self, session: &Session, now: DateTime<Utc>) -> Result<AnalyticsReport> {
        let since = now - Duration::days(self.window_days);
        let posts = self
            .db
            .list_published_posts(session.owner_id(), since.timestamp())
            .await?;

        let mut samples = Vec::with_capacity(posts.len());
        for post in posts {
            match self.metrics.metrics(&post.id).await? {
                Some(metrics) => samples.push((post.platform, metrics)),
                None => tracing::debug!("No metrics recorded for post {}, skipping", post.id),
            }
        }

        let analytics = aggregate(period_label(since, now), &samples);

        let summary = match self.summarizer.summarize(&analytics).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Could not summarize analytics: {}", e);
                String::new()
            }
        };

        Ok(AnalyticsReport { analytics, summary })
    }

    /// Store the latest counters for one of the owner's published posts
    ///
    /// Counters above [`PostMetrics::MAX_COUNT`] are a `Validation` error.
    pub async fn record_metrics(&self, session: &Session, post_id: &str, metrics: PostMetrics) -> Result<()> {
        metrics.validate()?;

        if self
            .db
            .get_published_post(session.owner_id(), post_id)
            .await?
            .is_none()
        {
            return Err(CreatorcastError::NotFound(format!(
                "Published post {}",
                post_id
            )));
        }

        self.db
            .record_metrics(post_id, &metrics, Utc::now().timestamp())
            .await
    }
}

/// Sum per-post counters into report totals
///
/// `average_engagement` is (likes + comments + shares) / posts, rounded to
/// two decimals, and 0.0 when there are no posts. Totals saturate at
/// `u64::MAX`.
pub fn aggregate(period: String, samples: &[(Platform, PostMetrics)]) -> AnalyticsTotals {
    let mut totals = AnalyticsTotals {
        period,
        ..Default::default()
    };
    let mut by_platform: BTreeMap<Platform, u64> = BTreeMap::new();
    // Exact even when the u64 totals saturate
    let mut engagement: u128 = 0;

    for (platform, metrics) in samples {
        totals.total_posts += 1;
        totals.total_views = totals.total_views.saturating_add(metrics.views);
        totals.total_likes = totals.total_likes.saturating_add(metrics.likes);
        totals.total_comments = totals.total_comments.saturating_add(metrics.comments);
        totals.total_shares = totals.total_shares.saturating_add(metrics.shares);
        engagement += u128::from(metrics.likes) + u128::from(metrics.comments) + u128::from(metrics.shares);
        *by_platform.entry(*platform).or_default() += 1;
    }

    totals.posts_by_platform = by_platform;
    totals.average_engagement = if totals.total_posts == 0 {
        0.0
    } else {
        round2(engagement as f64 / totals.total_posts as f64)
    };

    totals
}

/// "YYYY-MM-DD to YYYY-MM-DD"
pub fn period_label(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!("{} to {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
