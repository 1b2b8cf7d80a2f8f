//! Database operations for Creatorcast

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{CreatorcastError, DbError, Result};
use crate::types::{
    ConnectedAccount, ContentItem, ContentStatus, GenerationKind, Platform, PostMetrics,
    PublishedPost, ScheduledPost,
};

/// A stored identity as the local identity service sees it
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub niche: Option<String>,
    pub password_salt: String,
    pub password_hash: String,
    pub created_at: i64,
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    transitions: Arc<Mutex<()>>,
}

impl Database {
    /// Open (creating if needed) the database file and run migrations
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(DbError::SqlxError)?;

        Self::migrate(pool).await
    }

    /// Private in-memory database, used by tests and ephemeral runs
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(DbError::SqlxError)?
            .foreign_keys(true);

        // Every connection to :memory: is a separate database, so pin exactly one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(DbError::SqlxError)?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self {
            pool,
            transitions: Arc::new(Mutex::new(())),
        })
    }

    /// Serialize lifecycle transitions within this process
    ///
    /// Cross-process safety comes from the conditional updates inside each
    /// transition; this lock keeps check-then-write sequences in one process
    /// from interleaving.
    pub async fn lock_transitions(&self) -> MutexGuard<'_, ()> {
        self.transitions.lock().await
    }

    // ---------------------------------------------------------------------
    // Users and tokens
    // ---------------------------------------------------------------------

    /// Insert a user; `false` when the username or email is already taken
    pub async fn insert_user(&self, user: &UserRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, email, display_name, niche, password_salt, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.niche)
        .bind(&user.password_salt)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
            Err(e) => Err(DbError::SqlxError(e).into()),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, display_name, niche, password_salt, password_hash, created_at
            FROM users WHERE email = ? COLLATE NOCASE
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.map(|r| user_from_row(&r)))
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, display_name, niche, password_salt, password_hash, created_at
            FROM users WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.map(|r| user_from_row(&r)))
    }

    pub async fn insert_auth_token(
        &self,
        token_hash: &str,
        user_id: &str,
        created_at: i64,
        expires_at: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (token_hash, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Resolve an unexpired token digest to its user
    pub async fn find_user_by_token(&self, token_hash: &str, now: i64) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.username, u.email, u.display_name, u.niche,
                   u.password_salt, u.password_hash, u.created_at
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = ? AND t.expires_at > ?
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.map(|r| user_from_row(&r)))
    }

    pub async fn delete_auth_token(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn purge_expired_tokens(&self, now: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected())
    }

    // ---------------------------------------------------------------------
    // Content items
    // ---------------------------------------------------------------------

    pub async fn insert_content_item(&self, item: &ContentItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO content_items (id, owner_id, title, platform, idea, caption, script, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(&item.owner_id)
        .bind(&item.title)
        .bind(item.platform.as_str())
        .bind(&item.idea)
        .bind(&item.caption)
        .bind(&item.script)
        .bind(item.status.as_str())
        .bind(item.created_at)
        .bind(item.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Fetch an item visible to `owner_id`
    ///
    /// Items belonging to someone else are indistinguishable from missing ones.
    pub async fn get_content_item(&self, owner_id: &str, id: &str) -> Result<Option<ContentItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, title, platform, idea, caption, script, status, created_at
            FROM content_items WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.map(|r| content_item_from_row(&r)).transpose()
    }

    /// List an owner's items, newest first
    pub async fn list_content_items(
        &self,
        owner_id: &str,
        status: Option<ContentStatus>,
    ) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, title, platform, idea, caption, script, status, created_at
            FROM content_items
            WHERE owner_id = ? AND (? IS NULL OR status = ?)
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(owner_id)
        .bind(status.map(|s| s.as_str()))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(content_item_from_row).collect()
    }

    /// Persist the editable fields of an item
    ///
    /// Status is never written here. Returns false when the item is gone.
    pub async fn save_content_fields(&self, item: &ContentItem) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE content_items
            SET title = ?, idea = ?, platform = ?, caption = ?, script = ?, updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&item.title)
        .bind(&item.idea)
        .bind(item.platform.as_str())
        .bind(&item.caption)
        .bind(&item.script)
        .bind(chrono::Utc::now().timestamp())
        .bind(&item.id)
        .bind(&item.owner_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite a single enrichment column
    pub async fn replace_enrichment(
        &self,
        owner_id: &str,
        id: &str,
        kind: GenerationKind,
        text: &str,
    ) -> Result<bool> {
        let sql = match kind {
            GenerationKind::Caption => {
                "UPDATE content_items SET caption = ?, updated_at = ? WHERE id = ? AND owner_id = ?"
            }
            GenerationKind::Script => {
                "UPDATE content_items SET script = ?, updated_at = ? WHERE id = ? AND owner_id = ?"
            }
        };

        let result = sqlx::query(sql)
            .bind(text)
            .bind(chrono::Utc::now().timestamp())
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an item together with any scheduled post referencing it
    ///
    /// Returns the cancelled posts, or `None` when the item does not exist.
    pub async fn delete_content_item(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Option<Vec<ScheduledPost>>> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        // Write first so a contending process waits on busy_timeout
        let rows = sqlx::query(
            r#"
            DELETE FROM scheduled_posts WHERE draft_id = ? AND owner_id = ?
            RETURNING id, owner_id, draft_id, platform, scheduled_at, content, created_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        let cancelled = rows
            .iter()
            .map(scheduled_post_from_row)
            .collect::<Result<Vec<_>>>()?;

        let result = sqlx::query("DELETE FROM content_items WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(DbError::SqlxError)?;
            return Ok(None);
        }

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(Some(cancelled))
    }

    pub async fn count_content_items(
        &self,
        owner_id: &str,
        status: Option<ContentStatus>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM content_items WHERE owner_id = ? AND (? IS NULL OR status = ?)",
        )
        .bind(owner_id)
        .bind(status.map(|s| s.as_str()))
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(count)
    }

    // ---------------------------------------------------------------------
    // Connected accounts
    // ---------------------------------------------------------------------

    /// Insert or replace the owner's account for a platform
    pub async fn upsert_connected_account(&self, account: &ConnectedAccount) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO connected_accounts (owner_id, platform, profile_url, connected_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(owner_id, platform)
            DO UPDATE SET profile_url = excluded.profile_url, connected_at = excluded.connected_at
            "#,
        )
        .bind(&account.owner_id)
        .bind(account.platform.as_str())
        .bind(&account.profile_url)
        .bind(account.connected_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    pub async fn delete_connected_account(&self, owner_id: &str, platform: Platform) -> Result<bool> {
        let result = sqlx::query("DELETE FROM connected_accounts WHERE owner_id = ? AND platform = ?")
            .bind(owner_id)
            .bind(platform.as_str())
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_connected_account(
        &self,
        owner_id: &str,
        platform: Platform,
    ) -> Result<Option<ConnectedAccount>> {
        let row = sqlx::query(
            r#"
            SELECT owner_id, platform, profile_url, connected_at
            FROM connected_accounts WHERE owner_id = ? AND platform = ?
            "#,
        )
        .bind(owner_id)
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.map(|r| connected_account_from_row(&r)).transpose()
    }

    /// All of an owner's connected accounts, ordered by platform name
    pub async fn list_connected_accounts(&self, owner_id: &str) -> Result<Vec<ConnectedAccount>> {
        let rows = sqlx::query(
            r#"
            SELECT owner_id, platform, profile_url, connected_at
            FROM connected_accounts WHERE owner_id = ?
            ORDER BY platform ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(connected_account_from_row).collect()
    }

    // ---------------------------------------------------------------------
    // Scheduled and published posts
    // ---------------------------------------------------------------------

    /// Flip the item to scheduled and insert the post, atomically
    ///
    /// The flip only applies to an item that is still a draft. Returns false
    /// (and writes nothing) when another writer got there first.
    pub async fn insert_scheduled_post(&self, post: &ScheduledPost) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        let flipped = sqlx::query(
            r#"
            UPDATE content_items SET status = 'scheduled', updated_at = ?
            WHERE id = ? AND owner_id = ? AND status = 'draft'
            "#,
        )
        .bind(post.created_at)
        .bind(&post.draft_id)
        .bind(&post.owner_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        if flipped.rows_affected() == 0 {
            tx.rollback().await.map_err(DbError::SqlxError)?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO scheduled_posts (id, owner_id, draft_id, platform, scheduled_at, content, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.owner_id)
        .bind(&post.draft_id)
        .bind(post.platform.as_str())
        .bind(post.scheduled_at)
        .bind(&post.content)
        .bind(post.created_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(true)
    }

    /// Delete a scheduled post and return its item to draft, atomically
    pub async fn delete_scheduled_post_and_revert(
        &self,
        owner_id: &str,
        post_id: &str,
    ) -> Result<Option<ScheduledPost>> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        let row = sqlx::query(
            r#"
            DELETE FROM scheduled_posts WHERE id = ? AND owner_id = ?
            RETURNING id, owner_id, draft_id, platform, scheduled_at, content, created_at
            "#,
        )
        .bind(post_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(DbError::SqlxError)?;
            return Ok(None);
        };
        let post = scheduled_post_from_row(&row)?;

        sqlx::query(
            r#"
            UPDATE content_items SET status = 'draft', updated_at = ?
            WHERE id = ? AND status = 'scheduled'
            "#,
        )
        .bind(chrono::Utc::now().timestamp())
        .bind(&post.draft_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(Some(post))
    }

    /// Consume a scheduled post as published, atomically
    ///
    /// Deletes the scheduled post, flips the item to published and records a
    /// published post row.
    pub async fn publish_scheduled_post(
        &self,
        owner_id: &str,
        post_id: &str,
        published_at: i64,
    ) -> Result<Option<PublishedPost>> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        let row = sqlx::query(
            r#"
            DELETE FROM scheduled_posts WHERE id = ? AND owner_id = ?
            RETURNING id, owner_id, draft_id, platform, scheduled_at, content, created_at
            "#,
        )
        .bind(post_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(DbError::SqlxError)?;
            return Ok(None);
        };
        let scheduled = scheduled_post_from_row(&row)?;

        let flipped = sqlx::query(
            r#"
            UPDATE content_items SET status = 'published', updated_at = ?
            WHERE id = ? AND status = 'scheduled'
            "#,
        )
        .bind(published_at)
        .bind(&scheduled.draft_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        if flipped.rows_affected() == 0 {
            tx.rollback().await.map_err(DbError::SqlxError)?;
            return Ok(None);
        }

        let published = PublishedPost {
            id: scheduled.id,
            owner_id: scheduled.owner_id,
            draft_id: scheduled.draft_id,
            platform: scheduled.platform,
            published_at,
        };

        sqlx::query(
            r#"
            INSERT INTO published_posts (id, owner_id, draft_id, platform, published_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&published.id)
        .bind(&published.owner_id)
        .bind(&published.draft_id)
        .bind(published.platform.as_str())
        .bind(published.published_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(Some(published))
    }

    pub async fn get_scheduled_post(&self, owner_id: &str, id: &str) -> Result<Option<ScheduledPost>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, draft_id, platform, scheduled_at, content, created_at
            FROM scheduled_posts WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.map(|r| scheduled_post_from_row(&r)).transpose()
    }

    /// An owner's scheduled posts, soonest first
    pub async fn list_scheduled_posts(&self, owner_id: &str) -> Result<Vec<ScheduledPost>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, draft_id, platform, scheduled_at, content, created_at
            FROM scheduled_posts WHERE owner_id = ?
            ORDER BY scheduled_at ASC, created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(scheduled_post_from_row).collect()
    }

    pub async fn count_scheduled_posts(&self, owner_id: &str, platform: Option<Platform>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM scheduled_posts WHERE owner_id = ? AND (? IS NULL OR platform = ?)",
        )
        .bind(owner_id)
        .bind(platform.map(|p| p.as_str()))
        .bind(platform.map(|p| p.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(count)
    }

    pub async fn get_published_post(&self, owner_id: &str, id: &str) -> Result<Option<PublishedPost>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, draft_id, platform, published_at
            FROM published_posts WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.map(|r| published_post_from_row(&r)).transpose()
    }

    /// Posts published at or after `since`, newest first
    pub async fn list_published_posts(&self, owner_id: &str, since: i64) -> Result<Vec<PublishedPost>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, draft_id, platform, published_at
            FROM published_posts WHERE owner_id = ? AND published_at >= ?
            ORDER BY published_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(published_post_from_row).collect()
    }

    // ---------------------------------------------------------------------
    // Metrics
    // ---------------------------------------------------------------------

    /// Store the latest counters for a published post, replacing older ones
    pub async fn record_metrics(&self, post_id: &str, metrics: &PostMetrics, recorded_at: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO post_metrics (post_id, views, likes, comments, shares, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(post_id) DO UPDATE SET
                views = excluded.views,
                likes = excluded.likes,
                comments = excluded.comments,
                shares = excluded.shares,
                recorded_at = excluded.recorded_at
            "#,
        )
        .bind(post_id)
        .bind(to_sql_count(metrics.views)?)
        .bind(to_sql_count(metrics.likes)?)
        .bind(to_sql_count(metrics.comments)?)
        .bind(to_sql_count(metrics.shares)?)
        .bind(recorded_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    pub async fn get_metrics(&self, post_id: &str) -> Result<Option<PostMetrics>> {
        let row = sqlx::query(
            "SELECT views, likes, comments, shares FROM post_metrics WHERE post_id = ?",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.map(|r| {
            Ok(PostMetrics {
                views: from_sql_count(&r, "views")?,
                likes: from_sql_count(&r, "likes")?,
                comments: from_sql_count(&r, "comments")?,
                shares: from_sql_count(&r, "shares")?,
            })
        })
        .transpose()
    }
}

fn user_from_row(row: &SqliteRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        niche: row.get("niche"),
        password_salt: row.get("password_salt"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

fn content_item_from_row(row: &SqliteRow) -> Result<ContentItem> {
    Ok(ContentItem {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        platform: parse_column(row, "content_items", "platform")?,
        idea: row.get("idea"),
        caption: row.get("caption"),
        script: row.get("script"),
        status: parse_column(row, "content_items", "status")?,
        created_at: row.get("created_at"),
    })
}

fn connected_account_from_row(row: &SqliteRow) -> Result<ConnectedAccount> {
    Ok(ConnectedAccount {
        owner_id: row.get("owner_id"),
        platform: parse_column(row, "connected_accounts", "platform")?,
        profile_url: row.get("profile_url"),
        connected_at: row.get("connected_at"),
    })
}

fn scheduled_post_from_row(row: &SqliteRow) -> Result<ScheduledPost> {
    Ok(ScheduledPost {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        draft_id: row.get("draft_id"),
        platform: parse_column(row, "scheduled_posts", "platform")?,
        scheduled_at: row.get("scheduled_at"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    })
}

fn published_post_from_row(row: &SqliteRow) -> Result<PublishedPost> {
    Ok(PublishedPost {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        draft_id: row.get("draft_id"),
        platform: parse_column(row, "published_posts", "platform")?,
        published_at: row.get("published_at"),
    })
}

fn parse_column<T>(row: &SqliteRow, table: &'static str, column: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.get(column);
    raw.parse::<T>().map_err(|e| {
        DbError::Corrupt {
            table,
            reason: format!("{}: {}", column, e),
        }
        .into()
    })
}

fn to_sql_count(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| {
        CreatorcastError::Validation(format!("Counter {} is too large to store", value))
    })
}

fn from_sql_count(row: &SqliteRow, column: &str) -> Result<u64> {
    let raw: i64 = row.get(column);
    u64::try_from(raw).map_err(|_| {
        DbError::Corrupt {
            table: "post_metrics",
            reason: format!("{} is negative: {}", column, raw),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CreatorcastError;
    use crate::types::NewDraft;
    use tempfile::TempDir;

    fn draft(owner: &str, idea: &str) -> ContentItem {
        ContentItem::from_new(owner, NewDraft::new("Title", idea, Platform::Youtube)).unwrap()
    }

    fn scheduled_for(item: &ContentItem) -> ScheduledPost {
        let now = chrono::Utc::now().timestamp();
        ScheduledPost {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: item.owner_id.clone(),
            draft_id: item.id.clone(),
            platform: item.platform,
            scheduled_at: now + 3600,
            content: item.snapshot(),
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_new_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("dir").join("cc.db");

        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        assert!(db_path.exists());
        assert!(db.list_content_items("o", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_fails_when_parent_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let result = Database::new(blocker.join("cc.db").to_str().unwrap()).await;
        assert!(matches!(result, Err(CreatorcastError::Database(_))));
    }

    #[tokio::test]
    async fn test_content_item_round_trip_and_ownership() {
        let db = Database::in_memory().await.unwrap();
        let item = draft("alice", "launch video");
        db.insert_content_item(&item).await.unwrap();

        let loaded = db.get_content_item("alice", &item.id).await.unwrap().unwrap();
        assert_eq!(loaded, item);

        assert!(db.get_content_item("bob", &item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_idea_rejected_by_schema() {
        let db = Database::in_memory().await.unwrap();
        let mut item = draft("alice", "placeholder");
        item.idea = "   ".to_string();

        assert!(db.insert_content_item(&item).await.is_err());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_status_filter() {
        let db = Database::in_memory().await.unwrap();
        let mut older = draft("alice", "older");
        older.created_at -= 100;
        let newer = draft("alice", "newer");
        db.insert_content_item(&older).await.unwrap();
        db.insert_content_item(&newer).await.unwrap();
        db.insert_content_item(&draft("bob", "not yours")).await.unwrap();

        let items = db.list_content_items("alice", None).await.unwrap();
        let ideas: Vec<_> = items.iter().map(|i| i.idea.as_str()).collect();
        assert_eq!(ideas, vec!["newer", "older"]);

        assert!(db.insert_scheduled_post(&scheduled_for(&older)).await.unwrap());
        let drafts = db
            .list_content_items("alice", Some(ContentStatus::Draft))
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].idea, "newer");
        assert_eq!(
            db.count_content_items("alice", Some(ContentStatus::Scheduled))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_save_content_fields_never_touches_status() {
        let db = Database::in_memory().await.unwrap();
        let item = draft("alice", "idea");
        db.insert_content_item(&item).await.unwrap();

        let mut edited = item.clone();
        edited.title = "Edited".to_string();
        edited.status = ContentStatus::Published;
        assert!(db.save_content_fields(&edited).await.unwrap());

        let loaded = db.get_content_item("alice", &item.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Edited");
        assert_eq!(loaded.status, ContentStatus::Draft);
    }

    #[tokio::test]
    async fn test_replace_enrichment_single_column() {
        let db = Database::in_memory().await.unwrap();
        let mut item = draft("alice", "idea");
        item.script = Some("my script".to_string());
        db.insert_content_item(&item).await.unwrap();

        assert!(db
            .replace_enrichment("alice", &item.id, GenerationKind::Caption, "fresh caption")
            .await
            .unwrap());
        assert!(!db
            .replace_enrichment("bob", &item.id, GenerationKind::Caption, "stolen")
            .await
            .unwrap());

        let loaded = db.get_content_item("alice", &item.id).await.unwrap().unwrap();
        assert_eq!(loaded.caption.as_deref(), Some("fresh caption"));
        assert_eq!(loaded.script.as_deref(), Some("my script"));
    }

    #[tokio::test]
    async fn test_insert_scheduled_post_requires_draft() {
        let db = Database::in_memory().await.unwrap();
        let item = draft("alice", "idea");
        db.insert_content_item(&item).await.unwrap();

        assert!(db.insert_scheduled_post(&scheduled_for(&item)).await.unwrap());
        // Second attempt loses: the item is no longer a draft
        assert!(!db.insert_scheduled_post(&scheduled_for(&item)).await.unwrap());

        assert_eq!(db.list_scheduled_posts("alice").await.unwrap().len(), 1);
        let loaded = db.get_content_item("alice", &item.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ContentStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_revert_restores_draft_and_is_single_shot() {
        let db = Database::in_memory().await.unwrap();
        let item = draft("alice", "idea");
        db.insert_content_item(&item).await.unwrap();
        let post = scheduled_for(&item);
        db.insert_scheduled_post(&post).await.unwrap();

        let removed = db
            .delete_scheduled_post_and_revert("alice", &post.id)
            .await
            .unwrap();
        assert_eq!(removed, Some(post.clone()));
        assert!(db
            .delete_scheduled_post_and_revert("alice", &post.id)
            .await
            .unwrap()
            .is_none());

        let loaded = db.get_content_item("alice", &item.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ContentStatus::Draft);
    }

    #[tokio::test]
    async fn test_publish_moves_post_to_published() {
        let db = Database::in_memory().await.unwrap();
        let item = draft("alice", "idea");
        db.insert_content_item(&item).await.unwrap();
        let post = scheduled_for(&item);
        db.insert_scheduled_post(&post).await.unwrap();

        let now = chrono::Utc::now().timestamp();
        let published = db
            .publish_scheduled_post("alice", &post.id, now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(published.draft_id, item.id);

        assert!(db.get_scheduled_post("alice", &post.id).await.unwrap().is_none());
        let loaded = db.get_content_item("alice", &item.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ContentStatus::Published);
        assert_eq!(db.list_published_posts("alice", now - 10).await.unwrap().len(), 1);
        assert!(db.list_published_posts("alice", now + 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_content_item_cascades_to_scheduled_post() {
        let db = Database::in_memory().await.unwrap();
        let item = draft("alice", "idea");
        db.insert_content_item(&item).await.unwrap();
        let post = scheduled_for(&item);
        db.insert_scheduled_post(&post).await.unwrap();

        let cancelled = db.delete_content_item("alice", &item.id).await.unwrap();
        assert_eq!(cancelled, Some(vec![post]));
        assert!(db.list_scheduled_posts("alice").await.unwrap().is_empty());
        assert!(db.delete_content_item("alice", &item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connected_account_upsert() {
        let db = Database::in_memory().await.unwrap();
        let mut account = ConnectedAccount {
            owner_id: "alice".to_string(),
            platform: Platform::Youtube,
            profile_url: "https://youtube.com/a".to_string(),
            connected_at: 1,
        };
        db.upsert_connected_account(&account).await.unwrap();
        account.profile_url = "https://youtube.com/b".to_string();
        db.upsert_connected_account(&account).await.unwrap();

        let accounts = db.list_connected_accounts("alice").await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].profile_url, "https://youtube.com/b");

        assert!(db.delete_connected_account("alice", Platform::Youtube).await.unwrap());
        assert!(!db.delete_connected_account("alice", Platform::Youtube).await.unwrap());
    }

    #[tokio::test]
    async fn test_metrics_upsert() {
        let db = Database::in_memory().await.unwrap();
        let item = draft("alice", "idea");
        db.insert_content_item(&item).await.unwrap();
        let post = scheduled_for(&item);
        db.insert_scheduled_post(&post).await.unwrap();
        db.publish_scheduled_post("alice", &post.id, 10).await.unwrap();

        assert!(db.get_metrics(&post.id).await.unwrap().is_none());

        let first = PostMetrics { views: 10, likes: 1, comments: 0, shares: 0 };
        let second = PostMetrics { views: 50, likes: 5, comments: 2, shares: 1 };
        db.record_metrics(&post.id, &first, 11).await.unwrap();
        db.record_metrics(&post.id, &second, 12).await.unwrap();

        assert_eq!(db.get_metrics(&post.id).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_metrics_for_unknown_post_rejected() {
        let db = Database::in_memory().await.unwrap();
        let result = db.record_metrics("missing", &PostMetrics::default(), 1).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_tokens_expire() {
        let db = Database::in_memory().await.unwrap();
        let user = UserRecord {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            display_name: "alice".to_string(),
            niche: None,
            password_salt: "salt".to_string(),
            password_hash: "hash".to_string(),
            created_at: 0,
        };
        assert!(db.insert_user(&user).await.unwrap());
        db.insert_auth_token("live", "u1", 0, 200).await.unwrap();
        db.insert_auth_token("stale", "u1", 0, 50).await.unwrap();

        assert!(db.find_user_by_token("live", 100).await.unwrap().is_some());
        assert!(db.find_user_by_token("stale", 100).await.unwrap().is_none());
        assert_eq!(db.purge_expired_tokens(100).await.unwrap(), 1);
        assert!(db.delete_auth_token("live").await.unwrap());
        assert!(db
            .find_user_by_email("ALICE@example.com")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_insert_user_reports_taken_identity() {
        let db = Database::in_memory().await.unwrap();
        let user = UserRecord {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            display_name: "alice".to_string(),
            niche: None,
            password_salt: "salt".to_string(),
            password_hash: "hash".to_string(),
            created_at: 0,
        };
        assert!(db.insert_user(&user).await.unwrap());

        let same_email = UserRecord {
            id: "u2".to_string(),
            username: "alice2".to_string(),
            ..user.clone()
        };
        assert!(!db.insert_user(&same_email).await.unwrap());

        let same_username = UserRecord {
            id: "u3".to_string(),
            email: "other@example.com".to_string(),
            ..user
        };
        assert!(!db.insert_user(&same_username).await.unwrap());
    }
}
