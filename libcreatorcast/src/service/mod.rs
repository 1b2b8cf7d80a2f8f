//! Service layer for Creatorcast
//!
//! Business logic shared by every command-line tool. `CreatorcastService` is
//! the entry point and owns the sub-services:
//!
//! - `DraftStore`: content items and AI enrichment
//! - `AccountRegistry`: connected platform profiles
//! - `Scheduler`: lifecycle transitions (schedule, cancel, publish)
//! - `AnalyticsAggregator`: weekly reports and metrics ingestion
//! - `EventBus`: lifecycle event distribution
//!
//! Every operation takes the caller's [`Session`] explicitly.
//!
//! # Example
//!
//! ```no_run
//! use libcreatorcast::service::CreatorcastService;
//! use libcreatorcast::types::{NewDraft, Platform};
//!
//! # async fn example() -> libcreatorcast::Result<()> {
//! let service = CreatorcastService::new().await?;
//! let mut sessions = service.session_manager();
//! let session = sessions.hydrate().await.ok_or(libcreatorcast::error::AuthError::NotLoggedIn)?;
//!
//! let draft = service
//!     .drafts()
//!     .create(session, NewDraft::new("Launch", "launch video", Platform::Youtube))
//!     .await?;
//! println!("Created draft {}", draft.id);
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod analytics;
pub mod drafts;
pub mod events;
pub mod scheduler;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use self::accounts::AccountRegistry;
use self::analytics::AnalyticsAggregator;
use self::drafts::DraftStore;
use self::events::EventBus;
use self::scheduler::Scheduler;
use crate::assistant::AssistantBackends;
use crate::error::{ConfigError, CreatorcastError};
use crate::session::{open_token_store, LocalIdentityService, Session, SessionManager};
use crate::types::ContentStatus;
use crate::{Config, Database, Result};

/// Dashboard counts for one owner
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Overview {
    pub drafts: i64,
    pub scheduled: i64,
    pub published: i64,
    pub connected_accounts: i64,
}

/// Main service facade
///
/// All sub-services share one `Arc<Database>` and one `EventBus`.
pub struct CreatorcastService {
    db: Arc<Database>,
    config: Arc<Config>,
    drafts: DraftStore,
    accounts: AccountRegistry,
    scheduler: Scheduler,
    analytics: AnalyticsAggregator,
    event_bus: EventBus,
}

impl CreatorcastService {
    /// Create a service from the default configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration cannot be loaded
    /// - Database cannot be opened or migrated
    /// - The configured assistant backend cannot be built
    pub async fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config).await
    }

    /// Create a service with a pre-loaded configuration
    pub async fn from_config(config: Config) -> Result<Self> {
        let db_path = crate::config::resolve_db_path(Some(&config.database.path))?;
        let db_path_str = db_path.to_str().ok_or_else(|| {
            CreatorcastError::Config(ConfigError::InvalidValue {
                field: "database.path".to_string(),
                reason: "path is not valid UTF-8".to_string(),
            })
        })?;
        let db = Database::new(db_path_str).await?;
        let assistant = AssistantBackends::from_config(&config.assistant)?;

        Ok(Self::with_parts(db, config, assistant))
    }

    /// Assemble a service from already-built parts
    ///
    /// Tests use this with an in-memory database and mock assistant.
    pub fn with_parts(db: Database, config: Config, assistant: AssistantBackends) -> Self {
        let db = Arc::new(db);
        let event_bus = EventBus::new(100);

        let drafts = DraftStore::new(Arc::clone(&db), assistant.generator, event_bus.clone());
        let accounts = AccountRegistry::new(Arc::clone(&db), event_bus.clone());
        let scheduler = Scheduler::new(Arc::clone(&db), event_bus.clone());
        let analytics = AnalyticsAggregator::new(
            Arc::clone(&db),
            db.clone(),
            assistant.summarizer,
            config.analytics.window_days,
        );

        Self {
            db,
            config: Arc::new(config),
            drafts,
            accounts,
            scheduler,
            analytics,
            event_bus,
        }
    }

    /// A session manager wired to the local identity service and the
    /// configured token store
    pub fn session_manager(&self) -> SessionManager {
        let identity = LocalIdentityService::new(
            (*self.db).clone(),
            self.config.session.token_ttl_hours,
        );
        SessionManager::new(Arc::new(identity), open_token_store(&self.config.session))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    pub fn accounts(&self) -> &AccountRegistry {
        &self.accounts
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn analytics(&self) -> &AnalyticsAggregator {
        &self.analytics
    }

    /// Subscribe to lifecycle events
    ///
    /// Multiple subscribers are supported; each sees every event emitted
    /// after it subscribed.
    pub fn subscribe(&self) -> events::EventReceiver {
        self.event_bus.subscribe()
    }

    /// Counts for the owner's dashboard
    pub async fn overview(&self, session: &Session) -> Result<Overview> {
        let owner_id = session.owner_id();

        Ok(Overview {
            drafts: self
                .db
                .count_content_items(owner_id, Some(ContentStatus::Draft))
                .await?,
            scheduled: self.db.count_scheduled_posts(owner_id, None).await?,
            published: self
                .db
                .count_content_items(owner_id, Some(ContentStatus::Published))
                .await?,
            connected_accounts: self.accounts.list(session).await?.len() as i64,
        })
    }
}
