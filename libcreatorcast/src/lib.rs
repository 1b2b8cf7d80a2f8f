//! Creatorcast - content lifecycle tools for social media creators
//!
//! Drafts move from idea to published post: AI-assisted captions and scripts,
//! scheduling against connected platform accounts, and weekly analytics.
//! The command-line tools are thin wrappers over [`service::CreatorcastService`].

pub mod assistant;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod scheduling;
pub mod service;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use error::{CreatorcastError, Result};
pub use service::CreatorcastService;
pub use session::{Session, SessionManager};
pub use types::{ContentItem, ContentStatus, Platform};
