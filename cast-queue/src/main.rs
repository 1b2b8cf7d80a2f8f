//! cast-queue - Schedule drafts and manage the post queue
//!
//! Scheduling needs a connected account for the target platform and a time in
//! the future. Cancelling returns the item to draft.

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use libcreatorcast::logging::LoggingConfig;
use libcreatorcast::scheduling::{format_time_until, parse_schedule};
use libcreatorcast::service::scheduler::ScheduleRequest;
use libcreatorcast::types::ScheduledPost;
use libcreatorcast::{CreatorcastError, CreatorcastService, Platform, Result};
use std::collections::HashSet;

#[derive(Parser, Debug)]
#[command(name = "cast-queue")]
#[command(version)]
#[command(about = "Schedule drafts and manage the post queue")]
#[command(long_about = "\
cast-queue - Schedule drafts and manage the post queue

COMMANDS:
    schedule        Schedule a draft for a platform at a time
    list            List scheduled posts, soonest first
    cancel          Cancel a scheduled post (the item returns to draft)
    mark-published  Record that a scheduled post went live
    published       List published posts

TIME FORMATS:
    2h, +30m, \"2 days\"            relative to now
    \"2025-11-20 15:00\"             UTC
    2025-11-20T15:00:00+01:00     RFC 3339
    tomorrow, \"next friday 9am\"   natural language

USAGE EXAMPLES:
    cast-queue schedule <DRAFT_ID> 2h
    cast-queue schedule <DRAFT_ID> \"tomorrow 3pm\" --platform tiktok
    cast-queue list --format json
    cast-queue cancel <POST_ID>

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Not logged in
    3 - Invalid input (bad time, time in the past, unknown post)
    4 - Invalid state (not a draft, platform not connected)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Schedule a draft
    Schedule {
        draft_id: String,

        /// When to publish (e.g. "2h", "tomorrow 3pm")
        time: String,

        /// Target platform (defaults to the draft's platform)
        #[arg(short, long)]
        platform: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// List scheduled posts
    List {
        /// Only posts for this platform
        #[arg(short, long)]
        platform: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Cancel a scheduled post
    Cancel { post_id: String },

    /// Record that a scheduled post was published
    MarkPublished { post_id: String },

    /// List published posts
    Published {
        /// How many days back to look
        #[arg(short, long, default_value = "30")]
        days: i64,

        /// Output format: text or json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let service = CreatorcastService::new().await?;
    let mut sessions = service.session_manager();
    let session = sessions.resume().await?;

    match cli.command {
        Commands::Schedule {
            draft_id,
            time,
            platform,
            format,
        } => {
            let scheduled_at = parse_schedule(&time, Utc::now())?;
            tracing::debug!("Parsed '{}' as {}", time, scheduled_at.to_rfc3339());
            let platform = match platform {
                Some(p) => p.parse::<Platform>()?,
                None => match service.drafts().get(session, &draft_id).await {
                    Ok(item) => item.platform,
                    // The scheduler reports the missing draft
                    Err(CreatorcastError::NotFound(_)) => service.config().defaults.platform,
                    Err(e) => return Err(e),
                },
            };

            let post = service
                .scheduler()
                .schedule_post(
                    session,
                    ScheduleRequest {
                        draft_id,
                        platform,
                        scheduled_at,
                    },
                )
                .await?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&post)?);
            } else {
                println!(
                    "Scheduled {} on {} {}",
                    post.id,
                    post.platform.display_name(),
                    format_time_until(post.scheduled_at, Utc::now().timestamp())
                );
            }
        }
        Commands::List { platform, format } => {
            let platform = platform.map(|p| p.parse::<Platform>()).transpose()?;
            let mut posts = service.scheduler().list(session).await?;
            if let Some(platform) = platform {
                posts.retain(|p| p.platform == platform);
            }

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&posts)?);
            } else {
                let connected: HashSet<Platform> = service
                    .accounts()
                    .list(session)
                    .await?
                    .into_iter()
                    .map(|a| a.platform)
                    .collect();
                output_list_text(&posts, &connected);
            }
        }
        Commands::Cancel { post_id } => {
            let post = service.scheduler().cancel(session, &post_id).await?;
            println!("Cancelled {}; draft {} is a draft again", post.id, post.draft_id);
        }
        Commands::MarkPublished { post_id } => {
            let published = service.scheduler().mark_published(session, &post_id).await?;
            println!(
                "Marked {} as published on {}",
                published.id,
                published.platform.display_name()
            );
        }
        Commands::Published { days, format } => {
            if days < 1 {
                return Err(CreatorcastError::Validation(
                    "--days must be at least 1".to_string(),
                ));
            }
            let since = (Utc::now() - Duration::days(days)).timestamp();
            let posts = service.scheduler().list_published(session, since).await?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&posts)?);
            } else {
                for post in &posts {
                    let when = chrono::DateTime::from_timestamp(post.published_at, 0)
                        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| post.published_at.to_string());
                    println!("{} | {:<9} | {}", post.id, post.platform.as_str(), when);
                }
            }
        }
    }

    Ok(())
}

/// One line per post; posts whose platform was disconnected are flagged
fn output_list_text(posts: &[ScheduledPost], connected: &HashSet<Platform>) {
    let now = Utc::now().timestamp();

    for post in posts {
        let marker = if connected.contains(&post.platform) {
            ""
        } else {
            " (disconnected)"
        };
        println!(
            "{} | {:<9} | {} | {}{}",
            post.id,
            post.platform.as_str(),
            truncate_content(&post.content, 50),
            format_time_until(post.scheduled_at, now),
            marker
        );
    }
}

/// Truncate content to `max_chars` characters with an ellipsis
fn truncate_content(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        format!("{}...", content.chars().take(max_chars).collect::<String>())
    }
}
