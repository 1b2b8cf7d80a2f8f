//! cast-report - Engagement reports for published posts
//!
//! Reports are computed on demand from the metrics recorded for each
//! published post. Nothing here is stored.

use clap::{Parser, Subcommand};
use libcreatorcast::logging::LoggingConfig;
use libcreatorcast::service::Overview;
use libcreatorcast::types::{AnalyticsReport, PostMetrics};
use libcreatorcast::{CreatorcastService, Result};

#[derive(Parser, Debug)]
#[command(name = "cast-report")]
#[command(version)]
#[command(about = "Engagement reports for published posts")]
#[command(long_about = "\
cast-report - Engagement reports for published posts

COMMANDS:
    weekly    Totals and a short narrative for the trailing window
    overview  Counts of drafts, scheduled and published items
    metrics   Record the latest counters for a published post

The window length comes from [analytics] window_days (default 7).
Posts with no recorded metrics are left out of the weekly report.

USAGE EXAMPLES:
    cast-report weekly
    cast-report weekly --format json
    cast-report metrics <POST_ID> --views 1200 --likes 80 --comments 12 --shares 5

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Not logged in
    3 - Invalid input or post not found
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
    /// Weekly engagement report
    Weekly {
        /// Output format: text or json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Item counts by status
    Overview {
        /// Output format: text or json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Record metrics for a published post
    Metrics {
        post_id: String,

        #[arg(long, default_value = "0")]
        views: u64,

        #[arg(long, default_value = "0")]
        likes: u64,

        #[arg(long, default_value = "0")]
        comments: u64,

        #[arg(long, default_value = "0")]
        shares: u64,
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
        Commands::Weekly { format } => {
            let report = service.analytics().weekly_report(session).await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Overview { format } => {
            let overview = service.overview(session).await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                print_overview(&overview);
            }
        }
        Commands::Metrics {
            post_id,
            views,
            likes,
            comments,
            shares,
        } => {
            let metrics = PostMetrics {
                views,
                likes,
                comments,
                shares,
            };
            tracing::debug!("Recording {:?} for {}", metrics, post_id);
            service
                .analytics()
                .record_metrics(session, &post_id, metrics)
                .await?;
            println!("Recorded metrics for {}", post_id);
        }
    }

    Ok(())
}

fn print_report(report: &AnalyticsReport) {
    let totals = &report.analytics;
    println!("Period:     {}", totals.period);
    println!("Posts:      {}", totals.total_posts);
    println!("Views:      {}", totals.total_views);
    println!("Likes:      {}", totals.total_likes);
    println!("Comments:   {}", totals.total_comments);
    println!("Shares:     {}", totals.total_shares);
    println!("Engagement: {:.2} per post", totals.average_engagement);

    if !totals.posts_by_platform.is_empty() {
        println!("\nBy platform:");
        for (platform, count) in &totals.posts_by_platform {
            println!("  {:<10} {}", platform.as_str(), count);
        }
    }

    if !report.summary.is_empty() {
        println!("\n{}", report.summary);
    }
}

fn print_overview(overview: &Overview) {
    println!("Drafts:    {}", overview.drafts);
    println!("Scheduled: {}", overview.scheduled);
    println!("Published: {}", overview.published);
    println!("Accounts:  {}", overview.connected_accounts);
}
