//! cast-draft - Write and enrich content drafts
//!
//! Drafts hold an idea plus optional caption and script. Captions and scripts
//! can be written by hand or generated by the configured assistant.

use clap::{Parser, Subcommand};
use libcreatorcast::logging::LoggingConfig;
use libcreatorcast::service::drafts::EnrichRequest;
use libcreatorcast::types::{ContentItem, ContentStatus, DraftUpdate, NewDraft};
use libcreatorcast::{CreatorcastError, CreatorcastService, Platform, Result};
use std::io::{self, Read};

#[derive(Parser, Debug)]
#[command(name = "cast-draft")]
#[command(version)]
#[command(about = "Write and enrich content drafts")]
#[command(long_about = "\
cast-draft - Write and enrich content drafts

COMMANDS:
    create   Create a draft from an idea (reads stdin if no idea is given)
    show     Show one draft
    list     List drafts, newest first
    update   Change title, idea, platform, caption or script
    delete   Delete a draft, cancelling any post scheduled from it
    caption  Generate a caption with the assistant
    script   Generate a script with the assistant

USAGE EXAMPLES:
    cast-draft create \"launch video for my app\" --platform youtube
    echo \"meal prep tips\" | cast-draft create --platform tiktok
    cast-draft caption <DRAFT_ID>
    cast-draft update <DRAFT_ID> --title \"Launch day\"
    cast-draft update <DRAFT_ID> --json '{\"caption\": \"We are live!\"}'
    cast-draft list --status draft --format json

Generating a caption or script replaces the current one.

EXIT CODES:
    0 - Success
    1 - Operation failed (including assistant failures)
    2 - Not logged in
    3 - Invalid input or draft not found
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
    /// Create a draft
    Create {
        /// The idea (reads stdin if not provided)
        idea: Option<String>,

        #[arg(short, long, default_value = "")]
        title: String,

        /// Target platform (defaults to [defaults] platform)
        #[arg(short, long)]
        platform: Option<String>,

        #[arg(long)]
        caption: Option<String>,

        #[arg(long)]
        script: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Show one draft
    Show {
        id: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// List drafts
    List {
        /// Only items with this status (draft, scheduled, published)
        #[arg(short, long)]
        status: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Update fields of a draft
    Update {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        idea: Option<String>,

        #[arg(short, long)]
        platform: Option<String>,

        /// New caption (empty string clears it)
        #[arg(long)]
        caption: Option<String>,

        /// New script (empty string clears it)
        #[arg(long)]
        script: Option<String>,

        /// JSON patch with any of: title, idea, platform, caption, script
        #[arg(long, conflicts_with_all = ["title", "idea", "platform", "caption", "script"])]
        json: Option<String>,
    },

    /// Delete a draft
    Delete { id: String },

    /// Generate a caption
    Caption {
        id: String,

        /// Generate from this idea instead of the stored one
        #[arg(short, long)]
        idea: Option<String>,

        /// Generate for this platform instead of the stored one
        #[arg(short, long)]
        platform: Option<String>,
    },

    /// Generate a script
    Script {
        id: String,

        /// Generate from this idea instead of the stored one
        #[arg(short, long)]
        idea: Option<String>,

        /// Generate for this platform instead of the stored one
        #[arg(short, long)]
        platform: Option<String>,
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
        Commands::Create {
            idea,
            title,
            platform,
            caption,
            script,
            format,
        } => {
            let idea = match idea {
                Some(idea) => idea,
                None => read_idea_from_stdin()?,
            };
            let platform = match platform {
                Some(p) => p.parse::<Platform>()?,
                None => service.config().defaults.platform,
            };

            let mut draft = NewDraft::new(title, idea, platform);
            draft.caption = caption;
            draft.script = script;

            tracing::debug!("Creating {} draft", platform.display_name());
            let item = service.drafts().create(session, draft).await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&item)?);
            } else {
                println!("{}", item.id);
            }
        }
        Commands::Show { id, format } => {
            let item = service.drafts().get(session, &id).await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&item)?);
            } else {
                print_item(&item);
            }
        }
        Commands::List { status, format } => {
            let status = status
                .as_deref()
                .map(str::parse::<ContentStatus>)
                .transpose()?;
            let items = service.drafts().list(session, status).await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for item in &items {
                    println!(
                        "{} | {:<9} | {:<9} | {}",
                        item.id,
                        item.platform.as_str(),
                        item.status.as_str(),
                        preview(&item.idea, 50)
                    );
                }
            }
        }
        Commands::Update {
            id,
            title,
            idea,
            platform,
            caption,
            script,
            json,
        } => {
            let update = match json {
                Some(patch) => DraftUpdate::from_json(&patch)?,
                None => DraftUpdate {
                    title,
                    idea,
                    platform: platform.map(|p| p.parse::<Platform>()).transpose()?,
                    caption,
                    script,
                },
            };
            let item = service.drafts().update(session, &id, update).await?;
            print_item(&item);
        }
        Commands::Delete { id } => {
            let cancelled = service.drafts().delete(session, &id).await?;
            if cancelled > 0 {
                println!("Deleted {} and cancelled {} scheduled post(s)", id, cancelled);
            } else {
                println!("Deleted {}", id);
            }
        }
        Commands::Caption { id, idea, platform } => {
            let item = service
                .drafts()
                .enrich_caption(session, enrich_request(id, idea, platform)?)
                .await?;
            println!("{}", item.caption.unwrap_or_default());
        }
        Commands::Script { id, idea, platform } => {
            let item = service
                .drafts()
                .enrich_script(session, enrich_request(id, idea, platform)?)
                .await?;
            println!("{}", item.script.unwrap_or_default());
        }
    }

    Ok(())
}

fn enrich_request(draft_id: String, idea: Option<String>, platform: Option<String>) -> Result<EnrichRequest> {
    Ok(EnrichRequest {
        draft_id,
        idea,
        platform: platform.map(|p| p.parse::<Platform>()).transpose()?,
    })
}

fn read_idea_from_stdin() -> Result<String> {
    if atty::is(atty::Stream::Stdin) {
        return Err(CreatorcastError::Validation(
            "No idea given. Pass it as an argument or pipe it on stdin".to_string(),
        ));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| CreatorcastError::Validation(format!("Failed to read stdin: {}", e)))?;
    Ok(buffer.trim().to_string())
}

fn print_item(item: &ContentItem) {
    println!("ID:       {}", item.id);
    if !item.title.is_empty() {
        println!("Title:    {}", item.title);
    }
    println!("Platform: {}", item.platform.display_name());
    println!("Status:   {}", item.status);
    println!("Idea:     {}", item.idea);
    if let Some(caption) = &item.caption {
        println!("\nCaption:\n{}", caption);
    }
    if let Some(script) = &item.script {
        println!("\nScript:\n{}", script);
    }
}

/// Truncate to `max_chars` characters with an ellipsis
fn preview(text: &str, max_chars: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let truncated: String = single_line.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
