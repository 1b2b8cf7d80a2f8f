//! cast-accounts - Connect social platform profiles
//!
//! A platform must be connected before posts can be scheduled to it.

use clap::{Parser, Subcommand};
use libcreatorcast::logging::LoggingConfig;
use libcreatorcast::service::accounts::ConnectRequest;
use libcreatorcast::types::ConnectedAccount;
use libcreatorcast::{CreatorcastService, Platform, Result};

#[derive(Parser, Debug)]
#[command(name = "cast-accounts")]
#[command(version)]
#[command(about = "Connect social platform profiles")]
#[command(long_about = "\
cast-accounts - Connect social platform profiles

COMMANDS:
    connect     Connect (or update) a platform profile URL
    disconnect  Remove a platform connection
    list        List connected platforms

PLATFORMS:
    youtube, tiktok, twitter (or x), instagram, linkedin

USAGE EXAMPLES:
    cast-accounts connect youtube https://youtube.com/@maya
    cast-accounts list --format json
    cast-accounts disconnect tiktok

Disconnecting a platform does not cancel posts already scheduled to it;
cast-queue list marks them.

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Not logged in
    3 - Invalid input (unknown platform, bad URL)
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
    /// Connect a platform profile
    Connect {
        platform: String,

        /// Profile URL (http or https)
        url: String,
    },

    /// Remove a platform connection
    Disconnect { platform: String },

    /// List connected platforms
    List {
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
        Commands::Connect { platform, url } => {
            let platform: Platform = platform.parse()?;
            tracing::debug!("Connecting {} to {}", platform.as_str(), url);
            let accounts = service
                .accounts()
                .connect(
                    session,
                    ConnectRequest {
                        platform,
                        profile_url: url,
                    },
                )
                .await?;
            println!("Connected {}", platform.display_name());
            print_text(&accounts);
        }
        Commands::Disconnect { platform } => {
            let platform: Platform = platform.parse()?;
            let accounts = service.accounts().disconnect(session, platform).await?;
            println!("Disconnected {}", platform.display_name());
            print_text(&accounts);
        }
        Commands::List { format } => {
            let accounts = service.accounts().list(session).await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&accounts)?);
            } else {
                print_text(&accounts);
            }
        }
    }

    Ok(())
}

fn print_text(accounts: &[ConnectedAccount]) {
    for account in accounts {
        println!("{:<10} {}", account.platform.as_str(), account.profile_url);
    }
}
