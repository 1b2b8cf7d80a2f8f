//! cast-auth - Sign up, log in and out of Creatorcast
//!
//! The session token is the only state kept between invocations. Every other
//! cast-* tool restores the session this tool establishes.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use libcreatorcast::logging::LoggingConfig;
use libcreatorcast::session::{LoginRequest, SignupRequest};
use libcreatorcast::{CreatorcastError, CreatorcastService, Session};
use std::io::{self, Read};

#[derive(Parser)]
#[command(name = "cast-auth")]
#[command(version)]
#[command(about = "Manage your Creatorcast session")]
#[command(long_about = "\
cast-auth - Manage your Creatorcast session

COMMANDS:
    signup    Create an account and log in
    login     Log in with email and password
    logout    End the session and forget the stored token
    whoami    Show the logged-in identity

USAGE EXAMPLES:
    cast-auth signup --username maya --email maya@example.com --niche cooking
    cast-auth login --email maya@example.com
    echo \"$PASSWORD\" | cast-auth login --email maya@example.com --stdin
    cast-auth whoami --format json

CONFIGURATION:
    Configuration file: ~/.config/creatorcast/config.toml
    Override with CREATORCAST_CONFIG and CREATORCAST_DB_PATH.
    The token is kept in the OS keyring, or in [session] token_file.

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Authentication failed or not logged in
    3 - Invalid input
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and log in
    Signup {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        /// Content niche, e.g. "cooking" or "tech reviews"
        #[arg(short, long)]
        niche: Option<String>,

        /// Read the password from stdin (for automation/agents)
        #[arg(long)]
        stdin: bool,
    },

    /// Log in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        /// Read the password from stdin (for automation/agents)
        #[arg(long)]
        stdin: bool,
    },

    /// End the session
    Logout,

    /// Show the logged-in identity
    Whoami {
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
        let code = e
            .downcast_ref::<CreatorcastError>()
            .map(CreatorcastError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let service = CreatorcastService::new().await?;
    let mut sessions = service.session_manager();

    match cli.command {
        Commands::Signup {
            username,
            email,
            niche,
            stdin,
        } => {
            let password = read_password(stdin)?;
            let session = sessions
                .signup(SignupRequest {
                    username,
                    email,
                    password,
                    niche,
                })
                .await?;
            println!("Signed up and logged in as {}", describe(session));
        }
        Commands::Login { email, stdin } => {
            let password = read_password(stdin)?;
            let session = sessions.login(LoginRequest { email, password }).await?;
            println!("Logged in as {}", describe(session));
        }
        Commands::Logout => {
            sessions.logout().await;
            println!("Logged out");
        }
        Commands::Whoami { format } => {
            let session = sessions.resume().await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(session.identity())?);
            } else {
                println!("{}", describe(session));
                if let Some(niche) = &session.identity().niche {
                    println!("Niche: {}", niche);
                }
            }
        }
    }

    tracing::debug!("Session token backend: {}", sessions.store_backend());
    Ok(())
}

fn describe(session: &Session) -> String {
    format!(
        "{} ({})",
        session.display_name(),
        session.identity().username
    )
}

/// Password from stdin when asked (or piped), otherwise a hidden prompt
fn read_password(use_stdin: bool) -> Result<String> {
    let password = if use_stdin || !atty::is(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer.trim_end_matches(['\r', '\n']).to_string()
    } else {
        rpassword::prompt_password("Password: ")?
    };

    if password.is_empty() {
        bail!(CreatorcastError::Validation(
            "Password cannot be empty".to_string()
        ));
    }
    Ok(password)
}
