//! # nimbus
//!
//! CLI tool for exercising the Nimbus SDK against a live backend.
//!
//! ## Commands
//!
//! - `get`: Fetch an object
//! - `put`: Create an object, or replace every field of one
//! - `patch`: Send only the given fields
//! - `delete`: Delete an object
//! - `download`: Save an object body to a file
//! - `classify`: Classify a legacy error string (offline)
//!
//! ## Example
//!
//! ```bash
//! # Create an object
//! nimbus put scores --data '{"points": 10}'
//!
//! # Conditionally update it (refreshes first to learn the version)
//! nimbus patch scores abc --data '{"points": 11}'
//!
//! # See what a legacy error string means
//! nimbus classify "429 : http request failed"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{classify, delete, download, get, put};
use config::{Config, ACCESS_TOKEN_ENV};

/// CLI tool for exercising the Nimbus SDK.
#[derive(Parser, Debug)]
#[command(name = "nimbus")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, short, global = true, default_value = "nimbus.toml")]
    config: PathBuf,

    /// Use a bucket owned by this user instead of an application bucket
    #[arg(long, global = true)]
    user: Option<String>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch an object and print it
    Get {
        /// Bucket name
        bucket: String,
        /// Object id
        id: String,
    },

    /// Create an object, or replace every field of an existing one
    Put {
        /// Bucket name
        bucket: String,
        /// Object id (omit to create)
        id: Option<String>,
        /// JSON object with the fields to write
        #[arg(long, short)]
        data: String,
        /// Type hint for a new object
        #[arg(long = "type")]
        type_hint: Option<String>,
        /// Skip the version check
        #[arg(long)]
        overwrite: bool,
    },

    /// Send only the given fields of an existing object
    Patch {
        /// Bucket name
        bucket: String,
        /// Object id
        id: String,
        /// JSON object with the fields to write
        #[arg(long, short)]
        data: String,
        /// Skip the version check
        #[arg(long)]
        overwrite: bool,
    },

    /// Delete an object
    Delete {
        /// Bucket name
        bucket: String,
        /// Object id
        id: String,
    },

    /// Download an object body
    Download {
        /// Bucket name
        bucket: String,
        /// Object id
        id: String,
        /// Output file
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Classify a legacy error string
    Classify {
        /// The error string
        raw: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Classification is offline; no config needed.
    if let Commands::Classify { raw } = &cli.command {
        return classify::run(raw);
    }

    let config = Config::from_file(&cli.config)
        .context("Failed to load configuration")?
        .with_token_override(std::env::var(ACCESS_TOKEN_ENV).ok());
    let target = commands::Target::connect(&config, cli.user.as_deref())?;

    match cli.command {
        Commands::Get { bucket, id } => {
            get::run(&target, &bucket, &id).await?;
        }
        Commands::Put {
            bucket,
            id,
            data,
            type_hint,
            overwrite,
        } => {
            let fields = commands::parse_fields(&data)?;
            match id {
                Some(id) => put::replace(&target, &bucket, &id, fields, overwrite).await?,
                None => put::create(&target, &bucket, fields, type_hint.as_deref()).await?,
            }
        }
        Commands::Patch {
            bucket,
            id,
            data,
            overwrite,
        } => {
            let fields = commands::parse_fields(&data)?;
            put::patch(&target, &bucket, &id, fields, overwrite).await?;
        }
        Commands::Delete { bucket, id } => {
            delete::run(&target, &bucket, &id).await?;
        }
        Commands::Download { bucket, id, output } => {
            download::run(&target, &bucket, &id, &output).await?;
        }
        Commands::Classify { raw } => {
            classify::run(&raw)?;
        }
    }

    Ok(())
}
