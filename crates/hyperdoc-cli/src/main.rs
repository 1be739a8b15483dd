//! hyperdoc command-line tool.
//!
//! Usage:
//!   hyperdoc id 'hm://z6Mk.../notes?v=bafy...#blockId[2:9]'
//!   hyperdoc encode editor.json > canonical.json
//!   hyperdoc decode canonical.json
//!   hyperdoc comment --target hm://z6Mk.../doc --version bafy... --seed-hex <hex> body.json
//!   hyperdoc summarize --target hm://z6Mk.../doc mentions.json
//!
//! Output is JSON on stdout; logs go to stderr.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use crate::commands::CommentArgs;
use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "hyperdoc")]
#[command(about = "Hypermedia identifiers, block codec and signed comments")]
struct Args {
    /// Config file (default: ~/.config/hyperdoc/config.ron)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse an identifier and print its forms
    Id { url: String },

    /// Editor blocks (JSON) to canonical block nodes
    Encode { file: PathBuf },

    /// Canonical block nodes (JSON) to editor blocks
    Decode { file: PathBuf },

    /// Build and sign a comment on a document version
    Comment {
        /// Document being commented on
        #[arg(long)]
        target: String,

        /// `.`-joined head CIDs of the commented version
        #[arg(long)]
        version: String,

        /// Hex ed25519 seed (32 bytes)
        #[arg(long)]
        seed_hex: String,

        /// CID of the comment being replied to
        #[arg(long)]
        reply_parent: Option<String>,

        /// CID of the thread's first comment (defaults to --reply-parent)
        #[arg(long)]
        thread_root: Option<String>,

        /// Block of the target to quote
        #[arg(long)]
        quote_block: Option<String>,

        /// Unix ms timestamp instead of now
        #[arg(long)]
        timestamp: Option<u64>,

        /// Comment body as editor blocks (JSON)
        file: PathBuf,
    },

    /// Citation / comment counts for a document from mention records
    Summarize {
        #[arg(long)]
        target: String,

        /// JSON array of mention records
        mentions: PathBuf,
    },
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(config.log_filter.as_deref().unwrap_or("info"))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    });
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = CliConfig::load(args.config.as_deref())?;
    init_tracing(&config);
    tracing::debug!(
        gateway = %config.gateway_url,
        max_concurrency = config.resolver.max_concurrency,
        "loaded config"
    );

    let output = match &args.command {
        Command::Id { url } => commands::id(url, &config.gateway_url)?,
        Command::Encode { file } => commands::encode(file)?,
        Command::Decode { file } => commands::decode(file)?,
        Command::Comment {
            target,
            version,
            seed_hex,
            reply_parent,
            thread_root,
            quote_block,
            timestamp,
            file,
        } => {
            commands::comment(CommentArgs {
                target,
                version,
                seed_hex,
                content: file,
                reply_parent: reply_parent.as_deref(),
                thread_root: thread_root.as_deref(),
                quote_block: quote_block.as_deref(),
                timestamp: *timestamp,
            })
            .await?
        }
        Command::Summarize { target, mentions } => commands::summarize(target, mentions)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
