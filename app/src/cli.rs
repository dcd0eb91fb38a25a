use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI parser for the `quotebox` binary.
#[derive(Debug, Parser)]
#[command(name = "quotebox", version, about = "Random quotes, stored locally and synced")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show a quote: the last one viewed this session, or a random one
    Show {
        /// Category to pick from; defaults to the selected category
        #[arg(short, long)]
        category: Option<String>,
        /// Always pick a new random quote
        #[arg(short, long)]
        new: bool,
    },
    /// Add a quote and publish it to the remote
    Add { text: String, category: String },
    /// List quotes
    List {
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List distinct categories
    Categories,
    /// Remember a category filter ("all" clears it)
    Select { category: String },
    /// Import quotes from a JSON file
    Import { file: PathBuf },
    /// Export quotes as pretty-printed JSON (stdout when no file is given)
    Export { file: Option<PathBuf> },
    /// Merge the remote snapshot into the local quotes
    Sync,
    /// Restore the built-in quotes
    Reset,
    /// Sync periodically until interrupted, then end the session
    Watch,
}
