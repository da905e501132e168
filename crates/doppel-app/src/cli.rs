use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "doppel", about = "Doppel: a digital twin built from your own writing")]
pub struct Cli {
    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split text files under a directory into chunks and store them
    Ingest { dir: PathBuf },

    /// List stored chunks
    Chunks,

    /// Analyze all stored chunks and save a new active profile
    Analyze,

    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Send one message to the twin
    Chat {
        #[arg(long)]
        message: String,
        /// Continue an existing conversation
        #[arg(long)]
        conversation: Option<String>,
    },

    /// Check a reply against the active profile without generating anything
    Validate {
        #[arg(long)]
        response: String,
    },

    /// Score a reply for style (against retrieved passages) and basic quality
    Evaluate {
        #[arg(long)]
        response: String,
        #[arg(long)]
        query: String,
    },

    #[command(subcommand)]
    Feedback(FeedbackCommand),

    /// List conversations, or show the messages of one
    Conversations {
        #[arg(long)]
        id: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Print the active profile (or a given version) as JSON
    Show {
        #[arg(long)]
        version: Option<u32>,
        /// Print the prompt rendering instead of JSON
        #[arg(long)]
        text: bool,
    },
    /// List all versions, newest first
    List,
    /// Make an existing version active
    Activate { version: u32 },
    /// Save a profile read from a JSON file as a new version
    Edit {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum FeedbackCommand {
    /// Rate an assistant message from 1 to 5
    Submit {
        #[arg(long)]
        message_id: String,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Rating totals and distribution
    Stats,
    /// Summary of low-rated replies
    Improvements {
        #[arg(long, default_value_t = doppel_ai::feedback::DEFAULT_LOW_RATING_THRESHOLD)]
        threshold: u8,
    },
}
