use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::Mode;

pub const DEFAULT_MODEL: &str = "openai/gpt-4o";
pub const DEFAULT_EMBEDDING_MODEL: &str = "openai/text-embedding-3-small";
pub const DEFAULT_MAX_ESTIMATED_COST: f64 = 5.0;

/// Arcode CLI - build features on a codebase with an LLM
#[derive(Parser, Debug)]
#[command(name = "arcode")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Working directory of the codebase (defaults to the git root or current directory)
    #[arg(short = 'd', long, env = "ARCODE_DIR")]
    pub dir: Option<String>,

    /// Model for completions, as provider/name
    #[arg(short = 'm', long, env = "ARCODE_MODEL")]
    pub model: Option<String>,

    /// Model for embeddings in focused mode
    #[arg(long, env = "ARCODE_MODEL_EMBEDDING")]
    pub model_embedding: Option<String>,

    /// Upload only the N most relevant file chunks
    #[arg(long, value_name = "N")]
    pub focused: Option<usize>,

    /// Extra gitignore-style patterns to exclude
    #[arg(short = 'i', long, value_name = "PATTERN", num_args = 1..)]
    pub ignore: Vec<String>,

    /// Skip files larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_file_size: Option<u64>,

    /// Refuse to send when the estimated cost exceeds this many USD
    #[arg(long, value_name = "USD")]
    pub max_estimated_cost: Option<f64>,

    /// Write the changeset to disk without asking
    #[arg(short = 'w', long)]
    pub write: bool,

    #[arg(long, value_enum, default_value_t = Mode::Implement)]
    pub mode: Mode,

    /// URLs whose content is added to the prompt
    #[arg(long, value_name = "URL", num_args = 1..)]
    pub resources: Vec<String>,

    /// Images to attach to the prompt
    #[arg(long, value_name = "PATH", num_args = 1..)]
    pub images: Vec<PathBuf>,

    /// Maximum tokens in the response
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Do not ask for confirmation before sending
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Config file (defaults to ~/.arcode/config.json)
    #[arg(long, env = "ARCODE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Requirements for the features to build (or the question to ask)
    pub requirements: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Preview files that will be uploaded (dry-run)
    Preview {
        /// Workspace root (defaults to current directory or git root)
        #[arg(short = 'd', long)]
        dir: Option<String>,

        /// Extra gitignore-style patterns to exclude
        #[arg(short = 'i', long, value_name = "PATTERN", num_args = 1..)]
        ignore: Vec<String>,

        /// Skip files larger than this many bytes
        #[arg(long, value_name = "BYTES")]
        max_file_size: Option<u64>,

        /// Show all files (not just summary)
        #[arg(short, long)]
        verbose: bool,
    },
    /// List models with known pricing
    Models {
        /// Only show models containing this text
        filter: Option<String>,
    },
}
