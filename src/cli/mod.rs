//! CLI argument parsing for filerec
//!
//! Global flags: --format, --quiet, --verbose, --log-level, --log-json, --config

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use output::OutputFormat;

/// Filerec - batch file recommendations from content and ratings
#[derive(Parser, Debug)]
#[command(name = "filerec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Log phase timings and debug detail
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level or filter directive (e.g. `info`, `filerec_core=trace`)
    #[arg(long, global = true, env = "FILEREC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the recommendation job over a directory of files
    Run {
        /// Directory holding the files; subdirectories name their owner
        #[arg(long)]
        files: PathBuf,

        /// JSON file of user interactions or ratings
        #[arg(long)]
        ratings: PathBuf,

        /// JSON file of group memberships and group weights
        #[arg(long)]
        groups: Option<PathBuf>,

        /// SQLite database for results (in-memory when omitted)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Owner of files placed directly in the files directory
        #[arg(long, default_value = "admin")]
        owner: String,

        /// Skip the run when the recompute interval has not passed
        #[arg(long, requires = "db")]
        if_due: bool,
    },

    /// Print the text extracted from a file
    Extract {
        /// File to extract
        file: PathBuf,

        /// Media type, guessed from the extension when omitted
        #[arg(long)]
        media_type: Option<String>,
    },

    /// Print a file's TF-IDF keywords
    Keywords {
        /// File to score
        file: PathBuf,

        /// Directory used as the document corpus
        #[arg(long)]
        files: Option<PathBuf>,

        /// Maximum keywords to print
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: usize,
    },
}
