use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "quotd")]
#[command(about = "Keep a quote collection and sync it with a remote source")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a quote to the collection
    #[command(alias = "new")]
    Add {
        /// Quote text
        text: Vec<String>,
        /// Category the quote belongs to
        #[arg(short, long, value_name = "NAME")]
        category: String,
        /// Attributed author
        #[arg(short, long, default_value = "Anonymous")]
        author: String,
    },
    /// List quotes in insertion order
    List {
        /// Restrict to one category
        #[arg(long, value_name = "NAME")]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a random quote
    Random {
        /// Restrict to one category; defaults to the saved filter
        #[arg(long, value_name = "NAME")]
        category: Option<String>,
    },
    /// List categories with quote counts
    Categories,
    /// Show collection totals
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import quotes from a JSON file
    Import {
        /// File to read (bare array or export wrapper form)
        file: PathBuf,
    },
    /// Export quotes
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (a dated file name when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Print to stdout instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },
    /// Remove all custom quotes
    Clear,
    /// Save the default category filter used by `random`
    Filter {
        /// Category name, or "all"
        category: String,
    },
    /// Synchronize with the remote quote source
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ResolveStrategy {
    /// Keep the local collection, upload what the remote lacks
    Local,
    /// Replace the local custom set with the remote snapshot
    Server,
    /// Union of both sides, deduplicated, local wins
    Merge,
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Run one sync attempt
    Now {
        /// Strategy applied if the attempt detects a conflict
        #[arg(long, value_enum, value_name = "STRATEGY")]
        resolve: Option<ResolveStrategy>,
    },
    /// Enable, disable, or show the auto-sync preference
    Auto {
        /// `on`, `off`, or omitted to show the current setting
        state: Option<AutoSyncState>,
    },
    /// Run the periodic sync loop in the foreground until Ctrl-C
    Watch {
        /// Seconds between attempts
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
        /// Strategy applied when a tick detects a conflict
        #[arg(long, value_enum, value_name = "STRATEGY")]
        resolve: Option<ResolveStrategy>,
    },
    /// List recently resolved sync conflicts
    Conflicts {
        /// Number of conflicts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum AutoSyncState {
    On,
    Off,
}
