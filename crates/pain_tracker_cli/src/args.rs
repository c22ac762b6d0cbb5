use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pain-tracker")]
#[command(about = "Local pain journal backed by the pain tracker core", long_about = None)]
pub struct Cli {
    /// JSON config file; environment overrides still apply
    #[arg(short, long, global = true, env = "PAIN_TRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite file to use instead of the configured one
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a new entry
    #[command(alias = "a")]
    Add {
        /// Pain level, 0-10
        #[arg(allow_negative_numbers = true)]
        pain: f64,

        /// Pain location (repeatable)
        #[arg(short, long = "location")]
        locations: Vec<String>,

        /// Symptom (repeatable)
        #[arg(short, long = "symptom")]
        symptoms: Vec<String>,

        /// Sleep quality, 0-10
        #[arg(long, requires = "mood", allow_negative_numbers = true)]
        sleep: Option<f64>,

        /// Mood impact, 0-10
        #[arg(long, requires = "sleep", allow_negative_numbers = true)]
        mood: Option<f64>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Record an entry from a JSON candidate
    AddJson {
        /// Candidate JSON, e.g. '{"baselineData":{"pain":4}}'
        json: String,
    },

    /// List entries, most recent first
    #[command(alias = "ls")]
    List {
        /// Show at most this many entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show statistics and insight lines
    Summary,

    /// Write all entries to stdout, oldest first
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },

    /// Check core linkage
    Ping,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}
