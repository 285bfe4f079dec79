use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(
    name = "modpipe",
    version,
    about = "Resolve pipeline modules into executable processor lists",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "MODPIPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Module and pipeline catalog (JSON)
    #[arg(long, global = true, env = "MODPIPE_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Output format, overrides the configured one
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve modules, or a stored pipeline, into a processor list
    Resolve {
        /// Module name or id; with a stored pipeline, `-name` removes and
        /// `+name` forces a module
        #[arg(short = 'm', long = "module", allow_hyphen_values = true)]
        modules: Vec<String>,

        /// Stored pipeline to resolve (name or id)
        #[arg(short, long)]
        pipeline: Option<String>,

        /// Start from a bare prepend marker instead of the standard pipeline
        #[arg(long)]
        no_standard: bool,
    },

    /// Print the standard pipeline
    Standard,

    /// List the modules in the catalog
    Modules {
        /// Only list platform standard modules
        #[arg(long)]
        standard: bool,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON output
    Json,
    /// Compact JSON output
    JsonCompact,
    /// Table output
    Table,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonCompact)
    }
}
