//! CLI parse: clap types for storyteller. No behavior; definitions only.

use crate::story::{AttentionSpan, ReadingLevel};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Storyteller - personalized bedtime stories with narration and illustration
#[derive(Parser)]
#[command(name = "storyteller")]
#[command(about = "Generate personalized children's stories with audio and artwork")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root holding config/ (and static/ by default)
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Listen address, e.g. 127.0.0.1:8000
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the composed prompt and token budget without calling any provider
    Compose(ComposeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ComposeArgs {
    /// Child's name
    #[arg(long)]
    pub name: String,

    /// Child's age (1-12)
    #[arg(long)]
    pub age: i64,

    /// Story genre, e.g. adventure
    #[arg(long)]
    pub genre: String,

    /// Language code (en, es, fr, de, te, hi)
    #[arg(long, default_value = "en")]
    pub language: String,

    /// short, medium, or long
    #[arg(long, default_value = "medium")]
    pub attention_span: AttentionSpan,

    /// basic, intermediate, or advanced
    #[arg(long, default_value = "basic")]
    pub reading_level: ReadingLevel,

    /// Custom prompt used verbatim instead of the template
    #[arg(long)]
    pub prompt: Option<String>,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}
