use clap::Parser;
use std::path::PathBuf;

/// Compile task queries to SQL.
#[derive(Parser)]
pub struct Cli {
    /// Engine config file (JSON).
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Hours from UTC for date literals, overrides the config file.
    #[clap(long, allow_negative_numbers = true)]
    pub tz: Option<i8>,
    /// Saved searches file, a JSON object of name to query text.
    #[clap(long)]
    pub saved: Option<PathBuf>,
    /// Print the whole plan as JSON instead of just the SQL.
    #[clap(long, default_value = "false")]
    pub json: bool,
    #[clap(long, default_value = "warn")]
    pub log_level: String,
    /// Query text. Queries are read from stdin, one per line, when omitted.
    pub query: Vec<String>,
}
