mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use std::io::Write;
use taskql::{EngineConfig, QueryEngine, QueryPlan, SavedSearchStore};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let engine = build_engine(&cli)?;
    if !cli.query.is_empty() {
        let plan = engine
            .plan(&cli.query.join(" "))
            .context("Failed to compile query")?;
        print_plan(&plan, cli.json)?;
        return Ok(());
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;
        let mut line = String::new();
        if stdin.read_line(&mut line).context("Failed to read stdin")? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        } else if line == "/bye" {
            break;
        }
        match engine.plan(line) {
            Ok(plan) => print_plan(&plan, cli.json)?,
            Err(e) => eprintln!("Failed to compile query: {e}"),
        }
    }
    Ok(())
}

fn build_engine(cli: &Cli) -> Result<QueryEngine> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path).context("Failed to load config")?,
        None => EngineConfig::default(),
    };
    if let Some(tz) = cli.tz {
        if tz != config.timezone_offset_hours && cli.config.is_some() {
            warn!(config = config.timezone_offset_hours, tz, "--tz overrides the config file");
        }
        config.timezone_offset_hours = tz;
    }
    let saved = match &cli.saved {
        Some(path) => SavedSearchStore::from_file(path).context("Failed to load saved searches")?,
        None => SavedSearchStore::new(),
    };
    let engine = QueryEngine::new(config)
        .context("Invalid engine config")?
        .with_saved_searches(saved);
    Ok(engine)
}

fn print_plan(plan: &QueryPlan, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(plan).context("Failed to encode plan")?;
        println!("{text}");
    } else {
        println!("{}", plan.sql);
        if let Some(command) = &plan.command {
            println!("-- command: {command}");
        }
        if !plan.show_cols.is_empty() {
            println!("-- columns: {}", plan.show_cols.join(", "));
        }
    }
    Ok(())
}
