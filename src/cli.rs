use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::ir::CompiledSource;
use crate::registry::MetadataRegistry;
use crate::runtime::{ExecutionPlan, TransformManager, TransformManagerOptions};
use crate::timeframe::TimeFrame;

/// Validate that an asset symbol is plain (no path characters, alphanumeric only)
fn validate_asset(asset: &str) -> Result<()> {
    if asset.is_empty() || asset.len() > 20 {
        anyhow::bail!("Invalid asset name '{}': must be 1-20 characters", asset);
    }

    if !asset.chars().all(|c| c.is_alphanumeric()) {
        anyhow::bail!("Invalid asset name '{}': only alphanumeric characters allowed", asset);
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "transform-graph")]
#[command(about = "Compile strategy graphs and inspect their resolved timeframes")]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every configured transform in execution order
    Inspect {
        #[command(flatten)]
        graph: GraphArgs,
        /// Print configurations as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the (timeframe, asset) runs the graph needs
    Plan {
        #[command(flatten)]
        graph: GraphArgs,
        /// Comma-separated asset symbols (e.g., AAPL,MSFT)
        #[arg(long, value_delimiter = ',', required = true)]
        assets: Vec<String>,
    },
}

#[derive(Args)]
pub struct GraphArgs {
    /// Path to the compiled graph JSON file
    #[arg(long)]
    pub graph: PathBuf,
    /// Execution timeframe (1Min, 15Min, 1H, 1D, 1W-FRI, 1ME, ...)
    #[arg(long)]
    pub timeframe: Option<TimeFrame>,
    /// Use --timeframe only where a node has none of its own
    #[arg(long)]
    pub base: bool,
    /// Keep explicit node timeframes even when --timeframe is given
    #[arg(long)]
    pub no_strict: bool,
    /// Check ordering, outputs and cycles after compiling
    #[arg(long)]
    pub validate: bool,
}

impl GraphArgs {
    fn build(&self) -> Result<TransformManager> {
        let source = load_source(&self.graph)?;
        let mut options = TransformManagerOptions::new(source)
            .timeframe_is_base(self.base)
            .strict(!self.no_strict)
            .validate(self.validate);
        options.timeframe = self.timeframe.clone();

        TransformManager::new(options, &MetadataRegistry::with_builtins())
            .with_context(|| format!("Failed to compile graph: {}", self.graph.display()))
    }
}

pub fn load_source(path: &Path) -> Result<CompiledSource> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph file: {}", path.display()))?;
    CompiledSource::from_json(&json)
        .with_context(|| format!("Failed to parse graph file: {}", path.display()))
}

pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        init_logging(self.verbose);

        match self.command {
            Commands::Inspect { graph, json } => {
                let manager = graph.build()?;
                if json {
                    println!("{}", serde_json::to_string_pretty(manager.transforms())?);
                    return Ok(());
                }

                println!("{:<4} {:<24} {:<24} {:<8} outputs", "#", "id", "type", "tf");
                for (index, config) in manager.iter().enumerate() {
                    let timeframe = config
                        .timeframe()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<4} {:<24} {:<24} {:<8} {}",
                        index,
                        config.id(),
                        config.type_tag(),
                        timeframe,
                        config.output_ids().join(", ")
                    );
                }
                match manager.executor_id() {
                    Some(id) => println!("executor: {id}"),
                    None => println!("executor: <none>"),
                }
            }
            Commands::Plan { graph, assets } => {
                for asset in &assets {
                    validate_asset(asset)?;
                }
                let manager = graph.build()?;
                let plan = ExecutionPlan::new(&manager, assets);

                for timeframe in plan.timeframes() {
                    println!("{timeframe}: {}", plan.stage(timeframe).join(" -> "));
                }
                if !plan.timeframe_agnostic().is_empty() {
                    println!("timeframe-agnostic: {}", plan.timeframe_agnostic().join(", "));
                }
                let keys = plan.keys();
                println!("{} runs:", keys.len());
                for key in keys {
                    println!("  {key}");
                }
            }
        }

        Ok(())
    }
}
