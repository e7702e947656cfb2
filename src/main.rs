use anyhow::Result;
use clap::Parser;

use transform_graph::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.execute()
}
