use anyhow::Result;
use clap::Parser;

mod cli;
mod preset;

fn main() -> Result<()> {
    cli::Args::parse().run()
}
