use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "orb",
    about = "Object record bridge: load schemas and materialize JSON records",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with default settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a schema file and list its object types
    Check(CheckArgs),
    /// Materialize JSON records into a fresh store and print the tables
    Import(ImportArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    #[arg(short, long)]
    pub schema: PathBuf,
}

#[derive(Args)]
pub struct ImportArgs {
    #[arg(short, long)]
    pub schema: PathBuf,
    /// JSON file of the form {"Type": [records...]}
    #[arg(short, long)]
    pub data: PathBuf,
    /// Update objects whose primary key already exists
    #[arg(long)]
    pub update: bool,
    /// Commit the records written before a failure instead of discarding them
    #[arg(long)]
    pub keep_partial: bool,
}
