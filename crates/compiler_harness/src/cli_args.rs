//! Definition of the Clap command line.
//!
//! This is big; we opt to pull it out.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every suite against every configured subject.
    Run(RunArgs),

    /// List fixtures and registered interop runners.
    List(ListArgs),
}

#[derive(Debug, Parser)]
pub struct FilterArgs {
    /// If specified, only run fixtures whose names match this glob pattern.
    pub pattern: Option<String>,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// The harness configuration.  Defaults to `harness.yaml` next to this crate's manifest.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Write missing golden files from the compiler's current output instead of failing.
    #[arg(long)]
    pub create: bool,

    /// Only run against this subject.  May be given more than once.
    #[arg(long = "subject")]
    pub subjects: Vec<String>,
}

/// List fixtures, optionally constrained by a filter.
#[derive(Debug, Parser)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub config: ConfigArgs,
}
