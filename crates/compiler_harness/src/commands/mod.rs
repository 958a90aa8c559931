mod list;
mod run;

use anyhow::Result;

use crate::cli_args;
use crate::harness_config::HarnessConfig;

/// Load the configuration named on the command line, or the default one.
fn load_config(args: &cli_args::ConfigArgs) -> Result<HarnessConfig> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(crate::environment::default_config_path);
    log::debug!("Loading configuration from {}", path.display());
    Ok(HarnessConfig::load(&path)?)
}

/// Figure out what command to run, then run it.  Returns the process exit code.
pub fn dispatch_command(args: cli_args::CliArgs) -> Result<i32> {
    match &args.command {
        cli_args::Command::List(l) => list::list(&args, l),
        cli_args::Command::Run(r) => run::run(&args, r),
    }
}
