use anyhow::{Context, Result};

use crate::backends::{build_subject, default_loader};
use crate::cli_args::{CliArgs, RunArgs};
use crate::environment::Environment;
use crate::orchestrator::{run_all, RunOptionsBuilder};
use crate::registry::RunnerRegistry;
use crate::reporter::report_summary;
use crate::test_filtering::FixtureFilter;

pub fn run(_top_args: &CliArgs, run_args: &RunArgs) -> Result<i32> {
    let config = super::load_config(&run_args.config)?;
    let env = Environment::from_config(&config);
    let registry = RunnerRegistry::from_registrations()?;

    let loader = default_loader();
    let subjects = config
        .select_subjects(&run_args.subjects)?
        .into_iter()
        .map(|s| build_subject(s, &config, loader.clone()))
        .collect::<Vec<_>>();

    let options = RunOptionsBuilder::default()
        .create(run_args.create)
        .color(crate::style::use_color())
        .echo(true)
        .filter(FixtureFilter::from_args(&run_args.filter)?)
        .build()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Building the tokio runtime")?;
    let summaries = runtime.block_on(run_all(&subjects, &env, &options, &registry))?;

    eprintln!();
    for s in summaries.iter() {
        eprintln!("{}", report_summary(s));
    }

    if summaries.iter().all(|s| s.all_passed()) {
        Ok(0)
    } else {
        Ok(1)
    }
}
