use anyhow::Result;

use crate::cli_args::{CliArgs, ListArgs};
use crate::environment::Environment;
use crate::orchestrator::RunOptionsBuilder;
use crate::registry::RunnerRegistry;
use crate::suites::{compiler, interop};
use crate::test_filtering::FixtureFilter;

pub fn list(_top_args: &CliArgs, list_args: &ListArgs) -> Result<i32> {
    let config = super::load_config(&list_args.config)?;
    let env = Environment::from_config(&config);
    let options = RunOptionsBuilder::default()
        .filter(FixtureFilter::from_args(&list_args.filter)?)
        .build()?;
    let registry = RunnerRegistry::from_registrations()?;

    for case in compiler::discover(&env, &options)? {
        println!("{}/{}", compiler::SUITE, case.name);
    }

    for case in interop::discover(&env, &options)? {
        let runner = if registry.get(&case.id).is_some() {
            case.id.clone()
        } else {
            format!("{} (no runner)", case.id)
        };
        println!("{}/{} -> {runner}", interop::SUITE, case.name);
    }

    for s in config.subjects.iter() {
        println!("subject {}", s.name);
    }

    Ok(0)
}
