//! Interop fixtures.
//!
//! `interop/<id>.test.ts` is compiled (always silenced) to a binary, the binary is handed to the subject's loader,
//! and once the loader produces an instance the runner registered under `<id>` gets to poke at it.
//!
//! Every fixture is compiled and every load is started before any load is waited on, so several loads are in flight
//! at once.  Reports are recorded in whatever order the loads settle.  A rejected load, a loader panic or a failing
//! runner fails that fixture and nothing else.
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use itertools::Itertools;
use serde_json::Value as JsonValue;
use tokio::task::JoinSet;

use crate::assertions::Assertions;
use crate::directive::extract_config;
use crate::environment::Environment;
use crate::invoker::{invoke, panic_message, CompileInput};
use crate::orchestrator::RunOptions;
use crate::outcome::TestOutcome;
use crate::registry::{RunnerFn, RunnerRegistry};
use crate::reporter::Recorder;
use crate::subject::{Capability, ModuleInstance, Subject};

pub const SUITE: &str = "interop";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InteropCase {
    /// Path under the interop directory without the suffix or extension, e.g. `add`.
    pub name: String,

    /// The runner this fixture is paired with.
    pub id: String,

    pub source_path: PathBuf,
}

/// `add-two` is run by `add_two`.
fn runner_id(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).replace('-', "_")
}

pub fn discover(env: &Environment, options: &RunOptions) -> Result<Vec<InteropCase>> {
    let suffix = format!(".{}", env.interop_suffix);
    let mut cases = vec![];

    for source_path in super::files_with_extension(&env.interop_dir, &env.source_extension)? {
        let full = super::fixture_name(&env.interop_dir, &source_path);
        let Some(name) = full.strip_suffix(&suffix) else {
            log::debug!("Ignoring {}: not an interop fixture", source_path.display());
            continue;
        };

        if !options.filter.matches(name) {
            continue;
        }

        cases.push(InteropCase {
            id: runner_id(name),
            name: name.to_string(),
            source_path,
        });
    }

    Ok(cases)
}

/// Compile one case down to the binary the loader gets.  Returns the binary or the outcome to fail with, plus notes.
fn compile_case(
    subject: &Subject,
    case: &InteropCase,
    options: &RunOptions,
) -> (Result<Vec<u8>, TestOutcome>, Vec<String>) {
    let source = match std::fs::read_to_string(&case.source_path) {
        Ok(s) => s,
        Err(e) => {
            return (
                Err(TestOutcome::failed_with(
                    format!("could not read {}", case.source_path.display()),
                    e.to_string(),
                )),
                vec![],
            )
        }
    };

    let config = match extract_config(&source) {
        Ok(c) => c.merged_with([("silent".to_string(), JsonValue::Bool(true))]),
        Err(e) => {
            return (
                Err(TestOutcome::failed(format!("bad directive line: {e}"))),
                vec![],
            )
        }
    };

    let compiled = invoke(
        subject.compiler.as_ref(),
        CompileInput::File(&case.source_path),
        &config,
    );
    let notes = compiled
        .render_diagnostics(options.color)
        .into_iter()
        .collect::<Vec<_>>();

    let Some(module) = compiled.module else {
        let outcome = match compiled.failure {
            Some(f) => TestOutcome::failed_with("compilation failed", f),
            None => TestOutcome::failed("compilation failed"),
        };
        return (Err(outcome), notes);
    };

    match module.emit_binary() {
        Ok(b) => (Ok(b), notes),
        Err(e) => (
            Err(TestOutcome::failed_with(
                "could not emit binary",
                format!("{e:#}"),
            )),
            notes,
        ),
    }
}

/// Hand a loaded instance to its runner.
fn run_runner(
    case: &InteropCase,
    runner: RunnerFn,
    mut instance: Box<dyn ModuleInstance>,
) -> TestOutcome {
    let mut assertions = Assertions::default();
    let caught = catch_unwind(AssertUnwindSafe(|| {
        runner(&mut assertions, instance.as_mut())
    }));
    let failures = assertions
        .into_failures()
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>();

    match caught {
        Err(payload) => TestOutcome::failed_with("runner panicked", panic_message(&*payload)),
        Ok(Err(e)) => {
            let mut detail = vec![format!("{e:#}")];
            detail.extend(failures);
            TestOutcome::failed_with("runner returned an error", detail.join("\n"))
        }
        Ok(Ok(())) if failures.is_empty() => TestOutcome::Passed,
        Ok(Ok(())) => TestOutcome::failed_with(
            format!(
                "{} assertion{} failed",
                failures.len(),
                if failures.len() == 1 { "" } else { "s" }
            ),
            failures.join("\n"),
        ),
    }
}

pub async fn run_suite(
    subject: &Subject,
    env: &Environment,
    options: &RunOptions,
    registry: &RunnerRegistry,
    recorder: &mut Recorder,
) -> Result<()> {
    let cases = discover(env, options)?;

    for name in registry.names() {
        if options.filter.matches(name) && !cases.iter().any(|c| c.id == name) {
            log::warn!("Runner {name} has no interop fixture");
        }
    }

    if cases.is_empty() {
        return Ok(());
    }

    if let Capability::Unsupported { reason } = subject.loader.capability() {
        log::info!("{}: skipping interop suite: {reason}", subject.name);
        recorder.record(SUITE, "*", TestOutcome::skipped(reason), vec![]);
        return Ok(());
    }

    // Fixtures in different directories can still map to one runner.
    let names_by_id = cases
        .iter()
        .map(|c| (c.id.clone(), c.name.clone()))
        .into_group_map();

    let mut in_flight = JoinSet::new();

    for case in cases {
        if let Some(sharing) = names_by_id.get(&case.id).filter(|n| n.len() > 1) {
            recorder.record(
                SUITE,
                &case.name,
                TestOutcome::failed_with(
                    format!("runner id {} is shared by {} fixtures", case.id, sharing.len()),
                    sharing.join("\n"),
                ),
                vec![],
            );
            continue;
        }

        let Some(runner) = registry.get(&case.id) else {
            recorder.record(
                SUITE,
                &case.name,
                TestOutcome::failed(format!("no runner registered for {}", case.id)),
                vec![],
            );
            continue;
        };

        log::debug!("{}: compiling interop fixture {}", subject.name, case.name);
        let (binary, notes) = compile_case(subject, &case, options);
        let binary = match binary {
            Ok(b) => b,
            Err(outcome) => {
                recorder.record(SUITE, &case.name, outcome, notes);
                continue;
            }
        };

        let loader = subject.loader.clone();
        in_flight.spawn(async move {
            // The inner task turns a loader panic into an error for this case alone.
            let load = tokio::spawn(async move { loader.instantiate(binary).await });
            let loaded = match load.await {
                Ok(r) => r,
                Err(e) => Err(anyhow!("loader panicked: {e}")),
            };
            (case, runner, notes, loaded)
        });
    }

    while let Some(joined) = in_flight.join_next().await {
        // The outer task only awaits the inner one, so it cannot panic.
        let (case, runner, notes, loaded) = joined?;

        let outcome = match loaded {
            Ok(instance) => {
                log::debug!("{}: running {} against {}", subject.name, case.id, case.name);
                run_runner(&case, runner, instance)
            }
            Err(e) => TestOutcome::failed(format!("load rejected: {e:#}")),
        };
        recorder.record(SUITE, &case.name, outcome, notes);
    }

    Ok(())
}
