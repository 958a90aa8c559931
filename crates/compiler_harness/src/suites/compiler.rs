//! Snapshot fixtures.
//!
//! Each `fixtures/<name>.ts` is compiled with the configuration from its directive line, validated, emitted as text,
//! canonicalized and compared against `fixtures/<name>.wat`.  Fixtures run strictly one after another, and whatever
//! goes wrong with one of them is reported against that fixture alone.
use std::path::PathBuf;

use anyhow::Result;

use crate::canonicalize::canonicalize;
use crate::directive::extract_config;
use crate::environment::Environment;
use crate::golden::{compare_with_golden, golden_path_for, GoldenOutcome};
use crate::invoker::{invoke, CompileInput};
use crate::orchestrator::RunOptions;
use crate::outcome::TestOutcome;
use crate::reporter::Recorder;
use crate::subject::Subject;

pub const SUITE: &str = "compiler";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FixtureCase {
    pub name: String,
    pub source_path: PathBuf,
    pub golden_path: PathBuf,
}

/// Find snapshot fixtures, in name order.
pub fn discover(env: &Environment, options: &RunOptions) -> Result<Vec<FixtureCase>> {
    let cases = super::files_with_extension(&env.fixtures_dir, &env.source_extension)?
        .into_iter()
        .map(|source_path| FixtureCase {
            name: super::fixture_name(&env.fixtures_dir, &source_path),
            golden_path: golden_path_for(&source_path, &env.golden_extension),
            source_path,
        })
        .filter(|c| options.filter.matches(&c.name))
        .collect();
    Ok(cases)
}

/// Run one fixture.  Returns the outcome and any notes (compiler diagnostics) to show alongside it.
pub fn run_fixture(
    subject: &Subject,
    case: &FixtureCase,
    options: &RunOptions,
) -> (TestOutcome, Vec<String>) {
    log::debug!("{}: running fixture {}", subject.name, case.name);

    let source = match std::fs::read_to_string(&case.source_path) {
        Ok(s) => s,
        Err(e) => {
            return (
                TestOutcome::failed_with(
                    format!("could not read {}", case.source_path.display()),
                    e.to_string(),
                ),
                vec![],
            )
        }
    };

    let config = match extract_config(&source) {
        Ok(c) => c,
        Err(e) => return (TestOutcome::failed(format!("bad directive line: {e}")), vec![]),
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
        return (outcome, notes);
    };

    if let Err(e) = module.validate() {
        return (
            TestOutcome::failed_with("module failed validation", format!("{e:#}")),
            notes,
        );
    }

    let text = match module.emit_text() {
        Ok(t) => t,
        Err(e) => {
            return (
                TestOutcome::failed_with("could not emit text", format!("{e:#}")),
                notes,
            )
        }
    };

    let actual = canonicalize(&text);
    let outcome = match compare_with_golden(&actual, &case.golden_path, options.create) {
        Ok(GoldenOutcome::Matched) => TestOutcome::Passed,
        Ok(GoldenOutcome::Created(path)) => TestOutcome::created(path),
        Ok(GoldenOutcome::Missing(path)) => TestOutcome::failed(format!(
            "no golden file at {}; run again with --create to record the current output",
            path.display()
        )),
        Ok(GoldenOutcome::Mismatched(report)) => TestOutcome::failed_with(
            format!(
                "output differs from {} in {} places",
                case.golden_path.display(),
                report.changed_segments()
            ),
            report.render(options.color),
        ),
        Err(e) => TestOutcome::failed_with("could not check the golden file", format!("{e:#}")),
    };

    (outcome, notes)
}

pub fn run_suite(
    subject: &Subject,
    env: &Environment,
    options: &RunOptions,
    recorder: &mut Recorder,
) -> Result<()> {
    for case in discover(env, options)? {
        let (outcome, notes) = run_fixture(subject, &case, options);
        recorder.record(SUITE, &case.name, outcome, notes);
    }
    Ok(())
}
