//! Compile a source held in memory.
//!
//! This checks the string entry point of the compiler, which the fixture suites never touch: a small program must
//! compile without any diagnostics, survive optimization and still emit text.  Diagnostics from the optimizer are
//! shown but don't fail the test.
use crate::directive::CompilerConfig;
use crate::environment::Environment;
use crate::invoker::{format_diagnostics, invoke, CompileInput};
use crate::orchestrator::RunOptions;
use crate::outcome::TestOutcome;
use crate::reporter::Recorder;
use crate::subject::Subject;

pub const SUITE: &str = "smoke";
pub const NAME: &str = "string-compile";

/// The file name the smoke source is compiled as.
pub const SMOKE_FILE_NAME: &str = "smoke.ts";

pub const SMOKE_SOURCE: &str = "\
export function test(x: i32): i32 {
  return x;
}

export function start(): void {}
";

pub fn run_smoke(
    subject: &Subject,
    env: &Environment,
    options: &RunOptions,
) -> (TestOutcome, Vec<String>) {
    let compiled = invoke(
        subject.compiler.as_ref(),
        CompileInput::Source {
            name: SMOKE_FILE_NAME,
            source: &env.smoke_source,
        },
        &CompilerConfig::base(),
    );
    let mut notes = compiled
        .render_diagnostics(options.color)
        .into_iter()
        .collect::<Vec<_>>();

    let Some(mut module) = compiled.module else {
        let outcome = match compiled.failure {
            Some(f) => TestOutcome::failed_with("compilation failed", f),
            None => TestOutcome::failed("compilation failed"),
        };
        return (outcome, notes);
    };

    if !compiled.diagnostics.is_empty() {
        return (
            TestOutcome::failed(format!(
                "expected no diagnostics, got {}",
                compiled.diagnostics.len()
            )),
            notes,
        );
    }

    match module.optimize() {
        Ok(d) if d.is_empty() => {}
        Ok(d) => {
            log::warn!("{}: the optimizer reported {} diagnostics", subject.name, d.len());
            notes.push(format_diagnostics(&d, options.color));
        }
        Err(e) => {
            return (
                TestOutcome::failed_with("optimization failed", format!("{e:#}")),
                notes,
            )
        }
    }

    let outcome = match module.emit_text() {
        Ok(t) if t.trim().is_empty() => TestOutcome::failed("optimized module emitted no text"),
        Ok(_) => TestOutcome::Passed,
        Err(e) => TestOutcome::failed_with("could not emit text", format!("{e:#}")),
    };
    (outcome, notes)
}

pub fn run_suite(
    subject: &Subject,
    env: &Environment,
    options: &RunOptions,
    recorder: &mut Recorder,
) {
    if !options.filter.matches(NAME) {
        return;
    }

    log::debug!("{}: compiling the smoke source", subject.name);
    let (outcome, notes) = run_smoke(subject, env, options);
    recorder.record(SUITE, NAME, outcome, notes);
}
