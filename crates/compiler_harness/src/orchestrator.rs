//! Runs every suite against every subject.
//!
//! Subjects run one after another, each with its own [Recorder], so nothing one build does can leak into the results
//! of another.  Within a subject the order is snapshot fixtures, interop fixtures, the smoke test and finally the
//! round trip.
use std::time::Instant;

use anyhow::Result;

use crate::environment::Environment;
use crate::registry::RunnerRegistry;
use crate::reporter::{Recorder, SubjectSummary};
use crate::subject::Subject;
use crate::suites::{compiler, interop, roundtrip, smoke};
use crate::test_filtering::FixtureFilter;

/// Options shared by every suite of a run.
#[derive(Clone, Debug, Default, derive_builder::Builder)]
#[builder(pattern = "owned", default)]
pub struct RunOptions {
    /// Write missing golden files from the actual output instead of failing.
    pub create: bool,

    /// Colour diagnostics and diffs.
    pub color: bool,

    /// Print each test's report as it finishes.
    pub echo: bool,

    pub filter: FixtureFilter,
}

pub async fn run_subject(
    subject: &Subject,
    env: &Environment,
    options: &RunOptions,
    registry: &RunnerRegistry,
) -> Result<SubjectSummary> {
    log::info!("Running against {}", subject.name);
    let started = Instant::now();
    let mut recorder = Recorder::new(&subject.name, options.echo, options.color);

    compiler::run_suite(subject, env, options, &mut recorder)?;
    interop::run_suite(subject, env, options, registry, &mut recorder).await?;
    smoke::run_suite(subject, env, options, &mut recorder);
    roundtrip::run_suite(subject, options, &mut recorder);

    Ok(SubjectSummary {
        subject: subject.name.clone(),
        reports: recorder.into_reports(),
        elapsed: started.elapsed(),
    })
}

pub async fn run_all(
    subjects: &[Subject],
    env: &Environment,
    options: &RunOptions,
    registry: &RunnerRegistry,
) -> Result<Vec<SubjectSummary>> {
    let mut summaries = vec![];
    for s in subjects {
        summaries.push(run_subject(s, env, options, registry).await?);
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::{fake_subject, FakeCompiler, FakeLoader, FakeOutcome};

    const EMITTED: &str = "(module\n (export \"main\" (func $main))\n)\n";

    fn compiler(main: FakeOutcome) -> FakeCompiler {
        FakeCompiler::default()
            .with_source("main", main)
            .with_source("add", FakeOutcome::module("add"))
            .with_source(smoke::SMOKE_FILE_NAME, FakeOutcome::module("(module)"))
    }

    #[tokio::test]
    async fn builds_are_reported_independently() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("fixtures")).unwrap();
        std::fs::create_dir(dir.path().join("interop")).unwrap();
        std::fs::write(dir.path().join("fixtures/main.ts"), "").unwrap();
        std::fs::write(
            dir.path().join("fixtures/main.wat"),
            " (export \"main\" (func $main))\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("interop/add.test.ts"), "").unwrap();

        let subjects = vec![
            fake_subject(
                "sources",
                compiler(FakeOutcome::module(EMITTED)),
                FakeLoader::default(),
            ),
            fake_subject(
                "dist",
                compiler(FakeOutcome::fail("crashed")),
                FakeLoader::unsupported("no runtime"),
            ),
        ];
        let registry = RunnerRegistry::from_registrations().unwrap();
        let options = RunOptionsBuilder::default().build().unwrap();

        let summaries = run_all(
            &subjects,
            &Environment::rooted_at(dir.path()),
            &options,
            &registry,
        )
        .await
        .unwrap();

        let sources = &summaries[0];
        let names = sources
            .reports
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "sources/compiler/main",
                "sources/interop/add",
                "sources/smoke/string-compile",
                "sources/roundtrip/text-binary-text",
            ]
        );
        assert!(sources.all_passed());
        assert_eq!(sources.passed(), 4);

        let dist = &summaries[1];
        assert_eq!(dist.subject, "dist");
        assert_eq!(dist.failed(), 1);
        assert_eq!(dist.skipped(), 1);
        assert_eq!(dist.passed(), 2);
        assert!(dist.reports.iter().all(|r| r.name.starts_with("dist/")));
    }

    #[tokio::test]
    async fn filter_applies_to_every_suite() {
        let dir = tempfile::tempdir().unwrap();
        let subject = fake_subject(
            "dev",
            compiler(FakeOutcome::module(EMITTED)),
            FakeLoader::default(),
        );
        let options = RunOptionsBuilder::default()
            .filter(FixtureFilter::new(Some("text-*")).unwrap())
            .build()
            .unwrap();

        let summary = run_subject(
            &subject,
            &Environment::rooted_at(dir.path()),
            &options,
            &RunnerRegistry::default(),
        )
        .await
        .unwrap();
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.reports[0].name, "dev/roundtrip/text-binary-text");
    }
}
