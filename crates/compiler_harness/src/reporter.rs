//! Infrastructure to report the results of running tests.
//!
//! Suites hand finished tests to a [Recorder], which keeps them for the summary and, when echoing, writes them to
//! stderr as they arrive.  Interop tests finish in whatever order their loads settle, so nothing here assumes an
//! order.
use std::fmt::{Result, Write};
use std::time::Duration;

use indenter::indented;

use crate::outcome::{TestOutcome, TestReport};
use crate::style::{paint, Color};

// Formatting here is to strings and so cannot fail, but unwrap is annoying so we put that behind a function and unwrap
// once at the top.  The output string does not contain a trailing newline, which lets us use writeln everywhere.

/// Report the outcome of a test.
///
/// Returns a string without a trailing newline.
pub fn report_test(report: &TestReport, color: bool) -> String {
    let mut dest = String::new();
    report_test_fallible(&mut dest, report, color)
        .expect("This is formatting to strings and should never fail");

    match dest.strip_suffix('\n') {
        Some(stripped) => stripped.to_string(),
        None => dest,
    }
}

fn report_test_fallible(mut dest: &mut dyn Write, report: &TestReport, color: bool) -> Result {
    write!(dest, "{} ", report.name)?;

    match &report.outcome {
        TestOutcome::Passed => writeln!(dest, "{}", paint(color, Color::Green, "passed"))?,
        TestOutcome::Created(c) => writeln!(
            dest,
            "{} {}",
            paint(color, Color::Cyan, "created"),
            c.path.display()
        )?,
        TestOutcome::Skipped(s) => {
            writeln!(dest, "{}", paint(color, Color::Yellow, "SKIPPED"))?;
            writeln!(indented(&mut dest).with_str("  "), "Reason: {}", s.reason)?;
        }
        TestOutcome::Failed(f) => {
            writeln!(dest, "{}", paint(color, Color::Red, "FAILED"))?;
            let mut ind = indented(&mut dest).with_str("  ");
            writeln!(ind, "Reason: {}", f.reason)?;
            if let Some(detail) = &f.detail {
                writeln!(ind, "{detail}")?;
            }
        }
    }

    for note in report.notes.iter() {
        writeln!(indented(&mut dest).with_str("  "), "{note}")?;
    }

    Ok(())
}

/// Collects the reports of one subject.
pub struct Recorder {
    subject: String,
    echo: bool,
    color: bool,
    reports: Vec<TestReport>,
}

impl Recorder {
    pub fn new(subject: &str, echo: bool, color: bool) -> Self {
        Self {
            subject: subject.to_string(),
            echo,
            color,
            reports: vec![],
        }
    }

    pub fn record(&mut self, suite: &str, fixture: &str, outcome: TestOutcome, notes: Vec<String>) {
        let report = TestReport {
            name: format!("{}/{suite}/{fixture}", self.subject),
            outcome,
            notes,
        };

        if self.echo {
            eprintln!("{}", report_test(&report, self.color));
        }
        self.reports.push(report);
    }

    #[cfg(test)]
    pub fn reports(&self) -> &[TestReport] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<TestReport> {
        self.reports
    }
}

/// Totals for one subject.
#[derive(Clone, Debug)]
pub struct SubjectSummary {
    pub subject: String,
    pub reports: Vec<TestReport>,
    pub elapsed: Duration,
}

impl SubjectSummary {
    fn count(&self, pred: impl Fn(&TestOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn passed(&self) -> usize {
        self.count(TestOutcome::is_passed)
    }

    pub fn created(&self) -> usize {
        self.count(TestOutcome::is_created)
    }

    pub fn failed(&self) -> usize {
        self.count(TestOutcome::is_failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(TestOutcome::is_skipped)
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

/// One line: `subject: N passed, N created, N failed, N skipped (elapsed)`.
pub fn report_summary(summary: &SubjectSummary) -> String {
    let elapsed = chrono::TimeDelta::from_std(summary.elapsed)
        .map(|d| d.to_string())
        .unwrap_or_else(|_| format!("{:?}", summary.elapsed));

    format!(
        "{}: {} passed, {} created, {} failed, {} skipped ({elapsed})",
        summary.subject,
        summary.passed(),
        summary.created(),
        summary.failed(),
        summary.skipped(),
    )
}
