//! What running a single test can come to.
use std::path::PathBuf;

/// The outcome of a test.
#[derive(Clone, Debug, derive_more::IsVariant)]
pub enum TestOutcome {
    Passed,

    /// A missing golden file was written from the actual output.  Informational, not a failure.
    Created(CreatedOutcome),

    Failed(FailedOutcome),

    /// The test could not run in this environment.  Never counted as a pass.
    Skipped(SkippedOutcome),
}

#[derive(Clone, Debug)]
pub struct CreatedOutcome {
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct FailedOutcome {
    /// One line saying what went wrong.
    pub reason: String,

    /// Anything longer, e.g. a diff or an error chain.
    pub detail: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SkippedOutcome {
    pub reason: String,
}

impl TestOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        TestOutcome::Failed(FailedOutcome {
            reason: reason.into(),
            detail: None,
        })
    }

    pub fn failed_with(reason: impl Into<String>, detail: impl Into<String>) -> Self {
        TestOutcome::Failed(FailedOutcome {
            reason: reason.into(),
            detail: Some(detail.into()),
        })
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        TestOutcome::Skipped(SkippedOutcome {
            reason: reason.into(),
        })
    }

    pub fn created(path: impl Into<PathBuf>) -> Self {
        TestOutcome::Created(CreatedOutcome { path: path.into() })
    }

    /// The reason for a failure, if this is one.
    #[cfg(test)]
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            TestOutcome::Failed(f) => Some(&f.reason),
            _ => None,
        }
    }
}

/// A finished test, named `subject/suite/fixture`.
#[derive(Clone, Debug)]
pub struct TestReport {
    pub name: String,
    pub outcome: TestOutcome,

    /// Things worth showing even when the test passed, such as compiler diagnostics.
    pub notes: Vec<String>,
}
