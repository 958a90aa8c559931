//! Golden-file comparison, and creation of missing baselines.
//!
//! A golden file holds canonical text (see [crate::canonicalize]).  It is only ever written when it doesn't exist and
//! the run was started with `--create`; otherwise the harness treats it as read-only.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::canonicalize::canonicalize;
use crate::diff::{diff_chars, DiffReport};

#[derive(Debug, derive_more::IsVariant)]
pub enum GoldenOutcome {
    Matched,
    Mismatched(DiffReport),
    /// There was no baseline, and one was written from the actual output.
    Created(PathBuf),
    /// There was no baseline and we were not allowed to make one.
    Missing(PathBuf),
}

/// The golden file for a fixture source: same directory and stem, different extension.
pub fn golden_path_for(source: &Path, golden_extension: &str) -> PathBuf {
    source.with_extension(golden_extension)
}

/// Compare `actual`, which must already be canonical, against the golden file at `golden`.
///
/// Errors only for I/O failures other than the file not existing.
pub fn compare_with_golden(actual: &str, golden: &Path, create: bool) -> Result<GoldenOutcome> {
    let expected = match std::fs::read_to_string(golden) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if !create {
                return Ok(GoldenOutcome::Missing(golden.to_path_buf()));
            }

            std::fs::write(golden, actual)
                .with_context(|| format!("While creating golden file {}", golden.display()))?;
            log::info!("Created golden file {}", golden.display());
            return Ok(GoldenOutcome::Created(golden.to_path_buf()));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("While reading golden file {}", golden.display()))
        }
    };

    let report = diff_chars(&canonicalize(&expected), actual);
    if report.is_identical() {
        Ok(GoldenOutcome::Matched)
    } else {
        Ok(GoldenOutcome::Mismatched(report))
    }
}
