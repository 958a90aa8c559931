use anyhow::{Context, Result};
use regex::bytes as regex;

use crate::cli_args::FilterArgs;

/// Selects fixtures by name with an optional glob pattern from the command line.
#[derive(Clone, Debug, Default)]
pub struct FixtureFilter {
    glob: Option<regex::Regex>,
}

/// Given a string representing a glob pattern, return a regular expression which can match it.
fn compile_glob(glob: &str) -> Result<regex::Regex> {
    let parsed_glob =
        globset::Glob::new(glob).with_context(|| format!("Invalid fixture pattern {glob}"))?;
    Ok(regex::Regex::new(parsed_glob.regex())?)
}

impl FixtureFilter {
    pub fn new(pattern: Option<&str>) -> Result<Self> {
        Ok(Self {
            glob: pattern.map(compile_glob).transpose()?,
        })
    }

    pub fn from_args(args: &FilterArgs) -> Result<Self> {
        Self::new(args.pattern.as_deref())
    }

    pub fn matches(&self, name: &str) -> bool {
        self.glob
            .as_ref()
            .map(|g| g.is_match(name.as_bytes()))
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pattern_matches_everything() {
        let f = FixtureFilter::new(None).unwrap();
        assert!(f.matches("anything/at/all"));
    }

    #[test]
    fn globs() {
        let f = FixtureFilter::new(Some("std/*")).unwrap();
        assert!(f.matches("std/array"));
        assert!(!f.matches("if"));
    }

    #[test]
    fn bad_pattern_is_an_error() {
        assert!(FixtureFilter::new(Some("[")).is_err());
    }
}
