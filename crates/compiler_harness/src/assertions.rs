//! The assertion context handed to interop runners.
//!
//! Assertions record failures rather than panicking, so a runner sees all of its failures in one go.  A runner passes
//! when it returns `Ok` and nothing was recorded.
use std::fmt::{Debug, Display};
use std::panic::Location;

use anyhow::{bail, Result};

use crate::subject::{ModuleInstance, Value};

#[derive(Clone, Debug)]
pub struct AssertionFailure {
    pub location: &'static Location<'static>,
    pub message: String,
}

impl Display for AssertionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

#[derive(Default)]
pub struct Assertions {
    failures: Vec<AssertionFailure>,
}

impl Assertions {
    #[track_caller]
    fn fail(&mut self, message: String) {
        self.failures.push(AssertionFailure {
            location: Location::caller(),
            message,
        });
    }

    #[track_caller]
    pub fn ok(&mut self, condition: bool, what: impl Display) {
        if !condition {
            self.fail(format!("expected {what}"));
        }
    }

    #[track_caller]
    pub fn equal<T: PartialEq + Debug>(&mut self, actual: T, expected: T, what: impl Display) {
        if actual != expected {
            self.fail(format!("{what}: expected {expected:?}, got {actual:?}"));
        }
    }

    /// Call an export taking and returning `i32`s.
    ///
    /// Traps and signature mismatches are errors, which end the runner.
    pub fn call_i32(
        &mut self,
        instance: &mut dyn ModuleInstance,
        export: &str,
        args: &[i32],
    ) -> Result<i32> {
        let args = args.iter().copied().map(Value::I32).collect::<Vec<_>>();
        match instance.call(export, &args)?.as_slice() {
            [Value::I32(r)] => Ok(*r),
            other => bail!("{export} returned {other:?}, expected a single i32"),
        }
    }

    #[cfg(test)]
    pub fn failures(&self) -> &[AssertionFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<AssertionFailure> {
        self.failures
    }
}
