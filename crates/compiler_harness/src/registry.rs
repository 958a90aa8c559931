//! The interop runner registry.
//!
//! Each interop fixture has exactly one runner: a plain function which gets the live instance once the compiled
//! fixture has loaded.  Runners register themselves with [register_runner!]; at startup the registrations are gathered
//! into a [RunnerRegistry], which is what the interop suite consults.  Tests build registries by hand instead.
use std::collections::BTreeMap;

use crate::assertions::Assertions;
use crate::subject::ModuleInstance;

pub type RunnerFn = fn(&mut Assertions, &mut dyn ModuleInstance) -> anyhow::Result<()>;

#[derive(Debug, derive_more::Display)]
#[display(fmt = "{} (registered at {}:{}:{})", name, file, line, column)]
pub struct RunnerRegistryEntry {
    /// The fixture id this runner belongs to.
    pub name: &'static str,
    pub run_fn: RunnerFn,
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

inventory::collect!(RunnerRegistryEntry);

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("found duplicate runner registrations:\n{}", .0.join("\n"))]
    Duplicates(Vec<String>),
}

#[derive(Clone, Default)]
pub struct RunnerRegistry {
    runners: BTreeMap<String, RunnerFn>,
}

impl RunnerRegistry {
    /// Gather everything registered with [register_runner!].
    ///
    /// Fails, naming every offender, if any two runners share a name.
    pub fn from_registrations() -> Result<Self, RegistryError> {
        let entries = inventory::iter::<RunnerRegistryEntry>
            .into_iter()
            .collect::<Vec<_>>();
        Self::from_entries(entries)
    }

    fn from_entries(mut entries: Vec<&RunnerRegistryEntry>) -> Result<Self, RegistryError> {
        use itertools::Itertools;

        entries.sort_unstable_by_key(|x| (x.name, x.file, x.line, x.column));

        let mut duplicates = vec![];
        {
            let groups = entries.iter().group_by(|x| x.name);
            for (_, items) in groups.into_iter() {
                let items = items.collect::<Vec<_>>();
                if items.len() > 1 {
                    duplicates.extend(items.into_iter().map(|e| format!("  {e}")));
                }
            }
        }

        if !duplicates.is_empty() {
            return Err(RegistryError::Duplicates(duplicates));
        }

        Ok(Self {
            runners: entries
                .into_iter()
                .map(|e| (e.name.to_string(), e.run_fn))
                .collect(),
        })
    }

    #[cfg(test)]
    pub fn with_runner(mut self, name: &str, run_fn: RunnerFn) -> Self {
        self.runners.insert(name.to_string(), run_fn);
        self
    }

    pub fn get(&self, fixture_id: &str) -> Option<RunnerFn> {
        self.runners.get(fixture_id).copied()
    }

    /// Runner names in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.runners.keys().map(|k| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Assertions, _: &mut dyn ModuleInstance) -> anyhow::Result<()> {
        Ok(())
    }

    fn entry(name: &'static str, line: u32) -> RunnerRegistryEntry {
        RunnerRegistryEntry {
            name,
            run_fn: noop,
            file: "runners.rs",
            line,
            column: 1,
        }
    }

    #[test]
    fn shipped_runners_are_registered() {
        let registry = RunnerRegistry::from_registrations().unwrap();
        let names = registry.names().collect::<Vec<_>>();
        assert!(names.contains(&"add"));
        assert!(names.contains(&"identity"));
    }

    #[test]
    fn duplicates_are_reported_with_locations() {
        let a = entry("add", 10);
        let b = entry("add", 20);
        let c = entry("sub", 30);
        let Err(RegistryError::Duplicates(dups)) = RunnerRegistry::from_entries(vec![&a, &b, &c])
        else {
            panic!("expected duplicates");
        };
        assert_eq!(
            dups,
            vec![
                "  add (registered at runners.rs:10:1)".to_string(),
                "  add (registered at runners.rs:20:1)".to_string(),
            ]
        );
    }

    #[test]
    fn manual_registration() {
        let registry = RunnerRegistry::default().with_runner("fizz", noop);
        assert!(registry.get("fizz").is_some());
        assert!(registry.get("buzz").is_none());
    }
}
