//! The harness configuration file.
//!
//! A YAML file naming where fixtures live and which subject builds to test.  See `harness.yaml` next to this crate's
//! manifest for the default.  Relative paths are relative to the directory holding the file.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("no subjects are configured")]
    NoSubjects,

    #[error("subject {0} is configured more than once")]
    DuplicateSubject(String),

    #[error("no subject named {0} is configured")]
    UnknownSubject(String),
}

/// An external program and its leading arguments.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Defaults to the directory holding the configuration file.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// One direction of the text/binary converter.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConverterToolSpec {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Appended when debug names are to be kept.
    #[serde(default)]
    pub preserve_names_args: Vec<String>,

    /// Appended when debug names are to be dropped.
    #[serde(default)]
    pub discard_names_args: Vec<String>,
}

impl ConverterToolSpec {
    pub fn command(&self) -> CommandSpec {
        CommandSpec {
            program: self.program.clone(),
            args: self.args.clone(),
            working_dir: self.working_dir.clone(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConverterSpec {
    pub to_binary: ConverterToolSpec,
    pub to_text: ConverterToolSpec,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SubjectConfig {
    pub name: String,
    pub compiler: CommandSpec,
    pub converter: ConverterSpec,
}

fn default_fixtures_dir() -> PathBuf {
    PathBuf::from("fixtures")
}

fn default_interop_dir() -> PathBuf {
    PathBuf::from("interop")
}

fn default_source_extension() -> String {
    "ts".to_string()
}

fn default_golden_extension() -> String {
    "wat".to_string()
}

fn default_interop_suffix() -> String {
    "test".to_string()
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    #[serde(default = "default_fixtures_dir")]
    pub fixtures_dir: PathBuf,

    #[serde(default = "default_interop_dir")]
    pub interop_dir: PathBuf,

    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    #[serde(default = "default_golden_extension")]
    pub golden_extension: String,

    /// Interop fixtures are named `<id>.<interop_suffix>.<source_extension>`.
    #[serde(default = "default_interop_suffix")]
    pub interop_suffix: String,

    /// Source for the string-compile smoke test.  Defaults to [crate::suites::smoke::SMOKE_SOURCE].
    #[serde(default)]
    pub smoke_source: Option<String>,

    pub subjects: Vec<SubjectConfig>,

    /// Where the file was loaded from.  Filled in by [HarnessConfig::load].
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl HarnessConfig {
    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut cfg: HarnessConfig =
            serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;

        if cfg.subjects.is_empty() {
            return Err(ConfigError::NoSubjects);
        }

        {
            let mut seen = HashSet::new();
            for s in cfg.subjects.iter() {
                if !seen.insert(s.name.as_str()) {
                    return Err(ConfigError::DuplicateSubject(s.name.clone()));
                }
            }
        }

        cfg.base_dir = origin
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_relative_to(path, &cwd)
    }

    /// Load `path`, taken relative to `cwd` if it isn't absolute.
    ///
    /// Fixture paths handed to the compiler are built from [HarnessConfig::base_dir], and the compiler may run
    /// somewhere else entirely, so the base directory is always made absolute here.
    pub fn load_relative_to(path: &Path, cwd: &Path) -> Result<Self, ConfigError> {
        let path = cwd.join(path);
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&text, &path)
    }

    /// Resolve `path` against the configuration's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// The subjects to run, in file order, optionally limited to `only`.
    pub fn select_subjects(&self, only: &[String]) -> Result<Vec<&SubjectConfig>, ConfigError> {
        if let Some(missing) = only
            .iter()
            .find(|name| !self.subjects.iter().any(|s| &s.name == *name))
        {
            return Err(ConfigError::UnknownSubject(missing.clone()));
        }

        Ok(self
            .subjects
            .iter()
            .filter(|s| only.is_empty() || only.contains(&s.name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SUBJECTS: &str = r#"
fixtures_dir: tests/compiler
subjects:
  - name: sources
    compiler:
      program: node
      args: [bin/asc]
    converter:
      to_binary: { program: wat2wasm, preserve_names_args: [--debug-names] }
      to_text: { program: wasm2wat, discard_names_args: [--no-debug-names] }
  - name: dist
    compiler:
      program: node
      args: [dist/asc.js]
    converter:
      to_binary: { program: wat2wasm }
      to_text: { program: wasm2wat }
"#;

    #[test]
    fn defaults_and_overrides() {
        let cfg = HarnessConfig::parse(TWO_SUBJECTS, Path::new("/repo/harness.yaml")).unwrap();
        assert_eq!(cfg.fixtures_dir, PathBuf::from("tests/compiler"));
        assert_eq!(cfg.interop_dir, PathBuf::from("interop"));
        assert_eq!(cfg.source_extension, "ts");
        assert_eq!(cfg.golden_extension, "wat");
        assert_eq!(cfg.base_dir, PathBuf::from("/repo"));
        assert_eq!(
            cfg.resolve(&cfg.fixtures_dir),
            PathBuf::from("/repo/tests/compiler")
        );
        assert_eq!(
            cfg.subjects[0].converter.to_binary.preserve_names_args,
            vec!["--debug-names".to_string()]
        );
    }

    #[test]
    fn subject_selection() {
        let cfg = HarnessConfig::parse(TWO_SUBJECTS, Path::new("harness.yaml")).unwrap();
        assert_eq!(cfg.select_subjects(&[]).unwrap().len(), 2);

        let only = cfg.select_subjects(&["dist".to_string()]).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].name, "dist");

        assert!(matches!(
            cfg.select_subjects(&["nightly".to_string()]),
            Err(ConfigError::UnknownSubject(_))
        ));
    }

    #[test]
    fn relative_config_paths_give_an_absolute_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("h")).unwrap();
        std::fs::write(dir.path().join("h/harness.yaml"), TWO_SUBJECTS).unwrap();

        let cfg = HarnessConfig::load_relative_to(Path::new("h/harness.yaml"), dir.path()).unwrap();
        assert!(cfg.base_dir.is_absolute());
        assert_eq!(cfg.base_dir, dir.path().join("h"));
        assert_eq!(
            cfg.resolve(&cfg.fixtures_dir),
            dir.path().join("h/tests/compiler")
        );

        assert!(matches!(
            HarnessConfig::load_relative_to(Path::new("missing.yaml"), dir.path()),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn rejects_bad_configs() {
        assert!(matches!(
            HarnessConfig::parse("subjects: []", Path::new("h.yaml")),
            Err(ConfigError::NoSubjects)
        ));

        let dup = TWO_SUBJECTS.replace("name: dist", "name: sources");
        assert!(matches!(
            HarnessConfig::parse(&dup, Path::new("h.yaml")),
            Err(ConfigError::DuplicateSubject(_))
        ));

        assert!(matches!(
            HarnessConfig::parse("subjects: []\nsurprise: 1", Path::new("h.yaml")),
            Err(ConfigError::Parse { .. })
        ));
    }
}
