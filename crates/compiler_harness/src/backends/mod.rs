//! The real collaborators, as opposed to the fakes unit tests use.
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::harness_config::{HarnessConfig, SubjectConfig};
use crate::subject::{Capability, Loader, ModuleInstance, Subject};

pub mod command;
pub mod exec;
#[cfg(feature = "runtime")]
pub mod wasmtime_loader;

/// A loader for hosts which cannot execute modules.
pub struct UnsupportedLoader {
    reason: String,
}

impl UnsupportedLoader {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait::async_trait]
impl Loader for UnsupportedLoader {
    fn capability(&self) -> Capability {
        Capability::Unsupported {
            reason: self.reason.clone(),
        }
    }

    async fn instantiate(&self, _binary: Vec<u8>) -> Result<Box<dyn ModuleInstance>> {
        bail!("{}", self.reason)
    }
}

/// The loader this build of the harness executes modules with.  If the runtime can't start, interop is skipped.
#[cfg(feature = "runtime")]
pub fn default_loader() -> Arc<dyn Loader> {
    match wasmtime_loader::WasmtimeLoader::new() {
        Ok(l) => Arc::new(l),
        Err(e) => {
            log::warn!("Interop fixtures cannot run: {e:#}");
            Arc::new(UnsupportedLoader::new(format!("{e:#}")))
        }
    }
}

#[cfg(not(feature = "runtime"))]
pub fn default_loader() -> Arc<dyn Loader> {
    Arc::new(UnsupportedLoader::new(
        "the harness was built without the runtime feature",
    ))
}

/// Put a configured subject together.  Subjects share the loader; it keeps no per-module state.
pub fn build_subject(
    subject: &SubjectConfig,
    config: &HarnessConfig,
    loader: Arc<dyn Loader>,
) -> Subject {
    let cwd = config.base_dir.clone();
    Subject {
        name: subject.name.clone(),
        compiler: Arc::new(command::CommandCompiler::new(
            subject.compiler.clone(),
            cwd.clone(),
        )),
        converter: Arc::new(command::CommandConverter::new(
            subject.converter.clone(),
            cwd,
        )),
        loader,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_loader_says_why() {
        let loader = UnsupportedLoader::new("no runtime here");
        assert_eq!(
            loader.capability(),
            Capability::Unsupported {
                reason: "no runtime here".to_string()
            }
        );
        let err = loader.instantiate(vec![]).await.err().unwrap();
        assert_eq!(err.to_string(), "no runtime here");
    }

    /// A compiler which runs from `tool/`, a sibling of the configuration's directory, and copies its input to the
    /// text output.
    #[cfg(unix)]
    const ELSEWHERE: &str = r#"
subjects:
  - name: dev
    compiler:
      program: sh
      working_dir: ../tool
      args:
        - -c
        - |
          input=$1; shift
          while [ $# -gt 0 ]; do
            case $1 in
              --textFile) text=$2; shift 2 ;;
              --binaryFile) bin=$2; shift 2 ;;
              *) shift ;;
            esac
          done
          cat "$input" > "$text" || exit 1
          printf '\000asm\001\000\000\000' > "$bin"
        - compiler
    converter:
      to_binary: { program: "true" }
      to_text: { program: "true" }
"#;

    #[cfg(unix)]
    #[test]
    fn fixtures_resolve_when_the_compiler_runs_elsewhere() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("h/fixtures")).unwrap();
        std::fs::create_dir(root.path().join("tool")).unwrap();
        std::fs::write(root.path().join("h/harness.yaml"), ELSEWHERE).unwrap();
        std::fs::write(root.path().join("h/fixtures/a.ts"), "export const a = 1;\n").unwrap();

        let config =
            HarnessConfig::load_relative_to(std::path::Path::new("h/harness.yaml"), root.path())
                .unwrap();
        let env = crate::environment::Environment::from_config(&config);
        let subject = build_subject(
            &config.subjects[0],
            &config,
            Arc::new(UnsupportedLoader::new("test")),
        );

        let compiled = subject.compiler.compile_file(
            &env.fixtures_dir.join("a.ts"),
            &crate::directive::CompilerConfig::base(),
        );
        let module = compiled.module.unwrap();
        assert_eq!(module.emit_text().unwrap(), "export const a = 1;\n");
    }

    #[test]
    fn subjects_are_named_from_config() {
        let config = HarnessConfig::parse(
            r#"
subjects:
  - name: dist
    compiler: { program: node, args: [dist/asc.js] }
    converter:
      to_binary: { program: wat2wasm }
      to_text: { program: wasm2wat }
"#,
            std::path::Path::new("/repo/harness.yaml"),
        )
        .unwrap();
        let subject = build_subject(
            &config.subjects[0],
            &config,
            Arc::new(UnsupportedLoader::new("test")),
        );
        assert_eq!(subject.name, "dist");
        assert!(subject.loader.capability().is_unsupported());
    }
}
