//! In-memory stand-ins for the collaborators, used by unit tests.
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};

use crate::directive::CompilerConfig;
use crate::subject::*;

/// What the fake compiler does for one input.
#[derive(Clone, Debug, Default)]
pub struct FakeOutcome {
    text: String,
    binary: Option<Vec<u8>>,
    optimized_text: Option<String>,
    diagnostics: Vec<Diagnostic>,
    optimize_diagnostics: Vec<Diagnostic>,
    fail: Option<String>,
    panic: Option<String>,
    invalid: bool,
}

impl FakeOutcome {
    pub fn module(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn fail(message: &str) -> Self {
        Self {
            fail: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn panic(message: &str) -> Self {
        Self {
            panic: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn binary(mut self, binary: &[u8]) -> Self {
        self.binary = Some(binary.to_vec());
        self
    }

    pub fn optimized(mut self, text: &str) -> Self {
        self.optimized_text = Some(text.to_string());
        self
    }

    pub fn invalid(mut self) -> Self {
        self.invalid = true;
        self
    }

    pub fn warning(mut self, message: &str) -> Self {
        self.diagnostics
            .push(Diagnostic::new(Severity::Warning, message));
        self
    }

    /// A warning from the optimizer rather than the compiler.
    pub fn optimizer_warning(mut self, message: &str) -> Self {
        self.optimize_diagnostics
            .push(Diagnostic::new(Severity::Warning, message));
        self
    }

    pub fn error(mut self, message: &str) -> Self {
        self.diagnostics.push(Diagnostic::new(Severity::Error, message));
        self
    }
}

struct FakeModule {
    text: String,
    binary: Vec<u8>,
    optimized_text: Option<String>,
    optimize_diagnostics: Vec<Diagnostic>,
    invalid: bool,
}

impl CompiledModule for FakeModule {
    fn validate(&self) -> Result<()> {
        if self.invalid {
            bail!("module failed validation");
        }
        Ok(())
    }

    fn emit_text(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn emit_binary(&self) -> Result<Vec<u8>> {
        Ok(self.binary.clone())
    }

    fn optimize(&mut self) -> Result<Vec<Diagnostic>> {
        if let Some(t) = self.optimized_text.take() {
            self.text = t;
        }
        Ok(self.optimize_diagnostics.clone())
    }
}

/// Answers compilations from a table keyed by source name (for strings) or file stem (for files).
#[derive(Default)]
pub struct FakeCompiler {
    outcomes: HashMap<String, FakeOutcome>,
    /// Every compilation seen, in order, with the configuration it was given.
    pub seen: Mutex<Vec<(String, CompilerConfig)>>,
}

impl FakeCompiler {
    pub fn with_source(mut self, key: &str, outcome: FakeOutcome) -> Self {
        self.outcomes.insert(key.to_string(), outcome);
        self
    }

    fn answer(&self, key: &str, config: &CompilerConfig) -> Compilation {
        self.seen
            .lock()
            .unwrap()
            .push((key.to_string(), config.clone()));

        let Some(outcome) = self.outcomes.get(key).cloned() else {
            return Compilation {
                module: Err(anyhow!("fake compiler has nothing for {key}")),
                diagnostics: vec![],
            };
        };

        if let Some(p) = outcome.panic {
            panic!("{p}");
        }

        let module: Result<Box<dyn CompiledModule>> = match outcome.fail {
            Some(f) => Err(anyhow!(f)),
            None => Ok(Box::new(FakeModule {
                binary: outcome
                    .binary
                    .unwrap_or_else(|| outcome.text.clone().into_bytes()),
                text: outcome.text,
                optimized_text: outcome.optimized_text,
                optimize_diagnostics: outcome.optimize_diagnostics,
                invalid: outcome.invalid,
            })),
        };

        Compilation {
            module,
            diagnostics: outcome.diagnostics,
        }
    }
}

/// Strip the `.test` interop suffix as well as the extension, so both fixture kinds key by bare name.
fn file_key(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.strip_suffix(".test").unwrap_or(&stem).to_string()
}

impl Compiler for FakeCompiler {
    fn compile_file(&self, path: &Path, config: &CompilerConfig) -> Compilation {
        self.answer(&file_key(path), config)
    }

    fn compile_source(&self, name: &str, _source: &str, config: &CompilerConfig) -> Compilation {
        self.answer(name, config)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    ToBinary,
    ToText,
}

/// A converter whose "binary" is the text behind a magic prefix.  Without name preservation, `$names` are dropped.
#[derive(Default)]
pub struct FakeConverter {
    pub fail_on: Option<Direction>,
}

const FAKE_MAGIC: &[u8] = b"\0asm";

impl Converter for FakeConverter {
    fn text_to_binary(&self, text: &str, options: &ConvertOptions) -> Result<Vec<u8>> {
        if self.fail_on == Some(Direction::ToBinary) {
            bail!("unexpected token");
        }

        let body = if options.preserve_names {
            text.to_string()
        } else {
            text.split(' ')
                .filter(|t| !t.starts_with('$'))
                .collect::<Vec<_>>()
                .join(" ")
        };
        let mut out = FAKE_MAGIC.to_vec();
        out.extend(body.into_bytes());
        Ok(out)
    }

    fn binary_to_text(&self, binary: &[u8], _options: &ConvertOptions) -> Result<String> {
        if self.fail_on == Some(Direction::ToText) {
            bail!("malformed section");
        }

        let body = binary
            .strip_prefix(FAKE_MAGIC)
            .ok_or_else(|| anyhow!("missing magic"))?;
        Ok(String::from_utf8(body.to_vec())?)
    }
}

/// What the fake loader does with a particular binary.
#[derive(Clone, Debug)]
pub enum LoadBehavior {
    Resolve { delay: Duration },
    Reject { delay: Duration, message: String },
}

pub struct FakeLoader {
    pub capability: Capability,
    pub behaviors: HashMap<Vec<u8>, LoadBehavior>,
    /// Binaries in the order their loads settled.
    pub settled: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Default for FakeLoader {
    fn default() -> Self {
        Self {
            capability: Capability::Supported,
            behaviors: HashMap::new(),
            settled: Default::default(),
        }
    }
}

impl FakeLoader {
    pub fn unsupported(reason: &str) -> Self {
        Self {
            capability: Capability::Unsupported {
                reason: reason.to_string(),
            },
            ..Default::default()
        }
    }

    pub fn with_behavior(mut self, binary: &[u8], behavior: LoadBehavior) -> Self {
        self.behaviors.insert(binary.to_vec(), behavior);
        self
    }
}

#[async_trait::async_trait]
impl Loader for FakeLoader {
    fn capability(&self) -> Capability {
        self.capability.clone()
    }

    async fn instantiate(&self, binary: Vec<u8>) -> Result<Box<dyn ModuleInstance>> {
        let behavior = self
            .behaviors
            .get(&binary)
            .cloned()
            .unwrap_or(LoadBehavior::Resolve {
                delay: Duration::ZERO,
            });

        let res = match behavior {
            LoadBehavior::Resolve { delay } => {
                tokio::time::sleep(delay).await;
                Ok(Box::new(FakeInstance) as Box<dyn ModuleInstance>)
            }
            LoadBehavior::Reject { delay, message } => {
                tokio::time::sleep(delay).await;
                Err(anyhow!(message))
            }
        };
        self.settled.lock().unwrap().push(binary);
        res
    }
}

/// Exports `add(i32, i32) -> i32` and `identity(i32) -> i32`.
pub struct FakeInstance;

impl ModuleInstance for FakeInstance {
    fn exports(&self) -> Vec<String> {
        vec!["add".to_string(), "identity".to_string()]
    }

    fn call(&mut self, export: &str, args: &[Value]) -> Result<Vec<Value>> {
        match (export, args) {
            ("add", [Value::I32(a), Value::I32(b)]) => Ok(vec![Value::I32(a.wrapping_add(*b))]),
            ("identity", [Value::I32(a)]) => Ok(vec![Value::I32(*a)]),
            _ => bail!("no export {export} accepting {args:?}"),
        }
    }
}

/// A subject made of the given fakes.
pub fn fake_subject(name: &str, compiler: FakeCompiler, loader: FakeLoader) -> Subject {
    Subject {
        name: name.to_string(),
        compiler: Arc::new(compiler),
        converter: Arc::new(FakeConverter::default()),
        loader: Arc::new(loader),
    }
}
