//! The collaborators a subject build is made of.
//!
//! The harness never compiles, converts or executes anything itself.  It drives a [Subject], which bundles a
//! [Compiler], a [Converter] and a [Loader].  Two subjects built from the same source tree (say, the development
//! sources and a packaged distribution) are expected to behave identically, and the orchestrator runs every suite
//! against each of them.
//!
//! Everything here is a trait object so that the real backends in [crate::backends] and the fakes used by unit tests
//! are interchangeable.
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::directive::CompilerConfig;

/// Severity of a compiler diagnostic.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, derive_more::Display)]
pub enum Severity {
    #[display(fmt = "INFO")]
    Info,
    #[display(fmt = "WARNING")]
    Warning,
    #[display(fmt = "ERROR")]
    Error,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// What a compiler hands back for one compilation.
///
/// Diagnostics travel with the result rather than living on the compiler, so that draining them can never race a
/// concurrent compilation.  They may be non-empty even when `module` is `Ok`.
pub struct Compilation {
    pub module: Result<Box<dyn CompiledModule>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A module produced by a successful compilation.
pub trait CompiledModule: Send {
    /// Structural validation of the module.
    fn validate(&self) -> Result<()>;

    fn emit_text(&self) -> Result<String>;

    fn emit_binary(&self) -> Result<Vec<u8>>;

    /// Optimize in place.  Later emits reflect the optimized module.  Returns whatever the optimizer had to say.
    fn optimize(&mut self) -> Result<Vec<Diagnostic>>;
}

pub trait Compiler: Send + Sync {
    fn compile_file(&self, path: &Path, config: &CompilerConfig) -> Compilation;

    /// Compile a source held in memory.  `name` is used for diagnostics and, by backends which need one, as the file
    /// name.
    fn compile_source(&self, name: &str, source: &str, config: &CompilerConfig) -> Compilation;
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ConvertOptions {
    /// Keep debug names (`$add` and friends) across the conversion.
    pub preserve_names: bool,
}

/// Converts between the textual and the binary module representations.
pub trait Converter: Send + Sync {
    fn text_to_binary(&self, text: &str, options: &ConvertOptions) -> Result<Vec<u8>>;

    fn binary_to_text(&self, binary: &[u8], options: &ConvertOptions) -> Result<String>;
}

/// A value crossing the boundary into or out of a running instance.
#[derive(Copy, Clone, Debug, PartialEq, derive_more::Display)]
pub enum Value {
    #[display(fmt = "i32:{}", _0)]
    I32(i32),
    #[display(fmt = "i64:{}", _0)]
    I64(i64),
    #[display(fmt = "f32:{}", _0)]
    F32(f32),
    #[display(fmt = "f64:{}", _0)]
    F64(f64),
}

/// A live, executing realization of a compiled binary.
pub trait ModuleInstance: Send {
    /// Names of the exported functions.
    fn exports(&self) -> Vec<String>;

    fn call(&mut self, export: &str, args: &[Value]) -> Result<Vec<Value>>;
}

/// Whether the host can execute modules at all.
#[derive(Clone, Debug, Eq, PartialEq, derive_more::IsVariant)]
pub enum Capability {
    Supported,
    Unsupported { reason: String },
}

/// Turns a binary into a running instance.
#[async_trait::async_trait]
pub trait Loader: Send + Sync {
    fn capability(&self) -> Capability;

    async fn instantiate(&self, binary: Vec<u8>) -> Result<Box<dyn ModuleInstance>>;
}

/// One build of the compiler under test, with the tools it is exercised through.
#[derive(Clone)]
pub struct Subject {
    pub name: String,
    pub compiler: Arc<dyn Compiler>,
    pub converter: Arc<dyn Converter>,
    pub loader: Arc<dyn Loader>,
}

impl std::fmt::Debug for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subject").field("name", &self.name).finish()
    }
}
