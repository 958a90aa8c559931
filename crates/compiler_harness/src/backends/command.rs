//! A compiler and a converter which are external programs.
//!
//! The compiler is invoked as
//!
//! ```text
//! program [args...] <input> --textFile <tmp>/module.wat --binaryFile <tmp>/module.wasm --config <json> [--optimize]
//! ```
//!
//! and reports diagnostics on stderr, one per line starting with `ERROR`, `WARNING` or `INFO`; other non-empty lines
//! continue the diagnostic before them.  A non-zero exit status is a failed compilation.
//!
//! The converter is a pair of programs, one per direction, each invoked as `program [args...] [name args...] <input>
//! -o <output>`.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;

use super::exec::exec_tool;
use crate::directive::CompilerConfig;
use crate::harness_config::{CommandSpec, ConverterSpec, ConverterToolSpec};
use crate::subject::{
    Compilation, CompiledModule, Compiler, ConvertOptions, Converter, Diagnostic, Severity,
};

const WASM_MAGIC: &[u8] = b"\0asm";
const WASM_VERSION: &[u8] = &[1, 0, 0, 0];

lazy_static! {
    static ref DIAGNOSTIC_START: Regex =
        Regex::new(r"^(ERROR|WARNING|INFO)\b:?\s*(.*)$").expect("Should compile");
}

/// Split compiler stderr into diagnostics.
pub fn parse_diagnostics(stderr: &str) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = vec![];

    for line in stderr.lines() {
        if let Some(caps) = DIAGNOSTIC_START.captures(line) {
            let severity = match &caps[1] {
                "ERROR" => Severity::Error,
                "WARNING" => Severity::Warning,
                _ => Severity::Info,
            };
            diagnostics.push(Diagnostic::new(severity, &caps[2]));
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        match diagnostics.last_mut() {
            Some(d) => {
                d.message.push('\n');
                d.message.push_str(line);
            }
            None => log::trace!("Compiler stderr outside a diagnostic: {line}"),
        }
    }

    diagnostics
}

#[derive(Clone, Debug)]
pub struct CommandCompiler {
    command: CommandSpec,
    cwd: PathBuf,
}

/// Text and binary from one run of the compiler.
struct Emitted {
    text: String,
    binary: Vec<u8>,
}

impl CommandCompiler {
    pub fn new(command: CommandSpec, cwd: PathBuf) -> Self {
        Self { command, cwd }
    }

    fn run(
        &self,
        input: &Path,
        config_json: &str,
        optimize: bool,
    ) -> (Result<Emitted>, Vec<Diagnostic>) {
        let out_dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => return (Err(anyhow!(e).context("creating an output directory")), vec![]),
        };
        let text_path = out_dir.path().join("module.wat");
        let binary_path = out_dir.path().join("module.wasm");

        let mut args: Vec<OsString> = vec![
            input.into(),
            "--textFile".into(),
            text_path.clone().into(),
            "--binaryFile".into(),
            binary_path.clone().into(),
            "--config".into(),
            config_json.into(),
        ];
        if optimize {
            args.push("--optimize".into());
        }

        let output = match exec_tool(&self.command, &self.cwd, args) {
            Ok(o) => o,
            Err(e) => return (Err(e), vec![]),
        };
        let diagnostics = parse_diagnostics(&output.stderr);

        if !output.status.success() {
            return (
                Err(anyhow!("compiler exited with {}", output.status)),
                diagnostics,
            );
        }

        let emitted = std::fs::read_to_string(&text_path)
            .with_context(|| format!("reading {}", text_path.display()))
            .and_then(|text| {
                let binary = std::fs::read(&binary_path)
                    .with_context(|| format!("reading {}", binary_path.display()))?;
                Ok(Emitted { text, binary })
            });
        (emitted, diagnostics)
    }

    fn compile(
        &self,
        input: PathBuf,
        source_dir: Option<tempfile::TempDir>,
        config: &CompilerConfig,
    ) -> Compilation {
        let config_json = config.to_json();
        let (emitted, diagnostics) = self.run(&input, &config_json, false);

        let module = emitted.map(|e| {
            Box::new(CommandModule {
                compiler: self.clone(),
                input,
                _source_dir: source_dir,
                config_json,
                text: e.text,
                binary: e.binary,
            }) as Box<dyn CompiledModule>
        });

        Compilation {
            module,
            diagnostics,
        }
    }
}

impl Compiler for CommandCompiler {
    fn compile_file(&self, path: &Path, config: &CompilerConfig) -> Compilation {
        self.compile(path.to_path_buf(), None, config)
    }

    fn compile_source(&self, name: &str, source: &str, config: &CompilerConfig) -> Compilation {
        let written = tempfile::tempdir()
            .context("creating a source directory")
            .and_then(|dir| {
                let path = dir.path().join(name);
                std::fs::write(&path, source)
                    .with_context(|| format!("writing {}", path.display()))?;
                Ok((dir, path))
            });

        match written {
            Ok((dir, path)) => self.compile(path, Some(dir), config),
            Err(e) => Compilation {
                module: Err(e),
                diagnostics: vec![],
            },
        }
    }
}

struct CommandModule {
    compiler: CommandCompiler,
    input: PathBuf,

    /// Keeps a source compiled from a string on disk for as long as the module may be optimized.
    _source_dir: Option<tempfile::TempDir>,

    config_json: String,
    text: String,
    binary: Vec<u8>,
}

impl CompiledModule for CommandModule {
    fn validate(&self) -> Result<()> {
        if !self.binary.starts_with(WASM_MAGIC) {
            bail!("binary does not start with the module magic number");
        }
        if self.binary.get(4..8) != Some(WASM_VERSION) {
            bail!("binary is not version 1");
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
        let (emitted, diagnostics) = self.compiler.run(&self.input, &self.config_json, true);
        let emitted = emitted.context("optimizing")?;
        self.text = emitted.text;
        self.binary = emitted.binary;
        Ok(diagnostics)
    }
}

#[derive(Clone, Debug)]
pub struct CommandConverter {
    spec: ConverterSpec,
    cwd: PathBuf,
}

impl CommandConverter {
    pub fn new(spec: ConverterSpec, cwd: PathBuf) -> Self {
        Self { spec, cwd }
    }

    fn convert(
        &self,
        tool: &ConverterToolSpec,
        input: &[u8],
        extensions: (&str, &str),
        options: &ConvertOptions,
    ) -> Result<Vec<u8>> {
        let dir = tempfile::tempdir().context("creating a conversion directory")?;
        let input_path = dir.path().join(format!("input.{}", extensions.0));
        let output_path = dir.path().join(format!("output.{}", extensions.1));
        std::fs::write(&input_path, input)
            .with_context(|| format!("writing {}", input_path.display()))?;

        let name_args = if options.preserve_names {
            &tool.preserve_names_args
        } else {
            &tool.discard_names_args
        };

        let mut args = name_args.iter().map(OsString::from).collect::<Vec<_>>();
        args.push(input_path.into());
        args.push("-o".into());
        args.push(output_path.clone().into());

        exec_tool(&tool.command(), &self.cwd, args)?.check(&tool.program)?;
        std::fs::read(&output_path).with_context(|| format!("reading {}", output_path.display()))
    }
}

impl Converter for CommandConverter {
    fn text_to_binary(&self, text: &str, options: &ConvertOptions) -> Result<Vec<u8>> {
        self.convert(&self.spec.to_binary, text.as_bytes(), ("wat", "wasm"), options)
    }

    fn binary_to_text(&self, binary: &[u8], options: &ConvertOptions) -> Result<String> {
        let text = self.convert(&self.spec.to_text, binary, ("wasm", "wat"), options)?;
        Ok(String::from_utf8(text)?)
    }
}
