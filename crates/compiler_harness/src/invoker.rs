//! The boundary between the harness and the compiler under test.
//!
//! Nothing the compiler does may take a suite down: errors and panics alike come back as a [CompileResult] with a
//! `failure`, and the fixture that caused them fails on its own.
use std::fmt::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use crate::directive::CompilerConfig;
use crate::style::{paint, Color};
use crate::subject::{Compilation, CompiledModule, Compiler, Diagnostic, Severity};

#[derive(Copy, Clone, Debug)]
pub enum CompileInput<'a> {
    File(&'a Path),
    Source { name: &'a str, source: &'a str },
}

pub struct CompileResult {
    /// `None` exactly when `failure` is set.
    pub module: Option<Box<dyn CompiledModule>>,
    pub diagnostics: Vec<Diagnostic>,
    /// Why the compiler threw, if it did.
    pub failure: Option<String>,
}

impl CompileResult {
    #[cfg(test)]
    pub fn threw(&self) -> bool {
        self.failure.is_some()
    }

    #[cfg(test)]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Diagnostics formatted for a human, or `None` if there were none.
    pub fn render_diagnostics(&self, color: bool) -> Option<String> {
        if self.diagnostics.is_empty() {
            return None;
        }
        Some(format_diagnostics(&self.diagnostics, color))
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return s.to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "compiler panicked with a non-string payload".to_string()
}

/// Run one compilation, isolating whatever goes wrong inside it.
pub fn invoke(
    compiler: &dyn Compiler,
    input: CompileInput<'_>,
    config: &CompilerConfig,
) -> CompileResult {
    log::trace!("Compiling {input:?} with {}", config.to_json());

    let caught = catch_unwind(AssertUnwindSafe(|| match input {
        CompileInput::File(path) => compiler.compile_file(path, config),
        CompileInput::Source { name, source } => compiler.compile_source(name, source, config),
    }));

    let result = match caught {
        Ok(Compilation {
            module: Ok(module),
            diagnostics,
        }) => CompileResult {
            module: Some(module),
            diagnostics,
            failure: None,
        },
        Ok(Compilation {
            module: Err(e),
            diagnostics,
        }) => CompileResult {
            module: None,
            diagnostics,
            failure: Some(format!("{e:#}")),
        },
        Err(payload) => CompileResult {
            module: None,
            diagnostics: vec![],
            failure: Some(panic_message(&*payload)),
        },
    };

    if !result.diagnostics.is_empty() {
        log::debug!(
            "Compilation of {input:?} produced {} diagnostics",
            result.diagnostics.len()
        );
    }

    result
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Cyan,
    }
}

/// One diagnostic per line, `SEVERITY: message`, with continuation lines indented.
pub fn format_diagnostics(diagnostics: &[Diagnostic], color: bool) -> String {
    let mut out = String::new();
    for d in diagnostics {
        let label = paint(color, severity_color(d.severity), &d.severity.to_string());
        let mut lines = d.message.lines();
        let first = lines.next().unwrap_or("");
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{label}: {first}");
        for l in lines {
            let _ = writeln!(out, "  {l}");
        }
    }

    match out.strip_suffix('\n') {
        Some(s) => s.to_string(),
        None => out,
    }
}
