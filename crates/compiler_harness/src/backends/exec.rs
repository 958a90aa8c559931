use std::ffi::OsString;
use std::path::Path;
use std::process as proc;

use anyhow::{Context, Result};

use crate::harness_config::CommandSpec;

/// What an external tool left behind.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: proc::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Fail with the tool's stderr if it exited unsuccessfully, or its stdout if stderr is empty.
    pub fn check(self, what: &str) -> Result<Self> {
        if self.status.success() {
            return Ok(self);
        }
        let said = match self.stderr.trim_end() {
            "" => self.stdout.trim_end(),
            e => e,
        };
        anyhow::bail!("{what} exited with {}:\n{said}", self.status)
    }
}

/// Run `spec` with `extra_args` appended and wait for it.
///
/// `cwd` is used unless the command names its own working directory; an empty `cwd` means the current directory.  Stdin
/// is null and both output streams are captured.
pub fn exec_tool(
    spec: &CommandSpec,
    cwd: &Path,
    extra_args: impl IntoIterator<Item = OsString>,
) -> Result<ToolOutput> {
    let mut command = proc::Command::new(&spec.program);
    command
        .args(&spec.args)
        .args(extra_args)
        .stdin(proc::Stdio::null())
        .stdout(proc::Stdio::piped())
        .stderr(proc::Stdio::piped());

    let dir = match &spec.working_dir {
        Some(d) => cwd.join(d),
        None => cwd.to_path_buf(),
    };
    if !dir.as_os_str().is_empty() {
        command.current_dir(&dir);
    }

    log::trace!("Running {command:?}");
    let output = command
        .output()
        .with_context(|| format!("while running {}", spec.program))?;

    Ok(ToolOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
