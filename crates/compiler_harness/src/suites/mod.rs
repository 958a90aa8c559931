//! The suites run against each subject.
//!
//! - [compiler]: compile each snapshot fixture and compare its canonical text with the golden file.
//! - [interop]: compile each interop fixture, load it, and hand the instance to its runner.
//! - [smoke]: compile a source held in memory.
//! - [roundtrip]: push a module through the converter and back.
use std::path::Path;

pub mod compiler;
pub mod interop;
pub mod roundtrip;
pub mod smoke;

/// A fixture's name: its path under `root` without the extension, always `/`-separated.
fn fixture_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path).with_extension("");
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Every file under `root` ending in `.{extension}`, sorted.  A missing root yields nothing.
fn files_with_extension(root: &Path, extension: &str) -> anyhow::Result<Vec<std::path::PathBuf>> {
    if !root.exists() {
        log::warn!("Fixture directory {} does not exist", root.display());
        return Ok(vec![]);
    }

    let mut found = vec![];
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(extension)
        {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}
