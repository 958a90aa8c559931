//! A differential test harness for a source-to-binary-module compiler.
//!
//! The compiler under test is a black box: it turns `.ts` sources into a module which can be validated, optimized and
//! emitted as text or binary.  This crate is a binary target which checks such a compiler in a few ways:
//!
//! - Snapshot fixtures in `fixtures/`.  Each source is compiled with the configuration given on its first line (see
//!   [directive]), the emitted text is cut down to its export surface (see [canonicalize]) and compared character by
//!   character with the sibling `.wat` golden file.  Pass `--create` to write golden files which don't exist yet.
//! - Interop fixtures in `interop/`.  Each `<id>.test.ts` is compiled to a binary, loaded into a live instance, and
//!   handed to the runner registered for `<id>` (see [runners] and [register_runner!]).  Loads run concurrently.  If
//!   the host can't execute modules the suite is skipped, loudly.
//! - A smoke test compiling a source held in memory, and a round trip of a fixed module through the text/binary
//!   converter.
//!
//! All of the above runs once per configured subject: two builds of the same compiler (say the development sources
//! and a packaged distribution) are expected to produce the same results, and every test name starts with the subject
//! it ran against, e.g. `dist/compiler/std/array`.
//!
//! Subjects, fixture locations and the external programs involved are configured in `harness.yaml` next to this
//! crate's manifest.  See [harness_config].
#[macro_use]
mod registration_macro;

mod assertions;
mod backends;
mod canonicalize;
mod cli_args;
mod commands;
mod diff;
mod directive;
mod environment;
mod golden;
mod harness_config;
mod invoker;
mod orchestrator;
mod outcome;
mod registry;
mod reporter;
mod runners;
mod style;
mod subject;
mod suites;
mod test_filtering;

#[cfg(test)]
mod testing;

fn main() {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli_args::CliArgs::parse();
    match commands::dispatch_command(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            log::error!("{e:?}");
            std::process::exit(2);
        }
    }
}
