//! Text to binary to text through the subject's converter.
//!
//! The literal below must come back byte for byte when names are preserved in both directions.
use std::panic::{catch_unwind, AssertUnwindSafe};

use anyhow::Result;

use crate::diff::diff_chars;
use crate::invoker::panic_message;
use crate::orchestrator::RunOptions;
use crate::outcome::TestOutcome;
use crate::reporter::Recorder;
use crate::subject::{ConvertOptions, Converter, Subject};

pub const SUITE: &str = "roundtrip";
pub const NAME: &str = "text-binary-text";

pub const ROUNDTRIP_MODULE: &str = r#"(module (type (func (param i32 i32) (result i32))) (func $add (type 0) (param i32 i32) (result i32) get_local 0 get_local 1 i32.add) (memory 1) (export "add" (func $add)))"#;

fn convert_both_ways(
    converter: &dyn Converter,
    text: &str,
    options: &ConvertOptions,
) -> Result<String> {
    let binary = converter.text_to_binary(text, options)?;
    log::trace!("Round trip produced {} bytes", binary.len());
    converter.binary_to_text(&binary, options)
}

pub fn round_trip(converter: &dyn Converter, text: &str, color: bool) -> TestOutcome {
    let options = ConvertOptions {
        preserve_names: true,
    };

    let back = match catch_unwind(AssertUnwindSafe(|| {
        convert_both_ways(converter, text, &options)
    })) {
        Ok(Ok(t)) => t,
        Ok(Err(e)) => {
            return TestOutcome::failed_with("should convert without throwing", format!("{e:#}"))
        }
        Err(payload) => {
            return TestOutcome::failed_with(
                "should convert without throwing",
                panic_message(&*payload),
            )
        }
    };

    if back.as_bytes() == text.as_bytes() {
        TestOutcome::Passed
    } else {
        TestOutcome::failed_with(
            "text did not survive the round trip",
            diff_chars(text, &back).render(color),
        )
    }
}

pub fn run_suite(subject: &Subject, options: &RunOptions, recorder: &mut Recorder) {
    if !options.filter.matches(NAME) {
        return;
    }

    log::debug!("{}: round-tripping through the converter", subject.name);
    let outcome = round_trip(subject.converter.as_ref(), ROUNDTRIP_MODULE, options.color);
    recorder.record(SUITE, NAME, outcome, vec![]);
}
