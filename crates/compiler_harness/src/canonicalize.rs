//! Reduce emitted module text to the part worth comparing.
//!
//! Module headers (type tables, imports, internal names) move whenever the compiler changes in ways the fixtures don't
//! care about.  What the fixtures pin down is the export surface and everything after it, so we cut the text at the
//! first line that starts an export, and drop the module's closing paren.
//!
//! The cut only happens when there is a preamble to remove.  Text which already starts at an export is returned as is,
//! which is what makes this idempotent: golden files are stored in canonical form and are canonicalized again when
//! read.
use regex::Regex;

lazy_static::lazy_static! {
    static ref EXPORT_LINE: Regex = Regex::new(r"(?m)^[ \t]*\(export").unwrap();
    static ref CLOSING_PAREN: Regex = Regex::new(r"\)\r?\n?\z").unwrap();
}

pub fn canonicalize(text: &str) -> String {
    let Some(found) = EXPORT_LINE.find(text) else {
        return text.to_string();
    };

    if found.start() == 0 {
        return text.to_string();
    }

    CLOSING_PAREN.replace(&text[found.start()..], "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use proptest::{prop_assert_eq, proptest};

    const EMITTED: &str = "(module
 (type $ii (func (param i32) (result i32)))
 (memory $0 0)
 (export \"test\" (func $test))
 (func $test (; 0 ;) (type $ii) (param $0 i32) (result i32)
  (get_local $0)
 )
)
";

    #[test]
    fn strips_preamble_and_closing_paren() {
        assert_eq!(
            canonicalize(EMITTED),
            " (export \"test\" (func $test))
 (func $test (; 0 ;) (type $ii) (param $0 i32) (result i32)
  (get_local $0)
 )
"
        );
    }

    #[test]
    fn text_without_exports_is_untouched() {
        let text = "(module\n (memory $0 0)\n)\n";
        assert_eq!(canonicalize(text), text);
    }

    #[test]
    fn only_line_leading_exports_count() {
        let text = "(module\n ;; (export in a comment\n (func $a)\n)\n";
        assert_eq!(canonicalize(text), text);
    }

    #[test]
    fn crlf_closing_line() {
        let text = "(module\r\n (export \"a\" (func $a))\r\n)\r\n";
        assert_eq!(canonicalize(text), " (export \"a\" (func $a))\r\n");
    }

    #[test]
    fn canonical_text_is_a_fixed_point() {
        let once = canonicalize(EMITTED);
        assert_eq!(canonicalize(&once), once);
    }

    proptest! {
        #[test]
        fn idempotent(
            preamble in "[ -~\n]{0,40}",
            body in "[ ()a-z\"\n]{0,60}",
            tail in "(\\)\n?)?",
        ) {
            let text = format!("{preamble}\n (export{body}{tail}");
            let once = canonicalize(&text);
            prop_assert_eq!(canonicalize(&once), once);
        }
    }
}
