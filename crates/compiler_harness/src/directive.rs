//! Per-fixture compiler configuration.
//!
//! A fixture may start with a directive line: the sentinel `//!` immediately followed by a JSON object, e.g.
//! `//!{"silent":false}`.  The object is laid over the base configuration key by key.  Keys the base doesn't know about
//! are kept, so fixtures can pass options the harness has never heard of straight through to the compiler.
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

pub const DIRECTIVE_SENTINEL: &str = "//!";

#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    #[error("directive line is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("directive line must hold a JSON object, found {0}")]
    NotAnObject(String),
}

/// Options handed verbatim to the compiler.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CompilerConfig {
    options: BTreeMap<String, JsonValue>,
}

impl CompilerConfig {
    /// The configuration every compilation starts from: `{"silent": true}`.
    pub fn base() -> Self {
        let mut options = BTreeMap::new();
        options.insert("silent".to_string(), JsonValue::Bool(true));
        Self { options }
    }

    /// Apply `overrides` on top of `self`, returning the merged configuration.
    pub fn merged_with(&self, overrides: impl IntoIterator<Item = (String, JsonValue)>) -> Self {
        let mut options = self.options.clone();
        for (k, v) in overrides {
            options.insert(k, v);
        }
        Self { options }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.options.get(key)
    }

    #[cfg(test)]
    pub fn is_silent(&self) -> bool {
        matches!(self.get("silent"), Some(JsonValue::Bool(true)))
    }

    pub fn to_json(&self) -> String {
        // A map of strings to JSON values always serializes.
        serde_json::to_string(&self.options).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Parse the directive on the first line of `source`, if any.
///
/// Only the first line is looked at.  A line without the sentinel yields `None`.
pub fn parse_directive(
    source: &str,
) -> Result<Option<serde_json::Map<String, JsonValue>>, DirectiveError> {
    let first_line = source.lines().next().unwrap_or("");
    let Some(payload) = first_line.strip_prefix(DIRECTIVE_SENTINEL) else {
        return Ok(None);
    };

    match serde_json::from_str::<JsonValue>(payload)? {
        JsonValue::Object(map) => Ok(Some(map)),
        other => Err(DirectiveError::NotAnObject(other.to_string())),
    }
}

/// Compute the configuration for a fixture: the base, overridden by the fixture's directive.
pub fn extract_config(source: &str) -> Result<CompilerConfig, DirectiveError> {
    let base = CompilerConfig::base();
    Ok(match parse_directive(source)? {
        Some(overrides) => base.merged_with(overrides),
        None => base,
    })
}
