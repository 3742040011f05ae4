//! Pattern classification and matching.
//!
//! A pattern is treated as a regular expression when it starts with `^`,
//! ends with `$`, or contains `.*`. Anything else is a literal matched by
//! substring containment. Classification and compilation happen once, when
//! the watch is registered.
//!
//! Two search modes exist and return different things on a match:
//!
//! - Text bodies: the entire body is the matched text.
//! - JSON bodies (`Content-Type` contains `application/json`): the tree is
//!   walked depth-first and the first matching string leaf is returned on
//!   its own. Arrays are walked in index order, objects in map order.
//!   Numbers, booleans and null are never matched.

use crate::errors::CheckError;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Content-type fragment that selects JSON traversal.
const JSON_CONTENT_TYPE: &str = "application/json";

/// How a pattern is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Substring containment.
    Literal,
    /// Regular-expression search.
    Regex,
}

impl PatternKind {
    /// Classify a raw pattern string.
    pub fn classify(pattern: &str) -> Self {
        if pattern.starts_with('^') || pattern.ends_with('$') || pattern.contains(".*") {
            PatternKind::Regex
        } else {
            PatternKind::Literal
        }
    }

    /// Returns the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Literal => "literal",
            PatternKind::Regex => "regex",
        }
    }
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// A classified, ready-to-use pattern.
#[derive(Debug, Clone)]
pub struct PatternSpec {
    raw: String,
    regex: Option<Regex>,
}

impl PatternSpec {
    /// Classify `raw` and compile it if it is a regex.
    ///
    /// # Errors
    ///
    /// Returns `PatternError::InvalidRegex` when a pattern classified as a
    /// regex does not compile.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let regex = match PatternKind::classify(raw) {
            PatternKind::Regex => Some(Regex::new(raw)?),
            PatternKind::Literal => None,
        };

        Ok(Self {
            raw: raw.to_string(),
            regex,
        })
    }

    /// The pattern as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> PatternKind {
        if self.regex.is_some() {
            PatternKind::Regex
        } else {
            PatternKind::Literal
        }
    }

    /// Test a single string against the pattern.
    pub fn is_match(&self, text: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(text),
            None => text.contains(self.raw.as_str()),
        }
    }

    /// Search a response body for the pattern.
    ///
    /// Returns `Ok(Some(text))` on a match, `Ok(None)` when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::InvalidJson` when `content_type` announces JSON
    /// and the body does not parse.
    pub fn find_match(
        &self,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<Option<String>, CheckError> {
        let is_json = content_type.is_some_and(|ct| ct.contains(JSON_CONTENT_TYPE));

        if is_json {
            let document: Value = serde_json::from_slice(body)
                .map_err(|e| CheckError::InvalidJson(e.to_string()))?;
            return Ok(self.find_in_json(&document).map(str::to_string));
        }

        let text = String::from_utf8_lossy(body);
        if self.is_match(&text) {
            Ok(Some(text.into_owned()))
        } else {
            Ok(None)
        }
    }

    /// Depth-first search for the first string leaf that matches.
    pub fn find_in_json<'a>(&self, value: &'a Value) -> Option<&'a str> {
        match value {
            Value::String(s) => self.is_match(s).then_some(s.as_str()),
            Value::Array(items) => items.iter().find_map(|item| self.find_in_json(item)),
            Value::Object(members) => members.values().find_map(|member| self.find_in_json(member)),
            Value::Null | Value::Bool(_) | Value::Number(_) => None,
        }
    }
}
