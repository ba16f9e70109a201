// src/validate/library.rs

//! Library specs, registry search queries and monitor baud rates.

use std::fmt;

use serde::Serialize;

use super::{SHELL_METACHARACTERS, ValidationError, has_control_chars, printable};

const MAX_LIBRARY_SPEC_LEN: usize = 128;
const MAX_SEARCH_QUERY_LEN: usize = 256;

/// Baud rates PlatformIO's monitor and common USB-serial bridges accept.
pub const STANDARD_BAUD_RATES: &[u32] = &[
    300, 1200, 2400, 4800, 9600, 14400, 19200, 28800, 38400, 57600, 74880, 115200, 230400,
    250000, 460800, 500000, 921600, 1000000, 2000000,
];

/// A registry library spec such as `ArduinoJson`,
/// `bblanchon/ArduinoJson@^6.21.0` or `knolleary/PubSubClient @ ~2.8`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LibrarySpec(String);

impl LibrarySpec {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LibrarySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn validate_library_spec(raw: &str) -> Result<LibrarySpec, ValidationError> {
    let reject = |reason: String| ValidationError::InvalidArgument {
        field: "library",
        input: printable(raw),
        reason,
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(reject("library name is empty".to_string()));
    }
    if trimmed.len() > MAX_LIBRARY_SPEC_LEN {
        return Err(reject(format!(
            "longer than {MAX_LIBRARY_SPEC_LEN} characters"
        )));
    }
    if trimmed.starts_with('-') {
        return Err(reject("must not start with '-'".to_string()));
    }
    if let Some(bad) = trimmed.chars().find(|c| {
        !(c.is_ascii_alphanumeric()
            || matches!(c, '-' | '_' | '.' | '/' | '@' | '^' | '~' | '=' | '+' | ' '))
    }) {
        return Err(reject(format!("character {bad:?} not allowed")));
    }

    Ok(LibrarySpec(trimmed.to_string()))
}

/// Free-text registry search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn validate_search_query(raw: &str) -> Result<SearchQuery, ValidationError> {
    let reject = |reason: &str| ValidationError::InvalidArgument {
        field: "query",
        input: printable(raw),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(reject("query is empty"));
    }
    if trimmed.chars().count() > MAX_SEARCH_QUERY_LEN {
        return Err(reject("query is too long"));
    }
    if has_control_chars(trimmed) {
        return Err(reject("query contains control characters"));
    }
    if trimmed.contains(SHELL_METACHARACTERS) {
        return Err(reject("query contains shell metacharacters"));
    }
    if trimmed.starts_with('-') {
        return Err(reject("query must not start with '-'"));
    }

    Ok(SearchQuery(trimmed.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BaudRate(u32);

impl BaudRate {
    pub const DEFAULT: BaudRate = BaudRate(9600);

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn validate_baud_rate(raw: u32) -> Result<BaudRate, ValidationError> {
    if STANDARD_BAUD_RATES.contains(&raw) {
        Ok(BaudRate(raw))
    } else {
        Err(ValidationError::InvalidArgument {
            field: "baud",
            input: raw.to_string(),
            reason: "not a standard baud rate".to_string(),
        })
    }
}
