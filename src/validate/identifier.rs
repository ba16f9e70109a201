// src/validate/identifier.rs

use std::fmt;

use serde::Serialize;

use super::{ValidationError, printable};

/// Upper bound on board ids, environment and framework names.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// A board id, environment name or framework name.
///
/// Case is preserved and significant: `Uno` and `uno` are different values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ValidatedIdentifier(String);

impl ValidatedIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate an identifier for the request field `field`.
///
/// Accepts ASCII alphanumerics, `-`, `_` and `.`, up to
/// [`MAX_IDENTIFIER_LEN`] characters. A leading `-` is refused so the value
/// can never be read as a flag by the tool.
pub fn validate_identifier(
    field: &'static str,
    raw: &str,
) -> Result<ValidatedIdentifier, ValidationError> {
    let reject = |reason: String| ValidationError::InvalidIdentifier {
        field,
        input: printable(raw),
        reason,
    };

    if raw.is_empty() {
        return Err(reject("value is empty".to_string()));
    }
    if raw.len() > MAX_IDENTIFIER_LEN {
        return Err(reject(format!(
            "longer than {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    if raw.starts_with('-') {
        return Err(reject("must not start with '-'".to_string()));
    }
    if let Some(bad) = raw
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(reject(format!(
            "character {bad:?} not allowed (use letters, digits, '-', '_' or '.')"
        )));
    }

    Ok(ValidatedIdentifier(raw.to_string()))
}
