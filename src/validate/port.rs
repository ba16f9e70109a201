// src/validate/port.rs

//! Serial port names.
//!
//! Only the syntactic shape is checked. Whether the device is plugged in is
//! a runtime question the tool answers with its own error.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{ValidationError, printable};

/// Accepted port shapes, tried in order.
static PORT_SHAPES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("unix device", r"^/dev/(tty|cu)[A-Za-z0-9._-]+$"),
        ("udev link", r"^/dev/serial/by-(id|path)/[A-Za-z0-9._:+-]+$"),
        ("windows COM", r"^(?i:com)[1-9][0-9]{0,2}$"),
        ("windows device", r"^\\\\\.\\(?i:com)[1-9][0-9]{0,2}$"),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (name, re)))
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ValidatedPort(String);

impl ValidatedPort {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn validate_port(raw: &str) -> Result<ValidatedPort, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::InvalidPort {
            input: String::new(),
            reason: "port is empty".to_string(),
        });
    }

    if PORT_SHAPES.iter().any(|(_, re)| re.is_match(raw)) {
        return Ok(ValidatedPort(raw.to_string()));
    }

    Err(ValidationError::InvalidPort {
        input: printable(raw),
        reason: "expected a device path like /dev/ttyUSB0 or /dev/cu.usbserial-0001, or COM3"
            .to_string(),
    })
}
