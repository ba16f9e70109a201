// src/validate/mod.rs

//! Input validation for everything that ends up on a tool command line.
//!
//! Every validator here is a pure, total function: no filesystem access, no
//! environment reads, same input gives the same decision. Accepted values are
//! wrapped in newtypes that can only be constructed by these functions, and
//! the executor's argument builder only accepts those newtypes (or static
//! literals). That is what keeps raw request strings off the command line.
//!
//! - [`path`]: project directories, normalized and contained in a root set.
//! - [`identifier`]: board ids, environment names, framework names.
//! - [`port`]: serial port names.
//! - [`library`]: library specs, search queries, baud rates.

pub mod identifier;
pub mod library;
pub mod path;
pub mod port;

use thiserror::Error;

pub use identifier::{MAX_IDENTIFIER_LEN, ValidatedIdentifier, validate_identifier};
pub use library::{
    BaudRate, LibrarySpec, SearchQuery, validate_baud_rate, validate_library_spec,
    validate_search_query,
};
pub use path::{PathPolicy, ValidatedPath};
pub use port::{ValidatedPort, validate_port};

/// Why an input was rejected before any process was started.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid path '{input}': {reason}")]
    InvalidPath { input: String, reason: String },

    #[error("invalid {field} '{input}': {reason}")]
    InvalidIdentifier {
        field: &'static str,
        input: String,
        reason: String,
    },

    #[error("invalid serial port '{input}': {reason}")]
    InvalidPort { input: String, reason: String },

    #[error("invalid {field} '{input}': {reason}")]
    InvalidArgument {
        field: &'static str,
        input: String,
        reason: String,
    },
}

impl ValidationError {
    /// The rejected input, as given by the caller.
    pub fn input(&self) -> &str {
        match self {
            ValidationError::InvalidPath { input, .. }
            | ValidationError::InvalidIdentifier { input, .. }
            | ValidationError::InvalidPort { input, .. }
            | ValidationError::InvalidArgument { input, .. } => input,
        }
    }

    /// Name of the request field that was rejected.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidPath { .. } => "path",
            ValidationError::InvalidPort { .. } => "port",
            ValidationError::InvalidIdentifier { field, .. }
            | ValidationError::InvalidArgument { field, .. } => field,
        }
    }
}

/// Characters that would split or substitute arguments if the value ever
/// reached a shell. Processes are spawned without one, so this is a second
/// line of defence only.
pub(crate) const SHELL_METACHARACTERS: &[char] = &[';', '|', '&', '$', '`', '<', '>', '\n', '\r'];

pub(crate) fn has_control_chars(s: &str) -> bool {
    s.chars().any(char::is_control)
}

/// Render an input for error messages without letting control characters
/// through to logs or the transport.
pub(crate) fn printable(input: &str) -> String {
    input.escape_debug().to_string()
}
