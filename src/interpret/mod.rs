// src/interpret/mod.rs

//! Turn an [`ExecutionOutcome`] into success or a list of diagnostics.
//!
//! Exit status decides success. Stdout of a successful run is passed
//! through untouched; structuring it is the handler's job. For failures the
//! error text is scanned line by line against a [`SignatureTable`]. This is
//! best-effort: lines that match nothing are only lost detail, never an
//! error of their own.

pub mod signatures;

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::exec::ExecutionOutcome;

pub use signatures::{Signature, SignatureKind, SignatureTable};

/// Cap on extracted diagnostic lines.
pub const MAX_DIAGNOSTICS: usize = 20;

/// Number of trailing lines kept when no signature matches.
pub const FALLBACK_LINES: usize = 3;

static ANSI_ESCAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").ok());

/// One extracted line of explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line: String,
    /// `None` for fallback lines that matched no signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<SignatureKind>,
}

/// A non-zero exit, reduced to what a caller can act on.
#[derive(Debug, Clone)]
pub struct ToolFailure {
    pub exit_code: i32,
    pub diagnostics: Vec<Diagnostic>,
    /// Highest-ranked signature among the matched lines.
    pub primary: Option<SignatureKind>,
    pub elapsed: Duration,
}

impl ToolFailure {
    pub fn lines(&self) -> Vec<String> {
        self.diagnostics.iter().map(|d| d.line.clone()).collect()
    }
}

#[derive(Debug)]
pub enum Interpretation {
    Success { stdout: String, elapsed: Duration },
    Failure(ToolFailure),
}

/// Interpret with the builtin signature table.
pub fn interpret(outcome: ExecutionOutcome) -> Interpretation {
    Interpreter::builtin().interpret(outcome)
}

#[derive(Debug, Clone, Copy)]
pub struct Interpreter<'t> {
    table: &'t SignatureTable,
}

impl Interpreter<'static> {
    pub fn builtin() -> Self {
        Self {
            table: SignatureTable::builtin(),
        }
    }
}

impl<'t> Interpreter<'t> {
    pub fn new(table: &'t SignatureTable) -> Self {
        Self { table }
    }

    pub fn interpret(&self, outcome: ExecutionOutcome) -> Interpretation {
        let ExecutionOutcome {
            stdout,
            stderr,
            exit_code,
            elapsed,
        } = outcome;

        if exit_code == 0 {
            return Interpretation::Success { stdout, elapsed };
        }

        // PlatformIO prints compiler output on stdout; only look there when
        // stderr has nothing left once escape codes are stripped.
        let mut lines = clean_lines(&stderr);
        if lines.is_empty() {
            lines = clean_lines(&stdout);
        }
        let (mut diagnostics, primary) = self.extract_lines(&lines);

        // Non-empty stderr always yields at least one diagnostic, escaped
        // when nothing printable survives cleaning.
        if diagnostics.is_empty() && !stderr.is_empty() {
            diagnostics.push(Diagnostic {
                line: format!("{stderr:?}"),
                kind: None,
            });
        }

        debug!(
            exit_code,
            diagnostics = diagnostics.len(),
            primary = ?primary,
            "interpreted failed tool run"
        );

        Interpretation::Failure(ToolFailure {
            exit_code,
            diagnostics,
            primary,
            elapsed,
        })
    }

    /// Matched lines in source order, deduplicated; otherwise the last
    /// non-empty lines.
    pub fn extract(&self, text: &str) -> (Vec<Diagnostic>, Option<SignatureKind>) {
        self.extract_lines(&clean_lines(text))
    }

    fn extract_lines(&self, lines: &[String]) -> (Vec<Diagnostic>, Option<SignatureKind>) {
        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        let mut best: Option<(usize, SignatureKind)> = None;

        for line in lines {
            let Some((rank, kind)) = self.table.match_line(line) else {
                continue;
            };
            if best.is_none_or(|(best_rank, _)| rank < best_rank) {
                best = Some((rank, kind));
            }
            if matched.len() < MAX_DIAGNOSTICS && seen.insert(line.as_str()) {
                matched.push(Diagnostic {
                    line: line.clone(),
                    kind: Some(kind),
                });
            }
        }

        if !matched.is_empty() {
            return (matched, best.map(|(_, kind)| kind));
        }

        let mut tail: Vec<Diagnostic> = Vec::new();
        for line in lines.iter().rev() {
            if tail.len() == FALLBACK_LINES {
                break;
            }
            if tail.iter().all(|d| d.line != *line) {
                tail.push(Diagnostic {
                    line: line.clone(),
                    kind: None,
                });
            }
        }
        tail.reverse();
        (tail, None)
    }
}

/// Non-empty lines of `text` with escape codes stripped.
fn clean_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(clean_line)
        .filter(|l| !l.is_empty())
        .collect()
}

fn clean_line(line: &str) -> String {
    let stripped = match ANSI_ESCAPE.as_ref() {
        Some(re) => re.replace_all(line, "").into_owned(),
        None => line.to_string(),
    };
    stripped.trim().to_string()
}
