// src/types.rs

use std::fmt;

/// Deadline class a handler picks for its invocation.
///
/// The executor never sees the class, only the [`std::time::Duration`]
/// that [`crate::config::TimeoutSettings::for_class`] resolves it to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutClass {
    /// Discovery, search, listing, project init.
    Short,
    /// Compilation (`pio run`).
    Compile,
    /// Device flashing (`pio run --target upload`).
    Flash,
}

impl fmt::Display for TimeoutClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeoutClass::Short => "short",
            TimeoutClass::Compile => "compile",
            TimeoutClass::Flash => "flash",
        };
        f.write_str(s)
    }
}
