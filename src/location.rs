//! Call-site capture.
//!
//! cmocka's C macros smuggle `__FILE__`/`__LINE__` into every assertion and
//! mock call. The idiomatic Rust replacement is `#[track_caller]` plus
//! `std::panic::Location::caller()`: callers never pass a location
//! explicitly, and the value still points at the real call site even
//! through several layers of `#[track_caller]` wrappers.

use std::fmt;

/// Where an assertion, mock call, or allocation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
}

impl SourceLocation {
    #[track_caller]
    pub fn caller() -> Self {
        let loc = std::panic::Location::caller();
        SourceLocation {
            file: loc.file(),
            line: loc.line(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
