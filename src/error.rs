//! Crate-wide error types.
//!
//! Hand-rolled `Display`/`Error` impls, matching the rest of the crate's
//! style: no `thiserror`, no `anyhow`. Every variant is test-local and is
//! turned into a `TestStatus` by the runner before it would ever need to
//! cross a public API boundary.

use crate::location::SourceLocation;
use std::fmt;

/// Anything that can end a test early with a non-`Passed` outcome.
#[derive(Debug, Clone)]
pub enum MockaError {
    AssertionFailed {
        message: String,
        location: SourceLocation,
    },
    MockUnderflow {
        function: String,
        parameter: Option<String>,
        last_seen: Option<SourceLocation>,
    },
    OrderViolation {
        expected: String,
        actual: Option<String>,
        location: SourceLocation,
    },
    LeftoverExpectations {
        count: usize,
    },
    Leak {
        blocks: usize,
        bytes: usize,
    },
    GuardCorruption {
        allocated_at: SourceLocation,
        freed_at: Option<SourceLocation>,
    },
    SetupError {
        message: String,
    },
    TeardownError {
        message: String,
    },
    Crash {
        signal: &'static str,
    },
}

impl fmt::Display for MockaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssertionFailed { message, location } => {
                write!(f, "{location}: assertion failed: {message}")
            }
            Self::MockUnderflow {
                function,
                parameter,
                last_seen,
            } => {
                write!(f, "no mock value left for {function}")?;
                if let Some(p) = parameter {
                    write!(f, " (parameter `{p}`)")?;
                }
                if let Some(loc) = last_seen {
                    write!(f, ", last queued at {loc}")?;
                }
                Ok(())
            }
            Self::OrderViolation {
                expected,
                actual,
                location,
            } => match actual {
                Some(actual) => write!(
                    f,
                    "{location}: expected call order: `{expected}`, got `{actual}`"
                ),
                None => write!(
                    f,
                    "{location}: expected call order: `{expected}`, but no calls were recorded"
                ),
            },
            Self::LeftoverExpectations { count } => {
                write!(f, "{count} unsatisfied mock expectation(s) remain")
            }
            Self::Leak { blocks, bytes } => {
                write!(f, "{blocks} block(s) leaked, {bytes} byte(s) total")
            }
            Self::GuardCorruption {
                allocated_at,
                freed_at,
            } => {
                write!(f, "memory corruption detected, block allocated at {allocated_at}")?;
                if let Some(freed_at) = freed_at {
                    write!(f, ", freed at {freed_at}")?;
                }
                Ok(())
            }
            Self::SetupError { message } => write!(f, "setup failed: {message}"),
            Self::TeardownError { message } => write!(f, "teardown failed: {message}"),
            Self::Crash { signal } => write!(f, "test crashed with {signal}"),
        }
    }
}

impl std::error::Error for MockaError {}

impl From<crate::alloc::Corruption> for MockaError {
    fn from(c: crate::alloc::Corruption) -> Self {
        MockaError::GuardCorruption {
            allocated_at: c.allocated_at,
            freed_at: c.freed_at,
        }
    }
}

pub type MockaResult<T> = Result<T, MockaError>;
