//! Assertion primitives.
//!
//! Each function captures its call site via `#[track_caller]` and returns
//! `Result<(), MockaError>` instead of longjmp'ing out of the test; test
//! bodies propagate a failure with `?`, which the runner treats exactly
//! like any other early return (see [`crate::runner`]).

use std::fmt::Debug;

use crate::error::MockaError;
use crate::location::SourceLocation;
use crate::runner::with_context;

fn fail(message: impl Into<String>) -> Result<(), MockaError> {
    Err(MockaError::AssertionFailed {
        message: message.into(),
        location: SourceLocation::caller(),
    })
}

#[track_caller]
pub fn assert_true(condition: bool) -> Result<(), MockaError> {
    if condition {
        Ok(())
    } else {
        fail("expected a true condition")
    }
}

#[track_caller]
pub fn assert_false(condition: bool) -> Result<(), MockaError> {
    if !condition {
        Ok(())
    } else {
        fail("expected a false condition")
    }
}

#[track_caller]
pub fn assert_int_equal<T: PartialEq + Debug>(actual: T, expected: T) -> Result<(), MockaError> {
    if actual == expected {
        Ok(())
    } else {
        fail(format!("{actual:?} != {expected:?}"))
    }
}

#[track_caller]
pub fn assert_int_not_equal<T: PartialEq + Debug>(actual: T, expected: T) -> Result<(), MockaError> {
    if actual != expected {
        Ok(())
    } else {
        fail(format!("{actual:?} == {expected:?}, expected different values"))
    }
}

/// Passes either within the absolute `epsilon`, or — for numbers too large
/// for an absolute tolerance to be meaningful — within the largest
/// magnitude times machine epsilon, the same relative-tolerance fallback
/// `float_compare` in the original implementation uses.
#[track_caller]
pub fn assert_float_equal(actual: f64, expected: f64, epsilon: f64) -> Result<(), MockaError> {
    let diff = (actual - expected).abs();
    if diff <= epsilon {
        return Ok(());
    }
    let largest = actual.abs().max(expected.abs());
    if diff <= largest * f64::EPSILON {
        return Ok(());
    }
    fail(format!("{actual} != {expected} (delta {diff})"))
}

#[track_caller]
pub fn assert_string_equal(actual: &str, expected: &str) -> Result<(), MockaError> {
    if actual == expected {
        Ok(())
    } else {
        fail(format!("\"{actual}\" != \"{expected}\""))
    }
}

#[track_caller]
pub fn assert_string_not_equal(actual: &str, expected: &str) -> Result<(), MockaError> {
    if actual != expected {
        Ok(())
    } else {
        fail(format!("\"{actual}\" == \"{expected}\", expected different strings"))
    }
}

/// Reports up to 16 differing byte offsets and then a summary count,
/// mirroring `memory_equal_display_error` in the original implementation.
#[track_caller]
pub fn assert_memory_equal(actual: &[u8], expected: &[u8]) -> Result<(), MockaError> {
    let len = actual.len().min(expected.len());
    let mut diffs = Vec::new();
    let mut differences = actual.len().abs_diff(expected.len());
    for i in 0..len {
        if actual[i] != expected[i] {
            if diffs.len() < 16 {
                diffs.push(format!("difference at offset {i}: 0x{:02x} 0x{:02x}", actual[i], expected[i]));
            }
            differences += 1;
        }
    }
    if differences == 0 {
        return Ok(());
    }
    let mut message = diffs.join("\n");
    if differences >= 16 {
        message.push_str("\n...");
    }
    message.push_str(&format!(
        "\n{differences} byte(s) of {} and {} byte region(s) differ",
        actual.len(),
        expected.len()
    ));
    fail(message)
}

#[track_caller]
pub fn assert_in_range<T: PartialOrd + Debug>(value: T, low: T, high: T) -> Result<(), MockaError> {
    if value >= low && value <= high {
        Ok(())
    } else {
        fail(format!("{value:?} not in range [{low:?}, {high:?}]"))
    }
}

#[track_caller]
pub fn assert_not_in_range<T: PartialOrd + Debug>(value: T, low: T, high: T) -> Result<(), MockaError> {
    if value < low || value > high {
        Ok(())
    } else {
        fail(format!("{value:?} unexpectedly in range [{low:?}, {high:?}]"))
    }
}

#[track_caller]
pub fn assert_in_set<T: PartialEq + Debug>(value: T, set: &[T]) -> Result<(), MockaError> {
    if set.contains(&value) {
        Ok(())
    } else {
        fail(format!("{value:?} not found in {set:?}"))
    }
}

#[track_caller]
pub fn assert_not_in_set<T: PartialEq + Debug>(value: T, set: &[T]) -> Result<(), MockaError> {
    if !set.contains(&value) {
        Ok(())
    } else {
        fail(format!("{value:?} unexpectedly found in {set:?}"))
    }
}

/// Fails iff `code < 0`. `errno_hint` is a caller-supplied guess at which
/// errno the negative return corresponds to; when positive it is resolved
/// through the platform's errno-to-string facility and folded into the
/// diagnostic, matching `_assert_return_code`'s `result < 0` contract (this
/// is a code/errno-hint pair, not an equality check against an expected
/// return value).
#[track_caller]
pub fn assert_return_code(code: i64, errno_hint: i32) -> Result<(), MockaError> {
    if code >= 0 {
        return Ok(());
    }
    if errno_hint > 0 {
        fail(format!("{code} < 0, errno({errno_hint}): {}", errno_string(errno_hint)))
    } else {
        fail(format!("{code} < 0"))
    }
}

#[cfg(unix)]
fn errno_string(code: i32) -> String {
    unsafe {
        let ptr = libc::strerror(code);
        if ptr.is_null() {
            return "unknown error".to_string();
        }
        std::ffi::CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

#[cfg(not(unix))]
fn errno_string(_code: i32) -> String {
    "unknown error".to_string()
}

/// A runtime assertion inside library code under test, as opposed to an
/// assertion in the test body itself. Behaves like [`assert_true`] unless
/// the test has armed `expect_assert_failure`, in which case the first
/// failing call here ends the test early exactly like [`crate::runner::stop_test`]
/// — the expected failure was consumed, so the test can't keep running past
/// this point, but whatever else it had queued is still subject to the
/// leftover audit — instead of letting it propagate as an ordinary failure.
#[track_caller]
pub fn mock_assert(condition: bool) -> Result<(), MockaError> {
    if condition {
        return Ok(());
    }
    let armed = with_context(|ctx| ctx.take_expect_assert_failure());
    if armed {
        crate::runner::stop_test();
    }
    fail("mock_assert failed")
}

/// Arms the trap consumed by the next failing [`mock_assert`] in this test.
pub fn expect_assert_failure() {
    with_context(|ctx| ctx.arm_expect_assert_failure());
}
