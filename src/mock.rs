//! Mock registry: queued return values and queued parameter checks.
//!
//! Two independent [`crate::store::Store`] instances, keyed respectively by
//! `[function]` and `[function, parameter]`. Both speak in `u64` payloads —
//! the same "opaque machine word" convention the assertion layer uses for
//! integers, pointers cast to `usize`, and small values packed by the
//! caller.

use crate::error::MockaError;
use crate::location::SourceLocation;
use crate::store::{Entry, Store, UseCount};

/// A predicate used to validate a parameter passed to `check_expected`.
#[derive(Clone)]
pub enum ParamCheck {
    Equal(u64),
    NotEqual(u64),
    InSet(Vec<u64>),
    NotInSet(Vec<u64>),
    InRange(u64, u64),
    NotInRange(u64, u64),
    /// Compares `len` bytes at the pointer value against an expected blob.
    MemoryEqual(Vec<u8>),
    MemoryNotEqual(Vec<u8>),
    /// Compares a nul-terminated C string at the pointer value against an
    /// expected string, unlike `MemoryEqual` which compares a fixed byte
    /// count regardless of embedded/trailing nul bytes.
    StringEqual(String),
    StringNotEqual(String),
    Any,
    /// Escape hatch: a function pointer plus an opaque comparison value.
    Custom(fn(u64, u64) -> bool, u64),
}

impl ParamCheck {
    /// `actual` is the parameter value; for `MemoryEqual`/`MemoryNotEqual`
    /// it is interpreted as a pointer to compare against the stored blob.
    pub fn check(&self, actual: u64) -> bool {
        match self {
            ParamCheck::Equal(v) => actual == *v,
            ParamCheck::NotEqual(v) => actual != *v,
            ParamCheck::InSet(set) => set.contains(&actual),
            ParamCheck::NotInSet(set) => !set.contains(&actual),
            ParamCheck::InRange(lo, hi) => actual >= *lo && actual <= *hi,
            ParamCheck::NotInRange(lo, hi) => !(actual >= *lo && actual <= *hi),
            ParamCheck::MemoryEqual(expected) => unsafe { memory_matches(actual, expected) },
            ParamCheck::MemoryNotEqual(expected) => unsafe { !memory_matches(actual, expected) },
            ParamCheck::StringEqual(expected) => unsafe { string_matches(actual, expected) },
            ParamCheck::StringNotEqual(expected) => unsafe { !string_matches(actual, expected) },
            ParamCheck::Any => true,
            ParamCheck::Custom(f, data) => f(actual, *data),
        }
    }
}

unsafe fn memory_matches(ptr: u64, expected: &[u8]) -> bool {
    if ptr == 0 {
        return expected.is_empty();
    }
    let slice = std::slice::from_raw_parts(ptr as *const u8, expected.len());
    slice == expected
}

unsafe fn string_matches(ptr: u64, expected: &str) -> bool {
    if ptr == 0 {
        return false;
    }
    let cstr = std::ffi::CStr::from_ptr(ptr as *const std::os::raw::c_char);
    cstr.to_bytes() == expected.as_bytes()
}

/// Queued return values for `will_return`/`mock`, keyed by function name.
#[derive(Default)]
pub struct Returns {
    store: Store<u64>,
}

impl Returns {
    pub fn new() -> Self {
        Self::default()
    }

    #[track_caller]
    pub fn will_return(&mut self, function: &str, value: u64, use_count: UseCount) {
        self.store
            .add(&[function], value, use_count, SourceLocation::caller());
    }

    #[track_caller]
    pub fn mock(&mut self, function: &str) -> Result<u64, MockaError> {
        let location = SourceLocation::caller();
        self.store
            .take(&[function])
            .map(|Entry { value, .. }| value)
            .ok_or_else(|| MockaError::MockUnderflow {
                function: function.to_string(),
                parameter: None,
                last_seen: self.store.front_location(&[function]),
            })
            .map_err(|e| {
                tracing::debug!(function, %location, "mock() underflow");
                e
            })
    }

    pub fn leftover_count(&self) -> usize {
        self.store.leftover_count()
    }

    pub fn reap_used_sticky(&mut self) {
        self.store.reap_used_sticky();
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }
}

/// Queued parameter-check expectations for `expect_*`/`check_expected`,
/// keyed by `(function, parameter)`.
#[derive(Default)]
pub struct Checks {
    store: Store<ParamCheck>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    #[track_caller]
    pub fn expect(&mut self, function: &str, parameter: &str, check: ParamCheck, use_count: UseCount) {
        self.store
            .add(&[function, parameter], check, use_count, SourceLocation::caller());
    }

    #[track_caller]
    pub fn check_expected(&mut self, function: &str, parameter: &str, actual: u64) -> Result<(), MockaError> {
        let location = SourceLocation::caller();
        let key = [function, parameter];
        let entry = self.store.take(&key).ok_or_else(|| MockaError::MockUnderflow {
            function: function.to_string(),
            parameter: Some(parameter.to_string()),
            last_seen: self.store.front_location(&key),
        })?;

        if entry.value.check(actual) {
            Ok(())
        } else {
            Err(MockaError::AssertionFailed {
                message: format!(
                    "parameter `{parameter}` of `{function}` failed its expectation (registered at {})",
                    entry.location
                ),
                location,
            })
        }
    }

    pub fn leftover_count(&self) -> usize {
        self.store.leftover_count()
    }

    pub fn reap_used_sticky(&mut self) {
        self.store.reap_used_sticky();
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }
}
