//! A unit testing and mocking framework for native Rust test binaries.
//!
//! Built around seven cooperating pieces:
//!
//! - [`store`] — the ordered multimap backing both the mock registry and
//!   the call-ordering engine.
//! - [`alloc`] — a guard-byte tracking allocator for leak/corruption audits.
//! - [`assert`] — assertion primitives returning `Result` instead of
//!   unwinding through a C-style longjmp.
//! - [`mock`] — queued return values and queued parameter checks.
//! - [`order`] — a FIFO of expected calls enforcing cross-function
//!   ordering.
//! - [`runner`] — the setup/test/teardown lifecycle, crash capture, and
//!   leak/leftover audits.
//! - [`output`] — `STANDARD`/`TAP`/`SUBUNIT`/`XML` result formatting.
//!
//! # Example
//!
//! ```rust
//! use mocka::assert::assert_int_equal;
//! use mocka::runner::{run_group, Test, TestResult};
//!
//! fn addition_works() -> TestResult {
//!     assert_int_equal(2 + 2, 4)
//! }
//!
//! let tests = [Test::new("addition_works", addition_works)];
//! let failed = run_group("arithmetic", &tests, None, None);
//! assert_eq!(failed, 0);
//! ```

pub mod alloc;
pub mod assert;
pub mod config;
pub mod error;
pub mod glob;
pub mod location;
mod macros;
pub mod mock;
pub mod order;
pub mod output;
pub mod runner;
#[cfg(unix)]
pub mod signal;
pub mod store;
pub mod tracing_init;

pub use config::{set_list_test, set_skip_filter, set_test_filter};
pub use error::{MockaError, MockaResult};
pub use location::SourceLocation;
pub use order::{expect_function_call, function_called};
pub use runner::{run_group, skip_test, stop_test, with_context, Test, TestContext, TestResult};
