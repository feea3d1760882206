//! Convenience macros for declaring a test group without hand-writing a
//! `&[Test]` literal.

/// Builds a `&'static [Test]` from a list of bare function names, using
/// each function's own identifier as the test name.
///
/// ```rust
/// use mocka::{mocka_tests, runner::TestResult};
///
/// fn one_equals_one() -> TestResult {
///     mocka::assert::assert_int_equal(1, 1)
/// }
///
/// let tests = mocka_tests![one_equals_one];
/// assert_eq!(tests.len(), 1);
/// assert_eq!(tests[0].name, "one_equals_one");
/// ```
#[macro_export]
macro_rules! mocka_tests {
    ($($test:ident),* $(,)?) => {
        &[$($crate::runner::Test::new(stringify!($test), $test)),*]
    };
}
