//! Test lifecycle runner: setup → test → teardown, with leak/leftover
//! audits and crash capture, reporting through whatever formatters
//! [`crate::output`] has wired up.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::alloc::TrackingAllocator;
use crate::config::RunConfig;
use crate::error::MockaError;
use crate::glob::PatternList;
use crate::mock::{Checks, Returns};
use crate::order::OrderingQueue;
use crate::output::{Event, OutputSink};

pub type TestResult = Result<(), MockaError>;

/// Per-thread state backing one running test. Never shared across threads;
/// a group runs its tests sequentially on the thread that calls
/// [`run_group`].
pub struct TestContext {
    pub returns: Returns,
    pub checks: Checks,
    pub order: OrderingQueue,
    pub allocator: TrackingAllocator,
    expect_assert_failure: bool,
    pub(crate) abort_on_failure: bool,
}

impl Default for TestContext {
    fn default() -> Self {
        TestContext {
            returns: Returns::new(),
            checks: Checks::new(),
            order: OrderingQueue::new(),
            allocator: TrackingAllocator::new(),
            expect_assert_failure: false,
            abort_on_failure: false,
        }
    }
}

impl TestContext {
    fn reset(&mut self, abort_on_failure: bool) {
        self.returns.clear();
        self.checks.clear();
        self.order.clear();
        self.expect_assert_failure = false;
        self.abort_on_failure = abort_on_failure;
    }

    /// Arms the "next `mock_assert` that would fail instead succeeds by
    /// unwinding here" trap used by `expect_assert_failure`.
    pub fn arm_expect_assert_failure(&mut self) {
        self.expect_assert_failure = true;
    }

    pub fn take_expect_assert_failure(&mut self) -> bool {
        std::mem::take(&mut self.expect_assert_failure)
    }

    fn leftover_expectations(&self) -> usize {
        self.returns.leftover_count() + self.checks.leftover_count() + self.order.leftover_count()
    }

    fn reap_sticky(&mut self) {
        self.returns.reap_used_sticky();
        self.checks.reap_used_sticky();
        self.order.reap_used_sticky();
    }
}

thread_local! {
    static CONTEXT: RefCell<TestContext> = RefCell::new(TestContext::default());
}

/// Runs `f` with mutable access to the current thread's [`TestContext`].
/// Used by [`crate::assert`] and [`crate::mock`] call sites so individual
/// assertions don't need a context parameter threaded through every test.
pub fn with_context<R>(f: impl FnOnce(&mut TestContext) -> R) -> R {
    CONTEXT.with(|c| f(&mut c.borrow_mut()))
}

/// A single registered test: a name, the body, and optional per-test
/// setup/teardown fixtures run immediately before/after it (as opposed to
/// the group-level fixtures [`run_group`] takes, which run once for the
/// whole group).
pub struct Test {
    pub name: &'static str,
    pub body: fn() -> TestResult,
    pub setup: Option<fn() -> TestResult>,
    pub teardown: Option<fn() -> TestResult>,
}

impl Test {
    /// Builds a bare test with no per-test fixtures — the common case, and
    /// what [`crate::mocka_tests`] constructs.
    pub const fn new(name: &'static str, body: fn() -> TestResult) -> Self {
        Test {
            name,
            body,
            setup: None,
            teardown: None,
        }
    }

    pub const fn with_fixtures(
        name: &'static str,
        body: fn() -> TestResult,
        setup: Option<fn() -> TestResult>,
        teardown: Option<fn() -> TestResult>,
    ) -> Self {
        Test {
            name,
            body,
            setup,
            teardown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    /// A fatal signal was captured during the test body.
    Crashed,
    /// Setup or teardown returned a non-zero/error result.
    Error,
}

pub struct TestOutcome {
    pub name: &'static str,
    pub status: TestStatus,
    pub runtime: std::time::Duration,
    pub message: Option<String>,
}

/// Runs one test under the full lifecycle contract: fresh registries, a
/// per-test setup/teardown fixture chain, allocator checkpoints, crash
/// capture, and leak/leftover audits.
fn run_one(test: &Test, config: &RunConfig) -> TestOutcome {
    let start = Instant::now();

    with_context(|ctx| ctx.reset(config.abort_on_failure));

    #[cfg(unix)]
    let _guard = crate::signal::install_handlers(config.debug);
    #[cfg(not(unix))]
    let _guard = ();

    // Blocks allocated during setup are exempt from the leak audit; they're
    // expected to be cleaned up by teardown, which is checked against this
    // earlier checkpoint instead.
    let checkpoint_before_setup = with_context(|ctx| ctx.allocator.checkpoint());

    if let Some(setup) = test.setup {
        if let Err(message) = run_fixture(setup) {
            return TestOutcome {
                name: test.name,
                status: TestStatus::Error,
                runtime: start.elapsed(),
                message: Some(MockaError::SetupError { message }.to_string()),
            };
        }
    }

    let checkpoint_before_test = with_context(|ctx| ctx.allocator.checkpoint());
    let outcome = panic::catch_unwind(AssertUnwindSafe(test.body));

    let (mut status, mut message) = match outcome {
        Ok(Ok(())) => match leak_audit(checkpoint_before_test) {
            Err(e) => (TestStatus::Failed, Some(e.to_string())),
            Ok(()) => match leftover_audit() {
                Ok(()) => (TestStatus::Passed, None),
                Err(e) => (TestStatus::Failed, Some(e.to_string())),
            },
        },
        Ok(Err(e)) => (TestStatus::Failed, Some(e.to_string())),
        Err(payload) => {
            let sentinel = panic_message(&payload);
            if sentinel == SKIP_SENTINEL {
                (TestStatus::Skipped, None)
            } else if sentinel == STOP_SENTINEL {
                // stop() still audits leftovers, just skips the leak check.
                match leftover_audit() {
                    Ok(()) => (TestStatus::Passed, None),
                    Err(e) => (TestStatus::Failed, Some(e.to_string())),
                }
            } else if let Some(signal) = sentinel.strip_prefix(CRASH_SENTINEL_PREFIX) {
                #[cfg(unix)]
                let signal = crate::signal::static_name(signal);
                #[cfg(not(unix))]
                let signal: &'static str = "unknown signal";
                (TestStatus::Crashed, Some(MockaError::Crash { signal }.to_string()))
            } else {
                (TestStatus::Crashed, Some(sentinel))
            }
        }
    };

    if let Some(teardown) = test.teardown {
        if let Err(teardown_message) = run_fixture_checked(teardown, checkpoint_before_setup) {
            status = TestStatus::Error;
            message = Some(MockaError::TeardownError { message: teardown_message }.to_string());
        }
    }

    TestOutcome {
        name: test.name,
        status,
        runtime: start.elapsed(),
        message,
    }
}

fn leak_audit(checkpoint: usize) -> TestResult {
    let leaks = with_context(|ctx| ctx.allocator.leaked_since(checkpoint));
    if leaks.is_empty() {
        return Ok(());
    }
    let bytes = leaks.iter().map(|(_, size)| size).sum();
    Err(MockaError::Leak {
        blocks: leaks.len(),
        bytes,
    })
}

fn leftover_audit() -> TestResult {
    with_context(|ctx| {
        ctx.reap_sticky();
        let leftover = ctx.leftover_expectations();
        if leftover > 0 {
            return Err(MockaError::LeftoverExpectations { count: leftover });
        }
        Ok(())
    })
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "test panicked with a non-string payload".to_string()
    }
}

const SKIP_SENTINEL: &str = "mocka::skip";
const STOP_SENTINEL: &str = "mocka::stop";
pub(crate) const CRASH_SENTINEL_PREFIX: &str = "mocka::crash::";

/// Panics with a sentinel recognized by [`run_one`] to end the calling
/// test immediately with [`TestStatus::Skipped`], bypassing every audit.
pub fn skip_test() -> ! {
    panic::panic_any(SKIP_SENTINEL)
}

/// Panics with a sentinel recognized by [`run_one`] to end the calling test
/// immediately, auditing leftover expectations (but not leaked
/// allocations) to decide between [`TestStatus::Passed`] and
/// [`TestStatus::Failed`] — the author-initiated early exit used when a
/// test has nothing more to check once some condition holds.
pub fn stop_test() -> ! {
    panic::panic_any(STOP_SENTINEL)
}

/// Runs a named group of tests with optional group-level fixtures,
/// reporting through every configured output sink. Returns the number of
/// failed/crashed/errored tests, which callers use as the process exit
/// code.
///
/// `setup`/`teardown` here are *group* fixtures (`group_setup`/
/// `group_teardown` in spec.md §4.F): they run once for the whole group,
/// under the same barrier and crash shield as a test but audited against a
/// group-level allocation checkpoint, not a per-test one. Per-test fixtures
/// belong on [`Test::setup`]/[`Test::teardown`] instead.
pub fn run_group(
    group_name: &str,
    tests: &[Test],
    setup: Option<fn() -> TestResult>,
    teardown: Option<fn() -> TestResult>,
) -> usize {
    crate::tracing_init::init();
    let config = RunConfig::resolve();

    if config.list_only {
        for test in tests {
            println!("{group_name}.{}", test.name);
        }
        return 0;
    }

    let mut sink = OutputSink::from_config(&config, group_name);

    let filter = config.test_filter.as_deref().map(PatternList::parse);
    let skip = config.skip_filter.as_deref().map(PatternList::parse);

    sink.emit(Event::GroupStart { group: group_name });

    with_context(|ctx| ctx.reset(config.abort_on_failure));
    let group_checkpoint = with_context(|ctx| ctx.allocator.checkpoint());

    if let Some(setup) = setup {
        if let Err(e) = run_fixture(setup) {
            sink.emit(Event::GroupFinish {
                group: group_name,
                passed: 0,
                failed: 1,
            });
            sink.finish();
            tracing::error!(group = group_name, error = %e, "group setup failed");
            return 1;
        }
    }

    let mut passed = 0usize;
    let mut failed = 0usize;

    for test in tests {
        if let Some(filter) = &filter {
            if !filter.is_empty() && !filter.matches_any(test.name) {
                continue;
            }
        }
        if let Some(skip) = &skip {
            if skip.matches_any(test.name) {
                sink.emit(Event::TestSkipped { name: test.name });
                continue;
            }
        }

        sink.emit(Event::TestStart { name: test.name });
        let outcome = run_one(test, &config);

        match outcome.status {
            TestStatus::Passed => {
                passed += 1;
                sink.emit(Event::TestSuccess {
                    name: outcome.name,
                    runtime: outcome.runtime,
                });
            }
            TestStatus::Skipped => {
                sink.emit(Event::TestSkipped { name: outcome.name });
            }
            TestStatus::Failed | TestStatus::Error => {
                failed += 1;
                sink.emit(Event::TestFailure {
                    name: outcome.name,
                    runtime: outcome.runtime,
                    message: outcome.message.clone().unwrap_or_default(),
                });
                if config.abort_on_failure {
                    sink.finish();
                    std::process::abort();
                }
            }
            TestStatus::Crashed => {
                failed += 1;
                sink.emit(Event::TestFailure {
                    name: outcome.name,
                    runtime: outcome.runtime,
                    message: outcome.message.clone().unwrap_or_default(),
                });
                if config.abort_on_failure {
                    sink.finish();
                    std::process::abort();
                }
            }
        }
    }

    if let Some(teardown) = teardown {
        if let Err(e) = run_fixture(teardown) {
            tracing::error!(group = group_name, error = %e, "group teardown failed");
            failed += 1;
        }
    }

    if let Err(e) = leak_audit(group_checkpoint) {
        tracing::error!(group = group_name, error = %e, "group-level leak detected");
        failed += 1;
    }

    sink.emit(Event::GroupFinish {
        group: group_name,
        passed,
        failed,
    });
    sink.finish();

    failed
}

/// Runs a fixture function (setup or teardown) under the same panic
/// shield as a test body, surfacing the failure as a plain message rather
/// than a [`MockaError`] — setup/teardown failures are always reported as
/// [`TestStatus::Error`], never routed through the ordinary assertion
/// machinery.
fn run_fixture(f: fn() -> TestResult) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(&payload)),
    }
}

/// Runs a teardown fixture and additionally audits that every block
/// allocated since `checkpoint` — covering both setup's and the test
/// body's own allocations — has been freed by the time teardown returns.
fn run_fixture_checked(f: fn() -> TestResult, checkpoint: usize) -> Result<(), String> {
    run_fixture(f)?;
    leak_audit(checkpoint).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RunConfig {
        RunConfig {
            output_mask: crate::output::OutputMask::parse("STANDARD"),
            xml_file_template: None,
            abort_on_failure: false,
            test_filter: None,
            skip_filter: None,
            debug: true,
            list_only: false,
        }
    }

    #[test]
    fn passing_test_reports_passed() {
        let test = Test::new("ok", || Ok(()));
        let outcome = run_one(&test, &test_config());
        assert_eq!(outcome.status, TestStatus::Passed);
    }

    #[test]
    fn failing_test_reports_failed_with_message() {
        let test = Test::new("bad", || {
            Err(MockaError::AssertionFailed {
                message: "1 != 2".into(),
                location: crate::location::SourceLocation { file: "f", line: 1 },
            })
        });
        let outcome = run_one(&test, &test_config());
        assert_eq!(outcome.status, TestStatus::Failed);
        assert!(outcome.message.unwrap().contains("1 != 2"));
    }

    #[test]
    fn leaked_allocation_fails_an_otherwise_passing_test() {
        let test = Test::new("leaky", || {
            with_context(|ctx| {
                let _ = ctx.allocator.alloc(8);
            });
            Ok(())
        });
        let outcome = run_one(&test, &test_config());
        assert_eq!(outcome.status, TestStatus::Failed);
        assert!(outcome.message.unwrap().contains("leaked"));
    }

    #[test]
    fn setup_failure_reports_error_status() {
        let test = Test::with_fixtures(
            "with_bad_setup",
            || Ok(()),
            Some(|| Err(MockaError::AssertionFailed {
                message: "setup boom".into(),
                location: crate::location::SourceLocation { file: "f", line: 1 },
            })),
            None,
        );
        let outcome = run_one(&test, &test_config());
        assert_eq!(outcome.status, TestStatus::Error);
        assert!(outcome.message.unwrap().contains("setup boom"));
    }

    #[test]
    fn teardown_leak_check_catches_setup_allocations_not_freed() {
        let test = Test::with_fixtures(
            "with_leaky_teardown",
            || Ok(()),
            Some(|| {
                with_context(|ctx| {
                    let _ = ctx.allocator.alloc(8);
                });
                Ok(())
            }),
            Some(|| Ok(())),
        );
        let outcome = run_one(&test, &test_config());
        assert_eq!(outcome.status, TestStatus::Error);
        assert!(outcome.message.unwrap().contains("leaked"));
    }

    #[test]
    fn stop_mid_test_passes_when_no_leftovers() {
        let test = Test::new("stops_early", || {
            stop_test();
        });
        let outcome = run_one(&test, &test_config());
        assert_eq!(outcome.status, TestStatus::Passed);
    }
}
