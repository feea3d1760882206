use mocka::assert::{assert_int_equal, assert_in_range};
use mocka::runner::{run_group, with_context, Test, TestResult};
use mocka::store::UseCount;
use mocka::{expect_function_call, function_called, stop_test};

fn mock_test_a_called() -> TestResult {
    function_called("mock_test_a_called")
}

fn mock_test_b_called() -> TestResult {
    function_called("mock_test_b_called")
}

fn call_order_matches_expectations() -> TestResult {
    expect_function_call("mock_test_a_called", UseCount::Exact(1));
    mock_test_a_called()
}

fn stop_mid_test_discards_unmade_expected_call() -> TestResult {
    expect_function_call("mock_test_a_called", UseCount::Exact(1));
    expect_function_call("mock_test_b_called", UseCount::Exact(1));

    mock_test_a_called()?;
    stop_test();
}

#[test]
fn call_ordering_suite() {
    let tests = mocka::mocka_tests![call_order_matches_expectations];
    let failed = run_group("call_ordering", tests, None, None);
    assert_eq!(failed, 0);
}

#[test]
fn stop_with_leftover_expectation_fails() {
    let tests = mocka::mocka_tests![stop_mid_test_discards_unmade_expected_call];
    let failed = run_group("stop_with_leftover", tests, None, None);
    assert_eq!(failed, 1);
}

// Group fixtures run outside any individual test's registries (each test's
// `run_one` resets those fresh), so state shared across a group's tests has
// to live in a plain static rather than the mock/order registries — the
// Rust analogue of the `**state` pointer the original threads through
// `group_test_setup`/`unit_test`.
static GROUP_ANSWER: std::sync::atomic::AtomicI64 = std::sync::atomic::AtomicI64::new(0);

fn malloc_setup_test() -> TestResult {
    assert_int_equal(GROUP_ANSWER.load(std::sync::atomic::Ordering::SeqCst), 42)
}

fn test_value_range() -> TestResult {
    assert_in_range(GROUP_ANSWER.load(std::sync::atomic::Ordering::SeqCst), 0, 100)
}

fn group_setup() -> TestResult {
    GROUP_ANSWER.store(42, std::sync::atomic::Ordering::SeqCst);
    Ok(())
}

#[test]
fn group_fixtures_share_state_across_tests() {
    let tests: &[Test] = &[
        Test::new("malloc_setup_test", malloc_setup_test),
        Test::new("test_value_range", test_value_range),
    ];
    let failed = run_group("group_fixtures", tests, Some(group_setup), None);
    assert_eq!(failed, 0);
}

fn per_test_setup_allocates() -> TestResult {
    with_context(|ctx| {
        let ptr = ctx.allocator.alloc(1);
        let _ = ctx.allocator.free(ptr);
    });
    Ok(())
}

#[test]
fn per_test_fixtures_run_around_each_test() {
    let setup: fn() -> TestResult = || {
        with_context(|ctx| {
            let ptr = ctx.allocator.alloc(1);
            ctx.returns.will_return("fixture_ptr", ptr.as_ptr() as u64, UseCount::Exact(1));
        });
        Ok(())
    };
    let teardown: fn() -> TestResult = || {
        with_context(|ctx| -> TestResult {
            let raw = ctx.returns.mock("fixture_ptr")?;
            let ptr = std::ptr::NonNull::new(raw as *mut u8).unwrap();
            Ok(ctx.allocator.free(ptr)?)
        })
    };

    let tests = &[Test::with_fixtures(
        "per_test_setup_allocates",
        per_test_setup_allocates,
        Some(setup),
        Some(teardown),
    )];
    let failed = run_group("per_test_fixtures", tests, None, None);
    assert_eq!(failed, 0);
}

fn leaks_an_allocation() -> TestResult {
    with_context(|ctx| {
        let _ = ctx.allocator.alloc(16);
    });
    Ok(())
}

fn clean_after_the_leaky_test() -> TestResult {
    with_context(|ctx| {
        let ptr = ctx.allocator.alloc(4);
        Ok(ctx.allocator.free(ptr)?)
    })
}

#[test]
fn leak_in_one_test_does_not_bleed_into_the_next() {
    let tests: &[Test] = &[
        Test::new("leaks_an_allocation", leaks_an_allocation),
        Test::new("clean_after_the_leaky_test", clean_after_the_leaky_test),
    ];
    let failed = run_group("leak_detection", tests, None, None);
    assert_eq!(failed, 1);
}

fn corrupts_the_trailing_guard_zone() -> TestResult {
    with_context(|ctx| {
        let ptr = ctx.allocator.alloc(8);
        unsafe {
            *ptr.as_ptr().add(8) = 0;
        }
        Ok(ctx.allocator.free(ptr)?)
    })
}

#[test]
fn guard_corruption_on_free_fails_the_test() {
    let tests: &[Test] = &[Test::new("corrupts_the_trailing_guard_zone", corrupts_the_trailing_guard_zone)];
    let failed = run_group("guard_corruption", tests, None, None);
    assert_eq!(failed, 1);
}

fn armed_mock_assert_fires_as_an_expected_assertion() -> TestResult {
    mocka::assert::expect_assert_failure();
    mocka::assert::mock_assert(1 == 2)?;
    Err(mocka::MockaError::AssertionFailed {
        message: "mock_assert should have unwound before this point".into(),
        location: mocka::SourceLocation::caller(),
    })
}

#[test]
fn expect_assert_failure_consumes_the_next_mock_assert() {
    let tests: &[Test] = &[Test::new(
        "armed_mock_assert_fires_as_an_expected_assertion",
        armed_mock_assert_fires_as_an_expected_assertion,
    )];
    let failed = run_group("expect_assert_failure", tests, None, None);
    assert_eq!(failed, 0);
}

#[cfg(unix)]
fn crashes_with_segv() -> TestResult {
    unsafe {
        libc::raise(libc::SIGSEGV);
    }
    Ok(())
}

#[cfg(unix)]
fn runs_normally_after_a_crash() -> TestResult {
    assert_int_equal(1 + 1, 2)
}

#[cfg(unix)]
#[test]
fn crash_is_captured_and_the_group_continues() {
    let tests: &[Test] = &[
        Test::new("crashes_with_segv", crashes_with_segv),
        Test::new("runs_normally_after_a_crash", runs_normally_after_a_crash),
    ];
    let failed = run_group("crash_recovery", tests, None, None);
    assert_eq!(failed, 1);
}
