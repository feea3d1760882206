use mocka::assert::assert_int_equal;
use mocka::mock::ParamCheck;
use mocka::runner::{run_group, with_context, TestResult};
use mocka::store::UseCount;
use mocka::{mocka_tests, MockaError};

/// Stand-in for a mocked function under test: it reports its parameter
/// through the shared check registry and returns whatever was queued.
fn set_width(value: u64) -> Result<u64, MockaError> {
    with_context(|ctx| {
        ctx.checks.check_expected("set_width", "value", value)?;
        ctx.returns.mock("set_width")
    })
}

fn expect_check_matches_queued_predicate() -> TestResult {
    with_context(|ctx| {
        ctx.checks.expect(
            "set_width",
            "value",
            ParamCheck::Equal(80),
            UseCount::Exact(1),
        );
        ctx.returns.will_return("set_width", 1, UseCount::Exact(1));
    });

    let result = set_width(80)?;
    assert_int_equal(result, 1)
}

fn expect_check_rejects_mismatched_parameter() -> TestResult {
    with_context(|ctx| {
        ctx.checks.expect(
            "set_width",
            "value",
            ParamCheck::Equal(80),
            UseCount::Exact(1),
        );
        ctx.returns.will_return("set_width", 1, UseCount::Exact(1));
    });

    match set_width(81) {
        Err(_) => Ok(()),
        Ok(_) => Err(MockaError::AssertionFailed {
            message: "expected check_expected to reject mismatched parameter".into(),
            location: mocka::SourceLocation::caller(),
        }),
    }
}

fn mock_underflow_surfaces_function_name() -> TestResult {
    let result = with_context(|ctx| ctx.returns.mock("never_queued"));
    match result {
        Err(MockaError::MockUnderflow { function, .. }) => {
            if function == "never_queued" {
                Ok(())
            } else {
                Err(MockaError::AssertionFailed {
                    message: "wrong function name in underflow error".into(),
                    location: mocka::SourceLocation::caller(),
                })
            }
        }
        _ => Err(MockaError::AssertionFailed {
            message: "expected a MockUnderflow error".into(),
            location: mocka::SourceLocation::caller(),
        }),
    }
}

fn always_check_is_never_exhausted() -> TestResult {
    with_context(|ctx| {
        ctx.checks
            .expect("log", "msg", ParamCheck::Any, UseCount::Always);
    });
    for v in 0..5u64 {
        with_context(|ctx| ctx.checks.check_expected("log", "msg", v))?;
    }
    Ok(())
}

#[test]
fn expect_check_suite() {
    let tests = mocka_tests![
        expect_check_matches_queued_predicate,
        expect_check_rejects_mismatched_parameter,
        mock_underflow_surfaces_function_name,
        always_check_is_never_exhausted,
    ];
    let failed = run_group("expect_check", tests, None, None);
    assert_eq!(failed, 0);
}
