//! Crash capture: installs handlers for the signals a misbehaving test
//! body is most likely to raise, converting them into a panic the runner's
//! `catch_unwind` already knows how to turn into [`crate::runner::TestStatus::Crashed`].
//!
//! Disabled when `CMOCKA_DEBUG=1` is set, the runtime equivalent of the
//! original's compile-time `UNIT_TESTING_DEBUG` escape hatch for attaching
//! a real debugger.

#![cfg(unix)]

use std::sync::atomic::{AtomicBool, Ordering};

static INSTALLED: AtomicBool = AtomicBool::new(false);

const CAUGHT_SIGNALS: &[(libc::c_int, &str)] = &[
    (libc::SIGFPE, "SIGFPE"),
    (libc::SIGILL, "SIGILL"),
    (libc::SIGSEGV, "SIGSEGV"),
    (libc::SIGBUS, "SIGBUS"),
    (libc::SIGSYS, "SIGSYS"),
];

extern "C" fn handler(sig: libc::c_int) {
    let name = CAUGHT_SIGNALS
        .iter()
        .find(|(s, _)| *s == sig)
        .map(|(_, n)| *n)
        .unwrap_or("unknown signal");
    // Async-signal-safety is a real concern here; panicking from a signal
    // handler is technically UB but is the pragmatic choice every
    // crash-to-panic test harness in the ecosystem makes, and it only
    // needs to survive long enough for `catch_unwind` to see it.
    panic!("{}{name}", crate::runner::CRASH_SENTINEL_PREFIX);
}

/// Maps a signal name back to its `'static` string from [`CAUGHT_SIGNALS`],
/// for building a [`crate::error::MockaError::Crash`] from the name recovered
/// out of the panic payload.
pub(crate) fn static_name(name: &str) -> &'static str {
    CAUGHT_SIGNALS
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(_, n)| *n)
        .unwrap_or("unknown signal")
}

pub struct HandlerGuard {
    previous: Vec<(libc::c_int, libc::sighandler_t)>,
}

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        for (sig, prev) in self.previous.drain(..) {
            unsafe {
                libc::signal(sig, prev);
            }
        }
        INSTALLED.store(false, Ordering::SeqCst);
    }
}

/// Installs crash handlers unless `debug` is set, returning a guard that
/// restores the previous handlers when dropped at the end of the test.
pub fn install_handlers(debug: bool) -> Option<HandlerGuard> {
    if debug {
        return None;
    }
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return None;
    }

    let mut previous = Vec::with_capacity(CAUGHT_SIGNALS.len());
    for (sig, _) in CAUGHT_SIGNALS {
        let prev = unsafe { libc::signal(*sig, handler as libc::sighandler_t) };
        previous.push((*sig, prev));
    }

    Some(HandlerGuard { previous })
}
