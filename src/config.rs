//! Runtime configuration, layered: compiled defaults < `mocka.toml` <
//! environment variables. Environment variables always win, matching the
//! precedence the original already establishes between its compiled-in
//! defaults and its `CMOCKA_*` overrides.

use parking_lot::Mutex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::output::OutputMask;

const ENV_MESSAGE_OUTPUT: &str = "CMOCKA_MESSAGE_OUTPUT";
const ENV_XML_FILE: &str = "CMOCKA_XML_FILE";
const ENV_TEST_ABORT: &str = "CMOCKA_TEST_ABORT";
const ENV_TEST_FILTER: &str = "CMOCKA_TEST_FILTER";
const ENV_TEST_SKIP: &str = "CMOCKA_SKIP_FILTER";
const ENV_DEBUG: &str = "CMOCKA_DEBUG";

/// Programmatic overrides, set by the test binary itself rather than the
/// environment — e.g. a `main()` that parses its own `--list`/`--filter`
/// flags and forwards them here before calling [`crate::run_group`].
/// Environment variables still win when both are set, matching the
/// layering the rest of this module already establishes.
struct Overrides {
    test_filter: Mutex<Option<String>>,
    skip_filter: Mutex<Option<String>>,
    list_only: AtomicBool,
}

fn overrides() -> &'static Overrides {
    static OVERRIDES: OnceLock<Overrides> = OnceLock::new();
    OVERRIDES.get_or_init(|| Overrides {
        test_filter: Mutex::new(None),
        skip_filter: Mutex::new(None),
        list_only: AtomicBool::new(false),
    })
}

/// Sets the glob pattern (or comma-separated list of patterns) used to
/// select which tests in a group run. Overridden by `CMOCKA_TEST_FILTER`
/// when that environment variable is set.
pub fn set_test_filter(pattern: impl Into<String>) {
    *overrides().test_filter.lock() = Some(pattern.into());
}

/// Sets the glob pattern used to skip matching tests without running them.
/// Overridden by `CMOCKA_SKIP_FILTER` when set.
pub fn set_skip_filter(pattern: impl Into<String>) {
    *overrides().skip_filter.lock() = Some(pattern.into());
}

/// Enables list-only mode: [`crate::run_group`] prints each test's name
/// and returns without executing anything.
pub fn set_list_test(enabled: bool) {
    overrides().list_only.store(enabled, Ordering::SeqCst);
}

/// Optional `mocka.toml` contents. Every field is optional; an absent file
/// is equivalent to an empty one.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    message_output: Option<String>,
    #[serde(default)]
    xml_file: Option<String>,
    #[serde(default)]
    test_filter: Option<String>,
    #[serde(default)]
    skip_filter: Option<String>,
}

impl FileConfig {
    fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), %err, "ignoring malformed mocka.toml");
                FileConfig::default()
            }),
            Err(_) => FileConfig::default(),
        }
    }
}

/// Resolved configuration for one process run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub output_mask: OutputMask,
    pub xml_file_template: Option<String>,
    pub abort_on_failure: bool,
    pub test_filter: Option<String>,
    pub skip_filter: Option<String>,
    pub debug: bool,
    pub list_only: bool,
}

impl RunConfig {
    /// Resolves environment variables over programmatic overrides
    /// ([`set_test_filter`] & co.) over an optional `mocka.toml` found in
    /// the current working directory, over compiled defaults.
    pub fn resolve() -> Self {
        let file = FileConfig::load(Path::new("mocka.toml"));
        let overrides = overrides();

        let message_output = env::var(ENV_MESSAGE_OUTPUT)
            .ok()
            .or(file.message_output)
            .unwrap_or_else(|| "STANDARD".to_string());

        RunConfig {
            output_mask: OutputMask::parse(&message_output),
            xml_file_template: env::var(ENV_XML_FILE).ok().or(file.xml_file),
            abort_on_failure: env::var(ENV_TEST_ABORT)
                .map(|v| v == "1")
                .unwrap_or(false),
            test_filter: env::var(ENV_TEST_FILTER)
                .ok()
                .or_else(|| overrides.test_filter.lock().clone())
                .or(file.test_filter),
            skip_filter: env::var(ENV_TEST_SKIP)
                .ok()
                .or_else(|| overrides.skip_filter.lock().clone())
                .or(file.skip_filter),
            debug: env::var(ENV_DEBUG).map(|v| v == "1").unwrap_or(false),
            list_only: overrides.list_only.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_is_standard_only() {
        let file = FileConfig::default();
        let mask = OutputMask::parse(&file.message_output.unwrap_or_else(|| "STANDARD".into()));
        assert!(mask.contains_standard());
        assert!(!mask.contains_xml());
    }
}
