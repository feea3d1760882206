//! `XML` formatter: a JUnit-compatible `<testsuites><testsuite><testcase>`
//! document. The destination path may contain `%g`, substituted with the
//! current group name so multiple groups in one process can write
//! separate files or, if the substituted path resolves to the same file,
//! accumulate further `<testsuite>` blocks into one shared document.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Duration;

use parking_lot::Mutex;

use super::Event;

/// Path -> already-finished `<testsuite>` blocks written under it so far
/// this process. Rewritten in full on every `finish()` because a JUnit
/// document needs one closing `</testsuites>` tag, not a stream of opens.
static GROUPS_BY_PATH: OnceLock<Mutex<HashMap<String, Vec<String>>>> = OnceLock::new();

fn groups_by_path() -> &'static Mutex<HashMap<String, Vec<String>>> {
    GROUPS_BY_PATH.get_or_init(|| Mutex::new(HashMap::new()))
}

pub struct XmlWriter {
    path: String,
    group: String,
    cases: Vec<String>,
    passed: usize,
    failed: usize,
    errors: usize,
    skipped: usize,
    total_time: Duration,
}

fn substitute_group(template: &str, group: &str) -> String {
    template.replace("%g", group)
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl XmlWriter {
    pub fn new(template: Option<&str>, group: &str) -> Self {
        let path = substitute_group(template.unwrap_or("mocka-results.xml"), group);
        XmlWriter {
            path,
            group: group.to_string(),
            cases: Vec::new(),
            passed: 0,
            failed: 0,
            errors: 0,
            skipped: 0,
            total_time: Duration::ZERO,
        }
    }

    pub fn emit(&mut self, event: &Event<'_>) {
        match event {
            Event::TestSuccess { name, runtime } => {
                self.passed += 1;
                self.total_time += *runtime;
                self.cases
                    .push(testcase_xml(&self.group, name, *runtime, None));
            }
            Event::TestSkipped { name } => {
                self.skipped += 1;
                self.cases.push(format!(
                    "    <testcase classname=\"{}\" name=\"{}\"><skipped/></testcase>\n",
                    escape(&self.group),
                    escape(name)
                ));
            }
            Event::TestFailure { name, runtime, message } => {
                self.failed += 1;
                self.total_time += *runtime;
                self.cases.push(testcase_xml(
                    &self.group,
                    name,
                    *runtime,
                    Some(("failure", message)),
                ));
            }
            Event::TestError { name, runtime, message } => {
                self.errors += 1;
                self.total_time += *runtime;
                self.cases.push(testcase_xml(
                    &self.group,
                    name,
                    *runtime,
                    Some(("error", message)),
                ));
            }
            _ => {}
        }
    }

    pub fn finish(&mut self) {
        let block = format!(
            "  <testsuite name=\"{}\" time=\"{:.6}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" skipped=\"{}\">\n{}  </testsuite>\n",
            escape(&self.group),
            self.total_time.as_secs_f64(),
            self.passed + self.failed + self.errors + self.skipped,
            self.failed,
            self.errors,
            self.skipped,
            self.cases.concat()
        );

        let mut by_path = groups_by_path().lock();
        let blocks = by_path.entry(self.path.clone()).or_default();
        blocks.push(block);

        let mut file = File::create(&self.path).expect("failed to open XML results file");
        writeln!(file, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>").ok();
        writeln!(file, "<testsuites>").ok();
        for block in blocks.iter() {
            write!(file, "{block}").ok();
        }
        writeln!(file, "</testsuites>").ok();
    }
}

fn testcase_xml(
    classname: &str,
    name: &str,
    runtime: Duration,
    failure: Option<(&str, &str)>,
) -> String {
    let time = runtime.as_secs_f64();
    match failure {
        None => format!(
            "    <testcase classname=\"{}\" name=\"{}\" time=\"{:.6}\"/>\n",
            escape(classname),
            escape(name),
            time
        ),
        Some((kind, message)) => format!(
            "    <testcase classname=\"{}\" name=\"{}\" time=\"{:.6}\"><{kind}><![CDATA[{}]]></{kind}></testcase>\n",
            escape(classname),
            escape(name),
            time,
            message.replace("]]>", "]]]]><![CDATA[>")
        ),
    }
}
