//! `STANDARD` formatter: `[ RUN ]`/`[ OK ]`/`[ FAILED ]`-style lines on
//! stdout, the default output when no `CMOCKA_MESSAGE_OUTPUT` is set.

use super::Event;

pub struct StandardWriter;

impl StandardWriter {
    pub fn new() -> Self {
        StandardWriter
    }

    pub fn emit(&mut self, event: &Event<'_>) {
        match event {
            Event::GroupStart { group } => println!("[==========] Running test group {group}"),
            Event::TestStart { name } => println!("[ RUN      ] {name}"),
            Event::TestSuccess { name, runtime } => {
                println!("[       OK ] {name} ({} ms)", runtime.as_millis())
            }
            Event::TestSkipped { name } => println!("[  SKIPPED ] {name}"),
            Event::TestFailure { name, runtime, message } => {
                println!("[  FAILED  ] {name} ({} ms)", runtime.as_millis());
                println!("  {message}");
            }
            Event::TestError { name, runtime, message } => {
                println!("[  ERROR   ] {name} ({} ms)", runtime.as_millis());
                println!("  {message}");
            }
            Event::GroupFinish { group, passed, failed } => {
                println!("[==========] {passed} test(s) passed, {failed} test(s) failed in group {group}");
            }
        }
    }
}
