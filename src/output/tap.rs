//! `TAP` formatter: Test Anything Protocol version 13.

use super::Event;

pub struct TapWriter {
    count: u32,
    any_failed: bool,
    group: String,
    lines: Vec<String>,
}

impl TapWriter {
    pub fn new() -> Self {
        println!("TAP version 13");
        TapWriter {
            count: 0,
            any_failed: false,
            group: String::new(),
            lines: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: &Event<'_>) {
        match event {
            Event::GroupStart { group } => self.group = group.to_string(),
            Event::TestSuccess { name, .. } => {
                self.count += 1;
                self.lines.push(format!("ok {} - {name}", self.count));
            }
            Event::TestSkipped { name } => {
                self.count += 1;
                self.lines
                    .push(format!("ok {} - {name} # SKIP", self.count));
            }
            Event::TestFailure { name, message, .. } | Event::TestError { name, message, .. } => {
                self.count += 1;
                self.any_failed = true;
                self.lines.push(format!("not ok {} - {name}", self.count));
                for line in message.lines() {
                    self.lines.push(format!("# {line}"));
                }
            }
            _ => {}
        }
    }

    pub fn finish(&mut self) {
        println!("1..{}", self.count);
        for line in self.lines.drain(..) {
            println!("{line}");
        }
        if self.any_failed {
            println!("# not ok - {}", self.group);
        } else {
            println!("# ok - {}", self.group);
        }
    }
}
