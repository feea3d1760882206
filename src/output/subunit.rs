//! `SUBUNIT` formatter: the line-based `test:`/`success:`/`failure:`/
//! `skip:` protocol used by subunit-consuming CI tooling.

use super::Event;

pub struct SubunitWriter;

impl SubunitWriter {
    pub fn new() -> Self {
        SubunitWriter
    }

    pub fn emit(&mut self, event: &Event<'_>) {
        match event {
            Event::TestStart { name } => println!("test: {name}"),
            Event::TestSuccess { name, .. } => println!("success: {name}"),
            Event::TestSkipped { name } => println!("skip: {name}"),
            Event::TestFailure { name, message, .. } => {
                println!("failure: {name} [");
                println!("{message}");
                println!("]");
            }
            Event::TestError { name, message, .. } => {
                println!("error: {name} [");
                println!("{message}");
                println!("]");
            }
            _ => {}
        }
    }
}
