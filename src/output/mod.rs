//! Output dispatch: turns lifecycle [`Event`]s into one or more of the
//! `STANDARD`/`TAP`/`SUBUNIT`/`XML` result streams, selected by
//! `CMOCKA_MESSAGE_OUTPUT` (or `mocka.toml`).

mod standard;
mod subunit;
mod tap;
mod xml;

use std::time::Duration;

use crate::config::RunConfig;

/// A bitmask of active output formats, parsed from a comma-separated
/// `CMOCKA_MESSAGE_OUTPUT`-style string. Unknown tokens are ignored rather
/// than rejected, matching the original's lenient parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputMask(u8);

const STANDARD: u8 = 1;
const SUBUNIT: u8 = 2;
const TAP: u8 = 4;
const XML: u8 = 8;

impl OutputMask {
    pub fn parse(spec: &str) -> Self {
        let mut mask = 0u8;
        for token in spec.split(',').map(str::trim) {
            match token.to_ascii_uppercase().as_str() {
                "STANDARD" | "STDOUT" => mask |= STANDARD,
                "SUBUNIT" => mask |= SUBUNIT,
                "TAP" => mask |= TAP,
                "XML" => mask |= XML,
                _ => {}
            }
        }
        if mask == 0 {
            mask = STANDARD;
        }
        OutputMask(mask)
    }

    pub fn contains_standard(&self) -> bool {
        self.0 & STANDARD != 0
    }
    pub fn contains_subunit(&self) -> bool {
        self.0 & SUBUNIT != 0
    }
    pub fn contains_tap(&self) -> bool {
        self.0 & TAP != 0
    }
    pub fn contains_xml(&self) -> bool {
        self.0 & XML != 0
    }
}

/// A lifecycle notification fanned out to every active formatter.
pub enum Event<'a> {
    GroupStart { group: &'a str },
    TestStart { name: &'a str },
    TestSuccess { name: &'a str, runtime: Duration },
    TestSkipped { name: &'a str },
    TestFailure { name: &'a str, runtime: Duration, message: String },
    TestError { name: &'a str, runtime: Duration, message: String },
    GroupFinish { group: &'a str, passed: usize, failed: usize },
}

/// Owns the formatters active for one group run and fans events out to
/// each of them in turn.
pub struct OutputSink {
    standard: Option<standard::StandardWriter>,
    tap: Option<tap::TapWriter>,
    subunit: Option<subunit::SubunitWriter>,
    xml: Option<xml::XmlWriter>,
}

impl OutputSink {
    pub fn from_config(config: &RunConfig, group: &str) -> Self {
        OutputSink {
            standard: config.output_mask.contains_standard().then(standard::StandardWriter::new),
            tap: config.output_mask.contains_tap().then(tap::TapWriter::new),
            subunit: config.output_mask.contains_subunit().then(subunit::SubunitWriter::new),
            xml: config
                .output_mask
                .contains_xml()
                .then(|| xml::XmlWriter::new(config.xml_file_template.as_deref(), group)),
        }
    }

    pub fn emit(&mut self, event: Event<'_>) {
        if let Some(w) = &mut self.standard {
            w.emit(&event);
        }
        if let Some(w) = &mut self.tap {
            w.emit(&event);
        }
        if let Some(w) = &mut self.subunit {
            w.emit(&event);
        }
        if let Some(w) = &mut self.xml {
            w.emit(&event);
        }
    }

    pub fn finish(&mut self) {
        if let Some(w) = &mut self.tap {
            w.finish();
        }
        if let Some(w) = &mut self.xml {
            w.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults_to_standard() {
        assert!(OutputMask::parse("").contains_standard());
        assert!(OutputMask::parse("bogus").contains_standard());
    }

    #[test]
    fn parse_multiple_tokens() {
        let mask = OutputMask::parse("tap,xml");
        assert!(mask.contains_tap());
        assert!(mask.contains_xml());
        assert!(!mask.contains_standard());
        assert!(!mask.contains_subunit());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert!(OutputMask::parse("Standard").contains_standard());
    }

    #[test]
    fn stdout_is_an_alias_for_standard() {
        assert!(OutputMask::parse("stdout").contains_standard());
    }
}
