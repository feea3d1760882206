//! Minimal glob matcher for test filter/skip patterns.
//!
//! Supports `*` (any run of characters, including none) and `?` (exactly
//! one character). No character classes, no path semantics — test names
//! aren't paths. Implemented as a direct recursive descent rather than
//! pulled in from a crate, mirroring the original's hand-rolled matcher.

pub fn matches(pattern: &str, text: &str) -> bool {
    matches_bytes(pattern.as_bytes(), text.as_bytes())
}

fn matches_bytes(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some(b'*') => {
            matches_bytes(&pattern[1..], text)
                || (!text.is_empty() && matches_bytes(pattern, &text[1..]))
        }
        Some(b'?') => !text.is_empty() && matches_bytes(&pattern[1..], &text[1..]),
        Some(&c) => {
            !text.is_empty() && text[0] == c && matches_bytes(&pattern[1..], &text[1..])
        }
    }
}

/// A comma-separated list of glob patterns, as accepted by the filter and
/// skip environment variables. Most filter strings name a handful of
/// patterns, so the backing buffer stays inline rather than heap-allocating
/// for the common case.
pub struct PatternList {
    patterns: smallvec::SmallVec<[String; 4]>,
}

impl PatternList {
    pub fn parse(spec: &str) -> Self {
        PatternList {
            patterns: spec
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches_any(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| matches(p, text))
    }
}
