//! Natural ordering for listing entry names.
//!
//! `file2` sorts before `file10`: digit runs compare by numeric value, the
//! text between them compares case-insensitively, character by character.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// A run of ASCII digits compared by value, whatever its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digits(String);

impl Digits {
    fn new(run: &str) -> Self {
        let trimmed = run.trim_start_matches('0');
        if trimmed.is_empty() {
            Self("0".to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for Digits {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Digits {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One token of a natural key: a lowercased text character or a whole digit run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    Char(char),
    Number(Digits),
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Char(a), KeyPart::Char(b)) => a.cmp(b),
            (KeyPart::Number(a), KeyPart::Number(b)) => a.cmp(b),
            // A text character is never a digit, so any digit stands in for the run.
            (KeyPart::Char(c), KeyPart::Number(_)) => c.cmp(&'0'),
            (KeyPart::Number(_), KeyPart::Char(c)) => '0'.cmp(c),
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordering key for a name. Compare keys, not names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<KeyPart>);

impl NaturalKey {
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Build the natural ordering key for `name`.
pub fn natural_key(name: &str) -> NaturalKey {
    let mut parts = Vec::with_capacity(name.len());
    let mut last = 0;

    for m in DIGITS_RE.find_iter(name) {
        push_text(&mut parts, &name[last..m.start()]);
        parts.push(KeyPart::Number(Digits::new(m.as_str())));
        last = m.end();
    }
    push_text(&mut parts, &name[last..]);

    NaturalKey(parts)
}

fn push_text(parts: &mut Vec<KeyPart>, text: &str) {
    parts.extend(text.chars().flat_map(char::to_lowercase).map(KeyPart::Char));
}

/// Stable in-place natural sort of `items` by the name `name_of` extracts.
pub fn sort_natural<T>(items: &mut [T], name_of: impl Fn(&T) -> &str) {
    items.sort_by_cached_key(|item| natural_key(name_of(item)));
}
