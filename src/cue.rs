use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SubalignError};
use crate::vtt::parse_timestamp;

// Everything up to and including the first inline timestamp
static LEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)<([0-9:.]+)>").expect("leading fragment regex is valid"));

// `<ts><c> word</c>` pairs after the leading fragment
static TIMED_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([0-9:.]+)><c>(\s.*?)</c>").expect("timed word regex is valid")
});

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("markup regex is valid"));

/// A piece of caption text paired with the inline timestamp that tags it
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub timestamp: f64,
}

impl Fragment {
    pub fn new(text: impl Into<String>, timestamp: f64) -> Self {
        Self {
            text: text.into(),
            timestamp,
        }
    }

    /// Fragments without any word character (a stray `-`, `>>`, an empty
    /// leading fragment) carry no word
    pub fn is_degenerate(&self) -> bool {
        !self.text.chars().any(|c| c.is_alphanumeric() || c == '_')
    }
}

/// Strip inline markup tags from caption text
pub fn strip_markup(text: &str) -> String {
    MARKUP.replace_all(text, "").into_owned()
}

/// Parse one word-tagged cue line.
///
/// Element 0 is the leading fragment: the text before the first timestamp,
/// paired with that timestamp. The rest are the `<ts><c> word</c>` pairs in
/// line order. Pairs whose text is empty once trimmed are dropped; the
/// leading fragment is always kept, even when empty.
pub fn parse_tagged_line(line: &str) -> Result<Vec<Fragment>> {
    let leading = LEADING
        .captures(line)
        .ok_or_else(|| SubalignError::MalformedCueLine {
            line: line.to_string(),
        })?;

    let mut fragments = vec![Fragment::new(
        strip_markup(&leading[1]).trim(),
        parse_timestamp(&leading[2])?,
    )];

    for caps in TIMED_WORD.captures_iter(line) {
        let timestamp = parse_timestamp(&caps[1])?;
        let text = strip_markup(&caps[2]);
        let text = text.trim();
        if !text.is_empty() {
            fragments.push(Fragment::new(text, timestamp));
        }
    }

    Ok(fragments)
}
