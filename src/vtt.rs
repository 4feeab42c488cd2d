use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::error::{IntoSubalignError, Result, SubalignError};

/// Literal marker that flags a line carrying inline per-word timing
pub const WORD_TAG_MARKER: &str = "<c>";

static TIMING_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+)\s+-->\s+(\S+)").expect("timing line regex is valid")
});

/// One timed caption unit from the source track
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start: f64,
    pub end: f64,
    pub lines: Vec<String>,
}

impl Cue {
    pub fn new(start: f64, end: f64, lines: Vec<String>) -> Self {
        Self { start, end, lines }
    }

    /// Whole cue text, lines joined with newlines
    pub fn raw_text(&self) -> String {
        self.lines.join("\n")
    }

    /// First line carrying inline word tags, if any
    pub fn word_tagged_line(&self) -> Option<&str> {
        self.lines
            .iter()
            .map(String::as_str)
            .find(|line| line.contains(WORD_TAG_MARKER))
    }
}

/// Parse `hh:mm:ss.fff` (or `mm:ss.fff`) into seconds.
///
/// The fractional part is mandatory, matching what caption tracks emit
/// both in timing lines and in inline word tags.
pub fn parse_timestamp(value: &str) -> Result<f64> {
    let invalid = || SubalignError::TimestampParse {
        value: value.to_string(),
    };

    let parts: Vec<&str> = value.trim().split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => ("0", *m, *s),
        _ => return Err(invalid()),
    };

    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let (whole, fraction) = seconds.split_once('.').ok_or_else(invalid)?;
    if !all_digits(hours) || !all_digits(minutes) || !all_digits(whole) || !all_digits(fraction) {
        return Err(invalid());
    }

    let hours: f64 = hours.parse().map_err(|_| invalid())?;
    let minutes: f64 = minutes.parse().map_err(|_| invalid())?;
    let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
    if minutes >= 60.0 || seconds >= 60.0 {
        return Err(invalid());
    }

    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Parse WebVTT text into cues.
///
/// Blocks that are not cues (header, NOTE, STYLE, REGION) are skipped, as are
/// cues whose timing line does not parse.
pub fn parse_vtt(contents: &str) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in contents.lines().map(|l| l.trim_end_matches('\r')) {
        if line.is_empty() {
            if let Some(cue) = parse_block(&block) {
                cues.push(cue);
            }
            block.clear();
        } else {
            block.push(line);
        }
    }
    if let Some(cue) = parse_block(&block) {
        cues.push(cue);
    }

    debug!("Parsed {} cues", cues.len());
    cues
}

fn parse_block(block: &[&str]) -> Option<Cue> {
    let first = block.first()?.trim_start_matches('\u{feff}');
    if first.starts_with("WEBVTT")
        || first.starts_with("NOTE")
        || first.starts_with("STYLE")
        || first.starts_with("REGION")
    {
        return None;
    }

    let timing_index = block.iter().position(|line| line.contains("-->"))?;
    if timing_index > 1 {
        warn!("Skipping block without a timing line: {:?}", first);
        return None;
    }

    let timing = block[timing_index];
    let parsed = TIMING_LINE.captures(timing).and_then(|caps| {
        let start = parse_timestamp(&caps[1]).ok()?;
        let end = parse_timestamp(&caps[2]).ok()?;
        Some((start, end))
    });

    match parsed {
        Some((start, end)) => {
            let lines = block[timing_index + 1..].iter().map(|l| l.to_string()).collect();
            Some(Cue::new(start, end, lines))
        }
        None => {
            warn!("Skipping cue with unparsable timing line: {:?}", timing);
            None
        }
    }
}

/// Read and parse a WebVTT file
pub fn read_vtt_file(path: &Path) -> Result<Vec<Cue>> {
    let contents = std::fs::read_to_string(path).with_path(path.to_path_buf())?;
    Ok(parse_vtt(&contents))
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTO_CAPTIONS: &str = "WEBVTT\nKind: captions\nLanguage: en\n\n\
00:00:00.030 --> 00:00:02.270 align:start position:0%\n \n\
hello<00:00:00.539><c> everyone</c><00:00:01.020><c> welcome</c>\n\n\
00:00:02.270 --> 00:00:02.280 align:start position:0%\n\
hello everyone welcome\n \n\n\
00:00:02.280 --> 00:00:04.000 align:start position:0%\n\
hello everyone welcome\n\
to<00:00:02.700><c> my</c><00:00:03.100><c> kitchen</c>\n";

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:00:01.500").unwrap(), 1.5);
        assert_eq!(parse_timestamp("01:02:03.250").unwrap(), 3723.25);
        assert_eq!(parse_timestamp("02:03.250").unwrap(), 123.25);
        assert!(parse_timestamp("00:00:01").is_err());
        assert!(parse_timestamp("aa:00:01.000").is_err());
        assert!(parse_timestamp("00:61:01.000").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_parse_auto_captions() {
        let cues = parse_vtt(AUTO_CAPTIONS);
        assert_eq!(cues.len(), 3);

        assert_eq!(cues[0].start, 0.03);
        assert_eq!(cues[0].end, 2.27);
        assert_eq!(cues[0].lines.len(), 2);
        assert_eq!(cues[0].lines[0], " ");
        assert!(cues[0].word_tagged_line().unwrap().starts_with("hello<"));

        assert!(cues[1].word_tagged_line().is_none());
        assert_eq!(cues[2].word_tagged_line().unwrap(), "to<00:00:02.700><c> my</c><00:00:03.100><c> kitchen</c>");
    }

    #[test]
    fn test_skips_notes_identifiers_and_bad_timings() {
        let vtt = "WEBVTT\n\nNOTE this is a comment\n\n1\n00:01.000 --> 00:02.000\nplain words\n\n\
2\nnot a time --> 00:03.000\nbroken\n\n00:03.000 --> 00:04.000\r\nlast\r\n";
        let cues = parse_vtt(vtt);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start, 1.0);
        assert_eq!(cues[0].raw_text(), "plain words");
        assert_eq!(cues[1].lines, vec!["last".to_string()]);
    }

    #[test]
    fn test_read_vtt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.en.vtt");
        std::fs::write(&path, AUTO_CAPTIONS).unwrap();
        assert_eq!(read_vtt_file(&path).unwrap().len(), 3);
        assert!(read_vtt_file(&dir.path().join("missing.vtt")).is_err());
    }
}
