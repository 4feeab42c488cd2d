use log::{debug, info, warn};

use crate::cue::{parse_tagged_line, strip_markup, Fragment};
use crate::model::{Caption, Word};
use crate::split::split_multiword;
use crate::vtt::Cue;

/// Padding used where the track has no neighbouring timestamp: before the
/// first word of a video and after its last word. These are heuristic
/// estimates, not measurements.
pub const BOUNDARY_PADDING: f64 = 1.0;

/// Largest junction value kept as-is; larger means are replaced by
/// `new_timestamp - JUNCTION_CAP`
pub const JUNCTION_CAP: f64 = 1.0;

/// Round to millisecond precision
pub fn round_ms(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Estimated boundary between the last word of one caption and the first
/// word of the next.
///
/// The mean is taken against the previous word's *start*, and the cap
/// compares the mean itself against [`JUNCTION_CAP`].
pub fn junction(new_timestamp: f64, previous_word_start: f64) -> f64 {
    let mean = round_ms((new_timestamp + previous_word_start) / 2.0);
    if mean > JUNCTION_CAP {
        new_timestamp - JUNCTION_CAP
    } else {
        mean
    }
}

/// Build the captions of one video.
///
/// Word-tagged cues go through timestamp reconstruction and multi-word
/// splitting. When no cue in the whole track yields a word-aligned caption,
/// every cue becomes a coarse, cue-timed caption instead.
pub fn build_captions(video_id: &str, cues: &[Cue]) -> Vec<Caption> {
    let mut captions = reconstruct_word_timing(video_id, cues);
    if captions.is_empty() {
        info!("{}: no inline word timing, falling back to cue timing", video_id);
        return build_fallback_captions(cues);
    }

    for caption in &mut captions {
        split_multiword(caption);
    }
    debug!("{}: built {} word-aligned captions", video_id, captions.len());
    captions
}

/// Reconstruct per-word start/end times from word-tagged cues.
///
/// Only the first tagged line of each cue is used. Cues whose line fails to
/// parse are skipped.
pub fn reconstruct_word_timing(video_id: &str, cues: &[Cue]) -> Vec<Caption> {
    let mut captions: Vec<Caption> = Vec::new();

    for (index, cue) in cues.iter().enumerate() {
        let Some(line) = cue.word_tagged_line() else {
            continue;
        };

        let fragments = match parse_tagged_line(line) {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!("{}: skipping cue {} at {:.3}s: {}", video_id, index, cue.start, e);
                continue;
            }
        };

        if let Some(caption) = timed_caption(cue, &fragments, captions.last_mut()) {
            captions.push(caption);
        }
    }

    // The last word has no successor to borrow an end from
    if let Some(last) = captions.last_mut().and_then(|c| c.words.last_mut()) {
        if let Some(start) = last.start {
            last.end = Some(round_ms(start + BOUNDARY_PADDING));
        }
    }

    captions
}

fn timed_caption(cue: &Cue, fragments: &[Fragment], previous: Option<&mut Caption>) -> Option<Caption> {
    let leading = fragments.first()?;

    let first_start = match previous.and_then(|c| c.words.last_mut()) {
        Some(previous_word) => {
            let previous_start = previous_word.start.unwrap_or(leading.timestamp);
            let boundary = junction(leading.timestamp, previous_start);
            previous_word.end = Some(boundary);
            boundary
        }
        None => round_ms((leading.timestamp - BOUNDARY_PADDING).max(0.0)),
    };

    // Leading fragments without a word are dropped, but the last fragment
    // always survives
    let keep_from = fragments
        .iter()
        .position(|f| !f.is_degenerate())
        .unwrap_or(fragments.len() - 1);
    let kept = &fragments[keep_from..];

    let words: Vec<Word> = kept
        .iter()
        .enumerate()
        .filter(|(_, fragment)| !fragment.text.is_empty())
        .map(|(k, fragment)| {
            let start = if keep_from == 0 && k == 0 {
                first_start
            } else {
                fragment.timestamp
            };
            Word {
                text: fragment.text.clone(),
                start: Some(start),
                end: kept.get(k + 1).map(|next| next.timestamp),
                features: None,
            }
        })
        .collect();

    if words.is_empty() {
        return None;
    }

    let mut caption = Caption::new(true, cue.start, cue.end);
    caption.words = words;
    Some(caption)
}

/// Coarse captions for tracks without inline word timing: only the first
/// word's start and the last word's end are known
pub fn build_fallback_captions(cues: &[Cue]) -> Vec<Caption> {
    cues.iter()
        .filter_map(|cue| {
            let mut caption = Caption::new(false, cue.start, cue.end);
            caption.words = strip_markup(&cue.raw_text())
                .split_whitespace()
                .map(Word::new)
                .collect();

            caption.words.first_mut()?.start = Some(cue.start);
            if let Some(last) = caption.words.last_mut() {
                last.end = Some(cue.end);
            }
            Some(caption)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Video;

    const TOLERANCE: f64 = 1e-9;

    fn cue(start: f64, end: f64, lines: &[&str]) -> Cue {
        Cue::new(start, end, lines.iter().map(|l| l.to_string()).collect())
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("timestamp should be resolved");
        assert!(
            (actual - expected).abs() < TOLERANCE,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn assert_contiguous(captions: &[Caption]) {
        for caption in captions.iter().filter(|c| c.is_word_aligned) {
            for pair in caption.words.windows(2) {
                assert_close(pair[0].end, pair[1].start.unwrap());
            }
        }
    }

    #[test]
    fn test_single_cue_scenario() {
        let captions = build_captions("a", &[cue(1.0, 3.0, &["Hello<00:00:01.500><c> world</c>"])]);
        assert_eq!(captions.len(), 1);
        let words = &captions[0].words;
        assert_eq!(words.len(), 2);

        assert_eq!(words[0].text, "Hello");
        assert_close(words[0].start, 0.5);
        assert_close(words[0].end, 1.5);

        assert_eq!(words[1].text, "world");
        assert_close(words[1].start, 1.5);
        assert_close(words[1].end, 2.5);
        assert!(captions[0].is_word_aligned);
    }

    #[test]
    fn test_first_word_start_never_negative() {
        let captions = build_captions("a", &[cue(0.0, 1.0, &["hi<00:00:00.400><c> there</c>"])]);
        assert_close(captions[0].words[0].start, 0.0);
    }

    #[test]
    fn test_junction_under_cap_uses_mean() {
        let captions = build_captions(
            "a",
            &[
                cue(0.0, 1.0, &["a<00:00:00.200><c> b</c>"]),
                cue(1.0, 2.0, &["c<00:00:01.400><c> d</c>"]),
            ],
        );
        // previous last word "b" starts at 0.2, new timestamp 1.4 -> mean 0.8
        assert_close(captions[0].words[1].end, 0.8);
        assert_close(captions[1].words[0].start, 0.8);
        assert_close(captions[1].words[0].end, 1.4);
        assert_contiguous(&captions);
    }

    #[test]
    fn test_junction_cap() {
        assert_eq!(junction(1.4, 0.2), 0.8);
        // mean 3.5 > 1.0 -> replaced by new timestamp minus one second
        assert_eq!(junction(4.0, 3.0), 3.0);
        assert_eq!(junction(1.0, 1.0), 1.0);
        assert_eq!(junction(0.3333, 0.0), 0.167);

        let captions = build_captions(
            "a",
            &[
                cue(2.0, 4.0, &["one<00:00:03.000><c> two</c>"]),
                cue(4.0, 6.0, &["three<00:00:05.000><c> four</c>"]),
            ],
        );
        assert_close(captions[0].words[1].end, 4.0);
        assert_close(captions[1].words[0].start, 4.0);
        // last word of the video: start + 1s
        assert_close(captions[1].words[1].end, 6.0);
    }

    #[test]
    fn test_degenerate_first_fragment_is_discarded() {
        let captions = build_captions(
            "a",
            &[
                cue(0.0, 2.0, &["so<00:00:00.500><c> yes</c>"]),
                cue(2.0, 4.0, &["<00:00:02.000><c> fine</c><00:00:02.600><c> thanks</c>"]),
            ],
        );
        let second = &captions[1].words;
        assert_eq!(second.iter().map(|w| w.text.as_str()).collect::<Vec<_>>(), vec!["fine", "thanks"]);
        // the junction is still stamped on the previous caption
        assert_close(captions[0].words[1].end, 1.0);
        // the surviving first word keeps its parsed start
        assert_close(second[0].start, 2.0);
        assert_close(second[0].end, 2.6);
    }

    #[test]
    fn test_only_first_tagged_line_is_used() {
        let captions = build_captions(
            "a",
            &[cue(
                0.0,
                3.0,
                &["previous text", "x<00:00:01.000><c> y</c>", "z<00:00:02.000><c> w</c>"],
            )],
        );
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].text(), "x y");
    }

    #[test]
    fn test_bad_cue_is_skipped() {
        let captions = build_captions(
            "a",
            &[
                cue(0.0, 1.0, &["a<00:00:00.500><c> b</c>"]),
                cue(1.0, 2.0, &["broken <c>line</c>"]),
                cue(2.0, 3.0, &["c<00:00:02.500><c> d</c><00:00:9><c> e</c>"]),
                cue(3.0, 4.0, &["f<00:00:03.500><c> g</c>"]),
            ],
        );
        assert_eq!(captions.len(), 2);
        assert_eq!(captions[1].text(), "f g");
        assert_contiguous(&captions);
    }

    #[test]
    fn test_multiword_fragment_is_split() {
        let captions = build_captions(
            "a",
            &[
                cue(1.0, 2.0, &["ok<00:00:02.000><c> good morning</c>"]),
                cue(3.0, 4.0, &["all<00:00:04.000><c> right</c>"]),
            ],
        );
        // "good morning" spans [2.0, 3.0): junction(4.0, 2.0) = 3.0
        let words = &captions[0].words;
        assert_eq!(words.len(), 3);
        assert_eq!(words[1].text, "good");
        assert_close(words[1].start, 2.0);
        assert_close(words[1].end, 2.5);
        assert_eq!(words[2].text, "morning");
        assert_close(words[2].start, 2.5);
        assert_close(words[2].end, 3.0);
        assert_contiguous(&captions);
    }

    #[test]
    fn test_fallback_when_no_markers() {
        let cues = vec![
            cue(0.0, 2.0, &["hello there", "<i>friend</i>"]),
            cue(2.0, 3.0, &["  "]),
            cue(3.0, 5.0, &["bye"]),
        ];
        let captions = build_captions("a", &cues);
        assert_eq!(captions.len(), 2);
        assert!(captions.iter().all(|c| !c.is_word_aligned));

        let words = &captions[0].words;
        assert_eq!(words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>(), vec!["hello", "there", "friend"]);
        assert_eq!(words[0].start, Some(0.0));
        assert_eq!(words[0].end, None);
        assert_eq!(words[1].start, None);
        assert_eq!(words[1].end, None);
        assert_eq!(words[2].end, Some(2.0));

        assert_eq!(captions[1].words[0].start, Some(3.0));
        assert_eq!(captions[1].words[0].end, Some(5.0));
        assert!(captions.iter().flat_map(|c| &c.words).all(|w| w.features.is_none()));
    }

    #[test]
    fn test_fallback_when_every_tagged_line_fails() {
        let cues = vec![
            cue(0.0, 1.0, &["broken <c>line</c>"]),
            cue(1.0, 2.0, &["x<00:00:9><c> y</c>"]),
        ];
        let captions = build_captions("a", &cues);
        assert_eq!(captions.len(), 2);
        assert!(captions.iter().all(|c| !c.is_word_aligned));

        let video = Video::from_cues("a", &cues);
        assert_eq!(video.text(), "broken line x y");
        assert_eq!(video.captions[1].words[0].start, Some(1.0));
        assert_eq!(video.captions[1].words[1].end, Some(2.0));
    }

    #[test]
    fn test_underscore_fragment_is_kept() {
        let captions = build_captions(
            "a",
            &[
                cue(0.0, 1.0, &["a<00:00:00.500><c> b</c>"]),
                cue(1.0, 2.0, &["_<00:00:01.200><c> c</c>"]),
            ],
        );
        assert_eq!(captions[1].text(), "_ c");
    }

    #[test]
    fn test_no_fallback_when_any_cue_is_tagged() {
        let captions = build_captions(
            "a",
            &[cue(0.0, 1.0, &["plain only"]), cue(1.0, 2.0, &["a<00:00:01.500><c> b</c>"])],
        );
        assert_eq!(captions.len(), 1);
        assert!(captions[0].is_word_aligned);
    }

    #[test]
    fn test_rebuilding_is_stable() {
        let cues = vec![
            cue(0.0, 2.0, &["so<00:00:00.500><c> we are</c><00:00:01.200><c> here</c>"]),
            cue(2.0, 4.0, &[" ", "and<00:00:02.500><c> then</c>"]),
        ];
        let first = Video::from_cues("a", &cues);
        let second = Video::from_cues("a", &cues);
        assert_eq!(first, second);

        let mut resplit = first.clone();
        for caption in &mut resplit.captions {
            split_multiword(caption);
        }
        assert_eq!(resplit, first);
        assert_contiguous(&first.captions);
    }
}
