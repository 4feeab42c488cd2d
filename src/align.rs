//! Maps analyzer tokens back onto caption words.
//!
//! The analyzer tokenizes the space-joined video text on its own terms: it
//! may split one caption word into several tokens (`don't` -> `do` + `n't`).
//! Each caption word receives the features of its first token; every further
//! token of the same word appends its pos/dep as a subtag. Token heads are
//! then translated from token indices to word indices.

use log::{debug, warn};

use crate::analyzer::AnalyzerToken;
use crate::error::{Result, SubalignError};
use crate::model::{Features, Video};

/// What an alignment pass did, for logging and reports
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentSummary {
    pub words: usize,
    pub tokens: usize,
    /// Words whose features were merged from more than one token
    pub compound_words: usize,
}

/// Assign pos/dep/head to every word of `video` from `tokens`.
///
/// All-or-nothing: on any error no word of the video is modified.
pub fn assign_features(video: &mut Video, tokens: &[AnalyzerToken]) -> Result<AlignmentSummary> {
    if video.has_features() {
        return Err(SubalignError::AlreadyAligned {
            video: video.id.clone(),
        });
    }

    let features = align_tokens(video, tokens)?;
    let summary = AlignmentSummary {
        words: features.len(),
        tokens: tokens.len(),
        compound_words: features.iter().filter(|f| f.is_compound()).count(),
    };

    for (word, features) in video.words_mut().zip(features) {
        word.features = Some(features);
    }

    debug!(
        "{}: aligned {} tokens onto {} words ({} compound)",
        video.id, summary.tokens, summary.words, summary.compound_words
    );
    Ok(summary)
}

/// Compute one `Features` per word without touching the video
pub fn align_tokens(video: &Video, tokens: &[AnalyzerToken]) -> Result<Vec<Features>> {
    let text: Vec<char> = video.text().chars().collect();
    let words: Vec<&str> = video.words().map(|w| w.text.as_str()).collect();
    let inconsistent = |message: String| SubalignError::InconsistentTokenStream {
        video: video.id.clone(),
        message,
    };

    let mut drafts: Vec<Features> = Vec::with_capacity(words.len());
    let mut token_to_word: Vec<usize> = Vec::with_capacity(tokens.len());
    let mut new_words = 0usize;
    let mut mid_word = false;
    let mut pending = String::new();

    for (index, token) in tokens.iter().enumerate() {
        let after_space = token
            .offset
            .checked_sub(1)
            .and_then(|previous| text.get(previous))
            .is_some_and(|c| c.is_whitespace());

        if (after_space && !mid_word) || token.offset == 0 {
            if new_words < words.len() {
                drafts.push(Features {
                    pos: vec![token.pos.clone()],
                    dep: vec![token.dep.clone()],
                    head: token.head,
                });
            }
            new_words += 1;
        } else {
            let Some(word_index) = new_words.checked_sub(1) else {
                return Err(inconsistent(format!(
                    "token {} ({:?}) continues a word before any word started",
                    index, token.text
                )));
            };
            mid_word = true;

            if let Some(draft) = drafts.get_mut(word_index) {
                draft.pos.push(token.pos.clone());
                draft.dep.push(token.dep.clone());
            }

            // The buffer holds the earlier pieces of the word
            if let Some(previous) = index.checked_sub(1).map(|i| &tokens[i]) {
                pending.push_str(&previous.text);
            }
            let rebuilt = format!("{}{}", pending, token.text);
            if words.get(word_index).is_some_and(|word| *word == rebuilt) {
                mid_word = false;
                pending.clear();
            }
        }

        token_to_word.push(new_words.saturating_sub(1));
    }

    if mid_word {
        // Remaining pieces were folded into the last word without ever
        // reproducing its text
        warn!(
            "{}: token stream ended inside a word, unmatched buffer {:?}",
            video.id, pending
        );
    }

    if new_words != words.len() {
        return Err(SubalignError::AlignmentCountMismatch {
            video: video.id.clone(),
            produced: new_words,
            expected: words.len(),
        });
    }

    for draft in &mut drafts {
        draft.head = *token_to_word.get(draft.head).ok_or_else(|| {
            inconsistent(format!(
                "head {} is outside the token stream of {} tokens",
                draft.head,
                tokens.len()
            ))
        })?;
    }

    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Caption, Word};

    fn video(captions: &[&[&str]]) -> Video {
        Video {
            id: "vid".to_string(),
            captions: captions
                .iter()
                .map(|words| {
                    let mut caption = Caption::new(true, 0.0, 1.0);
                    caption.words = words.iter().map(|w| Word::new(*w)).collect();
                    caption
                })
                .collect(),
        }
    }

    fn token(text: &str, offset: usize, pos: &str, dep: &str, head: usize) -> AnalyzerToken {
        AnalyzerToken {
            text: text.to_string(),
            offset,
            pos: pos.to_string(),
            dep: dep.to_string(),
            head,
        }
    }

    fn pos_tags(video: &Video) -> Vec<String> {
        video
            .words()
            .map(|w| w.features.as_ref().unwrap().pos_tag())
            .collect()
    }

    fn heads(video: &Video) -> Vec<usize> {
        video.words().map(|w| w.features.as_ref().unwrap().head).collect()
    }

    #[test]
    fn test_one_token_per_word() {
        // "i like it"
        let mut video = video(&[&["i", "like"], &["it"]]);
        let tokens = vec![
            token("i", 0, "PRON", "nsubj", 1),
            token("like", 2, "VERB", "ROOT", 1),
            token("it", 7, "PRON", "dobj", 1),
        ];
        let summary = assign_features(&mut video, &tokens).unwrap();
        assert_eq!(summary.words, 3);
        assert_eq!(summary.compound_words, 0);
        assert_eq!(pos_tags(&video), vec!["PRON", "VERB", "PRON"]);
        assert_eq!(heads(&video), vec![1, 1, 1]);
    }

    #[test]
    fn test_split_token_is_merged_and_heads_remapped() {
        // "i don't know" -> i | do | n't | know
        let mut video = video(&[&["i", "don't", "know"]]);
        let tokens = vec![
            token("i", 0, "PRON", "nsubj", 3),
            token("do", 2, "AUX", "aux", 3),
            token("n't", 4, "PART", "neg", 3),
            token("know", 8, "VERB", "ROOT", 3),
        ];
        let summary = assign_features(&mut video, &tokens).unwrap();
        assert_eq!(summary.compound_words, 1);

        let dont = video.words().nth(1).unwrap().features.clone().unwrap();
        assert_eq!(dont.pos_tag(), "AUX+PART");
        assert_eq!(dont.dep_label(), "aux+neg");
        // token 3 ("know") is word 2
        assert_eq!(heads(&video), vec![2, 2, 2]);
    }

    #[test]
    fn test_continuation_clears_after_word_is_rebuilt() {
        // "(hello) there" -> ( | hello | ) | there
        let video = video(&[&["(hello)", "there"]]);
        let tokens = vec![
            token("(", 0, "PUNCT", "punct", 1),
            token("hello", 1, "INTJ", "ROOT", 1),
            token(")", 6, "PUNCT", "punct", 1),
            token("there", 8, "ADV", "advmod", 1),
        ];
        let features = align_tokens(&video, &tokens).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].pos_tag(), "PUNCT+INTJ+PUNCT");
        assert_eq!(features[1].pos_tag(), "ADV");
        assert_eq!(features[0].head, 0);
        assert_eq!(features[1].head, 0);
    }

    #[test]
    fn test_unicode_offsets_are_characters() {
        // "café ok"
        let video = video(&[&["café", "ok"]]);
        let tokens = vec![
            token("café", 0, "NOUN", "ROOT", 0),
            token("ok", 5, "INTJ", "intj", 0),
        ];
        let features = align_tokens(&video, &tokens).unwrap();
        assert_eq!(features[1].pos, vec!["INTJ".to_string()]);
    }

    #[test]
    fn test_too_few_words_is_mismatch_and_leaves_video_untouched() {
        // "we can not" tokenized as if "can" and "not" were one word
        let mut video = video(&[&["we", "can", "not"]]);
        let tokens = vec![
            token("we", 0, "PRON", "nsubj", 1),
            token("can", 3, "AUX", "ROOT", 1),
        ];
        let err = assign_features(&mut video, &tokens).unwrap_err();
        assert!(matches!(
            err,
            SubalignError::AlignmentCountMismatch { produced: 2, expected: 3, .. }
        ));
        assert!(!video.has_features());
    }

    #[test]
    fn test_too_many_words_is_mismatch() {
        // two tokens both claiming to open a word at offset 0
        let mut video = video(&[&["hi"]]);
        let tokens = vec![
            token("hi", 0, "INTJ", "ROOT", 0),
            token("hi", 0, "INTJ", "ROOT", 0),
        ];
        let err = assign_features(&mut video, &tokens).unwrap_err();
        assert!(matches!(
            err,
            SubalignError::AlignmentCountMismatch { produced: 2, expected: 1, .. }
        ));
        assert!(!video.has_features());
    }

    #[test]
    fn test_orphan_continuation_is_inconsistent() {
        let video = video(&[&["abc"]]);
        let tokens = vec![token("bc", 1, "X", "dep", 0)];
        let err = align_tokens(&video, &tokens).unwrap_err();
        assert!(matches!(err, SubalignError::InconsistentTokenStream { .. }));
    }

    #[test]
    fn test_head_out_of_range_is_inconsistent() {
        let mut video = video(&[&["hi"]]);
        let tokens = vec![token("hi", 0, "INTJ", "ROOT", 7)];
        let err = assign_features(&mut video, &tokens).unwrap_err();
        assert!(matches!(err, SubalignError::InconsistentTokenStream { .. }));
        assert!(!video.has_features());
    }

    #[test]
    fn test_features_assigned_once() {
        let mut video = video(&[&["hi"]]);
        let tokens = vec![token("hi", 0, "INTJ", "ROOT", 0)];
        assign_features(&mut video, &tokens).unwrap();
        let err = assign_features(&mut video, &tokens).unwrap_err();
        assert!(matches!(err, SubalignError::AlreadyAligned { .. }));
    }

    #[test]
    fn test_unmatched_buffer_swallows_following_tokens() {
        // the analyzer claims "ab" is one word spread over "ab c", which never
        // rebuilds "ab"; "c" is folded into it and the count comes up short
        let video = video(&[&["ab", "c"]]);
        let tokens = vec![
            token("a", 0, "X", "dep", 0),
            token("bx", 1, "X", "dep", 0),
            token("c", 3, "X", "dep", 0),
        ];
        let err = align_tokens(&video, &tokens).unwrap_err();
        assert!(matches!(
            err,
            SubalignError::AlignmentCountMismatch { produced: 1, expected: 2, .. }
        ));
    }
}
