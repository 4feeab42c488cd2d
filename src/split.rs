use log::warn;

use crate::model::{Caption, Word};

/// Split every multi-word fragment of a word-aligned caption into
/// individually timed words. Must run after all words have both bounds.
pub fn split_multiword(caption: &mut Caption) {
    if !caption.is_word_aligned
        || !caption
            .words
            .iter()
            .any(|w| w.text.contains(char::is_whitespace))
    {
        return;
    }

    let words = std::mem::take(&mut caption.words);
    caption.words = words.into_iter().flat_map(split_word).collect();
}

/// Divide a word spanning `[start, end)` into equal slices, one per
/// whitespace-separated token. The last slice ends exactly at `end`.
pub fn split_word(word: Word) -> Vec<Word> {
    let parts: Vec<&str> = word.text.split_whitespace().collect();
    if parts.len() < 2 {
        return vec![word];
    }

    let (Some(start), Some(end)) = (word.start, word.end) else {
        warn!("Cannot split untimed fragment {:?}", word.text);
        return vec![word];
    };

    let count = parts.len();
    let delta = end - start;
    let bound = |k: usize| {
        if k == count {
            end
        } else {
            start + delta * k as f64 / count as f64
        }
    };

    parts
        .iter()
        .enumerate()
        .map(|(k, part)| Word::timed(*part, bound(k), bound(k + 1)))
        .collect()
}
