use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::reconstruct::build_captions;
use crate::vtt::{read_vtt_file, Cue};

/// Linguistic features assigned to a caption word by the aligner.
///
/// When the analyzer split one caption word into several tokens, `pos` and
/// `dep` hold one subtag per token in token order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub pos: Vec<String>,
    pub dep: Vec<String>,
    /// Index of the governing word in the video's flattened word sequence
    pub head: usize,
}

impl Features {
    /// Compound part-of-speech tag, e.g. `AUX+PART`
    pub fn pos_tag(&self) -> String {
        self.pos.join("+")
    }

    /// Compound dependency label, e.g. `aux+neg`
    pub fn dep_label(&self) -> String {
        self.dep.join("+")
    }

    pub fn is_compound(&self) -> bool {
        self.pos.len() > 1
    }
}

/// A caption word with its (possibly estimated) timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub features: Option<Features>,
}

impl Word {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start: None,
            end: None,
            features: None,
        }
    }

    pub fn timed(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Self::new(text)
        }
    }

    pub fn duration(&self) -> Option<f64> {
        Some(self.end? - self.start?)
    }
}

/// An ordered run of words shown together on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub words: Vec<Word>,
    pub is_word_aligned: bool,
    pub start: f64,
    pub end: f64,
}

impl Caption {
    pub fn new(is_word_aligned: bool, start: f64, end: f64) -> Self {
        Self {
            words: Vec::new(),
            is_word_aligned,
            start,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn text(&self) -> String {
        join_words(self.words.iter())
    }
}

/// All captions of one subtitle track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub captions: Vec<Caption>,
}

impl Video {
    /// Build a video from raw cues, reconstructing per-word timing when the
    /// track carries inline word tags and falling back to cue timing otherwise
    pub fn from_cues(id: impl Into<String>, cues: &[Cue]) -> Self {
        let id = id.into();
        let captions = build_captions(&id, cues);
        Self { id, captions }
    }

    /// Load a video from a `.vtt` file; the id is the file name up to its first `.`
    pub fn from_vtt_file(path: &Path) -> Result<Self> {
        let cues = read_vtt_file(path)?;
        Ok(Self::from_cues(video_id_from_path(path), &cues))
    }

    /// Flattened view of every word, in caption order
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.captions.iter().flat_map(|c| c.words.iter())
    }

    pub fn words_mut(&mut self) -> impl Iterator<Item = &mut Word> {
        self.captions.iter_mut().flat_map(|c| c.words.iter_mut())
    }

    /// Total word count, the length of the head index space
    pub fn len(&self) -> usize {
        self.captions.iter().map(Caption::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Words joined by single spaces; this is what the analyzer consumes
    pub fn text(&self) -> String {
        join_words(self.words())
    }

    pub fn is_word_aligned(&self) -> bool {
        self.captions.iter().any(|c| c.is_word_aligned)
    }

    pub fn has_features(&self) -> bool {
        self.words().any(|w| w.features.is_some())
    }
}

fn join_words<'a>(words: impl Iterator<Item = &'a Word>) -> String {
    words.map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ")
}

/// `videos/abc123.en.vtt` -> `abc123`
pub fn video_id_from_path(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.split('.').next().unwrap_or(name).to_string())
        .unwrap_or_default()
}
