use log::{info, warn};
use serde::Serialize;
use std::path::Path;

use crate::align::assign_features;
use crate::analyzer::AnalyzerHandle;
use crate::error::{IntoSubalignError, Result, SubalignError};
use crate::model::{video_id_from_path, Video};
use crate::vtt::parse_vtt;

/// How far a video got through linguistic alignment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlignmentStatus {
    /// Every word carries pos/dep/head
    Aligned { tokens: usize, compound_words: usize },
    /// No analyzer available; timing only
    Skipped { reason: String },
    /// Analysis or alignment failed; the video has no features and must not
    /// feed feature-dependent analyses
    Failed { stage: FailureStage, reason: String },
}

/// Where a failed video stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// The analyzer itself (subprocess, model, output parsing)
    Analyzer,
    /// The token stream could not be mapped onto the words
    Alignment,
}

impl FailureStage {
    fn of(error: &SubalignError) -> Self {
        if error.is_alignment_failure() {
            FailureStage::Alignment
        } else {
            FailureStage::Analyzer
        }
    }
}

/// A video together with its alignment outcome
#[derive(Debug, Clone)]
pub struct ProcessedVideo {
    pub video: Video,
    pub status: AlignmentStatus,
}

impl ProcessedVideo {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, AlignmentStatus::Failed { .. })
    }
}

/// Parse a `.vtt` file and reconstruct its word timing
pub async fn load_video(path: &Path) -> Result<Video> {
    let contents = tokio::fs::read_to_string(path).await.with_path(path.to_path_buf())?;
    let video = Video::from_cues(video_id_from_path(path), &parse_vtt(&contents));
    log_loaded(&video);
    Ok(video)
}

/// Blocking counterpart of [`load_video`] for directory walks, which run on
/// a blocking thread
pub fn load_video_blocking(path: &Path) -> Result<Video> {
    let video = Video::from_vtt_file(path)?;
    log_loaded(&video);
    Ok(video)
}

fn log_loaded(video: &Video) {
    info!(
        "Loaded {} ({} captions, {} words, {})",
        video.id,
        video.captions.len(),
        video.len(),
        if video.is_word_aligned() { "word-aligned" } else { "cue timing only" }
    );
}

/// Run the analyzer over the video's text and fuse its annotations onto
/// the words. Fallback captions go through the same pass as aligned ones.
pub async fn analyze_video(mut video: Video, analyzer: &AnalyzerHandle) -> ProcessedVideo {
    let analyzer = match analyzer {
        AnalyzerHandle::Available(analyzer) => analyzer,
        AnalyzerHandle::Unavailable { reason } => {
            return ProcessedVideo {
                video,
                status: AlignmentStatus::Skipped {
                    reason: reason.clone(),
                },
            };
        }
    };

    if video.is_empty() {
        return ProcessedVideo {
            video,
            status: AlignmentStatus::Aligned {
                tokens: 0,
                compound_words: 0,
            },
        };
    }

    let outcome = match analyzer.analyze(&video.text()).await {
        Ok(tokens) => assign_features(&mut video, &tokens),
        Err(e) => Err(e),
    };

    let status = match outcome {
        Ok(summary) => AlignmentStatus::Aligned {
            tokens: summary.tokens,
            compound_words: summary.compound_words,
        },
        Err(e) => {
            let stage = FailureStage::of(&e);
            warn!("{}: {:?} stage failed: {}", video.id, stage, e);
            AlignmentStatus::Failed {
                stage,
                reason: e.to_string(),
            }
        }
    };

    ProcessedVideo { video, status }
}

/// Load and analyze one subtitle file
pub async fn process_video(path: &Path, analyzer: &AnalyzerHandle) -> Result<ProcessedVideo> {
    let video = load_video(path).await?;
    Ok(analyze_video(video, analyzer).await)
}

#[derive(Serialize)]
struct WordRecord<'a> {
    text: &'a str,
    start: Option<f64>,
    end: Option<f64>,
    pos: Option<String>,
    dep: Option<String>,
    head: Option<usize>,
}

#[derive(Serialize)]
struct CaptionRecord<'a> {
    start: f64,
    end: f64,
    is_word_aligned: bool,
    words: Vec<WordRecord<'a>>,
}

#[derive(Serialize)]
struct VideoRecord<'a> {
    id: &'a str,
    alignment: &'a AlignmentStatus,
    captions: Vec<CaptionRecord<'a>>,
}

/// Render a processed video as pretty JSON with one record per word
pub fn video_to_json(processed: &ProcessedVideo) -> Result<String> {
    let record = VideoRecord {
        id: &processed.video.id,
        alignment: &processed.status,
        captions: processed
            .video
            .captions
            .iter()
            .map(|caption| CaptionRecord {
                start: caption.start,
                end: caption.end,
                is_word_aligned: caption.is_word_aligned,
                words: caption
                    .words
                    .iter()
                    .map(|word| WordRecord {
                        text: &word.text,
                        start: word.start,
                        end: word.end,
                        pos: word.features.as_ref().map(|f| f.pos_tag()),
                        dep: word.features.as_ref().map(|f| f.dep_label()),
                        head: word.features.as_ref().map(|f| f.head),
                    })
                    .collect(),
            })
            .collect(),
    };

    serde_json::to_string_pretty(&record).map_err(|e| SubalignError::Processing {
        message: format!("Failed to serialize {}: {}", processed.video.id, e),
    })
}

/// Write `video_to_json` output to `path`, creating parent directories
pub async fn write_video_json(processed: &ProcessedVideo, path: &Path) -> Result<()> {
    let json = video_to_json(processed)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.with_path(parent.to_path_buf())?;
    }
    tokio::fs::write(path, json).await.with_path(path.to_path_buf())
}
