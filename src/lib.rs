// Core modules
pub mod align;
pub mod analyzer;
pub mod config;
pub mod config_file;
pub mod corpus;
pub mod cue;
pub mod dependencies;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod reconstruct;
pub mod resources;
pub mod split;
pub mod vtt;

// Re-export commonly used types
pub use align::{assign_features, AlignmentSummary};
pub use analyzer::{Analyzer, AnalyzerHandle, AnalyzerToken, SpacyAnalyzer};
pub use config::{Config, ConfigBuilder, SpacyModel};
pub use config_file::{ConfigFile, ProfileConfig};
pub use corpus::Corpus;
pub use error::{SubalignError, Result};
pub use model::{Caption, Features, Video, Word};
pub use pipeline::{AlignmentStatus, FailureStage, ProcessedVideo};
pub use progress::{ProgressTracker, ProgressOperation};
