use std::fmt;

/// Custom error types for subalign
#[derive(Debug)]
pub enum SubalignError {
    /// File system related errors
    FileSystem { source: std::io::Error, path: std::path::PathBuf },

    /// Analyzer (tokenizer/parser subprocess) errors
    Analyzer { message: String, stderr: Option<String> },

    /// Configuration validation errors
    Config { field: String, message: String },

    /// Unsupported file format
    UnsupportedFormat { extension: String, supported: Vec<String> },

    /// Missing external dependency
    MissingDependency { name: String, suggestion: String },

    /// A marker-bearing cue line that does not match the fragment pattern
    MalformedCueLine { line: String },

    /// An embedded timestamp that is not `hours:minutes:seconds.fraction`
    TimestampParse { value: String },

    /// The token stream produced a different number of words than the video holds
    AlignmentCountMismatch { video: String, produced: usize, expected: usize },

    /// The token stream cannot be mapped onto the video's words
    InconsistentTokenStream { video: String, message: String },

    /// Features were already assigned to this video
    AlreadyAligned { video: String },

    /// General processing error
    Processing { message: String },
}

impl fmt::Display for SubalignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubalignError::FileSystem { source, path } => {
                write!(f, "File system error for '{}': {}", path.display(), source)
            }
            SubalignError::Analyzer { message, stderr } => {
                write!(f, "Analyzer error: {}", message)?;
                if let Some(stderr) = stderr {
                    write!(f, "\nStderr: {}", stderr)?;
                }
                Ok(())
            }
            SubalignError::Config { field, message } => {
                write!(f, "Configuration error in '{}': {}", field, message)
            }
            SubalignError::UnsupportedFormat { extension, supported } => {
                write!(
                    f,
                    "Unsupported file format '{}'. Supported formats: {}",
                    extension,
                    supported.join(", ")
                )
            }
            SubalignError::MissingDependency { name, suggestion } => {
                write!(f, "Missing dependency '{}': {}", name, suggestion)
            }
            SubalignError::MalformedCueLine { line } => {
                write!(f, "Malformed cue line: {:?}", line)
            }
            SubalignError::TimestampParse { value } => {
                write!(f, "Invalid timestamp '{}', expected hh:mm:ss.fff", value)
            }
            SubalignError::AlignmentCountMismatch { video, produced, expected } => {
                write!(
                    f,
                    "Alignment failed for '{}': token stream yielded {} words, video has {}",
                    video, produced, expected
                )
            }
            SubalignError::InconsistentTokenStream { video, message } => {
                write!(f, "Inconsistent token stream for '{}': {}", video, message)
            }
            SubalignError::AlreadyAligned { video } => {
                write!(f, "Video '{}' already carries linguistic features", video)
            }
            SubalignError::Processing { message } => {
                write!(f, "Processing error: {}", message)
            }
        }
    }
}

impl std::error::Error for SubalignError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubalignError::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl SubalignError {
    /// True for errors that make a video's pos/dep/head data unusable
    pub fn is_alignment_failure(&self) -> bool {
        matches!(
            self,
            SubalignError::AlignmentCountMismatch { .. }
                | SubalignError::InconsistentTokenStream { .. }
                | SubalignError::AlreadyAligned { .. }
        )
    }
}

/// Result type alias for subalign operations
pub type Result<T> = std::result::Result<T, SubalignError>;

/// Helper function to create analyzer errors
pub fn analyzer_error(message: impl Into<String>, stderr: Option<String>) -> SubalignError {
    SubalignError::Analyzer {
        message: message.into(),
        stderr,
    }
}

/// Helper function to create configuration errors
pub fn config_error(field: impl Into<String>, message: impl Into<String>) -> SubalignError {
    SubalignError::Config {
        field: field.into(),
        message: message.into(),
    }
}

/// Helper function to create file system errors
pub fn fs_error(source: std::io::Error, path: std::path::PathBuf) -> SubalignError {
    SubalignError::FileSystem { source, path }
}

/// Trait for converting external errors to SubalignError
pub trait IntoSubalignError<T> {
    fn with_path(self, path: std::path::PathBuf) -> Result<T>;
}

impl<T> IntoSubalignError<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: std::path::PathBuf) -> Result<T> {
        self.map_err(|e| fs_error(e, path))
    }
}

// Subprocess code works in anyhow and converts at the module boundary
impl From<anyhow::Error> for SubalignError {
    fn from(err: anyhow::Error) -> Self {
        SubalignError::Processing {
            message: format!("{:#}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_display() {
        let err = SubalignError::AlignmentCountMismatch {
            video: "abc".to_string(),
            produced: 3,
            expected: 4,
        };
        assert_eq!(
            err.to_string(),
            "Alignment failed for 'abc': token stream yielded 3 words, video has 4"
        );
        assert!(err.is_alignment_failure());
    }

    #[test]
    fn test_with_path_keeps_source() {
        use std::error::Error;

        let io: std::io::Result<()> = Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = io.with_path("/tmp/missing.vtt".into()).unwrap_err();
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/tmp/missing.vtt"));
        assert!(!err.is_alignment_failure());
    }
}
