use std::path::PathBuf;
use crate::error::{config_error, SubalignError, Result};

/// spaCy English pipelines the analyzer can load
#[derive(Debug, Clone, PartialEq)]
pub enum SpacyModel {
    Small,
    Medium,
    Large,
    Transformer,
}

impl SpacyModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpacyModel::Small => "sm",
            SpacyModel::Medium => "md",
            SpacyModel::Large => "lg",
            SpacyModel::Transformer => "trf",
        }
    }

    /// Package name passed to `spacy.load`
    pub fn package(&self) -> &'static str {
        match self {
            SpacyModel::Small => "en_core_web_sm",
            SpacyModel::Medium => "en_core_web_md",
            SpacyModel::Large => "en_core_web_lg",
            SpacyModel::Transformer => "en_core_web_trf",
        }
    }
}

impl std::str::FromStr for SpacyModel {
    type Err = SubalignError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sm" | "en_core_web_sm" => Ok(SpacyModel::Small),
            "md" | "en_core_web_md" => Ok(SpacyModel::Medium),
            "lg" | "en_core_web_lg" => Ok(SpacyModel::Large),
            "trf" | "en_core_web_trf" => Ok(SpacyModel::Transformer),
            _ => Err(config_error(
                "spacy_model",
                format!("Invalid model '{}'. Valid options: sm, md, lg, trf", s)
            )),
        }
    }
}

/// Configuration for a subalign run
#[derive(Debug, Clone)]
pub struct Config {
    /// A `.vtt` file or a directory tree of them
    pub input_path: PathBuf,
    /// Where per-video JSON goes; `None` means no output files
    pub output_dir: Option<PathBuf>,
    pub spacy_model: SpacyModel,
    /// Python interpreter used to run spaCy
    pub python: String,
    /// Run the analyzer at all; off means timing only
    pub analyze: bool,
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.input_path.exists() {
            return Err(config_error(
                "input_path",
                format!("Input path does not exist: {}", self.input_path.display())
            ));
        }

        if self.input_path.is_file() {
            let extension = self.input_path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .to_lowercase();
            if extension != "vtt" {
                return Err(SubalignError::UnsupportedFormat {
                    extension,
                    supported: vec!["vtt".to_string()],
                });
            }
        }

        if let Some(ref output_dir) = self.output_dir {
            if output_dir.is_file() {
                return Err(config_error(
                    "output_dir",
                    format!("Output path is a file: {}", output_dir.display())
                ));
            }
        }

        if self.python.trim().is_empty() {
            return Err(config_error("python", "Python interpreter cannot be empty"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_dir: None,
            spacy_model: SpacyModel::Transformer,
            python: "python3".to_string(),
            analyze: true,
        }
    }
}

/// Builder pattern for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    input_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    spacy_model: Option<SpacyModel>,
    python: Option<String>,
    analyze: Option<bool>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_path(mut self, path: PathBuf) -> Self {
        self.input_path = Some(path);
        self
    }

    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }

    pub fn spacy_model(mut self, model: SpacyModel) -> Self {
        self.spacy_model = Some(model);
        self
    }

    pub fn python(mut self, python: impl Into<String>) -> Result<Self> {
        let python = python.into();
        if python.trim().is_empty() {
            return Err(config_error("python", "Python interpreter cannot be empty"));
        }
        self.python = Some(python);
        Ok(self)
    }

    pub fn analyze(mut self, analyze: bool) -> Self {
        self.analyze = Some(analyze);
        self
    }

    pub fn build(self) -> Result<Config> {
        let input_path = self.input_path
            .ok_or_else(|| config_error("input_path", "Input path is required"))?;

        let defaults = Config::default();
        let config = Config {
            input_path,
            output_dir: self.output_dir,
            spacy_model: self.spacy_model.unwrap_or(defaults.spacy_model),
            python: self.python.unwrap_or(defaults.python),
            analyze: self.analyze.unwrap_or(defaults.analyze),
        };

        config.validate()?;
        Ok(config)
    }
}
