use crate::config::{ConfigBuilder, SpacyModel};
use crate::error::{config_error, IntoSubalignError, SubalignError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file format that can be serialized to YAML/JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Default spaCy model (sm, md, lg, trf)
    pub spacy_model: Option<String>,
    /// Python interpreter used to run spaCy
    pub python: Option<String>,
    /// Run the analyzer; false gives timing-only output
    pub analyze: Option<bool>,
    /// Default output directory
    pub output_directory: Option<PathBuf>,
    /// Enable progress indicators by default
    pub show_progress: Option<bool>,
    /// Custom profiles
    pub profiles: Option<HashMap<String, ProfileConfig>>,
}

/// Profile-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub spacy_model: Option<String>,
    pub python: Option<String>,
    pub analyze: Option<bool>,
    pub description: Option<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let mut profiles = HashMap::new();

        profiles.insert("accurate".to_string(), ProfileConfig {
            spacy_model: Some("trf".to_string()),
            python: None,
            analyze: Some(true),
            description: Some("Transformer pipeline, slow but the most accurate parses".to_string()),
        });

        profiles.insert("fast".to_string(), ProfileConfig {
            spacy_model: Some("sm".to_string()),
            python: None,
            analyze: Some(true),
            description: Some("Small CPU pipeline for quick passes over large corpora".to_string()),
        });

        profiles.insert("timing".to_string(), ProfileConfig {
            spacy_model: None,
            python: None,
            analyze: Some(false),
            description: Some("Word timing only, no linguistic features".to_string()),
        });

        Self {
            spacy_model: Some("trf".to_string()),
            python: Some("python3".to_string()),
            analyze: Some(true),
            output_directory: None,
            show_progress: Some(true),
            profiles: Some(profiles),
        }
    }
}

impl ConfigFile {
    /// Load configuration from a YAML file
    pub async fn load_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = read_config(path.as_ref()).await?;
        serde_yaml::from_str(&contents)
            .map_err(|e| config_error("config_file", format!("Failed to parse YAML config: {}", e)))
    }

    /// Load configuration from a JSON file
    pub async fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = read_config(path.as_ref()).await?;
        serde_json::from_str(&contents)
            .map_err(|e| config_error("config_file", format!("Failed to parse JSON config: {}", e)))
    }

    /// Auto-detect and load configuration file based on extension
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::load_yaml(path).await,
            Some("json") => Self::load_json(path).await,
            Some(ext) => Err(SubalignError::UnsupportedFormat {
                extension: ext.to_string(),
                supported: vec!["yaml".to_string(), "yml".to_string(), "json".to_string()],
            }),
            None => Err(SubalignError::Config {
                field: "config_file".to_string(),
                message: "Config file must have .yaml, .yml, or .json extension".to_string(),
            }),
        }
    }

    /// Save configuration to YAML file
    pub async fn save_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml_content = serde_yaml::to_string(self)
            .map_err(|e| SubalignError::Config {
                field: "config_file".to_string(),
                message: format!("Failed to serialize config to YAML: {}", e),
            })?;

        fs::write(path.as_ref(), yaml_content).await.with_path(path.as_ref().to_path_buf())
    }

    /// Get default config file paths to search
    pub fn default_config_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from(".subalign.yaml"),
            PathBuf::from(".subalign.yml"),
            PathBuf::from(".subalign.json"),
            dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
                .join("subalign").join("config.yaml"),
            dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
                .join(".config").join("subalign.yaml"),
        ]
    }

    /// Try to load configuration from default locations
    pub async fn load_from_default_locations() -> Option<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::load(&path).await {
                    Ok(config) => {
                        log::info!("Loaded configuration from: {}", path.display());
                        return Some(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }
        None
    }

    /// Apply this config file to a ConfigBuilder
    pub fn apply_to_builder(&self, mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
        if let Some(ref model_str) = self.spacy_model {
            let model: SpacyModel = model_str.parse()?;
            builder = builder.spacy_model(model);
        }

        if let Some(ref python) = self.python {
            builder = builder.python(python.clone())?;
        }

        if let Some(analyze) = self.analyze {
            builder = builder.analyze(analyze);
        }

        if let Some(ref output_dir) = self.output_directory {
            builder = builder.output_dir(output_dir.clone());
        }

        Ok(builder)
    }

    /// Apply a specific profile to a ConfigBuilder
    pub fn apply_profile_to_builder(&self, profile_name: &str, builder: ConfigBuilder) -> Result<ConfigBuilder> {
        let profile = self.profile(profile_name)?;

        // First apply base config, then override with profile
        let mut builder = self.apply_to_builder(builder)?;

        if let Some(ref model_str) = profile.spacy_model {
            let model: SpacyModel = model_str.parse()?;
            builder = builder.spacy_model(model);
        }

        if let Some(ref python) = profile.python {
            builder = builder.python(python.clone())?;
        }

        if let Some(analyze) = profile.analyze {
            builder = builder.analyze(analyze);
        }

        Ok(builder)
    }

    /// Fill in the built-in profiles when the file defines none
    pub fn with_builtin_profiles(mut self) -> Self {
        if self.profiles.as_ref().map_or(true, |p| p.is_empty()) {
            self.profiles = Self::default().profiles;
        }
        self
    }

    /// Look up a profile by name
    pub fn profile(&self, profile_name: &str) -> Result<&ProfileConfig> {
        let profiles = self.profiles.as_ref().ok_or_else(|| SubalignError::Config {
            field: "profiles".to_string(),
            message: "No profiles defined".to_string(),
        })?;

        profiles.get(profile_name).ok_or_else(|| SubalignError::Config {
            field: "profile".to_string(),
            message: format!("Profile '{}' not found", profile_name),
        })
    }

    /// List available profiles, sorted by name
    pub fn list_profiles(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles
            .as_ref()
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

async fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).await.with_path(path.to_path_buf())
}
