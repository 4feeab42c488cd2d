use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::config::SpacyModel;
use crate::error::{analyzer_error, SubalignError};
use crate::resources::text_file;

/// One token of the analyzer's output stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerToken {
    pub text: String,
    /// Character offset into the analyzed text
    pub offset: usize,
    pub pos: String,
    pub dep: String,
    /// Index of the governing token in the same stream
    pub head: usize,
}

/// Tokenizer/parser run over a video's space-joined word text
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Name of the analyzer
    fn name(&self) -> &str;

    /// Tokenize, tag and parse `text`
    async fn analyze(&self, text: &str) -> crate::error::Result<Vec<AnalyzerToken>>;
}

/// The analyzer injected into the pipeline. `Unavailable` keeps videos
/// flowing with timing only.
pub enum AnalyzerHandle {
    Available(Box<dyn Analyzer>),
    Unavailable { reason: String },
}

impl AnalyzerHandle {
    pub fn available(analyzer: impl Analyzer + 'static) -> Self {
        AnalyzerHandle::Available(Box::new(analyzer))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        AnalyzerHandle::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AnalyzerHandle::Available(_))
    }

    pub fn describe(&self) -> String {
        match self {
            AnalyzerHandle::Available(analyzer) => analyzer.name().to_string(),
            AnalyzerHandle::Unavailable { reason } => format!("unavailable ({})", reason),
        }
    }
}

impl std::fmt::Debug for AnalyzerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AnalyzerHandle({})", self.describe())
    }
}

/// spaCy pipeline run in a Python subprocess
#[derive(Debug, Clone)]
pub struct SpacyAnalyzer {
    python: String,
    model: SpacyModel,
    name: String,
}

impl SpacyAnalyzer {
    pub fn new(python: impl Into<String>, model: SpacyModel) -> Self {
        Self {
            python: python.into(),
            name: format!("spacy:{}", model.package()),
            model,
        }
    }
}

#[async_trait]
impl Analyzer for SpacyAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, text: &str) -> crate::error::Result<Vec<AnalyzerToken>> {
        info!("Analyzing {} characters with {}", text.chars().count(), self.name);

        let script = create_spacy_script()?;
        // Long videos do not fit on a command line
        let input = text_file("subalign_text", text)?;
        let output = run_spacy(&self.python, &script, input.path(), self.model.package()).await?;

        let tokens: Vec<AnalyzerToken> = serde_json::from_str(&output)
            .map_err(|e| analyzer_error(format!("Failed to parse analyzer output: {}", e), None))?;

        debug!("{} produced {} tokens", self.name, tokens.len());
        Ok(tokens)
    }
}

/// Create a temporary Python script that dumps spaCy tokens as JSON
fn create_spacy_script() -> Result<NamedTempFile> {
    let script_content = r#"
import sys
import json
import spacy

def analyze(model_name, text_path):
    print(f"Loading model: {model_name}", file=sys.stderr)
    nlp = spacy.load(model_name)
    with open(text_path, encoding="utf-8") as f:
        text = f.read()
    doc = nlp(text)
    return [
        {
            "text": token.text,
            "offset": token.idx,
            "pos": token.pos_,
            "dep": token.dep_,
            "head": token.head.i,
        }
        for token in doc
    ]

if __name__ == "__main__":
    if len(sys.argv) != 3:
        print("Usage: python script.py <model> <text_path>", file=sys.stderr)
        sys.exit(1)
    tokens = analyze(sys.argv[1], sys.argv[2])
    print(f"Analysis complete: {len(tokens)} tokens", file=sys.stderr)
    print(json.dumps(tokens))
"#;

    let mut temp_file = NamedTempFile::new().context("Failed to create temporary Python script")?;

    temp_file
        .write_all(script_content.as_bytes())
        .context("Failed to write Python script")?;

    temp_file.flush().context("Failed to flush Python script")?;

    Ok(temp_file)
}

async fn run_spacy(
    python: &str,
    script: &NamedTempFile,
    text_path: &std::path::Path,
    model: &str,
) -> std::result::Result<String, SubalignError> {
    debug!(
        "Running spaCy: python={}, script={:?}, text={:?}, model={}",
        python,
        script.path(),
        text_path,
        model
    );

    let mut child = Command::new(python)
        .args([
            script.path().to_str().context("Invalid script path")?,
            model,
            text_path.to_str().context("Invalid text path")?,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn {}. Make sure Python 3 and spaCy are installed.", python))?;

    let stdout = child.stdout.take().context("Failed to get stdout")?;
    let stderr = child.stderr.take().context("Failed to get stderr")?;

    // Drain both pipes concurrently so a chatty stderr cannot block stdout
    let read_all = |pipe: Box<dyn tokio::io::AsyncRead + Unpin + Send>| async move {
        let mut reader = BufReader::new(pipe);
        let mut output = String::new();
        let mut line = String::new();
        while reader.read_line(&mut line).await? > 0 {
            output.push_str(&line);
            line.clear();
        }
        Ok::<_, std::io::Error>(output)
    };
    let (output, error_output) = tokio::try_join!(read_all(Box::new(stdout)), read_all(Box::new(stderr)))
        .context("Failed to read analyzer output")?;

    let status = child.wait().await.context("Failed to wait for Python process")?;

    if !status.success() {
        return Err(analyzer_error(
            format!("spaCy analysis exited with {}", status),
            Some(error_output),
        ));
    }

    if !error_output.is_empty() {
        debug!("spaCy stderr output: {}", error_output.trim());
    }

    if output.trim().is_empty() {
        warn!("spaCy produced no output");
    }

    Ok(output)
}
