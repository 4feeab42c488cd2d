use crate::analyzer::{AnalyzerHandle, SpacyAnalyzer};
use crate::config::{Config, SpacyModel};
use crate::error::{SubalignError, Result};
use log::{info, warn};
use tokio::process::Command;

/// Build the analyzer for this run.
///
/// Any missing piece (Python, spaCy, the model package) yields an
/// `Unavailable` handle rather than an error: videos are then produced with
/// timing only.
pub async fn probe_analyzer(config: &Config) -> AnalyzerHandle {
    if !config.analyze {
        return AnalyzerHandle::unavailable("analysis disabled");
    }

    match validate_dependencies(&config.python, &config.spacy_model).await {
        Ok(()) => AnalyzerHandle::available(SpacyAnalyzer::new(
            config.python.clone(),
            config.spacy_model.clone(),
        )),
        Err(e) => {
            warn!("Analyzer unavailable, producing timing only: {}", e);
            AnalyzerHandle::unavailable(e.to_string())
        }
    }
}

/// Check that Python, spaCy and the requested model are all installed
pub async fn validate_dependencies(python: &str, model: &SpacyModel) -> Result<()> {
    info!("Validating analyzer dependencies...");

    check_python(python).await?;
    check_spacy_model(python, model).await?;

    info!("All dependencies validated successfully");
    Ok(())
}

async fn check_python(python: &str) -> Result<()> {
    let output = Command::new(python)
        .args(["-c", "import sys; print(f'Python {sys.version.split()[0]}')"])
        .output()
        .await
        .map_err(|_| SubalignError::MissingDependency {
            name: "Python".to_string(),
            suggestion: format!("Install Python 3.8+ or point --python at it (tried '{}')", python),
        })?;

    if !output.status.success() {
        return Err(SubalignError::MissingDependency {
            name: "Python".to_string(),
            suggestion: "Python is installed but not working properly".to_string(),
        });
    }

    let version = String::from_utf8_lossy(&output.stdout);
    info!("Python found: {}", version.trim());
    Ok(())
}

async fn check_spacy_model(python: &str, model: &SpacyModel) -> Result<()> {
    let probe = format!(
        "import spacy, importlib.util; \
         assert importlib.util.find_spec('{}') is not None, 'model missing'; \
         print(f'spaCy {{spacy.__version__}}')",
        model.package()
    );

    let output = Command::new(python)
        .args(["-c", &probe])
        .output()
        .await
        .map_err(|_| SubalignError::MissingDependency {
            name: "spaCy".to_string(),
            suggestion: "Install spaCy: pip install spacy".to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let (name, suggestion) = if stderr.contains("No module named 'spacy'") {
            ("spaCy".to_string(), "Install spaCy: pip install spacy".to_string())
        } else {
            (
                model.package().to_string(),
                format!("Download the model: {} -m spacy download {}", python, model.package()),
            )
        };
        return Err(SubalignError::MissingDependency { name, suggestion });
    }

    let version = String::from_utf8_lossy(&output.stdout);
    info!("{} found with {}", model.package(), version.trim());
    Ok(())
}
