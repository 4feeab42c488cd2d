use clap::{Arg, Command};
use log::{info, warn};
use std::path::{Path, PathBuf};

use subalign::pipeline::{analyze_video, load_video_blocking, process_video, write_video_json};
use subalign::{dependencies, Config, ConfigBuilder, ConfigFile, Corpus, Result, SpacyModel, SubalignError};
use subalign::{AlignmentStatus, AnalyzerHandle, ProcessedVideo, ProgressOperation};

fn build_cli() -> Command {
    Command::new("subalign")
        .about("Reconstructs per-word timing from subtitle tracks and aligns linguistic annotations onto the words")
        .version("0.1.0")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("PATH")
                .help("A .vtt file or a directory tree of .vtt files")
                .required(false) // Will be validated in parse_config
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Directory for per-video JSON output (optional)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .help("spaCy English pipeline to use")
                .value_parser(["sm", "md", "lg", "trf"]),
        )
        .arg(
            Arg::new("python")
                .long("python")
                .value_name("PATH")
                .help("Python interpreter with spaCy installed"),
        )
        .arg(
            Arg::new("no-analyzer")
                .long("no-analyzer")
                .help("Skip linguistic analysis and produce timing only")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (YAML/JSON)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("profile")
                .short('p')
                .long("profile")
                .value_name("NAME")
                .help("Configuration profile to use (from config file)"),
        )
        .arg(
            Arg::new("no-progress")
                .long("no-progress")
                .help("Disable progress indicators")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-profiles")
                .long("list-profiles")
                .help("List available configuration profiles")
                .action(clap::ArgAction::SetTrue),
        )
}

async fn load_config_file(matches: &clap::ArgMatches) -> Result<Option<ConfigFile>> {
    match matches.get_one::<PathBuf>("config") {
        Some(config_path) => Ok(Some(ConfigFile::load(config_path).await?)),
        None => Ok(ConfigFile::load_from_default_locations().await),
    }
}

fn print_profiles(config_file: &ConfigFile) {
    println!("Available configuration profiles:");
    for profile_name in config_file.list_profiles() {
        let description = config_file
            .profile(&profile_name)
            .ok()
            .and_then(|p| p.description.as_deref())
            .unwrap_or("No description");
        println!("  {}: {}", profile_name, description);
    }
}

fn parse_config(matches: &clap::ArgMatches, config_file: Option<ConfigFile>) -> Result<Config> {
    let input_path = matches
        .get_one::<PathBuf>("input")
        .ok_or_else(|| subalign::error::config_error("input", "Input path is required"))?
        .clone();

    let mut builder = ConfigBuilder::new().input_path(input_path);

    let config_file = config_file.map(ConfigFile::with_builtin_profiles);
    if let Some(ref cf) = config_file {
        if let Some(profile_name) = matches.get_one::<String>("profile") {
            builder = cf.apply_profile_to_builder(profile_name, builder)?;
        } else {
            builder = cf.apply_to_builder(builder)?;
        }
    } else if let Some(profile_name) = matches.get_one::<String>("profile") {
        // built-in profiles still apply without a file on disk
        builder = ConfigFile::default().apply_profile_to_builder(profile_name, builder)?;
    }

    // Command line flags override the config file
    if let Some(output) = matches.get_one::<PathBuf>("output") {
        builder = builder.output_dir(output.clone());
    }

    if let Some(model_str) = matches.get_one::<String>("model") {
        let model: SpacyModel = model_str.parse()?;
        builder = builder.spacy_model(model);
    }

    if let Some(python) = matches.get_one::<String>("python") {
        builder = builder.python(python.clone())?;
    }

    if matches.get_flag("no-analyzer") {
        builder = builder.analyze(false);
    }

    builder.build()
}

fn output_path(output_dir: &Path, key: &str) -> PathBuf {
    output_dir.join(format!("{}.json", key))
}

async fn finish_video(processed: &ProcessedVideo, key: &str, config: &Config) -> Result<()> {
    match &processed.status {
        AlignmentStatus::Aligned { tokens, compound_words } => info!(
            "{}: aligned {} words from {} tokens ({} compound)",
            key,
            processed.video.len(),
            tokens,
            compound_words
        ),
        AlignmentStatus::Skipped { reason } => info!("{}: timing only ({})", key, reason),
        AlignmentStatus::Failed { stage, reason } => warn!("{}: {:?} stage failed: {}", key, stage, reason),
    }

    if let Some(ref output_dir) = config.output_dir {
        write_video_json(processed, &output_path(output_dir, key)).await?;
    }
    Ok(())
}

/// Process every video below `config.input_path`, returning how many failed
async fn run_corpus(config: &Config, analyzer: &AnalyzerHandle, progress: &ProgressOperation) -> Result<usize> {
    // walkdir and the loader are blocking
    let root = config.input_path.clone();
    let corpus = progress
        .with_spinner(
            "Reading subtitle files",
            tokio::task::spawn_blocking(move || Corpus::build(&root, load_video_blocking)),
        )
        .await
        .map_err(|e| SubalignError::Processing {
            message: format!("Corpus loading task failed: {}", e),
        })??;
    info!("Found {} videos under {}", corpus.len(), corpus.root().display());

    let entries = corpus.into_entries();
    let bar = progress.bar(entries.len() as u64, "Aligning videos");
    let mut failed = 0;

    for (key, video) in entries {
        let processed = analyze_video(video, analyzer).await;
        if processed.is_failed() {
            failed += 1;
        }
        finish_video(&processed, &key, config).await?;
        if let Some(ref pb) = bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = bar {
        pb.finish_with_message("✓ Aligning videos");
    }
    Ok(failed)
}

async fn run_single(config: &Config, analyzer: &AnalyzerHandle, progress: &ProgressOperation) -> Result<usize> {
    let processed = progress
        .with_spinner("Aligning video", process_video(&config.input_path, analyzer))
        .await?;
    let key = processed.video.id.clone();
    finish_video(&processed, &key, config).await?;
    Ok(usize::from(processed.is_failed()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = build_cli();
    let matches = app.get_matches();

    // Initialize logging
    if matches.get_flag("verbose") {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let config_file = load_config_file(&matches).await?;

    if matches.get_flag("list-profiles") {
        print_profiles(&config_file.map(ConfigFile::with_builtin_profiles).unwrap_or_default());
        return Ok(());
    }

    let config = parse_config(&matches, config_file.clone())?;
    let show_progress = !matches.get_flag("no-progress")
        && config_file.as_ref().and_then(|cf| cf.show_progress).unwrap_or(true);
    let progress = ProgressOperation::new(show_progress);

    info!("Starting subalign with config: {:?}", config);

    let analyzer = progress
        .with_spinner("Probing analyzer", dependencies::probe_analyzer(&config))
        .await;
    info!("Analyzer: {}", analyzer.describe());

    let failed = if config.input_path.is_dir() {
        run_corpus(&config, &analyzer, &progress).await?
    } else {
        run_single(&config, &analyzer, &progress).await?
    };

    if failed > 0 {
        warn!("{} video(s) failed alignment", failed);
        std::process::exit(1);
    }

    info!("✓ Done");
    Ok(())
}
