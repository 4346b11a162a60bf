//! Command-line entry point.
//!
//! # Startup sequence
//!
//! 1. Parse arguments.
//! 2. Load [`AppConfig`] (explicit `--config` file or the platform default)
//!    and apply command-line overrides.
//! 3. Initialise logging at `logging.level` (`RUST_LOG` wins).
//! 4. Create the tokio runtime and install the Ctrl-C handler.
//! 5. Build the transcription provider and, for the full policy, load the
//!    text classifier; both degrade gracefully when unavailable.
//! 6. Run one analysis and print the report (or JSON).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use ai_voice_detector::{
    audio::AudioInput,
    classifier::{BertTextClassifier, TextClassifier},
    config::{AppConfig, AppPaths, FusionPolicy},
    detector::{AnalysisOutcome, Detector},
    transcription::{
        AudioHandle, GladiaClient, JobHandle, JobOptions, JobStatus, TranscriptionError,
        TranscriptionProvider,
    },
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "ai-voice-detector", version, about = "Score how likely a voice recording is synthetic")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyse one audio or video file.
    Analyze(AnalyzeArgs),
    /// Show the settings and model cache locations, or dump the effective settings.
    Config {
        /// Print the effective settings as TOML.
        #[arg(long)]
        print: bool,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Recording to analyse.
    path: PathBuf,
    /// Settings file to use instead of the platform default.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Override `fusion.policy` (`coarse` or `full`).
    #[arg(long)]
    policy: Option<FusionPolicy>,
    /// Skip spectral noise suppression.
    #[arg(long)]
    no_denoise: bool,
    /// Do not load the text classifier.
    #[arg(long)]
    no_classifier: bool,
    /// Print the full result as JSON instead of the summary report.
    #[arg(long)]
    json: bool,
}

// ---------------------------------------------------------------------------
// NoCredentialProvider: stands in for the HTTP client without an API key
// ---------------------------------------------------------------------------

/// Fails every request with [`TranscriptionError::MissingApiKey`], so a
/// missing credential surfaces as a transcription failure (and the
/// audio-only fallback) instead of aborting start-up.
struct NoCredentialProvider;

#[async_trait]
impl TranscriptionProvider for NoCredentialProvider {
    async fn upload(&self, _wav: Vec<u8>, _name: &str) -> Result<AudioHandle, TranscriptionError> {
        Err(TranscriptionError::MissingApiKey)
    }

    async fn start_job(
        &self,
        _audio: &AudioHandle,
        _options: JobOptions,
    ) -> Result<JobHandle, TranscriptionError> {
        Err(TranscriptionError::MissingApiKey)
    }

    async fn job_status(&self, _job: &JobHandle) -> Result<JobStatus, TranscriptionError> {
        Err(TranscriptionError::MissingApiKey)
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(p) => AppConfig::load_from(p).with_context(|| format!("failed to load {}", p.display())),
        None => AppConfig::load().context("failed to load settings"),
    }
}

fn init_logging(config: &AppConfig) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Command::Config { print, config } => {
            let paths = AppPaths::new();
            if print {
                let config = load_config(config.as_deref())?;
                print!("{}", toml::to_string_pretty(&config)?);
            } else {
                println!("settings: {}", config.unwrap_or(paths.settings_file).display());
                println!("models:   {}", paths.models_dir.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Analyze(args) => {
            let mut config = load_config(args.config.as_deref())?;
            if let Some(policy) = args.policy {
                config.fusion.policy = policy;
            }
            if args.no_denoise {
                config.audio.noise_reduction_enabled = false;
            }
            if args.no_classifier {
                config.classifier.enabled = false;
            }
            init_logging(&config);

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to create tokio runtime")?;
            rt.block_on(analyze(args, config))
        }
    }
}

async fn load_classifier(config: &AppConfig) -> Option<Arc<dyn TextClassifier>> {
    if !config.classifier.enabled || config.fusion.policy != FusionPolicy::Full {
        return None;
    }
    let paths = AppPaths::new();
    let cache_dir = match paths.ensure_models_dir() {
        Ok(dir) => dir,
        Err(e) => {
            log::warn!("cannot create {} ({e}); the coarse policy will be used", paths.models_dir.display());
            return None;
        }
    };
    match BertTextClassifier::load(&config.classifier, cache_dir).await {
        Ok(classifier) => {
            log::info!("classifier loaded: {}", config.classifier.model_id);
            Some(Arc::new(classifier))
        }
        Err(e) => {
            log::warn!("could not load classifier ({e}); the coarse policy will be used");
            None
        }
    }
}

async fn analyze(args: AnalyzeArgs, config: AppConfig) -> anyhow::Result<ExitCode> {
    let provider: Arc<dyn TranscriptionProvider> = match GladiaClient::from_config(&config.transcription) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::warn!("{e}; transcription is unavailable");
            Arc::new(NoCredentialProvider)
        }
    };
    let classifier = load_classifier(&config).await;
    let detector = Detector::new(config, provider, classifier).context("invalid settings")?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, cancelling analysis");
            interrupt.cancel();
        }
    });

    let outcome = match detector.analyze(AudioInput::from(args.path), &cancel).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("error ({}): {e}", e.kind());
            return Ok(ExitCode::FAILURE);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(ExitCode::SUCCESS);
    }
    match &outcome {
        AnalysisOutcome::NoSpeechDetected => println!("No speech detected."),
        AnalysisOutcome::Partial(result) | AnalysisOutcome::Full(result) => {
            print!("{}", result.summary_report());
            println!();
            println!("Outcome: {}", outcome.kind());
        }
    }
    Ok(ExitCode::SUCCESS)
}
