//! End-to-end scenarios through the public API, with a scripted
//! transcription provider and classifier standing in for the network and the
//! model.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;

use ai_voice_detector::audio::{encode_wav, AudioInput, Signal, VoiceActivityGate};
use ai_voice_detector::classifier::{ClassifierError, TextClassifier};
use ai_voice_detector::config::{AppConfig, FeatureConfig, FullWeights, FusionConfig, FusionPolicy, LinguisticConfig};
use ai_voice_detector::detector::{Detector, OutcomeKind};
use ai_voice_detector::features::{AcousticFeatureExtractor, AcousticFeatures, FeatureBundle};
use ai_voice_detector::fusion::{
    audio_score, keyword_score, CoarseSignals, FullSignals, ScoreFusionEngine, TextStatus,
};
use ai_voice_detector::linguistic::{LinguisticAnalyzer, TextHeuristics};
use ai_voice_detector::transcription::{
    AudioHandle, JobHandle, JobOptions, JobStatus, Transcript, TranscriptionError,
    TranscriptionProvider,
};

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Completes with `text` after `pending_for` checks; never completes when
/// `text` is `None`.
struct ScriptedProvider {
    text: Option<String>,
    pending_for: u32,
    checks: AtomicU32,
}

impl ScriptedProvider {
    fn completing(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: Some(text.to_string()),
            pending_for: 2,
            checks: AtomicU32::new(0),
        })
    }

    fn stuck() -> Arc<Self> {
        Arc::new(Self {
            text: None,
            pending_for: u32::MAX,
            checks: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl TranscriptionProvider for ScriptedProvider {
    async fn upload(&self, wav: Vec<u8>, name: &str) -> Result<AudioHandle, TranscriptionError> {
        assert!(name.ends_with(".wav"));
        assert_eq!(&wav[..4], b"RIFF");
        Ok(AudioHandle {
            audio_url: "scripted://audio".into(),
        })
    }

    async fn start_job(
        &self,
        _audio: &AudioHandle,
        _options: JobOptions,
    ) -> Result<JobHandle, TranscriptionError> {
        Ok(JobHandle {
            id: "scripted-job".into(),
            result_url: None,
        })
    }

    async fn job_status(&self, _job: &JobHandle) -> Result<JobStatus, TranscriptionError> {
        let seen = self.checks.fetch_add(1, Ordering::SeqCst);
        match &self.text {
            Some(text) if seen >= self.pending_for => {
                Ok(JobStatus::Completed(Transcript::new(text.clone())))
            }
            _ => Ok(JobStatus::Pending),
        }
    }
}

struct FixedClassifier {
    ai: f32,
    natural: f32,
}

impl TextClassifier for FixedClassifier {
    fn ai_probability(&self, _text: &str) -> Result<f32, ClassifierError> {
        Ok(self.ai)
    }

    fn naturalness(&self, _text: &str) -> Result<f32, ClassifierError> {
        Ok(self.natural)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_config(policy: FusionPolicy) -> AppConfig {
    let mut config = AppConfig::default();
    config.fusion.policy = policy;
    config.audio.noise_reduction_enabled = false;
    config.transcription.poll_interval_ms = 1;
    config.transcription.max_attempts = 5;
    config
}

fn noise(seconds: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..16_000 * seconds)
        .map(|_| rng.gen_range(-0.5f32..0.5))
        .collect()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn silence_is_no_speech_not_an_error() {
    let detector = Detector::new(
        test_config(FusionPolicy::Full),
        ScriptedProvider::completing("never asked"),
        None,
    )
    .unwrap();
    let outcome = detector
        .analyze(
            AudioInput::samples(vec![0.0; 48_000], 16_000),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.kind(), OutcomeKind::NoSpeechDetected);
}

#[test]
fn five_seconds_of_noise_yields_aligned_features() {
    let signal = Signal::new(noise(5, 42), 16_000);
    let gated = VoiceActivityGate::new(20.0, 2048, 512).apply(&signal);
    assert!(!gated.is_empty());

    let features = AcousticFeatureExtractor::new(&FeatureConfig::default()).extract(&gated);
    let bundle = features.bundle().expect("noise has features");
    let frames = bundle.frame_count();
    assert!(frames > 0);
    assert_eq!(bundle.mfccs().len(), 13);
    assert!(bundle.mfccs().iter().all(|row| row.len() == frames));
    assert_eq!(bundle.spectral_centroid().len(), frames);
    assert_eq!(bundle.spectral_bandwidth().len(), frames);
    assert_eq!(bundle.spectral_rolloff().len(), frames);
}

#[test]
fn keyword_example_under_coarse_policy() {
    let bundle = FeatureBundle::new(
        vec![vec![-100.0, 100.0], vec![100.0, -100.0]],
        vec![1.0; 2],
        vec![1.0; 2],
        vec![1.0; 2],
    )
    .unwrap();
    assert_eq!(bundle.mfcc_variance(), 10_000.0);

    let config = FusionConfig {
        policy: FusionPolicy::Coarse,
        ..FusionConfig::default()
    };
    let audio = audio_score(&AcousticFeatures::Extracted(bundle), config.mfcc_variance_scale);
    let text = keyword_score(
        "Hello, my name is AI. Furthermore, indeed, I am here.",
        &config.suspicious_keywords,
    );
    assert_eq!(audio, 1.0);
    assert_eq!(text, 2.0);

    let fused = ScoreFusionEngine::new(&config).fuse(CoarseSignals { audio, text }, None);
    assert_eq!(fused.final_confidence, 1.0);
}

#[test]
fn short_transcripts_have_boundary_values() {
    let analyzer = LinguisticAnalyzer::new(&LinguisticConfig::default());
    for text in ["", "A single sentence without an ending", "Only one sentence."] {
        let set = analyzer.analyze(text);
        assert_eq!(set.response_coherence, 1.0, "{text:?}");
        assert_eq!(set.sentence_variance, 0.0, "{text:?}");
    }
}

#[test]
fn repeated_phrase_saturates_repetition() {
    // 20 words: ceil(20 / 10) = 2 repeats of "we are here" suffices.
    let text = "we are here and then we are here again with many other words \
                that are all different from each one";
    assert_eq!(text.split_whitespace().count(), 20);
    assert_eq!(TextHeuristics::new(2.0).score(text).repetition, 1.0);
}

#[test]
fn full_weights_are_conservative() {
    assert!((FullWeights::default().sum() - 1.0).abs() < 1e-6);
    let engine = ScoreFusionEngine::new(&FusionConfig::default());
    assert_eq!(engine.fuse_full(&FullSignals::uniform(0.0)).final_confidence, 0.0);
    assert!((engine.fuse_full(&FullSignals::uniform(1.0)).final_confidence - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn stuck_transcription_times_out_without_fallback() {
    let mut config = test_config(FusionPolicy::Full);
    config.fusion.fallback_to_coarse_on_transcription_error = false;
    let provider = ScriptedProvider::stuck();
    let detector = Detector::new(config, provider.clone(), None).unwrap();

    let err = detector
        .analyze(AudioInput::samples(noise(1, 1), 16_000), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), OutcomeKind::TranscriptionTimeout);
    assert_eq!(provider.checks.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn stuck_transcription_falls_back_to_audio_only() {
    let detector = Detector::new(
        test_config(FusionPolicy::Full),
        ScriptedProvider::stuck(),
        None,
    )
    .unwrap();

    let outcome = detector
        .analyze(AudioInput::samples(noise(1, 2), 16_000), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.kind(), OutcomeKind::SucceededPartial);
    let result = outcome.result().unwrap();
    assert_eq!(result.policy(), FusionPolicy::Coarse);
    assert!(matches!(
        result.text_status(),
        TextStatus::TranscriptionUnavailable { .. }
    ));
    let audio = result.score("audio_score").unwrap();
    assert!((result.final_confidence() - 0.6 * audio).abs() < 1e-6);
}

#[tokio::test]
async fn wav_file_runs_the_full_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("speech.wav");
    std::fs::write(&path, encode_wav(&Signal::new(noise(2, 3), 16_000)).unwrap()).unwrap();

    let classifier: Arc<dyn TextClassifier> = Arc::new(FixedClassifier {
        ai: 0.75,
        natural: 0.25,
    });
    let detector = Detector::new(
        test_config(FusionPolicy::Full),
        ScriptedProvider::completing(
            "[00:01] Speaker 1: I think, um, the weather is nice. Speaker 2: Indeed it is.",
        ),
        Some(classifier),
    )
    .unwrap();

    let outcome = detector
        .analyze(AudioInput::path(&path), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.kind(), OutcomeKind::SucceededFull);

    let result = outcome.result().unwrap();
    assert_eq!(result.policy(), FusionPolicy::Full);
    assert_eq!(result.scores().len(), 7);
    let audio = result.score("audio_score").expect("acoustic score is reported");
    assert!((0.0..=1.0).contains(&audio));
    assert_eq!(result.score("text_score"), Some(1.0));
    assert_eq!(result.score("classifier_score"), Some(0.75));
    assert_eq!(result.score("perplexity_score"), Some(0.25));
    assert!((0.0..=1.0).contains(&result.final_confidence()));
    assert!(result.transcript().contains("Indeed"));
    assert_eq!(result.analysis().len(), 9);
    assert!(result.summary_report().starts_with("AI Voice Detection Report"));

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "full");
    assert_eq!(json["result"]["policy"], "full");
}

#[tokio::test]
async fn unsupported_extension_cannot_decode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"not audio").unwrap();

    let detector = Detector::new(
        test_config(FusionPolicy::Coarse),
        ScriptedProvider::completing("unused"),
        None,
    )
    .unwrap();
    let err = detector
        .analyze(AudioInput::path(&path), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), OutcomeKind::CannotDecode);
}
