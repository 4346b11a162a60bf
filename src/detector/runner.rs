//! Detector: drives one recording through the whole pipeline.
//!
//! # Flow
//!
//! ```text
//! AudioInput
//!   └─▶ spawn_blocking(ingest → denoise → VAD)
//!         ├─ empty after VAD            → NoSpeechDetected
//!         └─▶ join!
//!               ├─ spawn_blocking(feature extraction)   [gated signal]
//!               └─ Transcriber::transcribe              [canonical WAV]
//!                     ├─ Err + fallback → coarse, audio only  → Partial
//!                     ├─ blank          → coarse, audio only  → Partial
//!                     └─ Ok  → linguistic metrics + keyword score
//!                               └─ full policy: heuristics + spawn_blocking(classifier)
//!                                     ├─ Ok  → five-signal blend  → Full
//!                                     └─ Err → coarse blend       → Partial
//! ```
//!
//! DSP and model inference run on the blocking pool; only the transcription
//! round-trip suspends on the async runtime.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::audio::{encode_wav, AudioInput, AudioIngestor, NoiseSuppressor, Signal, VoiceActivityGate};
use crate::classifier::{ClassifierOutput, TextClassifier};
use crate::config::{AppConfig, ConfigError, FusionPolicy};
use crate::features::AcousticFeatureExtractor;
use crate::fusion::{
    audio_score, keyword_score, CoarseSignals, DetectionResult, FullSignals, ScoreFusionEngine,
    TextStatus,
};
use crate::linguistic::{clean_transcript, LinguisticAnalyzer, TextHeuristics};
use crate::transcription::{Transcriber, TranscriptionError, TranscriptionProvider};

use super::error::{DetectionError, OutcomeKind};

// ---------------------------------------------------------------------------
// AnalysisOutcome
// ---------------------------------------------------------------------------

/// A completed analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "result", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// Nothing survived voice-activity gating.
    NoSpeechDetected,
    /// Some transcript-derived signals are missing.
    Partial(DetectionResult),
    /// Every signal of the configured policy contributed.
    Full(DetectionResult),
}

impl AnalysisOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::NoSpeechDetected => OutcomeKind::NoSpeechDetected,
            Self::Partial(_) => OutcomeKind::SucceededPartial,
            Self::Full(_) => OutcomeKind::SucceededFull,
        }
    }

    pub fn result(&self) -> Option<&DetectionResult> {
        match self {
            Self::NoSpeechDetected => None,
            Self::Partial(r) | Self::Full(r) => Some(r),
        }
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Owns every stage; one instance can serve concurrent analyses.
pub struct Detector {
    config: AppConfig,
    ingestor: AudioIngestor,
    denoiser: Option<Arc<NoiseSuppressor>>,
    gate: VoiceActivityGate,
    extractor: Arc<AcousticFeatureExtractor>,
    transcriber: Transcriber,
    analyzer: LinguisticAnalyzer,
    heuristics: TextHeuristics,
    classifier: Option<Arc<dyn TextClassifier>>,
    engine: ScoreFusionEngine,
}

impl Detector {
    /// Build every stage from `config`, which is validated first.
    ///
    /// Without a `classifier` the full policy always degrades to the coarse
    /// blend.
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn TranscriptionProvider>,
        classifier: Option<Arc<dyn TextClassifier>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let denoiser = config
            .audio
            .noise_reduction_enabled
            .then(|| Arc::new(NoiseSuppressor::new(&config.denoise)));
        Ok(Self {
            ingestor: AudioIngestor::new(&config.audio),
            denoiser,
            gate: VoiceActivityGate::from_config(&config.audio),
            extractor: Arc::new(AcousticFeatureExtractor::new(&config.features)),
            transcriber: Transcriber::new(provider, &config.transcription),
            analyzer: LinguisticAnalyzer::new(&config.linguistic),
            heuristics: TextHeuristics::new(config.linguistic.variance_k),
            classifier,
            engine: ScoreFusionEngine::new(&config.fusion),
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Analyse one recording.
    ///
    /// `cancel` aborts the transcription round-trip; a cancellation raised
    /// while decoding takes effect once decoding finishes.
    pub async fn analyze(
        &self,
        input: AudioInput,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome, DetectionError> {
        let source = input.describe();
        log::info!("detector: analysing {source}");

        let (canonical, gated) = self.preprocess(input).await?;
        if cancel.is_cancelled() {
            return Err(DetectionError::Cancelled);
        }
        if gated.is_empty() {
            log::info!("detector: no speech detected in {source}");
            return Ok(AnalysisOutcome::NoSpeechDetected);
        }
        log::debug!(
            "detector: {:.2}s canonical, {:.2}s speech",
            canonical.duration_secs(),
            gated.duration_secs()
        );

        let wav = encode_wav(&canonical)?;
        drop(canonical);
        let extractor = Arc::clone(&self.extractor);
        let features_task = tokio::task::spawn_blocking(move || extractor.extract(&gated));
        let (features, transcript) =
            tokio::join!(features_task, self.transcriber.transcribe(wav, cancel));
        let features = features?;

        let audio = audio_score(&features, self.config.fusion.mfcc_variance_scale);
        log::debug!("detector: audio_score = {audio:.3}");

        let transcript = match transcript {
            Ok(t) => t,
            Err(TranscriptionError::Cancelled) => return Err(DetectionError::Cancelled),
            Err(e) if self.config.fusion.fallback_to_coarse_on_transcription_error => {
                log::warn!("detector: {e}; reporting audio-only result");
                let fused = self.engine.fuse_coarse(CoarseSignals { audio, text: 0.0 });
                let status = TextStatus::TranscriptionUnavailable {
                    reason: e.to_string(),
                };
                return Ok(AnalysisOutcome::Partial(DetectionResult::new(fused, status)));
            }
            Err(e) => return Err(e.into()),
        };

        // Timestamps and speaker labels alone still count as blank.
        let cleaned = clean_transcript(&transcript.text);
        if cleaned.is_empty() {
            log::warn!("detector: empty transcript; reporting audio-only result");
            let fused = self.engine.fuse_coarse(CoarseSignals { audio, text: 0.0 });
            let result =
                DetectionResult::new(fused, TextStatus::EmptyTranscript).with_transcript(&transcript);
            return Ok(AnalysisOutcome::Partial(result));
        }

        let linguistic = self.analyzer.analyze(&transcript.text);
        let coarse = CoarseSignals {
            audio,
            text: keyword_score(&cleaned, &self.config.fusion.suspicious_keywords),
        };

        let (full, status) = match self.engine.policy() {
            FusionPolicy::Coarse => (None, TextStatus::Analyzed),
            FusionPolicy::Full => match self.classify(&cleaned).await {
                Some(output) => (
                    Some(FullSignals::new(self.heuristics.score(&cleaned), output)),
                    TextStatus::Analyzed,
                ),
                None => (None, TextStatus::ClassifierUnavailable),
            },
        };

        let fused = self.engine.fuse(coarse, full);
        let result = DetectionResult::new(fused, status)
            .with_transcript(&transcript)
            .with_linguistic(linguistic, self.engine.thresholds());
        log::info!(
            "detector: {source} scored {:.3} ({} policy)",
            result.final_confidence(),
            result.policy()
        );

        Ok(match result.text_status() {
            TextStatus::Analyzed => AnalysisOutcome::Full(result),
            _ => AnalysisOutcome::Partial(result),
        })
    }

    /// Decode to the canonical signal, then denoise and gate a copy of it.
    async fn preprocess(&self, input: AudioInput) -> Result<(Signal, Signal), DetectionError> {
        let ingestor = self.ingestor.clone();
        let denoiser = self.denoiser.clone();
        let gate = self.gate.clone();

        tokio::task::spawn_blocking(move || {
            let canonical = ingestor.ingest(input)?;
            let gated = match &denoiser {
                Some(d) => gate.apply(&d.reduce(&canonical)),
                None => gate.apply(&canonical),
            };
            Ok::<_, DetectionError>((canonical, gated))
        })
        .await?
    }

    /// `None` when no classifier is loaded or inference fails.
    async fn classify(&self, text: &str) -> Option<ClassifierOutput> {
        let Some(classifier) = self.classifier.clone() else {
            log::warn!("detector: no classifier loaded; using coarse policy");
            return None;
        };
        let text = text.to_string();
        match tokio::task::spawn_blocking(move || classifier.classify(&text)).await {
            Ok(Ok(output)) => {
                log::debug!(
                    "detector: classifier ai={:.3} naturalness={:.3}",
                    output.ai_probability,
                    output.naturalness_score
                );
                Some(output)
            }
            Ok(Err(e)) => {
                log::warn!("detector: {e}; using coarse policy");
                None
            }
            Err(e) => {
                log::warn!("detector: classifier task failed ({e}); using coarse policy");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MockClassifier;
    use crate::transcription::{AudioHandle, JobHandle, JobOptions, JobStatus, Transcript};
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Completes immediately with `text`, or never completes when `None`.
    struct ScriptedProvider {
        text: Option<String>,
    }

    #[async_trait]
    impl TranscriptionProvider for ScriptedProvider {
        async fn upload(&self, wav: Vec<u8>, _name: &str) -> Result<AudioHandle, TranscriptionError> {
            assert_eq!(&wav[..4], b"RIFF");
            Ok(AudioHandle {
                audio_url: "test://audio".into(),
            })
        }

        async fn start_job(
            &self,
            _audio: &AudioHandle,
            _options: JobOptions,
        ) -> Result<JobHandle, TranscriptionError> {
            Ok(JobHandle {
                id: "job".into(),
                result_url: None,
            })
        }

        async fn job_status(&self, _job: &JobHandle) -> Result<JobStatus, TranscriptionError> {
            Ok(match &self.text {
                Some(t) => JobStatus::Completed(Transcript::new(t.clone())),
                None => JobStatus::Pending,
            })
        }
    }

    fn config(policy: FusionPolicy) -> AppConfig {
        let mut config = AppConfig::default();
        config.fusion.policy = policy;
        config.audio.noise_reduction_enabled = false;
        config.transcription.poll_interval_ms = 1;
        config.transcription.max_attempts = 3;
        config
    }

    fn detector(
        config: AppConfig,
        text: Option<&str>,
        classifier: Option<MockClassifier>,
    ) -> Detector {
        let provider = Arc::new(ScriptedProvider {
            text: text.map(str::to_string),
        });
        let classifier = classifier.map(|c| Arc::new(c) as Arc<dyn TextClassifier>);
        Detector::new(config, provider, classifier).unwrap()
    }

    fn noise(seconds: usize) -> AudioInput {
        let mut rng = StdRng::seed_from_u64(7);
        AudioInput::Samples {
            samples: (0..16_000 * seconds).map(|_| rng.gen_range(-0.5..0.5)).collect(),
            sample_rate: 16_000,
        }
    }

    #[tokio::test]
    async fn silence_reports_no_speech() {
        let d = detector(config(FusionPolicy::Full), Some("unused"), None);
        let input = AudioInput::Samples {
            samples: vec![0.0; 32_000],
            sample_rate: 16_000,
        };
        let outcome = d.analyze(input, &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.kind(), OutcomeKind::NoSpeechDetected);
        assert!(outcome.result().is_none());
    }

    #[tokio::test]
    async fn empty_input_cannot_decode() {
        let d = detector(config(FusionPolicy::Full), None, None);
        let input = AudioInput::Samples {
            samples: Vec::new(),
            sample_rate: 16_000,
        };
        let err = d.analyze(input, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), OutcomeKind::CannotDecode);
    }

    #[tokio::test]
    async fn full_policy_with_classifier_is_full() {
        let d = detector(
            config(FusionPolicy::Full),
            Some("The cat sat on the mat. The dog slept by the door."),
            Some(MockClassifier::ok(0.9, 0.4)),
        );
        let outcome = d.analyze(noise(1), &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.kind(), OutcomeKind::SucceededFull);
        let result = outcome.result().unwrap();
        assert_eq!(result.policy(), FusionPolicy::Full);
        assert_eq!(result.score("classifier_score"), Some(0.9));
        assert_eq!(result.score("perplexity_score"), Some(0.4));
        assert!(result.score("audio_score").is_some());
        assert_eq!(result.score("text_score"), Some(0.0));
        assert!(result.linguistic().is_some());
        assert_eq!(result.analysis().len(), 9);
    }

    #[tokio::test]
    async fn classifier_failure_degrades_to_coarse() {
        let d = detector(
            config(FusionPolicy::Full),
            Some("Indeed, it works."),
            Some(MockClassifier::err("broken weights")),
        );
        let outcome = d.analyze(noise(1), &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.kind(), OutcomeKind::SucceededPartial);
        let result = outcome.result().unwrap();
        assert_eq!(result.policy(), FusionPolicy::Coarse);
        assert_eq!(result.text_status(), &TextStatus::ClassifierUnavailable);
        assert_eq!(result.score("text_score"), Some(1.0));
    }

    #[tokio::test]
    async fn coarse_policy_needs_no_classifier() {
        let d = detector(config(FusionPolicy::Coarse), Some("Furthermore, yes."), None);
        let outcome = d.analyze(noise(1), &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.kind(), OutcomeKind::SucceededFull);
        assert_eq!(outcome.result().unwrap().policy(), FusionPolicy::Coarse);
    }

    #[tokio::test]
    async fn blank_transcript_is_partial() {
        let d = detector(config(FusionPolicy::Full), Some("   "), None);
        let outcome = d.analyze(noise(1), &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.kind(), OutcomeKind::SucceededPartial);
        let result = outcome.result().unwrap();
        assert_eq!(result.text_status(), &TextStatus::EmptyTranscript);
        assert_eq!(result.score("text_score"), Some(0.0));
        assert!(result.linguistic().is_none());
    }

    #[tokio::test]
    async fn labels_only_transcript_is_empty() {
        let d = detector(
            config(FusionPolicy::Full),
            Some("[00:01] Speaker 1:  [00:04] Speaker 2:"),
            Some(MockClassifier::err("must not be called")),
        );
        let outcome = d.analyze(noise(1), &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.kind(), OutcomeKind::SucceededPartial);
        let result = outcome.result().unwrap();
        assert_eq!(result.text_status(), &TextStatus::EmptyTranscript);
        assert_eq!(result.policy(), FusionPolicy::Coarse);
        assert!(result.linguistic().is_none());
    }

    #[tokio::test]
    async fn polling_timeout_falls_back_or_fails() {
        let d = detector(config(FusionPolicy::Full), None, None);
        let outcome = d.analyze(noise(1), &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.kind(), OutcomeKind::SucceededPartial);
        assert!(matches!(
            outcome.result().unwrap().text_status(),
            TextStatus::TranscriptionUnavailable { .. }
        ));

        let mut strict = config(FusionPolicy::Full);
        strict.fusion.fallback_to_coarse_on_transcription_error = false;
        let err = detector(strict, None, None)
            .analyze(noise(1), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), OutcomeKind::TranscriptionTimeout);
    }

    #[tokio::test]
    async fn cancelled_token_aborts() {
        let d = detector(config(FusionPolicy::Full), None, None);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = d.analyze(noise(1), &cancel).await.unwrap_err();
        assert_eq!(err.kind(), OutcomeKind::Cancelled);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = AppConfig::default();
        config.features.mfcc_count = 0;
        let provider = Arc::new(ScriptedProvider { text: None });
        assert!(Detector::new(config, provider, None).is_err());
    }
}
