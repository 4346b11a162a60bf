//! BERT-family sequence classifier on candle.
//!
//! The checkpoint layout is the usual `*ForSequenceClassification` one:
//! an encoder under `bert.`, a pooler (`bert.pooler.dense`, tanh) over the
//! `[CLS]` state and a linear `classifier` head.  Class probabilities are the
//! softmax of the head's logits.  A bare encoder checkpoint (no `classifier.*`
//! tensors, e.g. `bert-base-uncased`) still loads, with a zero head.
//!
//! Model files come either from a local directory (when `model_id` is an
//! existing path) or from the Hugging Face hub, cached under the app's
//! models directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use candle_core::{Device, IndexOp, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};

use crate::config::ClassifierConfig;

use super::{ClassifierError, TextClassifier};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PYTORCH_FILE: &str = "pytorch_model.bin";

// ---------------------------------------------------------------------------
// ModelFiles
// ---------------------------------------------------------------------------

/// Resolved on-disk locations of a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelFiles {
    /// Files inside a local checkpoint directory.
    ///
    /// `model.safetensors` is preferred over `pytorch_model.bin`.
    pub fn from_dir(dir: &Path) -> Result<Self, ClassifierError> {
        let pick = |name: &str| {
            let path = dir.join(name);
            path.is_file().then_some(path)
        };
        let missing = |name: &str| {
            ClassifierError::Load(format!("{} has no {name}", dir.display()))
        };

        Ok(Self {
            config: pick(CONFIG_FILE).ok_or_else(|| missing(CONFIG_FILE))?,
            tokenizer: pick(TOKENIZER_FILE).ok_or_else(|| missing(TOKENIZER_FILE))?,
            weights: pick(SAFETENSORS_FILE)
                .or_else(|| pick(PYTORCH_FILE))
                .ok_or_else(|| missing(SAFETENSORS_FILE))?,
        })
    }

    /// Download (or reuse from cache) the checkpoint files from the hub.
    pub async fn fetch(config: &ClassifierConfig, cache_dir: &Path) -> Result<Self, ClassifierError> {
        use hf_hub::api::tokio::ApiBuilder;
        use hf_hub::{Repo, RepoType};

        let load_err = |what: &str, e: hf_hub::api::tokio::ApiError| {
            ClassifierError::Load(format!("{what} from {}: {e}", config.model_id))
        };

        let api = ApiBuilder::new()
            .with_cache_dir(cache_dir.to_path_buf())
            .with_token(std::env::var("HF_TOKEN").ok())
            .with_progress(false)
            .build()
            .map_err(|e| ClassifierError::Load(format!("hub client: {e}")))?;
        let repo = api.repo(Repo::with_revision(
            config.model_id.clone(),
            RepoType::Model,
            config.revision.clone(),
        ));

        log::info!("classifier: fetching {}@{}", config.model_id, config.revision);
        let config_path = repo
            .get(CONFIG_FILE)
            .await
            .map_err(|e| load_err(CONFIG_FILE, e))?;
        let tokenizer = repo
            .get(TOKENIZER_FILE)
            .await
            .map_err(|e| load_err(TOKENIZER_FILE, e))?;
        let weights = match repo.get(SAFETENSORS_FILE).await {
            Ok(path) => path,
            Err(_) => repo
                .get(PYTORCH_FILE)
                .await
                .map_err(|e| load_err("model weights", e))?,
        };

        Ok(Self {
            config: config_path,
            tokenizer,
            weights,
        })
    }
}

/// The parts of `config.json` candle's `BertConfig` does not expose.
#[derive(Debug, Deserialize)]
struct HeadConfig {
    hidden_size: usize,
    #[serde(default)]
    num_labels: Option<usize>,
    #[serde(default)]
    id2label: Option<HashMap<String, String>>,
}

impl HeadConfig {
    fn label_count(&self) -> usize {
        self.id2label
            .as_ref()
            .map(HashMap::len)
            .or(self.num_labels)
            .filter(|&n| n > 0)
            .unwrap_or(2)
    }
}

// ---------------------------------------------------------------------------
// BertTextClassifier
// ---------------------------------------------------------------------------

/// Candle BERT encoder plus a sequence-classification head.
pub struct BertTextClassifier {
    model: BertModel,
    pooler: Linear,
    head: Linear,
    tokenizer: Tokenizer,
    device: Device,
    num_labels: usize,
    ai_label: usize,
    naturalness_label: usize,
}

impl std::fmt::Debug for BertTextClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertTextClassifier")
            .field("device", &self.device)
            .field("num_labels", &self.num_labels)
            .field("ai_label", &self.ai_label)
            .field("naturalness_label", &self.naturalness_label)
            .finish_non_exhaustive()
    }
}

impl BertTextClassifier {
    /// Resolve the checkpoint named by `config.model_id` and load it.
    pub async fn load(config: &ClassifierConfig, cache_dir: &Path) -> Result<Self, ClassifierError> {
        let local = Path::new(&config.model_id);
        let files = if local.is_dir() {
            ModelFiles::from_dir(local)?
        } else {
            ModelFiles::fetch(config, cache_dir).await?
        };
        let config = config.clone();
        tokio::task::spawn_blocking(move || Self::from_files(&files, &config))
            .await
            .map_err(|e| ClassifierError::Load(format!("loader task failed: {e}")))?
    }

    /// Load from already-resolved files.  Blocking: reads and maps the weights.
    pub fn from_files(files: &ModelFiles, config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let load = |e: &dyn std::fmt::Display| ClassifierError::Load(e.to_string());

        let device = if config.use_gpu {
            Device::cuda_if_available(0).map_err(|e| load(&e))?
        } else {
            Device::Cpu
        };

        let raw = std::fs::read_to_string(&files.config).map_err(|e| load(&e))?;
        let bert_config: BertConfig = serde_json::from_str(&raw).map_err(|e| load(&e))?;
        let head_config: HeadConfig = serde_json::from_str(&raw).map_err(|e| load(&e))?;
        let num_labels = head_config.label_count();

        for (name, label) in [("ai_label", config.ai_label), ("naturalness_label", config.naturalness_label)] {
            if label >= num_labels {
                return Err(ClassifierError::Load(format!(
                    "{name} = {label} but the checkpoint has {num_labels} labels"
                )));
            }
        }

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer).map_err(|e| load(&e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_tokens,
                ..Default::default()
            }))
            .map_err(|e| load(&e))?;
        tokenizer.with_padding(None);

        let vb = if files.weights.extension().is_some_and(|ext| ext == "bin") {
            VarBuilder::from_pth(&files.weights, DTYPE, &device).map_err(|e| load(&e))?
        } else {
            // SAFETY: the weights file is not modified while mapped.
            unsafe { VarBuilder::from_mmaped_safetensors(&[&files.weights], DTYPE, &device) }
                .map_err(|e| load(&e))?
        };

        // Encoder tensors are either prefixed with `bert.` or at the root.
        let encoder_vb = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            vb.pp("bert")
        } else {
            vb.clone()
        };
        let model = BertModel::load(encoder_vb.clone(), &bert_config).map_err(|e| load(&e))?;
        let hidden = head_config.hidden_size;
        let pooler = candle_nn::linear(hidden, hidden, encoder_vb.pp("pooler").pp("dense"))
            .map_err(|e| load(&e))?;
        let head = if vb.contains_tensor("classifier.weight") {
            candle_nn::linear(hidden, num_labels, vb.pp("classifier")).map_err(|e| load(&e))?
        } else {
            log::warn!(
                "classifier: {} has no classification head; every label scores 1/{num_labels}",
                config.model_id
            );
            untrained_head(hidden, num_labels, &device).map_err(|e| load(&e))?
        };

        log::info!(
            "classifier: loaded ({num_labels} labels, max {} tokens, {:?})",
            config.max_tokens,
            device
        );
        Ok(Self {
            model,
            pooler,
            head,
            tokenizer,
            device,
            num_labels,
            ai_label: config.ai_label,
            naturalness_label: config.naturalness_label,
        })
    }

    /// Softmax class probabilities for `text`.  One forward pass.
    pub fn probabilities(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ClassifierError::Tokenize(e.to_string()))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self.model.forward(&input_ids, &type_ids, Some(&mask))?;
        let cls = hidden.i((.., 0, ..))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.head.forward(&pooled)?;
        let probs = candle_nn::ops::softmax(&logits, D::Minus1)?;
        Ok(probs.squeeze(0)?.to_vec1::<f32>()?)
    }

    fn label_probability(&self, text: &str, label: usize) -> Result<f32, ClassifierError> {
        let probs = self.probabilities(text)?;
        probs.get(label).copied().ok_or_else(|| {
            ClassifierError::Inference(format!("label {label} out of range ({} classes)", probs.len()))
        })
    }
}

/// A zero-initialised head: uniform probabilities until fine-tuned weights
/// are supplied.
fn untrained_head(hidden: usize, num_labels: usize, device: &Device) -> candle_core::Result<Linear> {
    let weight = Tensor::zeros((num_labels, hidden), DTYPE, device)?;
    let bias = Tensor::zeros(num_labels, DTYPE, device)?;
    Ok(Linear::new(weight, Some(bias)))
}

impl TextClassifier for BertTextClassifier {
    fn ai_probability(&self, text: &str) -> Result<f32, ClassifierError> {
        self.label_probability(text, self.ai_label)
    }

    fn naturalness(&self, text: &str) -> Result<f32, ClassifierError> {
        self.label_probability(text, self.naturalness_label)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
