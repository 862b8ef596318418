// Local sentence embeddings via Candle (all-MiniLM-L6-v2 by default)
use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use crate::embedding::{ensure_text, off_runtime, Embedder};
use crate::errors::{Result, TutorError};

const BACKEND: &str = "sentence-transformers";

/// Token limit of the sentence-transformers pipeline
const MAX_SEQUENCE_LENGTH: usize = 256;

/// BERT-style sentence encoder with mean pooling and L2 normalisation,
/// matching the sentence-transformers pipeline used to build the index
pub struct MiniLmEmbedder {
    encoder: Encoder,
    dimension: usize,
}

/// Model handles shared with blocking encode tasks
#[derive(Clone)]
struct Encoder {
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
}

impl MiniLmEmbedder {
    /// Create new embedder (downloads model on first use)
    pub fn new(model_id: &str) -> Result<Self> {
        Self::load(model_id).map_err(|e| TutorError::embedding(BACKEND, format!("{:#}", e)))
    }

    fn load(model_id: &str) -> AnyResult<Self> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(hub_repo_id(model_id), RepoType::Model));

        let config_path = repo.get("config.json")
            .context("Failed to download model config")?;
        let tokenizer_path = repo.get("tokenizer.json")
            .context("Failed to download tokenizer")?;
        let weights_path = repo.get("model.safetensors")
            .context("Failed to download model weights")?;

        let config_contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;
        let config: Config = serde_json::from_str(&config_contents)
            .context("Failed to parse model config")?;
        let dimension = serde_json::from_str::<serde_json::Value>(&config_contents)?
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .context("Model config has no hidden_size")? as usize;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;
        tokenizer.with_padding(None);

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .context("Failed to load model weights")?
        };
        let model = BertModel::load(vb, &config)
            .context("Failed to create BERT model")?;

        info!(model = model_id, dimension, "Loaded sentence embedding model");

        Ok(Self {
            encoder: Encoder {
                model: Arc::new(model),
                tokenizer: Arc::new(tokenizer),
                device,
            },
            dimension,
        })
    }

    /// Encode one text into a unit-length vector on the calling thread
    pub fn encode(&self, text: &str) -> AnyResult<Vec<f32>> {
        self.encoder.encode(text)
    }
}

impl Encoder {
    fn encode(&self, text: &str) -> AnyResult<Vec<f32>> {
        let encoding = self.tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let ids = encoding.get_ids().to_vec();
        let mask = encoding.get_attention_mask().to_vec();
        let len = ids.len();

        let token_ids = Tensor::from_vec(ids, (1, len), &self.device)?;
        let attention_mask = Tensor::from_vec(mask, (1, len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self.model.forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = Self::mean_pool(&hidden, &attention_mask)?;
        let normalized = Self::normalize(&pooled)?;

        let mut rows = normalized.to_vec2::<f32>()?;
        rows.pop().context("Model returned no embedding")
    }

    /// Mean pooling with attention mask
    fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> AnyResult<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .expand(embeddings.shape())?
            .to_dtype(embeddings.dtype())?;

        let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
        let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

        Ok(sum_embeddings.broadcast_div(&sum_mask)?)
    }

    fn normalize(pooled: &Tensor) -> AnyResult<Tensor> {
        let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
        Ok(pooled.broadcast_div(&norm)?)
    }
}

/// Bare model names live under the `sentence-transformers` organisation
pub fn hub_repo_id(model_id: &str) -> String {
    if model_id.contains('/') {
        model_id.to_string()
    } else {
        format!("sentence-transformers/{}", model_id)
    }
}

#[async_trait]
impl Embedder for MiniLmEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        ensure_text(BACKEND, text)?;
        let encoder = self.encoder.clone();
        let text = text.to_string();
        off_runtime(BACKEND, move || {
            encoder
                .encode(&text)
                .map_err(|e| TutorError::embedding(BACKEND, format!("{:#}", e)))
        })
        .await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
