use crate::config::EMBEDDING_MODEL_ID;
use crate::semantic::Embedder;
use anyhow::{Context, Result};
use candle_core::{Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::api::sync::Api;
use tokenizers::{Tokenizer, TruncationParams};

const BATCH_SIZE: usize = 64;
const MAX_SEQUENCE_LENGTH: usize = 512;

/// BERT sentence encoder running on CPU, weights pulled from the hub.
pub struct EmbeddingEngine {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl EmbeddingEngine {
    pub fn new() -> Result<Self> {
        let device = Device::Cpu;
        let api = Api::new()?;
        let repo = api.model(EMBEDDING_MODEL_ID.to_string());

        let config_path = repo
            .get("config.json")
            .with_context(|| format!("Could not download config for {EMBEDDING_MODEL_ID}"))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .with_context(|| format!("Could not download tokenizer for {EMBEDDING_MODEL_ID}"))?;
        let weights_path = repo
            .get("model.safetensors")
            .with_context(|| format!("Could not download weights for {EMBEDDING_MODEL_ID}"))?;

        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(config_path)?)?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Tokenizer error: {e}"))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Truncation error: {e}"))?;

        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)? };
        let model = BertModel::load(vb, &config)?;

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut encodings = Vec::with_capacity(texts.len());
        for text in texts {
            let encoding = self
                .tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Encode error: {e}"))?;
            encodings.push(encoding);
        }

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);
        let batch_size = texts.len();

        let mut ids = vec![0u32; batch_size * max_len];
        let mut type_ids = vec![0u32; batch_size * max_len];
        let mut attention_mask = vec![0u32; batch_size * max_len];

        for (row, encoding) in encodings.iter().enumerate() {
            let offset = row * max_len;
            let len = encoding.get_ids().len();
            ids[offset..offset + len].copy_from_slice(encoding.get_ids());
            type_ids[offset..offset + len].copy_from_slice(encoding.get_type_ids());
            attention_mask[offset..offset + len].copy_from_slice(encoding.get_attention_mask());
        }

        let input_ids = Tensor::from_slice(&ids, (batch_size, max_len), &self.device)?;
        let token_type_ids = Tensor::from_slice(&type_ids, (batch_size, max_len), &self.device)?;
        let attention_mask =
            Tensor::from_slice(&attention_mask, (batch_size, max_len), &self.device)?;

        // [batch_size, seq_len, hidden_size]
        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // CLS pooling (the bge models are trained for it), then L2 normalize
        let cls = output.i((.., 0))?;
        let norm = cls.sqr()?.sum_keepdim(1)?.sqrt()?;
        let normalized = cls.broadcast_div(&norm)?;

        Ok(normalized.to_vec2::<f32>()?)
    }
}

impl Embedder for EmbeddingEngine {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            vectors.extend(self.embed_batch(batch)?);
        }
        Ok(vectors)
    }
}
