//! Text embedding provider for paraphrase-multilingual-MiniLM-L12-v2.
//!
//! When the `onnx` Cargo feature is enabled and the model files are present,
//! runs real inference via `ort` with real BPE tokenization via `tokenizers`.
//! Otherwise falls back to a deterministic hash-based embedding that preserves
//! the correct 384-dim interface. The classifier never sees the difference —
//! it talks to [`EmbeddingProvider`] only.

use crate::error::MedAssistantError;

/// Embedding dimension for paraphrase-multilingual-MiniLM-L12-v2.
pub const EMBEDDING_DIM: usize = 384;
#[cfg(feature = "onnx")]
const MAX_SEQ_LEN: usize = 128;

// ── Capability trait ─────────────────────────────────────────────────────────

/// The single capability the rest of the system needs from the NLP model:
/// embed text into a fixed-dimension vector.
///
/// Injected into the classifier at construction so tests can substitute a
/// stub without touching any global model state.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into an L2-normalised vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, MedAssistantError>;

    /// Dimensionality of the vectors produced by [`EmbeddingProvider::embed`].
    fn dimensions(&self) -> usize;

    /// Human-readable backend name, used in startup logging.
    fn name(&self) -> &str;
}

/// Cosine similarity between two vectors.
///
/// Returns `0.0` on dimension mismatch or when either vector has (near) zero
/// norm, so a degenerate embedding can never clear the relevance threshold.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a < 1e-8 || norm_b < 1e-8 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// ── Backend enum ─────────────────────────────────────────────────────────────

enum EmbeddingBackend {
    /// Deterministic hash-based fallback — correct dimensions, no semantics.
    Hash,
    /// Real ONNX inference via `ort` + real BPE tokenization via `tokenizers`.
    ///
    /// Session::run() requires &mut self, so we wrap in Mutex for interior
    /// mutability. Tokenizer is Send+Sync, stored behind Arc for cheap clone.
    #[cfg(feature = "onnx")]
    Onnx {
        session: std::sync::Arc<std::sync::Mutex<ort::session::Session>>,
        tokenizer: std::sync::Arc<tokenizers::Tokenizer>,
    },
}

// ── Public struct ────────────────────────────────────────────────────────────

/// ONNX-based embedding provider.
///
/// Create with [`OnnxEmbedding::new`]; pass `config.embedding_model_path`.
pub struct OnnxEmbedding {
    model_path: String,
    backend: EmbeddingBackend,
}

// Safety: Mutex<Session> is Send+Sync; Arc<Tokenizer> is Send+Sync; Hash is trivially so.
unsafe impl Send for OnnxEmbedding {}
unsafe impl Sync for OnnxEmbedding {}

impl OnnxEmbedding {
    /// Create a new embedding provider.
    ///
    /// Tries to load the ONNX model when the `onnx` feature is active.
    /// On failure (missing file, runtime error, or feature disabled) falls back
    /// to the deterministic hash implementation and logs a warning.
    pub fn new(model_path: &str) -> Result<Self, MedAssistantError> {
        #[cfg(feature = "onnx")]
        {
            match Self::try_load_onnx_and_tokenizer(model_path) {
                Ok((session, tokenizer)) => {
                    tracing::info!("ONNX model + tokenizer loaded from '{}'", model_path);
                    return Ok(Self {
                        model_path: model_path.to_string(),
                        backend: EmbeddingBackend::Onnx {
                            session: std::sync::Arc::new(std::sync::Mutex::new(session)),
                            tokenizer: std::sync::Arc::new(tokenizer),
                        },
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "ONNX load failed ({}); falling back to hash embeddings. \
                         Domain classification will NOT be semantic.",
                        e
                    );
                }
            }
        }

        #[cfg(not(feature = "onnx"))]
        tracing::warn!(
            "onnx feature disabled — using hash fallback. \
             Build with '--features onnx' for real semantic embeddings."
        );

        Ok(Self {
            model_path: model_path.to_string(),
            backend: EmbeddingBackend::Hash,
        })
    }

    /// Returns `true` when running the hash fallback (no real model loaded).
    pub fn is_fallback(&self) -> bool {
        matches!(self.backend, EmbeddingBackend::Hash)
    }

    /// Model path this provider was initialised with.
    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    // ── ONNX loading / inference (feature-gated) ─────────────────────────────

    /// Load ONNX session and tokenizer from a model directory or .onnx file path.
    ///
    /// Expects:
    ///   - `<model_dir>/onnx/model.onnx`   (or the literal .onnx path)
    ///   - `<model_dir>/tokenizer.json`
    #[cfg(feature = "onnx")]
    fn try_load_onnx_and_tokenizer(
        model_path: &str,
    ) -> Result<(ort::session::Session, tokenizers::Tokenizer), MedAssistantError> {
        let p = std::path::Path::new(model_path);
        let (base_dir, onnx_path) = if p.is_dir() {
            (p.to_path_buf(), p.join("onnx").join("model.onnx"))
        } else {
            // model_path points to the .onnx file — parent is the model dir
            (
                p.parent()
                    .map(|d| d.to_path_buf())
                    .unwrap_or_else(|| std::path::PathBuf::from(".")),
                p.to_path_buf(),
            )
        };

        if !onnx_path.exists() {
            return Err(MedAssistantError::Embedding(format!(
                "ONNX model file not found: {}",
                onnx_path.display()
            )));
        }

        let tokenizer_path = base_dir.join("tokenizer.json");
        if !tokenizer_path.exists() {
            return Err(MedAssistantError::Embedding(format!(
                "tokenizer.json not found: {}",
                tokenizer_path.display()
            )));
        }

        let session = ort::session::Session::builder()
            .map_err(|e| MedAssistantError::Embedding(format!("ort builder: {e}")))?
            .commit_from_file(&onnx_path)
            .map_err(|e| MedAssistantError::Embedding(format!("ort load: {e}")))?;

        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| MedAssistantError::Embedding(format!("tokenizer load: {e}")))?;

        Ok((session, tokenizer))
    }

    /// Run ONNX inference: tokenize, truncate to `MAX_SEQ_LEN`, run the model,
    /// mean-pool over non-padding positions, L2-normalise.
    #[cfg(feature = "onnx")]
    fn onnx_embed(
        session: &std::sync::Arc<std::sync::Mutex<ort::session::Session>>,
        tokenizer: &std::sync::Arc<tokenizers::Tokenizer>,
        text: &str,
    ) -> Result<Vec<f32>, MedAssistantError> {
        use ndarray::Array2;
        use ort::value::Tensor;

        let encoding = tokenizer
            .encode(text, true)
            .map_err(|e| MedAssistantError::Embedding(format!("encode: {e}")))?;

        let raw_ids = encoding.get_ids();
        let raw_mask = encoding.get_attention_mask();
        let seq_len = raw_ids.len().min(MAX_SEQ_LEN);

        if seq_len == 0 {
            return Err(MedAssistantError::Embedding(
                "Tokenizer produced empty sequence".to_string(),
            ));
        }

        let input_ids: Vec<i64> = raw_ids[..seq_len].iter().map(|&x| x as i64).collect();
        let attention_mask: Vec<i64> = raw_mask[..seq_len].iter().map(|&x| x as i64).collect();
        let token_type_ids = vec![0i64; seq_len];

        let ids_arr = Array2::from_shape_vec((1, seq_len), input_ids)
            .map_err(|e| MedAssistantError::Embedding(e.to_string()))?;
        let mask_arr = Array2::from_shape_vec((1, seq_len), attention_mask.clone())
            .map_err(|e| MedAssistantError::Embedding(e.to_string()))?;
        let types_arr = Array2::from_shape_vec((1, seq_len), token_type_ids)
            .map_err(|e| MedAssistantError::Embedding(e.to_string()))?;

        let ids_val = Tensor::from_array(ids_arr)
            .map_err(|e: ort::Error| MedAssistantError::Embedding(e.to_string()))?;
        let mask_val = Tensor::from_array(mask_arr)
            .map_err(|e: ort::Error| MedAssistantError::Embedding(e.to_string()))?;
        let types_val = Tensor::from_array(types_arr)
            .map_err(|e: ort::Error| MedAssistantError::Embedding(e.to_string()))?;

        let guard = session
            .lock()
            .map_err(|_| MedAssistantError::Embedding("Session mutex poisoned".to_string()))?;

        let session_inputs = ort::inputs![
            "input_ids"      => ids_val,
            "attention_mask" => mask_val,
            "token_type_ids" => types_val
        ]
        .map_err(|e: ort::Error| MedAssistantError::Embedding(e.to_string()))?;

        let outputs = guard
            .run(session_inputs)
            .map_err(|e: ort::Error| MedAssistantError::Embedding(e.to_string()))?;

        let tensor = outputs["last_hidden_state"]
            .try_extract_tensor::<f32>()
            .map_err(|e: ort::Error| MedAssistantError::Embedding(e.to_string()))?;

        let flat: Vec<f32> = tensor.iter().copied().collect();
        if flat.len() < seq_len * EMBEDDING_DIM {
            return Err(MedAssistantError::Embedding(
                "ONNX output shorter than expected".to_string(),
            ));
        }

        // Mean pool token embeddings, masking out padded positions.
        let mut sum = vec![0.0f32; EMBEDDING_DIM];
        let mut count = 0i64;
        for (i, &mask) in attention_mask.iter().enumerate().take(seq_len) {
            if mask == 1 {
                let start = i * EMBEDDING_DIM;
                for (s, e) in sum.iter_mut().zip(flat[start..start + EMBEDDING_DIM].iter()) {
                    *s += e;
                }
                count += 1;
            }
        }
        if count > 0 {
            sum.iter_mut().for_each(|s| *s /= count as f32);
        }

        Ok(Self::normalize(&sum))
    }

    // ── Hash fallback ────────────────────────────────────────────────────────

    /// Deterministic hash-based embedding (development / test fallback).
    ///
    /// Uses an XOR-shift PRNG seeded per 48-element chunk to fill all 384
    /// dimensions, then L2-normalises the result.
    ///
    /// NOT semantic — different texts can produce similar or identical embeddings.
    fn hash_embed(text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut embedding = vec![0.0f32; EMBEDDING_DIM];
        const CHUNK: usize = 48; // 384 / 8 chunks

        for seed in 0u64..8 {
            let mut h = DefaultHasher::new();
            seed.hash(&mut h);
            text.hash(&mut h);
            let mut state = h.finish();
            // xorshift64
            let start = (seed as usize) * CHUNK;
            for i in 0..CHUNK {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                let f = (state as f32) / (u64::MAX as f32) * 2.0 - 1.0;
                if start + i < EMBEDDING_DIM {
                    embedding[start + i] = f;
                }
            }
        }

        Self::normalize(&embedding)
    }

    /// L2-normalise a vector; returns `v` unchanged if norm < ε.
    fn normalize(v: &[f32]) -> Vec<f32> {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 1e-8 {
            v.iter().map(|x| x / norm).collect()
        } else {
            v.to_vec()
        }
    }
}

impl EmbeddingProvider for OnnxEmbedding {
    fn embed(&self, text: &str) -> Result<Vec<f32>, MedAssistantError> {
        match &self.backend {
            EmbeddingBackend::Hash => Ok(Self::hash_embed(text)),
            #[cfg(feature = "onnx")]
            EmbeddingBackend::Onnx { session, tokenizer } => {
                Self::onnx_embed(session, tokenizer, text)
            }
        }
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }

    fn name(&self) -> &str {
        match &self.backend {
            EmbeddingBackend::Hash => "OnnxEmbedding (hash fallback — no real model)",
            #[cfg(feature = "onnx")]
            EmbeddingBackend::Onnx { .. } => {
                "OnnxEmbedding (paraphrase-multilingual-MiniLM-L12-v2)"
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_fallback_correct_dim() {
        let emb = OnnxEmbedding::new("nonexistent.onnx").unwrap();
        assert!(emb.is_fallback());
        let v = emb.embed("hello world").unwrap();
        assert_eq!(v.len(), EMBEDDING_DIM);
    }

    #[test]
    fn hash_fallback_normalised() {
        let emb = OnnxEmbedding::new("nonexistent.onnx").unwrap();
        let v = emb.embed("test normalisation").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm={norm}");
    }

    #[test]
    fn hash_fallback_deterministic() {
        let emb = OnnxEmbedding::new("x").unwrap();
        let a = emb.embed("same text").unwrap();
        let b = emb.embed("same text").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cosine_identical_vectors_is_one() {
        let v = vec![0.5f32, 0.5, 0.5, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors_is_zero() {
        let a = vec![1.0f32, 0.0];
        let b = vec![0.0f32, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_dimension_mismatch_is_zero() {
        let a = vec![1.0f32, 0.0, 0.0];
        let b = vec![1.0f32, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn cosine_zero_norm_is_zero() {
        let a = vec![0.0f32; 4];
        let b = vec![1.0f32; 4];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
