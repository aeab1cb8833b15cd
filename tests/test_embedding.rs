//! Tests for [`medassist::embedding`] — hash fallback behaviour and the
//! similarity helper. Real ONNX inference needs model files and the `onnx`
//! feature, so it is not covered here.

use medassist::embedding::{cosine_similarity, EmbeddingProvider, OnnxEmbedding, EMBEDDING_DIM};

/// Without the onnx feature (or with a missing model) construction succeeds
/// and reports the fallback backend.
#[test]
fn test_missing_model_falls_back() {
    let emb = OnnxEmbedding::new("./no/such/model").unwrap();
    assert!(emb.is_fallback());
    assert_eq!(emb.model_path(), "./no/such/model");
    assert!(emb.name().contains("fallback"));
}

/// Fallback vectors have the advertised dimensionality and unit norm.
#[test]
fn test_fallback_vectors_are_unit_norm() {
    let emb = OnnxEmbedding::new("x").unwrap();
    assert_eq!(emb.dimensions(), EMBEDDING_DIM);

    for text in ["headache", "the weather is nice", "a"] {
        let v = emb.embed(text).unwrap();
        assert_eq!(v.len(), EMBEDDING_DIM);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm={norm} for {text:?}");
    }
}

/// Same input, same vector — the fallback is deterministic.
#[test]
fn test_fallback_is_deterministic() {
    let emb = OnnxEmbedding::new("x").unwrap();
    assert_eq!(emb.embed("fever").unwrap(), emb.embed("fever").unwrap());
}

/// A vector is maximally similar to itself and the helper is symmetric.
#[test]
fn test_cosine_similarity_properties() {
    let emb = OnnxEmbedding::new("x").unwrap();
    let a = emb.embed("migraine").unwrap();
    let b = emb.embed("completely different text").unwrap();

    assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-5);
    let ab = cosine_similarity(&a, &b);
    let ba = cosine_similarity(&b, &a);
    assert!((ab - ba).abs() < 1e-6);
    assert!((-1.0..=1.0).contains(&ab));
}
