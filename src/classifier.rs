//! Embedding-similarity gate that decides whether input is medical in nature.
//!
//! The reference term set is embedded once at load and never changes
//! afterwards. An empty set (missing or unreadable term file) is a valid
//! degraded state: the classifier fails closed and rejects everything.

use std::sync::Arc;

use crate::config::DEFAULT_SIMILARITY_THRESHOLD;
use crate::embedding::{cosine_similarity, EmbeddingProvider};

/// A reference term and its precomputed embedding.
#[derive(Debug, Clone)]
pub struct DomainTerm {
    pub term: String,
    pub embedding: Vec<f32>,
}

/// Seam for the orchestrator: lets tests substitute a fixed-answer gate
/// without loading any term file or embedding model.
pub trait DomainGate {
    /// `true` iff `input` should be treated as in-domain.
    fn is_domain_relevant(&self, input: &str) -> bool;
}

/// Load and embed the reference term list: plain text, one term or phrase
/// per line, blank lines skipped.
///
/// A missing or unreadable file degrades to an empty set — logged as an
/// error, never propagated.
pub fn load_domain_terms(
    path: &str,
    embedder: &dyn EmbeddingProvider,
) -> Vec<DomainTerm> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Error loading medical terms from '{}': {}", path, e);
            return Vec::new();
        }
    };

    let mut terms = Vec::new();
    for line in contents.lines() {
        let term = line.trim();
        if term.is_empty() {
            continue;
        }
        match embedder.embed(term) {
            Ok(embedding) => terms.push(DomainTerm {
                term: term.to_string(),
                embedding,
            }),
            Err(e) => {
                tracing::error!("Failed to embed term '{}': {}", term, e);
            }
        }
    }

    tracing::info!("Loaded {} domain terms from '{}'", terms.len(), path);
    terms
}

/// Similarity-based domain classifier.
pub struct DomainClassifier {
    embedder: Arc<dyn EmbeddingProvider>,
    terms: Vec<DomainTerm>,
    threshold: f32,
}

impl DomainClassifier {
    /// Build a classifier over an already-loaded term set.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, terms: Vec<DomainTerm>) -> Self {
        Self {
            embedder,
            terms,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    /// Build a classifier by loading and embedding the term file at `path`.
    pub fn from_file(embedder: Arc<dyn EmbeddingProvider>, path: &str) -> Self {
        let terms = load_domain_terms(path, embedder.as_ref());
        Self::new(embedder, terms)
    }

    /// Override the default similarity threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Number of loaded reference terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// `true` iff any reference term's similarity to `input` strictly
    /// exceeds `threshold`.
    ///
    /// Fails closed: an empty term set or an embedding failure returns
    /// `false`. The input is embedded exactly once per call; nothing is
    /// cached across calls.
    pub fn is_relevant_with_threshold(&self, input: &str, threshold: f32) -> bool {
        if self.terms.is_empty() {
            tracing::warn!("Medical terms list is empty.");
            return false;
        }

        let input_embedding = match self.embedder.embed(&input.to_lowercase()) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("Failed to embed input: {}", e);
                return false;
            }
        };

        self.terms
            .iter()
            .any(|t| cosine_similarity(&input_embedding, &t.embedding) > threshold)
    }
}

impl DomainGate for DomainClassifier {
    fn is_domain_relevant(&self, input: &str) -> bool {
        self.is_relevant_with_threshold(input, self.threshold)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MedAssistantError;

    /// Stub embedder that maps known strings onto fixed unit vectors.
    struct FixtureEmbedder;

    impl EmbeddingProvider for FixtureEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, MedAssistantError> {
            // "headache"-family texts share an axis; everything else is orthogonal.
            if text.contains("headache") || text.contains("migraine") {
                Ok(vec![1.0, 0.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0, 0.0])
            }
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn name(&self) -> &str {
            "fixture"
        }
    }

    fn classifier_with_terms(terms: &[&str]) -> DomainClassifier {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(FixtureEmbedder);
        let embedded = terms
            .iter()
            .map(|t| DomainTerm {
                term: t.to_string(),
                embedding: embedder.embed(t).unwrap(),
            })
            .collect();
        DomainClassifier::new(embedder, embedded)
    }

    #[test]
    fn empty_term_set_fails_closed() {
        let c = classifier_with_terms(&[]);
        assert!(!c.is_domain_relevant("I have a headache"));
        assert!(!c.is_domain_relevant("migraine"));
    }

    #[test]
    fn matching_term_passes_gate() {
        let c = classifier_with_terms(&["headache"]);
        assert!(c.is_domain_relevant("terrible headache since morning"));
    }

    #[test]
    fn unrelated_input_rejected() {
        let c = classifier_with_terms(&["headache"]);
        assert!(!c.is_domain_relevant("what is the weather today"));
    }

    #[test]
    fn threshold_is_strictly_exceeded() {
        // Orthogonal vectors give similarity 0.0, which does not exceed 0.0.
        let c = classifier_with_terms(&["headache"]);
        assert!(!c.is_relevant_with_threshold("weather", 0.0));
        // Identical vectors give 1.0, which does not strictly exceed 1.0.
        assert!(!c.is_relevant_with_threshold("headache", 1.0));
        assert!(c.is_relevant_with_threshold("headache", 0.99));
    }
}
