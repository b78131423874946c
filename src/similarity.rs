use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::knowledge_base::Corpus;

/// Terms are runs of two or more word characters, the usual TF-IDF default.
static TERM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("term pattern is a valid regex"));

/// Best-scoring corpus entry for a piece of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityMatch {
    pub index: usize,
    pub score: f64,
}

/// TF-IDF model over the corpus prompts.
///
/// Built once and never mutated. The vocabulary is kept sorted so that two
/// builds from the same corpus produce identical columns and weights.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    prompt_vectors: Vec<Vec<f64>>,
}

impl SimilarityIndex {
    pub fn build(corpus: &Corpus) -> Self {
        let documents: Vec<Vec<String>> = corpus.prompts().map(terms).collect();

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for document in &documents {
            let mut seen: Vec<&String> = document.iter().collect();
            seen.sort();
            seen.dedup();
            for term in seen {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let vocabulary: BTreeMap<String, usize> = document_frequency
            .keys()
            .enumerate()
            .map(|(column, term)| (term.clone(), column))
            .collect();

        // Smoothed IDF: ln((1 + n) / (1 + df)) + 1
        let n = documents.len() as f64;
        let idf: Vec<f64> = document_frequency
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let mut index = Self {
            vocabulary,
            idf,
            prompt_vectors: Vec::new(),
        };
        let prompt_vectors: Vec<Vec<f64>> = documents
            .iter()
            .map(|document| index.weigh(document))
            .collect();
        index.prompt_vectors = prompt_vectors;
        index
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.keys().map(String::as_str)
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&column| self.idf[column])
    }

    pub fn prompt_vector(&self, index: usize) -> Option<&[f64]> {
        self.prompt_vectors.get(index).map(Vec::as_slice)
    }

    /// L2-normalised TF-IDF vector for `text`.
    ///
    /// Terms outside the vocabulary carry no weight. Returns `None` when
    /// nothing in the text is known, since such a vector has no direction.
    pub fn vectorize(&self, text: &str) -> Option<Vec<f64>> {
        let vector = self.weigh(&terms(text));
        if vector.iter().all(|weight| *weight == 0.0) {
            None
        } else {
            Some(vector)
        }
    }

    /// Highest cosine similarity against every prompt, lowest index on ties.
    pub fn best_match(&self, text: &str) -> Option<SimilarityMatch> {
        let query = self.vectorize(text)?;

        let mut best: Option<SimilarityMatch> = None;
        for (index, prompt_vector) in self.prompt_vectors.iter().enumerate() {
            let score = cosine(&query, prompt_vector);
            if !score.is_finite() {
                continue;
            }
            match best {
                Some(current) if current.score >= score => {}
                _ => best = Some(SimilarityMatch { index, score }),
            }
        }
        best
    }

    fn weigh(&self, document: &[String]) -> Vec<f64> {
        let mut vector = vec![0.0; self.vocabulary.len()];
        for term in document {
            if let Some(&column) = self.vocabulary.get(term) {
                vector[column] += 1.0;
            }
        }
        for (weight, idf) in vector.iter_mut().zip(&self.idf) {
            *weight *= idf;
        }

        let norm = vector.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in vector.iter_mut() {
                *weight /= norm;
            }
        }
        vector
    }
}

/// Cosine similarity; zero when either vector has no magnitude.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|y| y * y).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn terms(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TERM_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}
