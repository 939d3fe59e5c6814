//! TF-IDF vector space over normalized article texts.
//!
//! Weighting follows the classic smoothed formulation: raw term count times
//! `ln((1 + N) / (1 + df)) + 1`, then L2 normalization per document, so
//! cosine similarity reduces to a sparse dot product. Tokenization is
//! language-neutral: any alphanumeric run of two or more characters counts,
//! Cyrillic included.

use std::collections::HashMap;

/// A document as a sparse L2-normalized vector: `(term_id, weight)` pairs
/// sorted by term id. A document with no known terms is the zero vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DocVector(Vec<(usize, f64)>);

impl DocVector {
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Dot product of two sorted sparse vectors.
    pub fn dot(&self, other: &DocVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].0.cmp(&other.0[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.0[i].1 * other.0[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Sum of all term weights. Used by the extractive summarizer.
    pub fn weight_sum(&self) -> f64 {
        self.0.iter().map(|(_, w)| w).sum()
    }
}

/// A TF-IDF vector space fit over one corpus of documents.
pub struct VectorSpace {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl VectorSpace {
    /// Fit vocabulary and IDF weights over `documents`. Degenerate corpora
    /// (empty, all-empty strings, single token) produce a valid
    /// low-information space rather than an error.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut doc_frequencies: Vec<usize> = Vec::new();

        for doc in documents {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokenize(doc.as_ref()) {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(token).or_insert(next_id);
                if id == doc_frequencies.len() {
                    doc_frequencies.push(0);
                }
                if !seen.contains(&id) {
                    seen.push(id);
                    doc_frequencies[id] += 1;
                }
            }
        }

        let n = documents.len() as f64;
        let idf = doc_frequencies
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Self { vocabulary, idf }
    }

    /// Fit jointly over `existing ++ new` and return the two halves as
    /// vector rows. Joint fitting keeps IDF weights consistent across the
    /// stored corpus and the incoming batch; fitting the halves separately
    /// would make cross-batch similarity meaningless.
    pub fn fit_joint<S: AsRef<str>>(existing: &[S], new: &[S]) -> (Vec<DocVector>, Vec<DocVector>) {
        let mut all: Vec<&str> = Vec::with_capacity(existing.len() + new.len());
        all.extend(existing.iter().map(|s| s.as_ref()));
        all.extend(new.iter().map(|s| s.as_ref()));

        let space = Self::fit(&all);
        let existing_rows = existing.iter().map(|s| space.transform(s.as_ref())).collect();
        let new_rows = new.iter().map(|s| space.transform(s.as_ref())).collect();
        (existing_rows, new_rows)
    }

    /// Project a document into the space. Terms outside the vocabulary are
    /// ignored.
    pub fn transform(&self, document: &str) -> DocVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(document) {
            if let Some(&id) = self.vocabulary.get(&token) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let mut weights: Vec<(usize, f64)> =
            counts.into_iter().map(|(id, count)| (id, count * self.idf[id])).collect();
        weights.sort_by_key(|&(id, _)| id);

        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut weights {
                *w /= norm;
            }
        }
        DocVector(weights)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Lowercased alphanumeric runs of at least two characters.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| s.chars().count() > 1)
        .map(|s| s.to_lowercase())
}
