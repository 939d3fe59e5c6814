//! Pairwise cosine similarity for one batch run.

use crate::vectorizer::DocVector;

/// Cosine similarity between two L2-normalized sparse vectors. Zero vectors
/// yield 0.0, never NaN.
pub fn cosine_similarity(a: &DocVector, b: &DocVector) -> f64 {
    if a.is_zero() || b.is_zero() {
        return 0.0;
    }
    // Normalized vectors: the dot product is the cosine. Clamp away any
    // floating-point overshoot.
    a.dot(b).clamp(0.0, 1.0)
}

/// All similarity scores one batch needs: each new article against every
/// stored article, and against strictly earlier articles in the same batch.
pub struct BatchSimilarity {
    /// `with_existing[i][e]` — new article `i` vs stored article `e`.
    /// Inner vectors are empty when the corpus is empty.
    with_existing: Vec<Vec<f64>>,
    /// `within_batch[i][j]` for `j < i` — new article `i` vs earlier new
    /// article `j`. Row 0 is empty.
    within_batch: Vec<Vec<f64>>,
}

impl BatchSimilarity {
    pub fn compute(new: &[DocVector], existing: &[DocVector]) -> Self {
        let with_existing = new
            .iter()
            .map(|n| existing.iter().map(|e| cosine_similarity(n, e)).collect())
            .collect();
        let within_batch = (0..new.len())
            .map(|i| (0..i).map(|j| cosine_similarity(&new[i], &new[j])).collect())
            .collect();
        Self { with_existing, within_batch }
    }

    /// Build from precomputed score rows. Test seam for exercising the
    /// resolver at exact threshold values.
    pub fn from_rows(with_existing: Vec<Vec<f64>>, within_batch: Vec<Vec<f64>>) -> Self {
        Self { with_existing, within_batch }
    }

    /// Best-matching stored article for new article `i`, if any.
    pub fn max_existing(&self, i: usize) -> Option<(usize, f64)> {
        argmax(&self.with_existing[i])
    }

    /// Best-matching earlier batch article for new article `i`, if any.
    pub fn max_within_batch(&self, i: usize) -> Option<(usize, f64)> {
        argmax(&self.within_batch[i])
    }

    /// How many stored articles score at least `threshold` against `i`.
    pub fn existing_at_least(&self, i: usize, threshold: f64) -> usize {
        self.with_existing[i].iter().filter(|&&s| s >= threshold).count()
    }

    /// How many earlier batch articles score at least `threshold` against `i`.
    pub fn within_batch_at_least(&self, i: usize, threshold: f64) -> usize {
        self.within_batch[i].iter().filter(|&&s| s >= threshold).count()
    }
}

/// Index and value of the largest score. Ties resolve to the earliest index,
/// keeping resolution deterministic.
fn argmax(scores: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &s) in scores.iter().enumerate() {
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((i, s));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::VectorSpace;

    #[test]
    fn cosine_of_identical_documents_is_one() {
        let space = VectorSpace::fit(&["парк открыт в центре города"]);
        let a = space.transform("парк открыт в центре города");
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_of_disjoint_documents_is_zero() {
        let space = VectorSpace::fit(&["парк открыт", "футбольный матч"]);
        let a = space.transform("парк открыт");
        let b = space.transform("футбольный матч");
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero_not_nan() {
        let space = VectorSpace::fit(&["парк открыт"]);
        let a = space.transform("парк открыт");
        let zero = space.transform("");
        let s = cosine_similarity(&a, &zero);
        assert_eq!(s, 0.0);
        assert!(!s.is_nan());
    }

    #[test]
    fn within_batch_compares_earlier_indices_only() {
        let space = VectorSpace::fit(&["парк открыт", "парк открыт", "матч"]);
        let rows: Vec<_> =
            ["парк открыт", "парк открыт", "матч"].iter().map(|d| space.transform(d)).collect();
        let sims = BatchSimilarity::compute(&rows, &[]);

        assert!(sims.max_within_batch(0).is_none());
        let (j, s) = sims.max_within_batch(1).unwrap();
        assert_eq!(j, 0);
        assert!((s - 1.0).abs() < 1e-12);
        // Row 2 sees both earlier rows, matches neither.
        assert_eq!(sims.within_batch_at_least(2, 0.15), 0);
    }

    #[test]
    fn empty_corpus_gives_empty_existing_rows() {
        let space = VectorSpace::fit(&["парк открыт"]);
        let rows = vec![space.transform("парк открыт")];
        let sims = BatchSimilarity::compute(&rows, &[]);
        assert!(sims.max_existing(0).is_none());
        assert_eq!(sims.existing_at_least(0, 0.0), 0);
    }

    #[test]
    fn argmax_prefers_earliest_on_tie() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), Some((0, 0.4)));
        assert_eq!(argmax(&[]), None);
    }
}
