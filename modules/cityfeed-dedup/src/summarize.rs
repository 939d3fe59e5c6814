//! TF-IDF extractive summaries.
//!
//! Candidates sometimes arrive with a body but no summary. The summary is
//! then the two highest-scoring sentences of the body (sentence score = sum
//! of its TF-IDF weights over a space fit on the body's own sentences),
//! re-joined in original text order. Bodies of up to two sentences pass
//! through whole.

use cityfeed_common::CandidateArticle;

use crate::vectorizer::VectorSpace;

const SUMMARY_SENTENCES: usize = 2;

/// Build a summary from body text. Returns `None` for blank input.
pub fn summarize_text(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }

    let sentences = split_sentences(text);
    if sentences.len() <= SUMMARY_SENTENCES {
        return Some(text.trim().to_string());
    }

    let space = VectorSpace::fit(&sentences);
    let mut scored: Vec<(usize, f64)> = sentences
        .iter()
        .map(|s| space.transform(s).weight_sum())
        .enumerate()
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut picked: Vec<usize> = scored.iter().take(SUMMARY_SENTENCES).map(|&(i, _)| i).collect();
    picked.sort_unstable();

    Some(picked.into_iter().map(|i| sentences[i].as_str()).collect::<Vec<_>>().join(" "))
}

/// Fill in a missing summary from the body text. Candidates that already
/// carry a summary are left alone.
pub fn ensure_summary(candidate: &mut CandidateArticle) {
    let has_summary = candidate.summary.as_deref().is_some_and(|s| !s.trim().is_empty());
    if has_summary {
        return;
    }
    if let Some(text) = candidate.text.as_deref() {
        candidate.summary = summarize_text(text);
    }
}

/// Split on sentence-terminating punctuation. Deliberately naive — proper
/// sentence segmentation is language-specific and out of scope here.
fn split_sentences(text: &str) -> Vec<String> {
    text.split_inclusive(['.', '!', '?'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_has_no_summary() {
        assert_eq!(summarize_text(""), None);
        assert_eq!(summarize_text("   \n"), None);
    }

    #[test]
    fn short_text_passes_through() {
        let text = "Парк открыт. Вход свободный!";
        assert_eq!(summarize_text(text), Some(text.to_string()));
    }

    #[test]
    fn long_text_keeps_two_sentences_in_original_order() {
        let text = "Сегодня в центре города торжественно открыли новый большой парк. Да! \
                    Жители района давно просили городскую администрацию благоустроить территорию.";
        let summary = summarize_text(text).unwrap();
        assert_eq!(
            summary,
            "Сегодня в центре города торжественно открыли новый большой парк. \
             Жители района давно просили городскую администрацию благоустроить территорию."
        );
    }

    #[test]
    fn ensure_summary_fills_only_missing() {
        let mut with_summary = CandidateArticle {
            summary: Some("Уже есть".to_string()),
            text: Some("Первое предложение. Второе предложение.".to_string()),
            ..Default::default()
        };
        ensure_summary(&mut with_summary);
        assert_eq!(with_summary.summary.as_deref(), Some("Уже есть"));

        let mut without = CandidateArticle {
            summary: None,
            text: Some("Первое предложение. Второе предложение.".to_string()),
            ..Default::default()
        };
        ensure_summary(&mut without);
        assert_eq!(without.summary.as_deref(), Some("Первое предложение. Второе предложение."));
    }

    #[test]
    fn ensure_summary_leaves_bodyless_candidate_alone() {
        let mut candidate = CandidateArticle::default();
        ensure_summary(&mut candidate);
        assert!(candidate.summary.is_none());
    }

    #[test]
    fn split_sentences_handles_mixed_punctuation() {
        let sentences = split_sentences("Один. Два! Три? Четыре");
        assert_eq!(sentences, vec!["Один.", "Два!", "Три?", "Четыре"]);
    }
}
