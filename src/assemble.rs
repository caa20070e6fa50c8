use tracing::debug;

use crate::api_types::{PhraseResponse, RankedPhrase};
use crate::models::{AggregatedPhrase, RankedResult};

/// Labels a finished result set ("Name", "Movie", ...). The product contract
/// leaves the rule open, so the engine ships a generic default and treats the
/// classifier as a pluggable capability.
pub trait TopicClassifier: Send + Sync {
    fn classify(&self, phrases: &[AggregatedPhrase]) -> String;
}

/// Default classifier: everything is a "Phrase".
pub struct GenericTopic;

impl TopicClassifier for GenericTopic {
    fn classify(&self, _phrases: &[AggregatedPhrase]) -> String {
        "Phrase".to_string()
    }
}

/// Sort, trim to `top_n`, label, and attach accumulated warnings.
///
/// Ordering is fully deterministic: total score descending, then total
/// upvotes descending, then display form lexicographically.
pub fn assemble(
    mut phrases: Vec<AggregatedPhrase>,
    top_n: usize,
    topic: &dyn TopicClassifier,
    mut warnings: Vec<String>,
) -> RankedResult {
    phrases.sort_by(|a, b| {
        b.total_score
            .total_cmp(&a.total_score)
            .then_with(|| b.total_upvotes.cmp(&a.total_upvotes))
            .then_with(|| a.display_form.cmp(&b.display_form))
    });

    let distinct = phrases.len();
    phrases.truncate(top_n);
    debug!(
        "Result assembled - distinct={}, returned={}, top_n={}",
        distinct,
        phrases.len(),
        top_n
    );

    if phrases.is_empty() {
        warnings.push("No phrases survived filtering.".to_string());
    }

    let topic = topic.classify(&phrases);
    let warning = if warnings.is_empty() {
        None
    } else {
        Some(warnings.join(" "))
    };

    RankedResult {
        phrases,
        topic,
        warning,
    }
}

/// Shape the ranked result for the wire. `print_scores` only toggles the
/// per-phrase statistics fields; it never affects ranking.
pub fn to_response(result: RankedResult, print_scores: bool) -> PhraseResponse {
    let phrases = result
        .phrases
        .into_iter()
        .map(|p| RankedPhrase {
            phrase: p.display_form,
            score: print_scores.then(|| format!("{:.2}", p.total_score)),
            upvotes: print_scores.then_some(p.total_upvotes),
        })
        .collect();

    PhraseResponse {
        phrases,
        topic: result.topic,
        warning: result.warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrase(display: &str, score: f64, upvotes: i64) -> AggregatedPhrase {
        AggregatedPhrase {
            canonical_key: display.to_lowercase(),
            display_form: display.to_string(),
            display_capitalized: 0,
            total_score: score,
            total_upvotes: upvotes,
            occurrence_count: 1,
        }
    }

    #[test]
    fn orders_by_score_then_upvotes_then_display() {
        let result = assemble(
            vec![
                phrase("Beta", 1.0, 5),
                phrase("Alpha", 1.0, 5),
                phrase("Gamma", 1.0, 9),
                phrase("Delta", 3.0, 0),
            ],
            10,
            &GenericTopic,
            Vec::new(),
        );
        let order: Vec<&str> = result.phrases.iter().map(|p| p.display_form.as_str()).collect();
        assert_eq!(order, vec!["Delta", "Gamma", "Alpha", "Beta"]);
    }

    #[test]
    fn truncates_to_top_n() {
        let result = assemble(
            vec![phrase("A", 3.0, 0), phrase("B", 2.0, 0), phrase("C", 1.0, 0)],
            2,
            &GenericTopic,
            Vec::new(),
        );
        assert_eq!(result.phrases.len(), 2);
        assert!(result.warning.is_none());
    }

    #[test]
    fn fewer_survivors_than_top_n_is_not_an_error() {
        let result = assemble(vec![phrase("Only One", 1.0, 0)], 3, &GenericTopic, Vec::new());
        assert_eq!(result.phrases.len(), 1);
        assert!(result.warning.is_none());
    }

    #[test]
    fn empty_result_carries_a_warning() {
        let result = assemble(Vec::new(), 5, &GenericTopic, Vec::new());
        assert!(result.phrases.is_empty());
        assert!(result.warning.is_some());
        assert_eq!(result.topic, "Phrase");
    }

    #[test]
    fn response_hides_statistics_unless_requested() {
        let result = assemble(vec![phrase("Top Pick", 12.345, 7)], 1, &GenericTopic, Vec::new());
        let bare = to_response(result.clone(), false);
        assert!(bare.phrases[0].score.is_none());
        assert!(bare.phrases[0].upvotes.is_none());

        let with_stats = to_response(result, true);
        assert_eq!(with_stats.phrases[0].score.as_deref(), Some("12.35"));
        assert_eq!(with_stats.phrases[0].upvotes, Some(7));
    }
}
