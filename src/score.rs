use std::collections::HashMap;

use tracing::debug;

use crate::filter::capitalized_words;
use crate::models::{AggregatedPhrase, CandidatePhrase};

/// Position-decay policy: how much a comment's rank within its thread damps
/// the phrases it contributes. Must be monotonically non-increasing in the
/// position index. Replaceable so the curve can be recalibrated without
/// touching aggregation.
#[derive(Debug, Clone, Copy)]
pub enum PositionDecay {
    /// `1 / (1 + rate * index)`. Early comments score slightly higher; with
    /// the default rate of 0.005 the weight falls to 0.5 at index 200.
    Harmonic { rate: f64 },
    /// No positional damping; every comment weighs the same.
    Flat,
}

impl Default for PositionDecay {
    fn default() -> Self {
        PositionDecay::Harmonic { rate: 0.005 }
    }
}

impl PositionDecay {
    pub fn weight(&self, position_index: usize) -> f64 {
        match *self {
            PositionDecay::Harmonic { rate } => 1.0 / (1.0 + rate * position_index as f64),
            PositionDecay::Flat => 1.0,
        }
    }
}

/// Base weight from a comment's upvote count. Clamped so a net-negative
/// comment still contributes a strictly positive occurrence.
pub fn upvote_weight(upvote_count: i64) -> f64 {
    (upvote_count.max(0) + 1) as f64
}

pub fn occurrence_score(upvote_count: i64, position_index: usize, decay: PositionDecay) -> f64 {
    upvote_weight(upvote_count) * decay.weight(position_index)
}

/// Folds scored candidates into one phrase table, grouped by canonical key.
///
/// Owned by a single task; candidates must be fed in thread-supplied order,
/// then position order, so the floating-point sums are reproducible for
/// identical input.
pub struct Aggregator {
    table: HashMap<String, AggregatedPhrase>,
    // first-encounter order, so iteration is deterministic
    order: Vec<String>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn fold(&mut self, candidate: CandidatePhrase) {
        match self.table.get_mut(&candidate.canonical_key) {
            Some(agg) => {
                agg.total_score += candidate.occurrence_score;
                agg.total_upvotes += candidate.comment_upvotes;
                agg.occurrence_count += 1;
                // display form: most capitalized words wins; ties keep the
                // first encountered (thread-then-position order)
                let caps = capitalized_words(&candidate.surface_form);
                if caps > agg.display_capitalized {
                    agg.display_form = candidate.surface_form;
                    agg.display_capitalized = caps;
                }
            }
            None => {
                let caps = capitalized_words(&candidate.surface_form);
                self.order.push(candidate.canonical_key.clone());
                self.table.insert(
                    candidate.canonical_key.clone(),
                    AggregatedPhrase {
                        canonical_key: candidate.canonical_key,
                        display_form: candidate.surface_form,
                        display_capitalized: caps,
                        total_score: candidate.occurrence_score,
                        total_upvotes: candidate.comment_upvotes,
                        occurrence_count: 1,
                    },
                );
            }
        }
    }

    pub fn fold_batch(&mut self, batch: Vec<CandidatePhrase>) {
        for candidate in batch {
            self.fold(candidate);
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Drain the table in first-encounter order.
    pub fn into_phrases(mut self) -> Vec<AggregatedPhrase> {
        debug!("Aggregation table drained - distinct_phrases={}", self.order.len());
        self.order
            .iter()
            .filter_map(|key| self.table.remove(key))
            .collect()
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(surface: &str, upvotes: i64, position: usize, decay: PositionDecay) -> CandidatePhrase {
        CandidatePhrase {
            surface_form: surface.to_string(),
            canonical_key: crate::tokenize::canonical_key(surface),
            word_count: surface.split_whitespace().count(),
            comment_upvotes: upvotes,
            position_index: position,
            occurrence_score: occurrence_score(upvotes, position, decay),
        }
    }

    #[test]
    fn upvote_weight_is_strictly_positive() {
        assert_eq!(upvote_weight(10), 11.0);
        assert_eq!(upvote_weight(0), 1.0);
        assert_eq!(upvote_weight(-25), 1.0);
    }

    #[test]
    fn harmonic_decay_is_non_increasing() {
        let decay = PositionDecay::default();
        let mut prev = decay.weight(0);
        assert_eq!(prev, 1.0);
        for i in 1..500 {
            let w = decay.weight(i);
            assert!(w <= prev, "decay increased at index {i}");
            assert!(w > 0.0);
            prev = w;
        }
    }

    #[test]
    fn harmonic_decay_halves_at_inverse_rate() {
        let decay = PositionDecay::Harmonic { rate: 0.005 };
        assert!((decay.weight(200) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn flat_decay_ignores_position() {
        let decay = PositionDecay::Flat;
        assert_eq!(decay.weight(0), decay.weight(4999));
    }

    #[test]
    fn fold_merges_case_variants() {
        let decay = PositionDecay::default();
        let mut agg = Aggregator::new();
        agg.fold(candidate("Great Movie Title", 10, 0, decay));
        agg.fold(candidate("great movie title", 2, 5, decay));

        let phrases = agg.into_phrases();
        assert_eq!(phrases.len(), 1);
        let p = &phrases[0];
        assert_eq!(p.canonical_key, "great movie title");
        assert_eq!(p.display_form, "Great Movie Title");
        assert_eq!(p.total_upvotes, 12);
        assert_eq!(p.occurrence_count, 2);
        let expected = occurrence_score(10, 0, decay) + occurrence_score(2, 5, decay);
        assert_eq!(p.total_score, expected);
    }

    #[test]
    fn display_form_tie_keeps_first_encountered() {
        let decay = PositionDecay::Flat;
        let mut agg = Aggregator::new();
        agg.fold(candidate("Blade runner", 1, 0, decay));
        agg.fold(candidate("blade Runner", 1, 1, decay));

        let phrases = agg.into_phrases();
        assert_eq!(phrases[0].display_form, "Blade runner");
    }

    #[test]
    fn more_capitalized_display_form_wins_later() {
        let decay = PositionDecay::Flat;
        let mut agg = Aggregator::new();
        agg.fold(candidate("blade runner", 1, 0, decay));
        agg.fold(candidate("Blade Runner", 1, 1, decay));

        let phrases = agg.into_phrases();
        assert_eq!(phrases[0].display_form, "Blade Runner");
    }

    #[test]
    fn total_score_is_sum_of_occurrence_scores() {
        let decay = PositionDecay::default();
        let inputs = [(3i64, 0usize), (7, 2), (-4, 9), (0, 40)];
        let mut agg = Aggregator::new();
        let mut expected = 0.0;
        for (upvotes, pos) in inputs {
            let c = candidate("Same Phrase", upvotes, pos, decay);
            expected += c.occurrence_score;
            agg.fold(c);
        }
        let phrases = agg.into_phrases();
        assert_eq!(phrases[0].total_score, expected);
        assert_eq!(phrases[0].occurrence_count, 4);
    }
}
