use serde::{Deserialize, Serialize};

/// One discussion thread, as reported by the comment source.
/// Immutable after fetch; `title` is display-only and never scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub url: String,
    pub title: String,
    pub total_comment_count: usize,
}

/// One comment within a thread. `position_index` is the 0-based rank in the
/// source's native "best" ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub upvote_count: i64, // may be negative
    pub position_index: usize,
}

/// A single n-gram occurrence inside one comment. Ephemeral: produced by the
/// tokenizer, scored by the worker, consumed by the aggregator.
#[derive(Debug, Clone)]
pub struct CandidatePhrase {
    pub surface_form: String,  // as it appears, case preserved
    pub canonical_key: String, // case-folded, whitespace-normalized
    pub word_count: usize,
    pub comment_upvotes: i64,
    pub position_index: usize,
    pub occurrence_score: f64,
}

/// The fold of every [`CandidatePhrase`] sharing a canonical key, across all
/// threads in the request.
#[derive(Debug, Clone)]
pub struct AggregatedPhrase {
    pub canonical_key: String,
    pub display_form: String,
    /// Capitalized-word count of `display_form`, kept for the tie-break.
    pub display_capitalized: usize,
    pub total_score: f64,
    pub total_upvotes: i64,
    pub occurrence_count: usize,
}

/// Final, trimmed ranking plus the advisory metadata attached along the way.
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub phrases: Vec<AggregatedPhrase>,
    pub topic: String,
    pub warning: Option<String>,
}
