use std::collections::HashSet;

use tracing::debug;

use crate::models::CandidatePhrase;
use crate::tokenize::words;

/// Per-candidate lexical filters, applied between tokenization and
/// aggregation. Both rules are caller-toggleable and independent.
pub struct PhraseFilter {
    excluded: HashSet<String>,
    remove_lowercase: bool,
}

impl PhraseFilter {
    /// `custom_words` is the raw comma-separated exclusion list from the
    /// request; entries are trimmed and matched case-insensitively as whole
    /// words. Empty entries are ignored.
    pub fn new(custom_words: &str, remove_lowercase: bool) -> Self {
        let excluded: HashSet<String> = custom_words
            .split(',')
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        if !excluded.is_empty() {
            debug!(
                "Custom exclusion list loaded - words={}, remove_lowercase={}",
                excluded.len(),
                remove_lowercase
            );
        }
        Self {
            excluded,
            remove_lowercase,
        }
    }

    /// Whether a candidate survives. A phrase containing any excluded word is
    /// dropped entirely; keeping a partial phrase would change its n-gram
    /// length semantics.
    pub fn keep(&self, candidate: &CandidatePhrase) -> bool {
        if !self.excluded.is_empty() {
            let contains_excluded = candidate
                .canonical_key
                .split(' ')
                .any(|w| self.excluded.contains(w));
            if contains_excluded {
                return false;
            }
        }
        if self.remove_lowercase && !starts_and_ends_capitalized(&candidate.surface_form) {
            return false;
        }
        true
    }
}

/// Proper-noun/title heuristic: first and last words of the surface form must
/// begin with an uppercase letter. Evaluated on the surface form only, never
/// the canonical key.
fn starts_and_ends_capitalized(surface: &str) -> bool {
    let ws = words(surface);
    match (ws.first(), ws.last()) {
        (Some(first), Some(last)) => begins_uppercase(first) && begins_uppercase(last),
        _ => false,
    }
}

fn begins_uppercase(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Number of words in a surface form beginning with an uppercase letter.
/// Used by the aggregator to pick the best display form.
pub fn capitalized_words(surface: &str) -> usize {
    words(surface).iter().filter(|w| begins_uppercase(w)).count()
}
