use itertools::Itertools;
use unicode_normalization::UnicodeNormalization;

use crate::models::{CandidatePhrase, Comment};

/// Split raw comment text into words: maximal runs of letters and digits,
/// with apostrophes/hyphens kept only when they sit between two word
/// characters ("don't", "spider-man"). Leading/trailing punctuation never
/// survives into a word, so no phrase can start or end on a punctuation
/// boundary.
pub fn words(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].1.is_alphanumeric() {
            i += 1;
            continue;
        }
        let start = chars[i].0;
        let mut last = i; // index of last char included in the word
        let mut j = i + 1;
        while j < chars.len() {
            let c = chars[j].1;
            if c.is_alphanumeric() {
                last = j;
                j += 1;
            } else if (c == '\'' || c == '’' || c == '-')
                && j + 1 < chars.len()
                && chars[j + 1].1.is_alphanumeric()
            {
                // internal connector: keep scanning, the next alnum extends the word
                j += 1;
            } else {
                break;
            }
        }
        let end = chars[last].0 + chars[last].1.len_utf8();
        out.push(&text[start..end]);
        i = j;
    }
    out
}

/// Case/whitespace-normalized identity for a surface form: NFC fold,
/// lowercased, single-spaced, curly apostrophes folded to ASCII. Two phrases
/// differing only by case, spacing, or apostrophe glyph collapse to the same
/// key.
pub fn canonical_key(surface: &str) -> String {
    surface
        .split_whitespace()
        .map(|w| {
            w.nfc()
                .map(|c| if c == '’' { '\'' } else { c })
                .collect::<String>()
                .to_lowercase()
        })
        .join(" ")
}

/// Lazily generate every n-gram of the comment whose word length falls in
/// `[min_ngram, max_ngram]`, in position order (by start word, then length).
///
/// This stage is a pure generator: no filtering beyond the length window, no
/// scoring. `occurrence_score` is left at zero for the scoring stage to fill.
pub fn ngrams<'a>(comment: &'a Comment, min_ngram: usize, max_ngram: usize) -> NgramIter<'a> {
    NgramIter {
        comment,
        words: words(&comment.text),
        min: min_ngram,
        max: max_ngram,
        start: 0,
        n: min_ngram,
    }
}

pub struct NgramIter<'a> {
    comment: &'a Comment,
    words: Vec<&'a str>,
    min: usize,
    max: usize,
    start: usize,
    n: usize,
}

impl Iterator for NgramIter<'_> {
    type Item = CandidatePhrase;

    fn next(&mut self) -> Option<CandidatePhrase> {
        loop {
            if self.start >= self.words.len() {
                return None;
            }
            if self.n > self.max || self.start + self.n > self.words.len() {
                self.start += 1;
                self.n = self.min;
                continue;
            }
            let surface = self.words[self.start..self.start + self.n].join(" ");
            let key = canonical_key(&surface);
            let out = CandidatePhrase {
                surface_form: surface,
                canonical_key: key,
                word_count: self.n,
                comment_upvotes: self.comment.upvote_count,
                position_index: self.comment.position_index,
                occurrence_score: 0.0,
            };
            self.n += 1;
            return Some(out);
        }
    }
}
