use serde::{Deserialize, Serialize};

/// Request shape sent by the form UI / proxy layer.
///
/// Either `min_ngram`/`max_ngram` or the single `ngram_limit` field may be
/// supplied; `ngram_limit` means `max_ngram` with `min_ngram` defaulting to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseRequest {
    pub urls: Vec<String>,
    pub top_n: usize,
    #[serde(default)]
    pub min_ngram: Option<usize>,
    #[serde(default)]
    pub max_ngram: Option<usize>,
    #[serde(default)]
    pub ngram_limit: Option<usize>,
    /// Comma-separated, case-insensitive exclusion list. May be empty.
    #[serde(default)]
    pub custom_words: String,
    #[serde(default)]
    pub apply_remove_lowercase: bool,
    /// Response-shaping only: include per-phrase score/upvote fields.
    #[serde(default)]
    pub print_scores: bool,
}

/// One ranked phrase in the response. `score` and `upvotes` are present only
/// when statistics were requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPhrase {
    pub phrase: String,
    /// Two-decimal string, e.g. "123.45".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upvotes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseResponse {
    pub phrases: Vec<RankedPhrase>,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
