use thiserror::Error;

/// Rejections raised before any fetching starts. These surface to the caller
/// as a failed request with a machine-readable reason; no partial processing
/// happens once one is hit.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("at least one thread URL is required")]
    NoUrls,

    #[error("too many thread URLs: {got} (maximum {max})")]
    TooManyUrls { got: usize, max: usize },

    #[error("malformed thread URL: {url}")]
    MalformedUrl { url: String },

    #[error("top_n must be at least 1, got {0}")]
    TopNTooSmall(usize),

    #[error("min_ngram must be at least 1, got {0}")]
    MinNgramTooSmall(usize),

    #[error("max_ngram ({max}) must not be less than min_ngram ({min})")]
    NgramWindowInverted { min: usize, max: usize },
}

/// Failures after validation. Collaborator trouble on a single thread is
/// degraded to a warning, never an error; only a request where *no* thread
/// yields comments fails outright.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("no thread produced any comments: {detail}")]
    NoComments { detail: String },

    #[error("aggregation task failed: {0}")]
    AggregatorFailed(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
