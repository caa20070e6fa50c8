//! Phrase extraction and ranking engine for online discussion threads.
//!
//! Given 1-5 thread URLs, the engine fetches their comments through a
//! [`fetch::CommentSource`], extracts candidate n-gram phrases, filters and
//! scores them, and returns a ranked, deduplicated top-N list with aggregate
//! popularity scores and advisory warnings. The surrounding UI/proxy layers
//! consume it through [`api_types::PhraseRequest`] / [`api_types::PhraseResponse`].

pub mod api_types;
pub mod assemble;
pub mod budget;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod models;
pub mod score;
pub mod tokenize;

pub use api_types::{PhraseRequest, PhraseResponse, RankedPhrase};
pub use engine::Engine;
pub use error::{EngineError, EngineResult, ValidationError};
pub use fetch::{CommentSource, RedditJsonSource};
pub use score::PositionDecay;
