use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::api_types::{PhraseRequest, PhraseResponse};
use crate::assemble::{assemble, to_response, GenericTopic, TopicClassifier};
use crate::budget::{allocate, MAX_TOTAL_COMMENTS};
use crate::error::{EngineError, EngineResult, ValidationError};
use crate::fetch::CommentSource;
use crate::filter::PhraseFilter;
use crate::models::CandidatePhrase;
use crate::score::{occurrence_score, Aggregator, PositionDecay};
use crate::tokenize::ngrams;

/// Cap on threads per request; also sizes the fetch worker pool.
pub const MAX_THREADS_PER_REQUEST: usize = 5;

/// Default `max_ngram` when the request supplies neither `max_ngram` nor
/// `ngram_limit` (matches the form default).
pub const DEFAULT_MAX_NGRAM: usize = 5;

const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// The phrase extraction and ranking engine. One instance serves many
/// requests; no state is shared between them.
pub struct Engine {
    pub decay: PositionDecay,
    /// Single deadline for the whole request. Threads not fetched in time
    /// degrade to zero comments rather than failing the request.
    pub deadline: Duration,
    pub comment_cap: usize,
    pub topic: Box<dyn TopicClassifier>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            decay: PositionDecay::default(),
            deadline: DEFAULT_DEADLINE,
            comment_cap: MAX_TOTAL_COMMENTS,
            topic: Box::new(GenericTopic),
        }
    }
}

fn valid_url(url: &str) -> bool {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty())
}

/// Check the request and resolve the n-gram window. Rejected requests see no
/// partial processing.
fn validate(req: &PhraseRequest) -> Result<(usize, usize), ValidationError> {
    if req.urls.is_empty() {
        return Err(ValidationError::NoUrls);
    }
    if req.urls.len() > MAX_THREADS_PER_REQUEST {
        return Err(ValidationError::TooManyUrls {
            got: req.urls.len(),
            max: MAX_THREADS_PER_REQUEST,
        });
    }
    for url in &req.urls {
        if !valid_url(url) {
            return Err(ValidationError::MalformedUrl { url: url.clone() });
        }
    }
    if req.top_n < 1 {
        return Err(ValidationError::TopNTooSmall(req.top_n));
    }

    let min_ngram = req.min_ngram.unwrap_or(1);
    let max_ngram = req
        .max_ngram
        .or(req.ngram_limit)
        .unwrap_or(DEFAULT_MAX_NGRAM);
    if min_ngram < 1 {
        return Err(ValidationError::MinNgramTooSmall(min_ngram));
    }
    if max_ngram < min_ngram {
        return Err(ValidationError::NgramWindowInverted {
            min: min_ngram,
            max: max_ngram,
        });
    }
    Ok((min_ngram, max_ngram))
}

impl Engine {
    pub async fn run(
        &self,
        source: &Arc<dyn CommentSource>,
        req: &PhraseRequest,
    ) -> EngineResult<PhraseResponse> {
        let (min_ngram, max_ngram) = validate(req)?;
        let request_start = Instant::now();
        let deadline = request_start + self.deadline;
        let mut warnings: Vec<String> = Vec::new();

        info!(
            "Request started - threads={}, top_n={}, ngram_window={}..={}",
            req.urls.len(),
            req.top_n,
            min_ngram,
            max_ngram
        );

        // 1) thread metadata: fetched concurrently, consumed in caller order
        let metas = join_all(req.urls.iter().map(|url| {
            let source = Arc::clone(source);
            async move {
                let res = match timeout_at(deadline, source.fetch_thread_meta(url)).await {
                    Ok(res) => res,
                    Err(_) => Err(anyhow!("deadline exceeded fetching thread metadata")),
                };
                (url.clone(), res)
            }
        }))
        .await;

        // 2) budget allocation in caller-supplied order; first threads win
        let allocations = allocate(metas, self.comment_cap, &mut warnings);
        debug!(
            "Budget allocation done - threads={}, effective_total={}",
            allocations.len(),
            allocations.iter().map(|a| a.effective_count).sum::<usize>()
        );

        // 3) one aggregator task owns the phrase table; per-thread workers
        //    stream filtered candidate batches to it over a channel. Batches
        //    are slotted by caller index and folded in that order, so float
        //    summation stays reproducible regardless of fetch completion order.
        let slot_count = req.urls.len();
        let (tx, mut rx) = mpsc::channel::<(usize, Vec<CandidatePhrase>)>(MAX_THREADS_PER_REQUEST);
        let aggregator = tokio::spawn(async move {
            let mut slots: Vec<Option<Vec<CandidatePhrase>>> = vec![None; slot_count];
            while let Some((index, batch)) = rx.recv().await {
                slots[index] = Some(batch);
            }
            let mut agg = Aggregator::new();
            for batch in slots.into_iter().flatten() {
                agg.fold_batch(batch);
            }
            agg
        });

        let filter = Arc::new(PhraseFilter::new(
            &req.custom_words,
            req.apply_remove_lowercase,
        ));
        let decay = self.decay;

        let worker_results = join_all(
            allocations
                .iter()
                .filter(|alloc| alloc.effective_count > 0)
                .map(|alloc| {
                    let tx = tx.clone();
                    let filter = Arc::clone(&filter);
                    let source = Arc::clone(source);
                    async move {
                        let fetched = timeout_at(
                            deadline,
                            source.fetch_comments(&alloc.url, alloc.effective_count),
                        )
                        .await;
                        let comments = match fetched {
                            Ok(Ok(comments)) => comments,
                            Ok(Err(e)) => {
                                return Err(format!(
                                    "\"{}\" contributed no comments: {e:#}",
                                    alloc.title
                                ))
                            }
                            Err(_) => {
                                return Err(format!(
                                    "\"{}\" timed out and contributed no comments.",
                                    alloc.title
                                ))
                            }
                        };

                        let mut batch = Vec::new();
                        for comment in &comments {
                            // a phrase counts once per comment, no matter how
                            // often it repeats inside it
                            let mut seen: HashSet<String> = HashSet::new();
                            for mut candidate in ngrams(comment, min_ngram, max_ngram) {
                                if !filter.keep(&candidate) {
                                    continue;
                                }
                                if !seen.insert(candidate.canonical_key.clone()) {
                                    continue;
                                }
                                candidate.occurrence_score = occurrence_score(
                                    candidate.comment_upvotes,
                                    candidate.position_index,
                                    decay,
                                );
                                batch.push(candidate);
                            }
                        }
                        debug!(
                            "Worker finished - url={}, comments={}, candidates={}",
                            alloc.url,
                            comments.len(),
                            batch.len()
                        );
                        // the receiver outlives every worker; a send can only
                        // fail if the aggregator already panicked
                        let count = comments.len();
                        tx.send((alloc.index, batch))
                            .await
                            .map_err(|_| "aggregator stopped receiving".to_string())?;
                        Ok(count)
                    }
                }),
        )
        .await;
        drop(tx); // closes the channel so the aggregator can drain

        // worker_results is in allocation order, keeping warnings deterministic
        let mut total_comments = 0usize;
        for result in worker_results {
            match result {
                Ok(count) => total_comments += count,
                Err(message) => {
                    warn!("Thread degraded - {}", message);
                    warnings.push(message);
                }
            }
        }

        let agg = aggregator
            .await
            .map_err(|e| EngineError::AggregatorFailed(e.to_string()))?;

        if total_comments == 0 {
            return Err(EngineError::NoComments {
                detail: if warnings.is_empty() {
                    "no threads with comments".to_string()
                } else {
                    warnings.join(" ")
                },
            });
        }

        // 4) rank, trim, label, shape
        let distinct = agg.len();
        let result = assemble(agg.into_phrases(), req.top_n, self.topic.as_ref(), warnings);
        info!(
            "Request completed - duration={:.2}s, comments={}, distinct_phrases={}, returned={}",
            request_start.elapsed().as_secs_f32(),
            total_comments,
            distinct,
            result.phrases.len()
        );
        Ok(to_response(result, req.print_scores))
    }
}
