use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use reddigist::fetch::{CommentSource, RedditJsonSource};
use reddigist::{Engine, PhraseRequest};

/// ReddiGist - ranked recurring phrases from discussion threads
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Thread URLs (1-5; the first listed gets comment-budget priority)
    #[arg(required = true, num_args = 1..)]
    urls: Vec<String>,

    /// How many top phrases to return
    #[arg(short = 'n', long, default_value_t = 10)]
    top_n: usize,

    /// Largest phrase length in words
    #[arg(long, default_value_t = 5)]
    ngram_limit: usize,

    /// Smallest phrase length in words (default 1)
    #[arg(long)]
    min_ngram: Option<usize>,

    /// Comma-separated words to exclude; phrases containing one are dropped
    #[arg(long, default_value = "")]
    custom_words: String,

    /// Keep only phrases whose first and last words start uppercase
    #[arg(long)]
    remove_lowercase: bool,

    /// Include per-phrase score and upvote statistics in the output
    #[arg(long)]
    scores: bool,

    /// Request deadline in seconds; late threads degrade to zero comments
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    let args = Args::parse();
    info!("Starting reddigist - threads={}", args.urls.len());

    let request = PhraseRequest {
        urls: args.urls,
        top_n: args.top_n,
        min_ngram: args.min_ngram,
        max_ngram: None,
        ngram_limit: Some(args.ngram_limit),
        custom_words: args.custom_words,
        apply_remove_lowercase: args.remove_lowercase,
        print_scores: args.scores,
    };

    let engine = Engine {
        deadline: Duration::from_secs(args.timeout),
        ..Engine::default()
    };
    let source: Arc<dyn CommentSource> = Arc::new(RedditJsonSource::new()?);

    let response = engine.run(&source, &request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
