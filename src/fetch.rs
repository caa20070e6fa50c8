use std::sync::LazyLock;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::models::{Comment, Thread};

const USER_AGENT: &str = "ReddiGist/1.0";

static SUBMISSION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/comments/([^/]+)/").expect("submission id regex"));

/// The external collaborator that supplies thread metadata and a flattened,
/// ordered comment list. Ordering is the source's native best/top ordering;
/// `max_count` enforces head-truncation at the adapter boundary so bandwidth
/// stays bounded.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn fetch_thread_meta(&self, url: &str) -> Result<Thread>;
    async fn fetch_comments(&self, url: &str, max_count: usize) -> Result<Vec<Comment>>;
}

/// Comment source backed by Reddit's public `.json` endpoints.
pub struct RedditJsonSource {
    client: Client,
}

impl RedditJsonSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Building HTTP client")?;
        Ok(Self { client })
    }
}

/// Extract the submission id from a Reddit thread URL.
pub fn submission_id(url: &str) -> Option<&str> {
    SUBMISSION_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[async_trait]
impl CommentSource for RedditJsonSource {
    async fn fetch_thread_meta(&self, url: &str) -> Result<Thread> {
        let id = submission_id(url).ok_or_else(|| anyhow!("Not a Reddit thread URL: {url}"))?;
        let api_url = format!("https://www.reddit.com/comments/{id}.json?limit=1");

        debug!("Fetching thread metadata - url={}", url);
        let resp = self
            .client
            .get(&api_url)
            .send()
            .await
            .with_context(|| format!("Request failed for {api_url}"))?
            .error_for_status()
            .with_context(|| format!("HTTP error for {api_url}"))?;

        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("Decoding JSON for {api_url}"))?;

        let post = &body[0]["data"]["children"][0]["data"];
        let title = post["title"]
            .as_str()
            .ok_or_else(|| anyhow!("No post title in response for {url}"))?
            .to_string();
        let total_comment_count = post["num_comments"].as_u64().unwrap_or(0) as usize;

        debug!(
            "Thread metadata - url={}, title={:?}, comments={}",
            url, title, total_comment_count
        );
        Ok(Thread {
            url: url.to_string(),
            title,
            total_comment_count,
        })
    }

    async fn fetch_comments(&self, url: &str, max_count: usize) -> Result<Vec<Comment>> {
        let id = submission_id(url).ok_or_else(|| anyhow!("Not a Reddit thread URL: {url}"))?;
        let api_url =
            format!("https://www.reddit.com/comments/{id}.json?limit={max_count}&sort=confidence");
        let start = std::time::Instant::now();

        let resp = self
            .client
            .get(&api_url)
            .send()
            .await
            .with_context(|| format!("Request failed for {api_url}"))?
            .error_for_status()
            .with_context(|| format!("HTTP error for {api_url}"))?;

        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("Decoding JSON for {api_url}"))?;

        let mut comments = Vec::new();
        flatten_comments(&body[1], &mut comments, max_count);

        info!(
            "Comment fetch completed - url={}, duration={:.2}s, comments={}",
            url,
            start.elapsed().as_secs_f32(),
            comments.len()
        );
        Ok(comments)
    }
}

/// Depth-first walk over a Reddit comment listing, assigning 0-based position
/// indices in traversal order and stopping at `max_count`.
fn flatten_comments(listing: &Value, out: &mut Vec<Comment>, max_count: usize) {
    let Some(children) = listing["data"]["children"].as_array() else {
        return;
    };
    for child in children {
        if out.len() >= max_count {
            return;
        }
        if child["kind"].as_str() != Some("t1") {
            continue;
        }
        let data = &child["data"];
        let Some(body) = data["body"].as_str() else {
            continue;
        };
        out.push(Comment {
            text: body.to_string(),
            upvote_count: data["ups"].as_i64().unwrap_or(0),
            position_index: out.len(),
        });
        // replies is "" when absent, a listing object otherwise
        if data["replies"].is_object() {
            flatten_comments(&data["replies"], out, max_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submission_id_from_thread_url() {
        let url = "https://www.reddit.com/r/movies/comments/abc123/best_scifi_movies/";
        assert_eq!(submission_id(url), Some("abc123"));
        assert_eq!(submission_id("https://example.com/not/reddit"), None);
    }

    #[test]
    fn flatten_walks_replies_depth_first_and_caps() {
        let listing = json!({
            "data": { "children": [
                { "kind": "t1", "data": {
                    "body": "first", "ups": 10,
                    "replies": { "data": { "children": [
                        { "kind": "t1", "data": { "body": "first child", "ups": 3, "replies": "" } }
                    ]}}
                }},
                { "kind": "t1", "data": { "body": "second", "ups": 5, "replies": "" } },
                { "kind": "more", "data": {} }
            ]}
        });

        let mut out = Vec::new();
        flatten_comments(&listing, &mut out, 10);
        let texts: Vec<&str> = out.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "first child", "second"]);
        assert_eq!(out[1].position_index, 1);

        let mut capped = Vec::new();
        flatten_comments(&listing, &mut capped, 2);
        assert_eq!(capped.len(), 2);
    }
}
