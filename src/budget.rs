use anyhow::Result;
use tracing::{debug, warn};

use crate::models::Thread;

/// Global cap on comments consumed across all threads in one request.
pub const MAX_TOTAL_COMMENTS: usize = 5000;

/// One thread's share of the comment budget.
#[derive(Debug, Clone)]
pub struct Allocation {
    /// Caller-supplied position; budget priority and all downstream ordering
    /// follow it.
    pub index: usize,
    pub url: String,
    pub title: String,
    pub total_comment_count: usize,
    /// How many of the thread's comments are actually processed. When below
    /// `total_comment_count`, only the head of the source's best ordering is
    /// retained.
    pub effective_count: usize,
}

/// Allocate the global comment budget over threads in caller-supplied order;
/// first-added threads get priority. A thread whose metadata fetch failed is
/// dropped with a warning rather than failing the request.
pub fn allocate(
    metas: Vec<(String, Result<Thread>)>,
    cap: usize,
    warnings: &mut Vec<String>,
) -> Vec<Allocation> {
    let mut remaining = cap;
    let mut allocations = Vec::new();

    for (index, (url, meta)) in metas.into_iter().enumerate() {
        let thread = match meta {
            Ok(t) => t,
            Err(e) => {
                warn!("Thread metadata fetch failed - url={}, error={:#}", url, e);
                warnings.push(format!("Skipped {url}: {e:#}"));
                continue;
            }
        };

        let effective = thread.total_comment_count.min(remaining);
        if effective < thread.total_comment_count {
            if effective == 0 {
                warnings.push(format!(
                    "Comment budget exhausted before \"{}\"; it contributed no comments.",
                    thread.title
                ));
            } else {
                warnings.push(format!(
                    "Only the first {} of {} comments from \"{}\" were processed (global cap {}).",
                    effective, thread.total_comment_count, thread.title, cap
                ));
            }
        }
        remaining -= effective;

        debug!(
            "Budget allocated - url={}, total={}, effective={}, remaining={}",
            url, thread.total_comment_count, effective, remaining
        );
        allocations.push(Allocation {
            index,
            url,
            title: thread.title,
            total_comment_count: thread.total_comment_count,
            effective_count: effective,
        });
    }

    allocations
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn meta(url: &str, title: &str, total: usize) -> (String, Result<Thread>) {
        (
            url.to_string(),
            Ok(Thread {
                url: url.to_string(),
                title: title.to_string(),
                total_comment_count: total,
            }),
        )
    }

    #[test]
    fn single_thread_under_cap_gets_everything() {
        let mut warnings = Vec::new();
        let allocs = allocate(vec![meta("u1", "t1", 300)], MAX_TOTAL_COMMENTS, &mut warnings);
        assert_eq!(allocs[0].effective_count, 300);
        assert!(warnings.is_empty());
    }

    #[test]
    fn oversized_thread_is_head_truncated_with_warning() {
        let mut warnings = Vec::new();
        let allocs = allocate(
            vec![meta("u1", "Big Thread", 7000)],
            MAX_TOTAL_COMMENTS,
            &mut warnings,
        );
        assert_eq!(allocs[0].effective_count, 5000);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Big Thread"));
        assert!(warnings[0].contains("5000"));
    }

    #[test]
    fn earlier_threads_have_priority() {
        let mut warnings = Vec::new();
        let allocs = allocate(
            vec![
                meta("u1", "first", 4000),
                meta("u2", "second", 2000),
                meta("u3", "third", 100),
            ],
            MAX_TOTAL_COMMENTS,
            &mut warnings,
        );
        assert_eq!(allocs[0].effective_count, 4000);
        assert_eq!(allocs[1].effective_count, 1000);
        assert_eq!(allocs[2].effective_count, 0);
        let total: usize = allocs.iter().map(|a| a.effective_count).sum();
        assert!(total <= MAX_TOTAL_COMMENTS);
        // one truncation warning, one exhaustion warning
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("second"));
        assert!(warnings[1].contains("third"));
    }

    #[test]
    fn failed_meta_is_dropped_with_warning() {
        let mut warnings = Vec::new();
        let allocs = allocate(
            vec![
                ("bad".to_string(), Err(anyhow!("connection refused"))),
                meta("u2", "good", 10),
            ],
            MAX_TOTAL_COMMENTS,
            &mut warnings,
        );
        assert_eq!(allocs.len(), 1);
        assert_eq!(allocs[0].url, "u2");
        assert_eq!(allocs[0].index, 1);
        assert!(warnings[0].contains("bad"));
    }
}
