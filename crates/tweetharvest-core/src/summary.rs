//! Run summaries printed after a scrape finishes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::record::Record;

/// Totals and averages over a table of records.
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementSummary {
    pub count: usize,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    pub likes: u64,
    pub reposts: u64,
    pub replies: u64,
    pub mean_likes: f64,
    pub mean_reposts: f64,
    pub mean_replies: f64,
    /// Up to three records with the highest total engagement, best first.
    pub top: Vec<Record>,
}

impl EngagementSummary {
    #[must_use]
    pub fn from_records(records: &[Record]) -> Self {
        let total = |count: fn(&Record) -> u64| -> u64 {
            records.iter().map(count).fold(0, u64::saturating_add)
        };
        let likes = total(|r| r.like_count);
        let reposts = total(|r| r.repost_count);
        let replies = total(|r| r.reply_count);

        #[allow(clippy::cast_precision_loss)]
        let mean = |sum: u64| -> f64 {
            if records.is_empty() {
                0.0
            } else {
                sum as f64 / records.len() as f64
            }
        };

        let mut top: Vec<Record> = records.to_vec();
        // Stable sort keeps discovery order among ties.
        top.sort_by_key(|r| std::cmp::Reverse(r.total_engagement()));
        top.truncate(3);

        Self {
            count: records.len(),
            earliest: records.iter().filter_map(|r| r.published_at).min(),
            latest: records.iter().filter_map(|r| r.published_at).max(),
            likes,
            reposts,
            replies,
            mean_likes: mean(likes),
            mean_reposts: mean(reposts),
            mean_replies: mean(replies),
            top,
        }
    }
}

/// Fan-out view over harvested replies or quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSummary {
    pub count: usize,
    /// `(parent permalink, harvested count)`, most-harvested first.
    pub busiest_parents: Vec<(String, usize)>,
    /// `(author, count)`, most active first, at most three.
    pub top_authors: Vec<(String, usize)>,
}

impl ThreadSummary {
    #[must_use]
    pub fn from_records(records: &[Record]) -> Self {
        let mut per_parent: HashMap<&str, usize> = HashMap::new();
        let mut per_author: HashMap<&str, usize> = HashMap::new();

        for record in records {
            if let Some(relation) = &record.relation {
                *per_parent.entry(relation.parent.as_str()).or_default() += 1;
            }
            if !record.author.is_empty() {
                *per_author.entry(record.author.as_str()).or_default() += 1;
            }
        }

        Self {
            count: records.len(),
            busiest_parents: ranked(per_parent, 3),
            top_authors: ranked(per_author, 3),
        }
    }
}

/// Highest counts first; ties broken alphabetically so output is deterministic.
fn ranked(counts: HashMap<&str, usize>, limit: usize) -> Vec<(String, usize)> {
    let mut rows: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.truncate(limit);
    rows
}
