//! Maps rendered item snapshots into [`Record`]s.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tweetharvest_core::{Record, Relation};

use crate::counts::parse_count;
use crate::surface::RenderedItem;

static STATUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://[^/]+)?/([A-Za-z0-9_]+)/status(?:es)?/(\d+)").expect("valid regex")
});

/// Numeric status id of a post permalink.
///
/// `https://twitter.com/a/status/1` and `https://x.com/a/status/1?s=20` both
/// yield `"1"`.
#[must_use]
pub fn status_id(url: &str) -> Option<&str> {
    STATUS_RE
        .captures(url.trim())
        .and_then(|c| c.get(2))
        .map(|m| m.as_str())
}

/// Author handle segment of a post permalink.
#[must_use]
pub fn permalink_handle(url: &str) -> Option<&str> {
    STATUS_RE
        .captures(url.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Build a record from one rendered item.
///
/// Returns `None` when the item carries no permalink; every other missing
/// field falls back to its default.
#[must_use]
pub fn extract_record(item: &RenderedItem, relation: Option<&Relation>) -> Option<Record> {
    let permalink = item
        .permalink
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())?
        .to_string();

    let author = item
        .author_label
        .as_deref()
        .and_then(handle_from_label)
        .or_else(|| permalink_handle(&permalink))
        .unwrap_or_default()
        .to_string();

    let label_count = |label: Option<&str>| label.map_or(0, parse_count);

    Some(Record {
        author,
        published_at: item.timestamp.as_deref().and_then(parse_timestamp),
        text: item.text.clone().unwrap_or_default(),
        reply_count: label_count(item.reply_label.as_deref()),
        repost_count: label_count(item.repost_label.as_deref()),
        like_count: label_count(item.like_label.as_deref()),
        view_count: item
            .view_label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .map(parse_count),
        relation: relation.cloned(),
        permalink,
    })
}

/// The user-name block renders as `Display Name\n@handle\n·\n3h`.
fn handle_from_label(label: &str) -> Option<&str> {
    label
        .split_whitespace()
        .find_map(|token| token.strip_prefix('@'))
        .filter(|h| !h.is_empty())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
