//! The scraped-post data model shared by the scraper and the exporters.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a harvested record relates to the page it was harvested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    ReplyTo,
    QuoteOf,
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationKind::ReplyTo => write!(f, "reply_to"),
            RelationKind::QuoteOf => write!(f, "quote_of"),
        }
    }
}

/// Back-reference to the parent post's permalink. Purely an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub kind: RelationKind,
    pub parent: String,
}

impl Relation {
    #[must_use]
    pub fn reply_to(parent: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::ReplyTo,
            parent: parent.into(),
        }
    }

    #[must_use]
    pub fn quote_of(parent: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::QuoteOf,
            parent: parent.into(),
        }
    }
}

/// One scraped post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Canonical post URL. This is the de-duplication key.
    pub permalink: String,
    /// Author handle without the leading `@`. Empty when unknown.
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    pub text: String,
    pub reply_count: u64,
    pub repost_count: u64,
    pub like_count: u64,
    pub view_count: Option<u64>,
    pub relation: Option<Relation>,
}

impl Record {
    /// Replies + reposts + likes. Views are not engagement.
    #[must_use]
    pub fn total_engagement(&self) -> u64 {
        self.reply_count
            .saturating_add(self.repost_count)
            .saturating_add(self.like_count)
    }

    /// Parent permalink when this record is a reply.
    #[must_use]
    pub fn reply_to(&self) -> Option<&str> {
        self.relation
            .as_ref()
            .filter(|r| r.kind == RelationKind::ReplyTo)
            .map(|r| r.parent.as_str())
    }

    /// Parent permalink when this record is a quote.
    #[must_use]
    pub fn quote_of(&self) -> Option<&str> {
        self.relation
            .as_ref()
            .filter(|r| r.kind == RelationKind::QuoteOf)
            .map(|r| r.parent.as_str())
    }
}

/// Sort records newest first. Records without a timestamp go last, keeping
/// their discovery order among themselves.
pub fn sort_newest_first(records: &mut [Record]) {
    records.sort_by(|a, b| match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
