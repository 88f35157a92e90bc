//! The incremental collector: enumerate, de-duplicate, request more, repeat
//! until the target is met, the feed stops yielding, or the pass budget runs
//! out.

use std::collections::HashSet;

use tweetharvest_core::{Record, Relation};

use crate::error::ScraperError;
use crate::extract::{extract_record, status_id};
use crate::pacing::Pacer;
use crate::surface::{RenderSurface, RenderedItem, SurfaceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorLimits {
    pub target_count: usize,
    pub max_passes: usize,
    /// Consecutive passes without a new record before the feed counts as
    /// exhausted. Values below 1 are treated as 1.
    pub stall_limit: usize,
}

impl CollectorLimits {
    #[must_use]
    pub fn new(target_count: usize, max_passes: usize, stall_limit: usize) -> Self {
        Self {
            target_count,
            max_passes,
            stall_limit: stall_limit.max(1),
        }
    }
}

/// Which extracted records a collection keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Keep only posts by this handle (case-insensitive, `@` optional).
    pub author: Option<String>,
    /// Drop the post with this permalink, typically the parent of a thread.
    pub exclude: Option<String>,
}

impl RecordFilter {
    #[must_use]
    pub fn by_author(handle: &str) -> Self {
        Self {
            author: Some(handle.trim_start_matches('@').to_string()),
            exclude: None,
        }
    }

    #[must_use]
    pub fn excluding(permalink: &str) -> Self {
        Self {
            author: None,
            exclude: Some(permalink.to_string()),
        }
    }

    #[must_use]
    pub fn accepts(&self, record: &Record) -> bool {
        if let Some(author) = &self.author {
            if !record
                .author
                .eq_ignore_ascii_case(author.trim_start_matches('@'))
            {
                return false;
            }
        }
        if let Some(excluded) = &self.exclude {
            if identity(&record.permalink) == identity(excluded) {
                return false;
            }
        }
        true
    }
}

/// Everything one collector run needs besides the surface and pacing.
#[derive(Debug, Clone)]
pub struct CollectPlan {
    pub limits: CollectorLimits,
    pub filter: RecordFilter,
    /// Annotation attached to every harvested record.
    pub relation: Option<Relation>,
}

impl CollectPlan {
    #[must_use]
    pub fn new(limits: CollectorLimits) -> Self {
        Self {
            limits,
            filter: RecordFilter::default(),
            relation: None,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relation = Some(relation);
        self
    }
}

/// Why a collection stopped. All three carry a usable partial result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOutcome {
    TargetReached,
    ExhaustedFeed,
    PassLimitReached,
}

impl std::fmt::Display for CollectionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionOutcome::TargetReached => write!(f, "target reached"),
            CollectionOutcome::ExhaustedFeed => write!(f, "feed exhausted"),
            CollectionOutcome::PassLimitReached => write!(f, "pass limit reached"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// Records in discovery order.
    pub records: Vec<Record>,
    pub outcome: CollectionOutcome,
    pub passes: usize,
}

/// De-duplication state of one collector run.
#[derive(Debug)]
pub struct CollectionSession {
    target_count: usize,
    seen: HashSet<String>,
    records: Vec<Record>,
}

impl CollectionSession {
    #[must_use]
    pub fn new(target_count: usize) -> Self {
        Self {
            target_count,
            seen: HashSet::new(),
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.target_count
    }

    /// Extract and keep every new, accepted item until the target is met.
    /// Returns how many records were added.
    pub fn absorb(&mut self, items: &[RenderedItem], plan: &CollectPlan) -> usize {
        let mut added = 0;
        for item in items {
            if self.is_full() {
                break;
            }
            let Some(record) = extract_record(item, plan.relation.as_ref()) else {
                continue;
            };
            if !plan.filter.accepts(&record) {
                continue;
            }
            if self.seen.insert(identity(&record.permalink).to_string()) {
                self.records.push(record);
                added += 1;
            }
        }
        added
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// De-duplication key: the status id when the permalink has one.
fn identity(permalink: &str) -> &str {
    status_id(permalink).unwrap_or(permalink)
}

/// Run the collector on whatever the surface currently shows.
///
/// # Errors
///
/// Returns [`ScraperError::SurfaceUnavailable`] when the surface cannot be
/// queried at all. Transient failures only cost the pass they happen in.
pub async fn collect<S>(
    surface: &mut S,
    plan: &CollectPlan,
    pacer: &Pacer,
) -> Result<Collection, ScraperError>
where
    S: RenderSurface + ?Sized,
{
    let limits = plan.limits;
    let mut session = CollectionSession::new(limits.target_count);
    let mut passes = 0usize;
    let mut stall = 0usize;

    let outcome = loop {
        if passes >= limits.max_passes {
            break CollectionOutcome::PassLimitReached;
        }
        if session.is_full() {
            break CollectionOutcome::TargetReached;
        }

        let items = match surface.enumerate_visible_items().await {
            Ok(items) => items,
            Err(e) if e.is_unavailable() => {
                return Err(unavailable(surface, "enumerate items", &e).await);
            }
            Err(e) => {
                tracing::warn!(
                    pass = passes,
                    error = %e,
                    "enumeration failed; treating pass as empty"
                );
                Vec::new()
            }
        };

        let added = session.absorb(&items, plan);
        tracing::debug!(
            pass = passes,
            visible = items.len(),
            added,
            collected = session.len(),
            "collector pass"
        );

        if session.is_full() {
            passes += 1;
            break CollectionOutcome::TargetReached;
        }

        if added == 0 {
            stall += 1;
        } else {
            stall = 0;
        }
        if stall >= limits.stall_limit {
            passes += 1;
            break CollectionOutcome::ExhaustedFeed;
        }

        match surface.request_more_content().await {
            Ok(()) => {}
            Err(e) if e.is_unavailable() => {
                return Err(unavailable(surface, "request more content", &e).await);
            }
            Err(e) => {
                tracing::warn!(pass = passes, error = %e, "render-more request failed");
            }
        }
        pacer.pause().await;
        passes += 1;
    };

    tracing::info!(
        collected = session.len(),
        passes,
        %outcome,
        "collection finished"
    );

    Ok(Collection {
        records: session.into_records(),
        outcome,
        passes,
    })
}

pub(crate) async fn unavailable<S>(surface: &mut S, step: &str, err: &SurfaceError) -> ScraperError
where
    S: RenderSurface + ?Sized,
{
    let location = surface
        .current_location()
        .await
        .unwrap_or_else(|_| "<unknown>".to_string());
    ScraperError::unavailable(location, step, err.reason())
}
