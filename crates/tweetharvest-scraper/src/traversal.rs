//! Reply and quote fan-out: for each parent post, collect its replies and
//! its quote posts, then put the surface back where it was.

use std::time::Duration;

use tweetharvest_core::{Record, Relation};

use crate::collector::{
    collect, Collection, CollectionOutcome, CollectPlan, CollectorLimits, RecordFilter,
};
use crate::error::ScraperError;
use crate::feed::{open_feed, FeedTarget};
use crate::pacing::{settle, Pacer};
use crate::surface::RenderSurface;

#[derive(Debug, Clone)]
pub struct TraversalOptions {
    pub base_url: String,
    pub replies_per_record: usize,
    pub quotes_per_record: usize,
    /// Pass budget for each sub-collection.
    pub max_passes: usize,
    pub stall_limit: usize,
    /// Wait after opening a sub-page or going back.
    pub settle: Duration,
    /// Delay between render-more requests on sub-pages.
    pub scroll_pacer: Pacer,
    /// Delay between consecutive parent records.
    pub record_pacer: Pacer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHarvest {
    pub parent: String,
    pub replies: Option<Collection>,
    pub quotes: Option<Collection>,
}

/// Replies and quotes across all parents, each in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngagementHarvest {
    pub replies: Vec<Record>,
    pub quotes: Vec<Record>,
    pub parents_visited: usize,
}

struct Checkpoint {
    location: String,
    scroll: f64,
}

/// Collect the replies and quotes of one parent record.
///
/// A sub-view with a zero target is skipped.
///
/// # Errors
///
/// Returns [`ScraperError::SurfaceUnavailable`] if the surface goes away while
/// opening or reading either sub-page. A sub-page whose navigation fails
/// transiently yields an empty collection; failure to restore the previous
/// page is logged only.
pub async fn harvest_thread<S>(
    surface: &mut S,
    parent: &Record,
    opts: &TraversalOptions,
) -> Result<ThreadHarvest, ScraperError>
where
    S: RenderSurface + ?Sized,
{
    let replies = if opts.replies_per_record > 0 {
        let target = FeedTarget::Replies {
            permalink: parent.permalink.clone(),
        };
        let plan = sub_plan(opts, opts.replies_per_record, parent)
            .with_relation(Relation::reply_to(&parent.permalink));
        Some(harvest_view(surface, &target, &plan, opts).await?)
    } else {
        None
    };

    let quotes = if opts.quotes_per_record > 0 {
        let target = FeedTarget::Quotes {
            permalink: parent.permalink.clone(),
        };
        let plan = sub_plan(opts, opts.quotes_per_record, parent)
            .with_relation(Relation::quote_of(&parent.permalink));
        Some(harvest_view(surface, &target, &plan, opts).await?)
    } else {
        None
    };

    Ok(ThreadHarvest {
        parent: parent.permalink.clone(),
        replies,
        quotes,
    })
}

/// Run [`harvest_thread`] for every parent, pausing between parents.
///
/// # Errors
///
/// Stops at the first [`ScraperError::SurfaceUnavailable`] and returns it.
pub async fn harvest_engagement<S>(
    surface: &mut S,
    parents: &[Record],
    opts: &TraversalOptions,
) -> Result<EngagementHarvest, ScraperError>
where
    S: RenderSurface + ?Sized,
{
    let mut harvest = EngagementHarvest::default();

    for (index, parent) in parents.iter().enumerate() {
        if index > 0 {
            opts.record_pacer.pause().await;
        }

        tracing::info!(
            parent = %parent.permalink,
            position = index + 1,
            total = parents.len(),
            "harvesting thread"
        );

        let thread = harvest_thread(surface, parent, opts).await?;
        let replies = thread.replies.map(|c| c.records).unwrap_or_default();
        let quotes = thread.quotes.map(|c| c.records).unwrap_or_default();
        tracing::info!(
            parent = %parent.permalink,
            replies = replies.len(),
            quotes = quotes.len(),
            "thread harvested"
        );

        harvest.replies.extend(replies);
        harvest.quotes.extend(quotes);
        harvest.parents_visited += 1;
    }

    Ok(harvest)
}

fn sub_plan(opts: &TraversalOptions, target_count: usize, parent: &Record) -> CollectPlan {
    CollectPlan::new(CollectorLimits::new(
        target_count,
        opts.max_passes,
        opts.stall_limit,
    ))
    .with_filter(RecordFilter::excluding(&parent.permalink))
}

async fn harvest_view<S>(
    surface: &mut S,
    target: &FeedTarget,
    plan: &CollectPlan,
    opts: &TraversalOptions,
) -> Result<Collection, ScraperError>
where
    S: RenderSurface + ?Sized,
{
    let checkpoint = checkpoint(surface).await;

    let collection = match open_feed(surface, target, &opts.base_url, opts.settle).await {
        Ok(_) => collect(surface, plan, &opts.scroll_pacer).await?,
        Err(ScraperError::NavigationFailed { url, reason }) => {
            tracing::warn!(%url, %reason, "sub-page did not open; skipping it");
            if let Some(checkpoint) = checkpoint {
                return_to(surface, &checkpoint, opts.settle).await;
            }
            return Ok(Collection {
                records: Vec::new(),
                outcome: CollectionOutcome::ExhaustedFeed,
                passes: 0,
            });
        }
        Err(e) => return Err(e),
    };

    if let Some(checkpoint) = checkpoint {
        restore(surface, &checkpoint, opts.settle).await;
    }
    Ok(collection)
}

async fn checkpoint<S>(surface: &mut S) -> Option<Checkpoint>
where
    S: RenderSurface + ?Sized,
{
    let location = match surface.current_location().await {
        Ok(location) => location,
        Err(e) => {
            tracing::warn!(error = %e, "could not read location; page will not be restored");
            return None;
        }
    };
    let scroll = surface.scroll_offset().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read scroll offset");
        0.0
    });
    Some(Checkpoint { location, scroll })
}

/// Back in history, then [`return_to`] the saved page. Every failure here is
/// logged and ignored.
async fn restore<S>(surface: &mut S, checkpoint: &Checkpoint, settle_for: Duration)
where
    S: RenderSurface + ?Sized,
{
    if let Err(e) = surface.history_back().await {
        tracing::warn!(error = %e, "history back failed");
    }
    settle(settle_for).await;
    return_to(surface, checkpoint, settle_for).await;
}

/// Navigate directly to the saved page unless already there, then restore
/// the scroll offset.
async fn return_to<S>(surface: &mut S, checkpoint: &Checkpoint, settle_for: Duration)
where
    S: RenderSurface + ?Sized,
{
    let landed = surface.current_location().await.ok();
    if landed.as_deref() != Some(checkpoint.location.as_str()) {
        tracing::debug!(
            expected = %checkpoint.location,
            landed = landed.as_deref().unwrap_or("<unknown>"),
            "not on the saved page; navigating directly"
        );
        if let Err(e) = surface.navigate(&checkpoint.location).await {
            tracing::warn!(
                location = %checkpoint.location,
                error = %e,
                "restore navigation failed"
            );
            return;
        }
        settle(settle_for).await;
    }

    if let Err(e) = surface.restore_scroll(checkpoint.scroll).await {
        tracing::warn!(error = %e, "scroll restore failed");
    }
}
