//! Scrape job handlers: browser setup, feed collection, thread fan-out and
//! CSV output.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tweetharvest_core::{
    query_file_stem, sort_newest_first, AppConfig, EngagementSummary, SearchTab, ThreadSummary,
};
use tweetharvest_scraper::{
    collect, establish_session, harvest_engagement, open_feed, BrowserOptions, ChromiumSurface,
    Collection, CollectPlan, CollectorLimits, FeedTarget, LoginOptions, LoginState, Pacer,
    RecordFilter, RenderSurface, SessionStore, TraversalOptions,
};

use crate::output;

pub(crate) const PROFILE_MAX_TWEETS: usize = 500;
pub(crate) const PROFILE_MAX_SCROLLS: usize = 50;
pub(crate) const ENGAGEMENT_MAX_TWEETS: usize = 200;
pub(crate) const ENGAGEMENT_MAX_SCROLLS: usize = 30;
pub(crate) const REPLIES_PER_TWEET: usize = 50;
pub(crate) const QUOTES_PER_TWEET: usize = 50;
pub(crate) const SUB_SCROLLS: usize = 30;

const WINDOW_SIZE: (u32, u32) = (1920, 1080);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProfileJob {
    pub handle: String,
    pub max_tweets: usize,
    pub max_scrolls: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchJob {
    pub query: String,
    pub tab: SearchTab,
    pub max_tweets: usize,
    pub max_scrolls: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EngagementJob {
    pub handle: String,
    pub max_tweets: usize,
    pub max_scrolls: usize,
    pub replies_per_tweet: usize,
    pub quotes_per_tweet: usize,
    pub sub_scrolls: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Job {
    Profile(ProfileJob),
    Search(SearchJob),
    Engagement(EngagementJob),
}

impl Job {
    pub(crate) fn describe(&self) -> String {
        match self {
            Job::Profile(job) => format!("profile @{}", job.handle),
            Job::Search(job) => format!("search \"{}\"", job.query),
            Job::Engagement(job) => format!("engagement @{}", job.handle),
        }
    }
}

/// Files written by one job.
#[derive(Debug, Default)]
pub(crate) struct JobReport {
    pub files: Vec<PathBuf>,
    pub records: usize,
}

pub(crate) fn browser_options(config: &AppConfig) -> BrowserOptions {
    BrowserOptions {
        headless: config.headless,
        chrome_path: config.chrome_path.clone(),
        user_agent: config.user_agent.clone(),
        window_size: WINDOW_SIZE,
        navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
    }
}

pub(crate) fn login_options(config: &AppConfig) -> LoginOptions {
    LoginOptions {
        account: config.account.clone(),
        base_url: config.base_url.clone(),
        timeout: Duration::from_secs(config.login_timeout_secs),
        poll_interval: Duration::from_secs(config.login_poll_secs),
        settle: Duration::from_millis(config.page_settle_ms),
        allow_manual: config.allow_manual_login,
        allow_anonymous: config.allow_anonymous,
    }
}

/// Launch the browser and bring it into a logged-in or anonymous state.
///
/// The browser is closed again if the login step fails.
pub(crate) async fn open_browser(
    config: &AppConfig,
) -> anyhow::Result<(ChromiumSurface, LoginState)> {
    let mut surface = ChromiumSurface::launch(&browser_options(config))
        .await
        .context("failed to launch browser")?;

    let store = SessionStore::new(&config.session_dir);
    match establish_session(&mut surface, &store, &login_options(config)).await {
        Ok(state) => {
            tracing::info!(account = %config.account, %state, "browser ready");
            Ok((surface, state))
        }
        Err(e) => {
            close_browser(surface).await;
            Err(e).context("failed to establish a session")
        }
    }
}

pub(crate) async fn close_browser(surface: ChromiumSurface) {
    if let Err(e) = surface.close().await {
        tracing::warn!(error = %e, "browser did not close cleanly");
    }
}

/// Run one job in a fresh browser.
pub(crate) async fn run_single(config: &AppConfig, job: &Job) -> anyhow::Result<()> {
    let (mut surface, _) = open_browser(config).await?;
    let result = run_job(&mut surface, config, job).await;
    close_browser(surface).await;

    let report = result?;
    tracing::info!(
        job = %job.describe(),
        files = report.files.len(),
        records = report.records,
        "job finished"
    );
    Ok(())
}

/// Run one job on an already prepared surface.
pub(crate) async fn run_job<S>(
    surface: &mut S,
    config: &AppConfig,
    job: &Job,
) -> anyhow::Result<JobReport>
where
    S: RenderSurface + ?Sized,
{
    match job {
        Job::Profile(job) => run_profile(surface, config, job).await,
        Job::Search(job) => run_search(surface, config, job).await,
        Job::Engagement(job) => run_engagement(surface, config, job).await,
    }
}

async fn collect_timeline<S>(
    surface: &mut S,
    config: &AppConfig,
    handle: &str,
    max_tweets: usize,
    max_scrolls: usize,
) -> anyhow::Result<Collection>
where
    S: RenderSurface + ?Sized,
{
    let target = FeedTarget::Profile {
        handle: handle.to_string(),
    };
    open_feed(
        surface,
        &target,
        &config.base_url,
        Duration::from_millis(config.page_settle_ms),
    )
    .await
    .with_context(|| format!("failed to open profile @{handle}"))?;

    let plan = CollectPlan::new(CollectorLimits::new(
        max_tweets,
        max_scrolls,
        config.stall_limit,
    ))
    .with_filter(RecordFilter::by_author(handle));

    let collection = collect(surface, &plan, &Pacer::from_range(config.scroll_delay))
        .await
        .with_context(|| format!("failed to collect posts from @{handle}"))?;
    Ok(collection)
}

async fn run_profile<S>(
    surface: &mut S,
    config: &AppConfig,
    job: &ProfileJob,
) -> anyhow::Result<JobReport>
where
    S: RenderSurface + ?Sized,
{
    let collection =
        collect_timeline(surface, config, &job.handle, job.max_tweets, job.max_scrolls).await?;
    tracing::info!(
        handle = %job.handle,
        collected = collection.records.len(),
        outcome = %collection.outcome,
        "profile collected"
    );

    let mut records = collection.records;
    sort_newest_first(&mut records);

    let mut report = JobReport::default();
    let stem = format!("{}_tweets", job.handle);
    if let Some(path) = output::write_table(&config.data_dir, &stem, &records, Utc::now())? {
        report.files.push(path);
    }
    report.records = records.len();

    output::print_engagement_summary(
        &format!("@{}", job.handle),
        &EngagementSummary::from_records(&records),
    );
    Ok(report)
}

async fn run_search<S>(
    surface: &mut S,
    config: &AppConfig,
    job: &SearchJob,
) -> anyhow::Result<JobReport>
where
    S: RenderSurface + ?Sized,
{
    let target = FeedTarget::Search {
        query: job.query.clone(),
        tab: job.tab,
    };
    open_feed(
        surface,
        &target,
        &config.base_url,
        Duration::from_millis(config.page_settle_ms),
    )
    .await
    .with_context(|| format!("failed to open search \"{}\"", job.query))?;

    let plan = CollectPlan::new(CollectorLimits::new(
        job.max_tweets,
        job.max_scrolls,
        config.stall_limit,
    ));
    let collection = collect(surface, &plan, &Pacer::from_range(config.scroll_delay))
        .await
        .with_context(|| format!("failed to collect search \"{}\"", job.query))?;
    tracing::info!(
        query = %job.query,
        collected = collection.records.len(),
        outcome = %collection.outcome,
        "search collected"
    );

    let mut records = collection.records;
    sort_newest_first(&mut records);

    let mut report = JobReport::default();
    let stem = query_file_stem(&job.query);
    if let Some(path) = output::write_table(&config.data_dir, &stem, &records, Utc::now())? {
        report.files.push(path);
    }
    report.records = records.len();

    output::print_engagement_summary(
        &format!("search \"{}\"", job.query),
        &EngagementSummary::from_records(&records),
    );
    Ok(report)
}

pub(crate) fn traversal_options(config: &AppConfig, job: &EngagementJob) -> TraversalOptions {
    TraversalOptions {
        base_url: config.base_url.clone(),
        replies_per_record: job.replies_per_tweet,
        quotes_per_record: job.quotes_per_tweet,
        max_passes: job.sub_scrolls,
        stall_limit: config.stall_limit,
        settle: Duration::from_millis(config.subpage_settle_ms),
        scroll_pacer: Pacer::from_range(config.subpage_scroll_delay),
        record_pacer: Pacer::from_range(config.record_delay),
    }
}

async fn run_engagement<S>(
    surface: &mut S,
    config: &AppConfig,
    job: &EngagementJob,
) -> anyhow::Result<JobReport>
where
    S: RenderSurface + ?Sized,
{
    let collection =
        collect_timeline(surface, config, &job.handle, job.max_tweets, job.max_scrolls).await?;
    let mut originals = collection.records;
    sort_newest_first(&mut originals);
    tracing::info!(
        handle = %job.handle,
        collected = originals.len(),
        "original posts collected; harvesting threads"
    );

    // The timeline table is on disk before the fan-out starts.
    let now = Utc::now();
    let mut report = JobReport::default();
    let stem = format!("{}_original_tweets", job.handle);
    if let Some(path) = output::write_table(&config.data_dir, &stem, &originals, now)? {
        report.files.push(path);
    }
    report.records += originals.len();

    let harvest = harvest_engagement(surface, &originals, &traversal_options(config, job))
        .await
        .with_context(|| format!("failed to harvest replies and quotes for @{}", job.handle))?;

    let tables = [
        (format!("{}_all_replies", job.handle), &harvest.replies),
        (format!("{}_all_quotes", job.handle), &harvest.quotes),
    ];
    for (stem, records) in tables {
        if let Some(path) = output::write_table(&config.data_dir, &stem, records, now)? {
            report.files.push(path);
        }
        report.records += records.len();
    }

    let label = format!("@{}", job.handle);
    output::print_engagement_summary(&label, &EngagementSummary::from_records(&originals));
    output::print_thread_summary("replies", &ThreadSummary::from_records(&harvest.replies));
    output::print_thread_summary("quotes", &ThreadSummary::from_records(&harvest.quotes));
    Ok(report)
}

#[cfg(test)]
#[path = "scrape_test.rs"]
mod tests;
