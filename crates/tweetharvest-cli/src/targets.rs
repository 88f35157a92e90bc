//! `targets`: run every job listed in the targets file in one browser.
//!
//! Per-target failures are logged and counted rather than propagated so one
//! bad target does not abort the rest of the run.

use tweetharvest_core::{load_targets, AppConfig, TargetConfig, TargetKind};

use crate::scrape::{
    close_browser, open_browser, run_job, EngagementJob, Job, ProfileJob, SearchJob,
    ENGAGEMENT_MAX_SCROLLS, ENGAGEMENT_MAX_TWEETS, PROFILE_MAX_SCROLLS, PROFILE_MAX_TWEETS,
    QUOTES_PER_TWEET, REPLIES_PER_TWEET, SUB_SCROLLS,
};

/// All targets, or only the one named `name` (case-insensitive).
fn select_targets<'a>(
    targets: &'a [TargetConfig],
    name: Option<&str>,
) -> anyhow::Result<Vec<&'a TargetConfig>> {
    match name {
        Some(name) => {
            let target = targets
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow::anyhow!("target '{name}' not found in targets file"))?;
            Ok(vec![target])
        }
        None => Ok(targets.iter().collect()),
    }
}

/// Translate a validated target into a job, filling in command defaults.
fn job_for(target: &TargetConfig) -> Job {
    let handle = target.normalized_handle().unwrap_or_default().to_string();
    match target.kind {
        TargetKind::Profile => Job::Profile(ProfileJob {
            handle,
            max_tweets: target.max_tweets.unwrap_or(PROFILE_MAX_TWEETS),
            max_scrolls: target.max_scrolls.unwrap_or(PROFILE_MAX_SCROLLS),
        }),
        TargetKind::Search => Job::Search(SearchJob {
            query: target.query.clone().unwrap_or_default(),
            tab: target.tab,
            max_tweets: target.max_tweets.unwrap_or(PROFILE_MAX_TWEETS),
            max_scrolls: target.max_scrolls.unwrap_or(PROFILE_MAX_SCROLLS),
        }),
        TargetKind::Engagement => Job::Engagement(EngagementJob {
            handle,
            max_tweets: target.max_tweets.unwrap_or(ENGAGEMENT_MAX_TWEETS),
            max_scrolls: target.max_scrolls.unwrap_or(ENGAGEMENT_MAX_SCROLLS),
            replies_per_tweet: target.replies_per_tweet.unwrap_or(REPLIES_PER_TWEET),
            quotes_per_tweet: target.quotes_per_tweet.unwrap_or(QUOTES_PER_TWEET),
            sub_scrolls: SUB_SCROLLS,
        }),
    }
}

pub(crate) async fn run_targets(
    config: &AppConfig,
    name: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let file = load_targets(&config.targets_path)?;
    let selected = select_targets(&file.targets, name)?;
    if selected.is_empty() {
        println!("no targets configured in {}", config.targets_path.display());
        return Ok(());
    }

    let jobs: Vec<(&str, Job)> = selected
        .iter()
        .map(|t| (t.name.as_str(), job_for(t)))
        .collect();

    if dry_run {
        println!("dry-run: would run {} targets:", jobs.len());
        for (name, job) in &jobs {
            println!("  {name}: {}", job.describe());
        }
        return Ok(());
    }

    let (mut surface, _) = open_browser(config).await?;

    let total = jobs.len();
    let mut failed = 0usize;
    let mut files = 0usize;
    for (name, job) in &jobs {
        tracing::info!(target_name = %name, job = %job.describe(), "running target");
        match run_job(&mut surface, config, job).await {
            Ok(report) => {
                files += report.files.len();
                tracing::info!(target_name = %name, records = report.records, "target finished");
            }
            Err(e) => {
                tracing::error!(target_name = %name, error = %format!("{e:#}"), "target failed");
                failed += 1;
            }
        }
    }
    close_browser(surface).await;

    if failed > 0 {
        tracing::warn!(failed, total, "some targets failed");
    }
    if failed == total {
        anyhow::bail!("all {failed} targets failed");
    }

    println!("targets complete: {} ok, {failed} failed, {files} files written", total - failed);
    Ok(())
}
