//! CSV tables and the run summaries printed after each job.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tweetharvest_core::{output_path, write_records, EngagementSummary, Record, ThreadSummary};

/// Write `records` under `data_dir`. Empty tables are skipped and yield `None`.
pub(crate) fn write_table(
    data_dir: &Path,
    stem: &str,
    records: &[Record],
    at: DateTime<Utc>,
) -> anyhow::Result<Option<PathBuf>> {
    if records.is_empty() {
        tracing::warn!(stem, "no records collected; nothing written");
        return Ok(None);
    }

    let path = output_path(data_dir, stem, at);
    write_records(&path, records).with_context(|| format!("failed to write {}", path.display()))?;
    println!("saved {} records to {}", records.len(), path.display());
    Ok(Some(path))
}

pub(crate) fn print_engagement_summary(label: &str, summary: &EngagementSummary) {
    println!();
    println!("summary for {label}");
    println!("  posts:    {}", summary.count);
    if summary.count == 0 {
        return;
    }
    if let (Some(earliest), Some(latest)) = (summary.earliest, summary.latest) {
        println!(
            "  range:    {} to {}",
            earliest.format("%Y-%m-%d"),
            latest.format("%Y-%m-%d")
        );
    }
    println!(
        "  likes:    {} (avg {:.1})",
        summary.likes, summary.mean_likes
    );
    println!(
        "  reposts:  {} (avg {:.1})",
        summary.reposts, summary.mean_reposts
    );
    println!(
        "  replies:  {} (avg {:.1})",
        summary.replies, summary.mean_replies
    );
    println!("  top posts by engagement:");
    for (rank, record) in summary.top.iter().enumerate() {
        println!(
            "    {}. {} ({} engagements) {}",
            rank + 1,
            preview(&record.text, 60),
            record.total_engagement(),
            record.permalink
        );
    }
}

pub(crate) fn print_thread_summary(label: &str, summary: &ThreadSummary) {
    println!();
    println!("{label}: {}", summary.count);
    if summary.count == 0 {
        return;
    }
    println!("  busiest parents:");
    for (parent, count) in &summary.busiest_parents {
        println!("    {count:>4}  {parent}");
    }
    println!("  most active authors:");
    for (author, count) in &summary.top_authors {
        println!("    {count:>4}  @{author}");
    }
}

/// First `max_chars` characters on a single line, with an ellipsis if cut.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
