//! Flat CSV tables consumed by the downstream cleaning and reporting stages.
//!
//! Every table has the same column set so replies, quotes and timeline posts
//! can be concatenated without reshaping:
//!
//! ```text
//! date,username,content,reply_count,retweet_count,like_count,view_count,tweet_url,reply_to,quote_of,total_engagement
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::record::Record;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: String,
    username: &'a str,
    content: &'a str,
    reply_count: u64,
    retweet_count: u64,
    like_count: u64,
    view_count: Option<u64>,
    tweet_url: &'a str,
    reply_to: &'a str,
    quote_of: &'a str,
    total_engagement: u64,
}

impl<'a> From<&'a Record> for CsvRow<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            date: record
                .published_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
            username: &record.author,
            content: &record.text,
            reply_count: record.reply_count,
            retweet_count: record.repost_count,
            like_count: record.like_count,
            view_count: record.view_count,
            tweet_url: &record.permalink,
            reply_to: record.reply_to().unwrap_or(""),
            quote_of: record.quote_of().unwrap_or(""),
            total_engagement: record.total_engagement(),
        }
    }
}

/// Write `records` as a CSV table at `path`, creating parent directories.
///
/// # Errors
///
/// Returns a `csv::Error` if the directory or file cannot be created or a
/// row cannot be written.
pub fn write_records(path: &Path, records: &[Record]) -> Result<(), csv::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// `{data_dir}/{stem}_{YYYYmmdd_HHMMSS}.csv`
#[must_use]
pub fn output_path(data_dir: &Path, stem: &str, at: DateTime<Utc>) -> PathBuf {
    data_dir.join(format!("{stem}_{}.csv", at.format("%Y%m%d_%H%M%S")))
}

/// Turn a free-form search query into something safe to use in a file name.
///
/// `#` becomes `hashtag_`, `@` becomes `mention_`, whitespace becomes `_`, and
/// anything else outside `[A-Za-z0-9_-]` is dropped.
#[must_use]
pub fn query_file_stem(query: &str) -> String {
    let mut stem = String::with_capacity(query.len());
    for c in query.trim().chars() {
        match c {
            '#' => stem.push_str("hashtag_"),
            '@' => stem.push_str("mention_"),
            c if c.is_whitespace() => stem.push('_'),
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' => stem.push(c),
            _ => {}
        }
    }
    if stem.is_empty() {
        "search".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::record::Relation;

    fn sample(permalink: &str) -> Record {
        Record {
            permalink: permalink.to_string(),
            author: "barengwarga".to_string(),
            published_at: Some(Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()),
            text: "hello, \"world\"".to_string(),
            reply_count: 1,
            repost_count: 2,
            like_count: 3,
            view_count: Some(1_200),
            relation: None,
        }
    }

    #[test]
    fn output_path_uses_timestamp_suffix() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let path = output_path(Path::new("data/raw"), "barengwarga_tweets", at);
        assert_eq!(
            path,
            PathBuf::from("data/raw/barengwarga_tweets_20240309_140507.csv")
        );
    }

    #[test]
    fn query_file_stem_rewrites_symbols() {
        assert_eq!(query_file_stem("#kpop"), "hashtag_kpop");
        assert_eq!(query_file_stem("@barengwarga"), "mention_barengwarga");
        assert_eq!(query_file_stem("from:bts lang:en"), "frombts_langen");
        assert_eq!(query_file_stem("BTS concert"), "BTS_concert");
    }

    #[test]
    fn query_file_stem_never_empty() {
        assert_eq!(query_file_stem("???"), "search");
    }

    #[test]
    fn write_records_emits_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        let mut reply = sample("https://x.com/fan/status/2");
        reply.relation = Some(Relation::reply_to("https://x.com/barengwarga/status/1"));
        reply.view_count = None;
        reply.published_at = None;

        write_records(&path, &[sample("https://x.com/barengwarga/status/1"), reply]).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(
            lines[0],
            "date,username,content,reply_count,retweet_count,like_count,view_count,tweet_url,reply_to,quote_of,total_engagement"
        );
        assert_eq!(
            lines[1],
            "2024-03-09T14:05:00Z,barengwarga,\"hello, \"\"world\"\"\",1,2,3,1200,https://x.com/barengwarga/status/1,,,6"
        );
        assert_eq!(
            lines[2],
            ",barengwarga,\"hello, \"\"world\"\"\",1,2,3,,https://x.com/fan/status/2,https://x.com/barengwarga/status/1,,6"
        );
    }
}
