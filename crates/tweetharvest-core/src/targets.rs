use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// The account's own timeline.
    Profile,
    /// Timeline plus the replies and quotes of every collected post.
    Engagement,
    /// Search results for a free-form query.
    Search,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::Profile => write!(f, "profile"),
            TargetKind::Engagement => write!(f, "engagement"),
            TargetKind::Search => write!(f, "search"),
        }
    }
}

/// Which search results tab to scrape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTab {
    #[default]
    Latest,
    Top,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub kind: TargetKind,
    pub handle: Option<String>,
    pub query: Option<String>,
    #[serde(default)]
    pub tab: SearchTab,
    pub max_tweets: Option<usize>,
    pub max_scrolls: Option<usize>,
    pub replies_per_tweet: Option<usize>,
    pub quotes_per_tweet: Option<usize>,
}

impl TargetConfig {
    /// Handle with any leading `@` removed.
    #[must_use]
    pub fn normalized_handle(&self) -> Option<&str> {
        self.handle
            .as_deref()
            .map(|h| h.trim().trim_start_matches('@'))
            .filter(|h| !h.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct TargetsFile {
    pub targets: Vec<TargetConfig>,
}

/// Load and validate the scrape targets from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_targets(path: &Path) -> Result<TargetsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TargetsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let targets_file: TargetsFile = serde_yaml::from_str(&content)?;

    validate_targets(&targets_file)?;

    Ok(targets_file)
}

fn validate_targets(targets_file: &TargetsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for target in &targets_file.targets {
        if target.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "target name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(target.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate target name: '{}'",
                target.name
            )));
        }

        match target.kind {
            TargetKind::Profile | TargetKind::Engagement => {
                if target.normalized_handle().is_none() {
                    return Err(ConfigError::Validation(format!(
                        "target '{}' of kind {} requires a handle",
                        target.name, target.kind
                    )));
                }
            }
            TargetKind::Search => {
                if target.query.as_deref().is_none_or(|q| q.trim().is_empty()) {
                    return Err(ConfigError::Validation(format!(
                        "target '{}' of kind search requires a query",
                        target.name
                    )));
                }
            }
        }

        if target.max_tweets == Some(0) {
            return Err(ConfigError::Validation(format!(
                "target '{}' has max_tweets 0; must be positive",
                target.name
            )));
        }
    }

    Ok(())
}
