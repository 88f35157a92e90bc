use std::path::PathBuf;
use std::time::Duration;

/// Inclusive bounds, in milliseconds, for a randomised pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    #[must_use]
    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    #[must_use]
    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub base_url: String,
    pub data_dir: PathBuf,
    pub session_dir: PathBuf,
    pub targets_path: PathBuf,
    pub account: String,
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub user_agent: String,
    pub navigation_timeout_secs: u64,
    pub page_settle_ms: u64,
    pub subpage_settle_ms: u64,
    pub scroll_delay: DelayRange,
    pub subpage_scroll_delay: DelayRange,
    pub record_delay: DelayRange,
    pub stall_limit: usize,
    pub login_timeout_secs: u64,
    pub login_poll_secs: u64,
    pub allow_manual_login: bool,
    pub allow_anonymous: bool,
}
