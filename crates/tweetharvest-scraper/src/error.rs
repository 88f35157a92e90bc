use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("rendering surface unavailable at {location} during {step}: {reason}")]
    SurfaceUnavailable {
        location: String,
        step: String,
        reason: String,
    },

    /// The page did not open this time; the surface itself is still usable.
    #[error("navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("login for account \"{account}\" not completed after {waited_secs}s")]
    LoginTimedOut { account: String, waited_secs: u64 },

    #[error("account \"{account}\" is not authenticated and anonymous browsing is disabled")]
    NotAuthenticated { account: String },

    #[error("session file I/O error at {path}: {source}")]
    SessionIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session encode error for {path}: {source}")]
    SessionEncode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("browser error: {0}")]
    Browser(String),
}

impl ScraperError {
    pub(crate) fn unavailable(
        location: impl Into<String>,
        step: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::SurfaceUnavailable {
            location: location.into(),
            step: step.into(),
            reason: reason.into(),
        }
    }
}
