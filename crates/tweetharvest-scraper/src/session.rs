//! Per-account cookie persistence so a manual login survives restarts.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Seconds since the Unix epoch; `None` for session cookies.
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
}

/// Opaque authenticated session state for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBlob {
    pub account: String,
    pub saved_at: DateTime<Utc>,
    pub cookies: Vec<StoredCookie>,
}

/// One JSON file per account label under a single directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `{dir}/session_{encoded account}.json`
    #[must_use]
    pub fn path_for(&self, account: &str) -> PathBuf {
        self.dir.join(format!("session_{}.json", account_file_name(account)))
    }

    /// Load the saved session for `account`.
    ///
    /// A missing file yields `Ok(None)`. A file that cannot be decoded is
    /// logged and also yields `Ok(None)` so the caller falls back to a fresh
    /// login.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::SessionIo`] for any other read failure.
    pub fn load(&self, account: &str) -> Result<Option<SessionBlob>, ScraperError> {
        let path = self.path_for(account);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "session file unreadable; ignoring"
                );
                return Ok(None);
            }
            Err(e) => {
                return Err(ScraperError::SessionIo {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };

        match serde_json::from_str::<SessionBlob>(&content) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "session file corrupt; ignoring"
                );
                Ok(None)
            }
        }
    }

    /// Write `blob` to the account's file, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::SessionIo`] or [`ScraperError::SessionEncode`].
    pub fn save(&self, blob: &SessionBlob) -> Result<PathBuf, ScraperError> {
        let path = self.path_for(&blob.account);
        let io_err = |source| ScraperError::SessionIo {
            path: path.display().to_string(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let body = serde_json::to_string_pretty(blob).map_err(|source| {
            ScraperError::SessionEncode {
                path: path.display().to_string(),
                source,
            }
        })?;
        std::fs::write(&path, body).map_err(io_err)?;

        tracing::info!(
            account = %blob.account,
            path = %path.display(),
            cookies = blob.cookies.len(),
            "session saved"
        );
        Ok(path)
    }
}

/// Bytes kept verbatim in a session file name: lowercase ASCII letters,
/// digits, `-` and `_`. Uppercase letters are escaped too, so labels that
/// differ only in case stay distinct on case-insensitive filesystems.
const ACCOUNT_FILE_SET: &AsciiSet = &account_file_set();

const fn account_file_set() -> AsciiSet {
    let mut set = NON_ALPHANUMERIC.remove(b'-').remove(b'_');
    let mut c = b'A';
    while c <= b'Z' {
        set = set.add(c);
        c += 1;
    }
    set
}

/// Percent-encode `account` so every label maps to its own file name.
fn account_file_name(account: &str) -> String {
    utf8_percent_encode(account, ACCOUNT_FILE_SET).to_string()
}
