//! The rendering surface abstraction: a live, script-driven page that can be
//! navigated, enumerated and asked to render more content.
//!
//! Collection and traversal code only ever talks to [`RenderSurface`], so the
//! same algorithms run against Chromium in production and a scripted
//! in-memory surface in tests.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::session::StoredCookie;

#[derive(Debug, Error)]
pub enum SurfaceError {
    /// A single step failed but the surface is still usable.
    #[error("transient surface error: {0}")]
    Transient(String),

    /// The surface cannot be queried at all.
    #[error("surface unavailable: {0}")]
    Unavailable(String),
}

impl SurfaceError {
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SurfaceError::Unavailable(_))
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            SurfaceError::Transient(reason) | SurfaceError::Unavailable(reason) => reason,
        }
    }
}

/// Field snapshot of one rendered post as the page currently shows it.
///
/// Every field is optional; extraction decides what a missing field means.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedItem {
    pub permalink: Option<String>,
    /// ISO-8601 `datetime` attribute of the post's `<time>` element.
    pub timestamp: Option<String>,
    /// Raw text of the user-name block: display name and `@handle` lines.
    pub author_label: Option<String>,
    pub text: Option<String>,
    pub reply_label: Option<String>,
    pub repost_label: Option<String>,
    pub like_label: Option<String>,
    pub view_label: Option<String>,
}

#[async_trait]
pub trait RenderSurface: Send {
    /// Load `url` and wait for the navigation to finish.
    async fn navigate(&mut self, url: &str) -> Result<(), SurfaceError>;

    /// Snapshot every post currently present in the rendered document.
    async fn enumerate_visible_items(&mut self) -> Result<Vec<RenderedItem>, SurfaceError>;

    /// Ask the page to render more items (scroll to the bottom).
    async fn request_more_content(&mut self) -> Result<(), SurfaceError>;

    async fn current_location(&mut self) -> Result<String, SurfaceError>;

    async fn reload(&mut self) -> Result<(), SurfaceError> {
        let location = self.current_location().await?;
        self.navigate(&location).await
    }

    async fn history_back(&mut self) -> Result<(), SurfaceError>;

    /// Vertical scroll offset in CSS pixels.
    async fn scroll_offset(&mut self) -> Result<f64, SurfaceError>;

    async fn restore_scroll(&mut self, offset: f64) -> Result<(), SurfaceError>;

    /// Whether the page shows the signed-in chrome (compose button, home column).
    async fn is_authenticated(&mut self) -> Result<bool, SurfaceError>;

    async fn export_session(&mut self) -> Result<Vec<StoredCookie>, SurfaceError>;

    async fn import_session(&mut self, cookies: &[StoredCookie]) -> Result<(), SurfaceError>;
}
