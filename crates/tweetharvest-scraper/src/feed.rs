//! Feed URLs and opening a feed on the surface.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tweetharvest_core::SearchTab;

use crate::error::ScraperError;
use crate::pacing::settle;
use crate::surface::RenderSurface;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedTarget {
    /// An account's timeline.
    Profile { handle: String },
    Search { query: String, tab: SearchTab },
    /// The reply view of a post, which is the post's own page.
    Replies { permalink: String },
    /// The quote-post list of a post.
    Quotes { permalink: String },
}

impl FeedTarget {
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            FeedTarget::Profile { handle } => {
                format!("{base}/{}", handle.trim().trim_start_matches('@'))
            }
            FeedTarget::Search { query, tab } => {
                let encoded = utf8_percent_encode(query.trim(), NON_ALPHANUMERIC);
                let filter = match tab {
                    SearchTab::Latest => "live",
                    SearchTab::Top => "top",
                };
                format!("{base}/search?q={encoded}&src=typed_query&f={filter}")
            }
            FeedTarget::Replies { permalink } => permalink.trim_end_matches('/').to_string(),
            FeedTarget::Quotes { permalink } => {
                format!("{}/retweets/with_comments", permalink.trim_end_matches('/'))
            }
        }
    }
}

pub(crate) fn is_login_wall(location: &str) -> bool {
    location.contains("/login") || location.contains("/i/flow/login")
}

/// Navigate to `target`, wait `settle_for`, and get past a login wall by
/// reloading once. Returns the settled location.
///
/// # Errors
///
/// Returns [`ScraperError::NavigationFailed`] when the surface reports a
/// transient navigation error, and [`ScraperError::SurfaceUnavailable`] when
/// the surface is gone or the page is still behind a login wall after the
/// reload.
pub async fn open_feed<S>(
    surface: &mut S,
    target: &FeedTarget,
    base_url: &str,
    settle_for: Duration,
) -> Result<String, ScraperError>
where
    S: RenderSurface + ?Sized,
{
    let url = target.url(base_url);
    tracing::info!(%url, "opening feed");

    if let Err(e) = surface.navigate(&url).await {
        if e.is_unavailable() {
            return Err(ScraperError::unavailable(&url, "navigate", e.reason()));
        }
        return Err(ScraperError::NavigationFailed {
            url,
            reason: e.reason().to_string(),
        });
    }
    settle(settle_for).await;

    let location = current_or(surface, &url).await;
    if !is_login_wall(&location) {
        return Ok(location);
    }

    tracing::warn!(%url, %location, "login wall shown; reloading once");
    if let Err(e) = surface.reload().await {
        return Err(ScraperError::unavailable(&location, "login wall", e.reason()));
    }
    settle(settle_for).await;

    let location = current_or(surface, &url).await;
    if is_login_wall(&location) {
        return Err(ScraperError::unavailable(
            location,
            "login wall",
            "page still requires login after reload",
        ));
    }
    Ok(location)
}

async fn current_or<S>(surface: &mut S, fallback: &str) -> String
where
    S: RenderSurface + ?Sized,
{
    surface
        .current_location()
        .await
        .unwrap_or_else(|_| fallback.to_string())
}
