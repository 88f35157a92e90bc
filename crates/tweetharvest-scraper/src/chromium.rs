//! Chromium-backed [`RenderSurface`] driven over CDP with chromiumoxide.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, TimeSinceEpoch};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::error::ScraperError;
use crate::session::StoredCookie;
use crate::surface::{RenderSurface, RenderedItem, SurfaceError};

/// Snapshot every post on the page. Keys match [`RenderedItem`].
const ENUMERATE_SCRIPT: &str = r#"
(() => {
  const label = (root, sel) => {
    const el = root.querySelector(sel);
    return el ? el.getAttribute('aria-label') : null;
  };
  return Array.from(document.querySelectorAll('article[data-testid="tweet"]')).map((article) => {
    const time = article.querySelector('time');
    const link = time ? time.closest('a') : null;
    const user = article.querySelector('[data-testid="User-Name"]');
    const text = article.querySelector('[data-testid="tweetText"]');
    return {
      permalink: link ? link.href : null,
      timestamp: time ? time.getAttribute('datetime') : null,
      authorLabel: user ? user.innerText : null,
      text: text ? text.innerText : null,
      replyLabel: label(article, '[data-testid="reply"]'),
      repostLabel: label(article, '[data-testid="retweet"], [data-testid="unretweet"]'),
      likeLabel: label(article, '[data-testid="like"], [data-testid="unlike"]'),
      viewLabel: label(article, 'a[href*="/analytics"]'),
    };
  });
})()
"#;

/// Expand truncated posts in place. Only buttons are clicked: the link form
/// of "show more" navigates to the post page.
const EXPAND_SCRIPT: &str = r#"
(() => {
  let clicked = 0;
  document.querySelectorAll('article[data-testid="tweet"] [data-testid="tweet-text-show-more-link"]').forEach((el) => {
    if (el.tagName === 'BUTTON') { el.click(); clicked += 1; }
  });
  return clicked;
})()
"#;

const AUTH_SCRIPT: &str = r#"
!!(document.querySelector('[data-testid="SideNav_NewTweet_Button"]') || document.querySelector('[data-testid="primaryColumn"]'))
"#;

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub user_agent: String,
    pub window_size: (u32, u32),
    pub navigation_timeout: Duration,
}

pub struct ChromiumSurface {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    connected: Arc<AtomicBool>,
    navigation_timeout: Duration,
}

impl ChromiumSurface {
    /// Launch a browser and open a blank tab.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] when the browser cannot be configured,
    /// launched, or asked for a page.
    pub async fn launch(opts: &BrowserOptions) -> Result<Self, ScraperError> {
        let (width, height) = opts.window_size;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .request_timeout(opts.navigation_timeout)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", opts.user_agent));
        if !opts.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &opts.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| ScraperError::Browser(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::Browser(format!("failed to launch browser: {e}")))?;

        let connected = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&connected);
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser handler event error");
                }
            }
            flag.store(false, Ordering::SeqCst);
            tracing::debug!("browser handler stopped");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::Browser(format!("failed to open page: {e}")))?;

        tracing::info!(headless = opts.headless, "browser launched");
        Ok(Self {
            browser,
            page,
            handler,
            connected,
            navigation_timeout: opts.navigation_timeout,
        })
    }

    /// Close the browser and wait for its process to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the browser does not shut down cleanly.
    pub async fn close(mut self) -> Result<(), ScraperError> {
        self.browser
            .close()
            .await
            .map_err(|e| ScraperError::Browser(format!("failed to close browser: {e}")))?;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "waiting for browser exit failed");
        }
        self.handler.abort();
        Ok(())
    }

    fn surface_error(&self, step: &str, err: &CdpError) -> SurfaceError {
        let reason = format!("{step}: {err}");
        if self.connected.load(Ordering::SeqCst) {
            SurfaceError::Transient(reason)
        } else {
            SurfaceError::Unavailable(reason)
        }
    }

    async fn eval<T: DeserializeOwned>(&self, step: &str, script: &str) -> Result<T, SurfaceError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| self.surface_error(step, &e))?;
        result
            .into_value()
            .map_err(|e| SurfaceError::Transient(format!("{step}: unexpected result: {e}")))
    }
}

#[async_trait]
impl RenderSurface for ChromiumSurface {
    async fn navigate(&mut self, url: &str) -> Result<(), SurfaceError> {
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(self.surface_error("navigate", &e)),
            Err(_) => {
                return Err(SurfaceError::Transient(format!(
                    "navigation to {url} timed out after {}s",
                    self.navigation_timeout.as_secs()
                )));
            }
        }
        if let Err(e) = self.page.wait_for_navigation().await {
            tracing::debug!(%url, error = %e, "wait for navigation failed");
        }
        Ok(())
    }

    async fn enumerate_visible_items(&mut self) -> Result<Vec<RenderedItem>, SurfaceError> {
        match self.eval::<u32>("expand truncated posts", EXPAND_SCRIPT).await {
            Ok(0) => {}
            Ok(clicked) => {
                tracing::debug!(clicked, "expanded truncated posts");
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            Err(e) if e.is_unavailable() => return Err(e),
            Err(e) => tracing::debug!(error = %e, "expanding posts failed"),
        }
        self.eval("enumerate items", ENUMERATE_SCRIPT).await
    }

    async fn request_more_content(&mut self) -> Result<(), SurfaceError> {
        self.eval::<bool>(
            "scroll",
            "window.scrollTo(0, document.body.scrollHeight); true",
        )
        .await
        .map(|_| ())
    }

    async fn current_location(&mut self) -> Result<String, SurfaceError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| self.surface_error("read location", &e))?;
        Ok(url.unwrap_or_default())
    }

    async fn reload(&mut self) -> Result<(), SurfaceError> {
        self.page
            .reload()
            .await
            .map_err(|e| self.surface_error("reload", &e))?;
        Ok(())
    }

    async fn history_back(&mut self) -> Result<(), SurfaceError> {
        self.eval::<bool>("history back", "window.history.back(); true")
            .await?;
        if let Err(e) = self.page.wait_for_navigation().await {
            tracing::debug!(error = %e, "wait after history back failed");
        }
        Ok(())
    }

    async fn scroll_offset(&mut self) -> Result<f64, SurfaceError> {
        self.eval("read scroll offset", "window.scrollY").await
    }

    async fn restore_scroll(&mut self, offset: f64) -> Result<(), SurfaceError> {
        let script = format!("window.scrollTo(0, {offset}); true");
        self.eval::<bool>("restore scroll", &script)
            .await
            .map(|_| ())
    }

    async fn is_authenticated(&mut self) -> Result<bool, SurfaceError> {
        let location = self.current_location().await?.to_lowercase();
        let on_home = location.contains("/home")
            || location.trim_end_matches('/').ends_with("x.com")
            || location.trim_end_matches('/').ends_with("twitter.com");
        if !on_home {
            return Ok(false);
        }
        self.eval("check login", AUTH_SCRIPT).await
    }

    async fn export_session(&mut self) -> Result<Vec<StoredCookie>, SurfaceError> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|e| self.surface_error("read cookies", &e))?;
        Ok(cookies
            .into_iter()
            .map(|c| StoredCookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                expires: (!c.session && c.expires > 0.0).then_some(c.expires),
                http_only: c.http_only,
                secure: c.secure,
            })
            .collect())
    }

    async fn import_session(&mut self, cookies: &[StoredCookie]) -> Result<(), SurfaceError> {
        let mut params = Vec::with_capacity(cookies.len());
        for cookie in cookies {
            let mut builder = CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .domain(cookie.domain.clone())
                .path(cookie.path.clone())
                .http_only(cookie.http_only)
                .secure(cookie.secure);
            if let Some(expires) = cookie.expires {
                builder = builder.expires(TimeSinceEpoch::new(expires));
            }
            match builder.build() {
                Ok(param) => params.push(param),
                Err(e) => tracing::debug!(name = %cookie.name, error = %e, "skipping cookie"),
            }
        }
        self.page
            .set_cookies(params)
            .await
            .map_err(|e| self.surface_error("set cookies", &e))?;
        Ok(())
    }
}
