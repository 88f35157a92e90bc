//! Scripted in-memory rendering surface shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tweetharvest_scraper::{RenderSurface, RenderedItem, StoredCookie, SurfaceError};

pub const BASE: &str = "https://x.com";
pub const LOGIN_URL: &str = "https://x.com/i/flow/login";

/// One rendered post by `handle` with status id `id`.
pub fn post(handle: &str, id: u64) -> RenderedItem {
    RenderedItem {
        permalink: Some(format!("{BASE}/{handle}/status/{id}")),
        timestamp: Some(format!("2024-03-{:02}T10:00:00.000Z", (id % 28) + 1)),
        author_label: Some(format!("Display\n@{handle}\n·\n3h")),
        text: Some(format!("post {id}")),
        reply_label: Some("2 Replies. Reply".to_string()),
        repost_label: Some("1 repost. Repost".to_string()),
        like_label: Some("1.2K Likes. Like".to_string()),
        view_label: Some("10K views".to_string()),
    }
}

pub fn permalink(handle: &str, id: u64) -> String {
    format!("{BASE}/{handle}/status/{id}")
}

#[derive(Debug, Default)]
pub struct FakeSurface {
    /// Frames per URL. Each render-more request advances to the next frame;
    /// the last frame repeats.
    pages: HashMap<String, Vec<Vec<RenderedItem>>>,
    current: String,
    requested: String,
    frame: usize,
    scroll: f64,
    history: Vec<String>,

    /// Number of upcoming visits to a URL that land on the login page.
    pub walls: HashMap<String, usize>,
    /// URLs whose navigation fails outright.
    pub unreachable: HashSet<String>,
    /// URLs whose navigation times out without leaving the current page.
    pub flaky: HashSet<String>,
    /// Enumeration call numbers (0-based) that fail transiently.
    pub transient_enumerations: HashSet<usize>,
    /// Enumeration call number from which the surface is gone.
    pub unavailable_from: Option<usize>,
    /// History back leaves the browser on an unrelated page.
    pub back_misses: bool,

    pub authenticated: bool,
    /// Becomes authenticated on this `is_authenticated` call (1-based).
    pub authenticate_on_check: Option<usize>,
    /// Cookie value that `import_session` accepts as a valid session.
    pub valid_token: Option<String>,

    pub enumerations: usize,
    pub more_requests: usize,
    pub auth_checks: usize,
    pub navigations: Vec<String>,
    pub restored_scrolls: Vec<f64>,
    pub imported: Vec<StoredCookie>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, frames: Vec<Vec<RenderedItem>>) -> Self {
        self.pages.insert(url.to_string(), frames);
        self
    }

    /// Pretend the browser is already showing `url`.
    pub fn at(mut self, url: &str) -> Self {
        self.current = url.to_string();
        self.requested = url.to_string();
        self
    }

    pub fn location(&self) -> &str {
        &self.current
    }

    pub fn scroll(&self) -> f64 {
        self.scroll
    }
}

#[async_trait]
impl RenderSurface for FakeSurface {
    async fn navigate(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.navigations.push(url.to_string());
        if self.unreachable.contains(url) {
            return Err(SurfaceError::Unavailable(format!("cannot reach {url}")));
        }
        if self.flaky.contains(url) {
            return Err(SurfaceError::Transient(format!(
                "navigation to {url} timed out"
            )));
        }
        if !self.current.is_empty() {
            self.history.push(self.current.clone());
        }
        self.requested = url.to_string();
        self.frame = 0;
        self.scroll = 0.0;
        match self.walls.get_mut(url) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                self.current = LOGIN_URL.to_string();
            }
            _ => self.current = url.to_string(),
        }
        Ok(())
    }

    async fn enumerate_visible_items(&mut self) -> Result<Vec<RenderedItem>, SurfaceError> {
        let call = self.enumerations;
        self.enumerations += 1;
        if self.unavailable_from.is_some_and(|from| call >= from) {
            return Err(SurfaceError::Unavailable("browser closed".to_string()));
        }
        if self.transient_enumerations.contains(&call) {
            return Err(SurfaceError::Transient("stale element".to_string()));
        }
        Ok(self
            .pages
            .get(&self.current)
            .and_then(|frames| frames.get(self.frame.min(frames.len().saturating_sub(1))))
            .cloned()
            .unwrap_or_default())
    }

    async fn request_more_content(&mut self) -> Result<(), SurfaceError> {
        self.more_requests += 1;
        self.frame += 1;
        self.scroll += 1_000.0;
        Ok(())
    }

    async fn current_location(&mut self) -> Result<String, SurfaceError> {
        Ok(self.current.clone())
    }

    async fn reload(&mut self) -> Result<(), SurfaceError> {
        let target = self.requested.clone();
        self.navigate(&target).await
    }

    async fn history_back(&mut self) -> Result<(), SurfaceError> {
        let previous = self.history.pop().unwrap_or_default();
        self.current = if self.back_misses {
            format!("{BASE}/explore")
        } else {
            previous
        };
        self.frame = 0;
        self.scroll = 0.0;
        Ok(())
    }

    async fn scroll_offset(&mut self) -> Result<f64, SurfaceError> {
        Ok(self.scroll)
    }

    async fn restore_scroll(&mut self, offset: f64) -> Result<(), SurfaceError> {
        self.restored_scrolls.push(offset);
        self.scroll = offset;
        Ok(())
    }

    async fn is_authenticated(&mut self) -> Result<bool, SurfaceError> {
        self.auth_checks += 1;
        if self.authenticate_on_check.is_some_and(|n| self.auth_checks >= n) {
            self.authenticated = true;
        }
        Ok(self.authenticated)
    }

    async fn export_session(&mut self) -> Result<Vec<StoredCookie>, SurfaceError> {
        Ok(vec![StoredCookie {
            name: "auth_token".to_string(),
            value: "fresh-token".to_string(),
            domain: ".x.com".to_string(),
            path: "/".to_string(),
            expires: None,
            http_only: true,
            secure: true,
        }])
    }

    async fn import_session(&mut self, cookies: &[StoredCookie]) -> Result<(), SurfaceError> {
        self.imported.extend(cookies.iter().cloned());
        let accepted = cookies.iter().any(|c| {
            c.name == "auth_token" && self.valid_token.as_deref() == Some(c.value.as_str())
        });
        if accepted {
            self.authenticated = true;
        }
        Ok(())
    }
}
