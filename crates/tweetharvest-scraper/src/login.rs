//! Establishing an authenticated session: restore saved cookies, fall back to
//! a bounded manual login, and finally to anonymous browsing if allowed.

use std::time::Duration;

use chrono::Utc;

use crate::error::ScraperError;
use crate::pacing::settle;
use crate::session::{SessionBlob, SessionStore};
use crate::surface::RenderSurface;

#[derive(Debug, Clone)]
pub struct LoginOptions {
    pub account: String,
    pub base_url: String,
    /// How long to wait for a manual login to complete.
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub settle: Duration,
    pub allow_manual: bool,
    pub allow_anonymous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    RestoredSession,
    ManualLogin,
    /// Continuing without a session; some feeds will be truncated.
    Anonymous,
}

impl std::fmt::Display for LoginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginState::RestoredSession => write!(f, "restored session"),
            LoginState::ManualLogin => write!(f, "manual login"),
            LoginState::Anonymous => write!(f, "anonymous"),
        }
    }
}

/// Bring the surface into an authenticated (or knowingly anonymous) state.
///
/// # Errors
///
/// - [`ScraperError::LoginTimedOut`] when the manual login window expires and
///   anonymous browsing is disabled.
/// - [`ScraperError::NotAuthenticated`] when no login path is allowed.
/// - [`ScraperError::SurfaceUnavailable`] when the login pages cannot be opened.
/// - Session store errors from loading or saving cookies.
pub async fn establish_session<S>(
    surface: &mut S,
    store: &SessionStore,
    opts: &LoginOptions,
) -> Result<LoginState, ScraperError>
where
    S: RenderSurface + ?Sized,
{
    let base = opts.base_url.trim_end_matches('/');

    if let Some(blob) = store.load(&opts.account)? {
        if restore_session(surface, base, &blob, opts.settle).await? {
            tracing::info!(account = %opts.account, "restored saved session");
            return Ok(LoginState::RestoredSession);
        }
        tracing::warn!(account = %opts.account, "saved session was not accepted");
    }

    if opts.allow_manual {
        if manual_login(surface, store, base, opts).await? {
            return Ok(LoginState::ManualLogin);
        }
        if !opts.allow_anonymous {
            return Err(ScraperError::LoginTimedOut {
                account: opts.account.clone(),
                waited_secs: opts.timeout.as_secs(),
            });
        }
        tracing::warn!(
            account = %opts.account,
            waited_secs = opts.timeout.as_secs(),
            "login not completed; continuing anonymously"
        );
        return Ok(LoginState::Anonymous);
    }

    if opts.allow_anonymous {
        tracing::warn!(account = %opts.account, "no session; continuing anonymously");
        return Ok(LoginState::Anonymous);
    }

    Err(ScraperError::NotAuthenticated {
        account: opts.account.clone(),
    })
}

async fn restore_session<S>(
    surface: &mut S,
    base: &str,
    blob: &SessionBlob,
    settle_for: Duration,
) -> Result<bool, ScraperError>
where
    S: RenderSurface + ?Sized,
{
    surface
        .navigate(base)
        .await
        .map_err(|e| ScraperError::unavailable(base, "open site root", e.reason()))?;

    if let Err(e) = surface.import_session(&blob.cookies).await {
        tracing::warn!(error = %e, "could not import saved cookies");
        return Ok(false);
    }
    if let Err(e) = surface.reload().await {
        tracing::warn!(error = %e, "reload after cookie import failed");
    }

    let home = format!("{base}/home");
    surface
        .navigate(&home)
        .await
        .map_err(|e| ScraperError::unavailable(&home, "open home", e.reason()))?;
    settle(settle_for).await;

    Ok(surface.is_authenticated().await.unwrap_or(false))
}

async fn manual_login<S>(
    surface: &mut S,
    store: &SessionStore,
    base: &str,
    opts: &LoginOptions,
) -> Result<bool, ScraperError>
where
    S: RenderSurface + ?Sized,
{
    let login_url = format!("{base}/i/flow/login");
    surface
        .navigate(&login_url)
        .await
        .map_err(|e| ScraperError::unavailable(&login_url, "open login page", e.reason()))?;

    tracing::info!(
        account = %opts.account,
        timeout_secs = opts.timeout.as_secs(),
        "waiting for login to be completed in the browser window"
    );

    let polls = if opts.poll_interval.is_zero() {
        1
    } else {
        opts.timeout
            .as_millis()
            .div_ceil(opts.poll_interval.as_millis())
    };

    let mut attempt = 0u128;
    loop {
        match surface.is_authenticated().await {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => tracing::debug!(error = %e, "login check failed"),
        }
        if attempt >= polls {
            return Ok(false);
        }
        attempt += 1;
        tokio::time::sleep(opts.poll_interval).await;
    }

    tracing::info!(account = %opts.account, "login detected");
    match surface.export_session().await {
        Ok(cookies) => {
            store.save(&SessionBlob {
                account: opts.account.clone(),
                saved_at: Utc::now(),
                cookies,
            })?;
        }
        Err(e) => tracing::warn!(error = %e, "could not export session; it will not be saved"),
    }
    Ok(true)
}
