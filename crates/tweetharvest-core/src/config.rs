use std::path::PathBuf;

use crate::app_config::{AppConfig, DelayRange};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default; the lookup is only consulted for overrides.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_flag(&or_default(var, default)).ok_or_else(|| {
            invalid(
                var,
                "expected one of true/false, 1/0, yes/no, on/off".to_string(),
            )
        })
    };

    let parse_delay = |prefix: &str, min: &str, max: &str| -> Result<DelayRange, ConfigError> {
        let min_var = format!("{prefix}_MIN_MS");
        let max_var = format!("{prefix}_MAX_MS");
        let min_ms = parse_u64(&min_var, min)?;
        let max_ms = parse_u64(&max_var, max)?;
        if min_ms > max_ms {
            return Err(invalid(
                &min_var,
                format!("minimum {min_ms}ms exceeds {max_var}={max_ms}ms"),
            ));
        }
        Ok(DelayRange::new(min_ms, max_ms))
    };

    let log_level = or_default("TWEETHARVEST_LOG_LEVEL", "info");
    let base_url = or_default("TWEETHARVEST_BASE_URL", "https://x.com")
        .trim_end_matches('/')
        .to_string();
    let data_dir = PathBuf::from(or_default("TWEETHARVEST_DATA_DIR", "data/raw"));
    let session_dir = PathBuf::from(or_default("TWEETHARVEST_SESSION_DIR", "cookies"));
    let targets_path = PathBuf::from(or_default(
        "TWEETHARVEST_TARGETS_PATH",
        "./config/targets.yaml",
    ));
    let account = or_default("TWEETHARVEST_ACCOUNT", "default");
    let headless = parse_bool("TWEETHARVEST_HEADLESS", "false")?;
    let chrome_path = lookup("TWEETHARVEST_CHROME_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let user_agent = or_default("TWEETHARVEST_USER_AGENT", DEFAULT_USER_AGENT);

    let navigation_timeout_secs = parse_u64("TWEETHARVEST_NAVIGATION_TIMEOUT_SECS", "30")?;
    let page_settle_ms = parse_u64("TWEETHARVEST_PAGE_SETTLE_MS", "5000")?;
    let subpage_settle_ms = parse_u64("TWEETHARVEST_SUBPAGE_SETTLE_MS", "3000")?;

    let scroll_delay = parse_delay("TWEETHARVEST_SCROLL_DELAY", "2000", "4000")?;
    let subpage_scroll_delay =
        parse_delay("TWEETHARVEST_SUBPAGE_SCROLL_DELAY", "1500", "2500")?;
    let record_delay = parse_delay("TWEETHARVEST_RECORD_DELAY", "2000", "4000")?;

    let stall_limit = parse_usize("TWEETHARVEST_STALL_LIMIT", "3")?;
    if stall_limit == 0 {
        return Err(invalid(
            "TWEETHARVEST_STALL_LIMIT",
            "must be at least 1".to_string(),
        ));
    }

    let login_timeout_secs = parse_u64("TWEETHARVEST_LOGIN_TIMEOUT_SECS", "120")?;
    let login_poll_secs = parse_u64("TWEETHARVEST_LOGIN_POLL_SECS", "5")?;
    let allow_manual_login = parse_bool("TWEETHARVEST_ALLOW_MANUAL_LOGIN", "true")?;
    let allow_anonymous = parse_bool("TWEETHARVEST_ALLOW_ANONYMOUS", "true")?;

    Ok(AppConfig {
        log_level,
        base_url,
        data_dir,
        session_dir,
        targets_path,
        account,
        headless,
        chrome_path,
        user_agent,
        navigation_timeout_secs,
        page_settle_ms,
        subpage_settle_ms,
        scroll_delay,
        subpage_scroll_delay,
        record_delay,
        stall_limit,
        login_timeout_secs,
        login_poll_secs,
        allow_manual_login,
        allow_anonymous,
    })
}

/// Parse a boolean flag. Accepts the usual spellings, case-insensitively.
fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
