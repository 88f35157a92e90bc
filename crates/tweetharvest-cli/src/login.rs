//! `login`: open a visible browser, let the user sign in, save the session.

use tweetharvest_core::AppConfig;
use tweetharvest_scraper::{LoginState, SessionStore};

use crate::scrape::{close_browser, open_browser};

/// Manual login is always allowed here and anonymous browsing never is.
fn login_config(config: &AppConfig) -> AppConfig {
    AppConfig {
        headless: false,
        allow_manual_login: true,
        allow_anonymous: false,
        ..config.clone()
    }
}

pub(crate) async fn run_login(config: &AppConfig) -> anyhow::Result<()> {
    let config = login_config(config);
    let (surface, state) = open_browser(&config).await?;
    close_browser(surface).await;

    let path = SessionStore::new(&config.session_dir).path_for(&config.account);
    match state {
        LoginState::RestoredSession => {
            println!(
                "account '{}' already has a valid session ({})",
                config.account,
                path.display()
            );
        }
        LoginState::ManualLogin => {
            println!(
                "logged in as '{}'; session saved to {}",
                config.account,
                path.display()
            );
        }
        LoginState::Anonymous => anyhow::bail!("login for '{}' did not complete", config.account),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_config_forces_visible_manual_login() {
        let mut base = tweetharvest_core::load_app_config_from_env().unwrap();
        base.headless = true;
        base.allow_manual_login = false;
        base.allow_anonymous = true;
        base.account = "research".to_string();

        let config = login_config(&base);
        assert!(!config.headless);
        assert!(config.allow_manual_login);
        assert!(!config.allow_anonymous);
        assert_eq!(config.account, "research");
    }
}
