//! Integration tests for session restore, manual login and anonymous fallback.

mod common;

use std::time::Duration;

use chrono::Utc;
use common::{FakeSurface, BASE, LOGIN_URL};
use tweetharvest_scraper::{
    establish_session, LoginOptions, LoginState, ScraperError, SessionBlob, SessionStore,
    StoredCookie,
};

fn options(allow_manual: bool, allow_anonymous: bool) -> LoginOptions {
    LoginOptions {
        account: "research".to_string(),
        base_url: BASE.to_string(),
        timeout: Duration::from_millis(30),
        poll_interval: Duration::from_millis(1),
        settle: Duration::ZERO,
        allow_manual,
        allow_anonymous,
    }
}

fn saved(store: &SessionStore, token: &str) {
    store
        .save(&SessionBlob {
            account: "research".to_string(),
            saved_at: Utc::now(),
            cookies: vec![StoredCookie {
                name: "auth_token".to_string(),
                value: token.to_string(),
                domain: ".x.com".to_string(),
                path: "/".to_string(),
                expires: Some(4_102_444_800.0),
                http_only: true,
                secure: true,
            }],
        })
        .unwrap();
}

#[tokio::test]
async fn valid_saved_session_is_restored() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    saved(&store, "good-token");

    let mut surface = FakeSurface::new();
    surface.valid_token = Some("good-token".to_string());

    let state = establish_session(&mut surface, &store, &options(true, false))
        .await
        .unwrap();

    assert_eq!(state, LoginState::RestoredSession);
    assert_eq!(surface.imported.len(), 1);
    assert_eq!(surface.navigations.first().map(String::as_str), Some(BASE));
    assert_eq!(
        surface.navigations.last().map(String::as_str),
        Some(format!("{BASE}/home").as_str())
    );
    assert!(!surface.navigations.iter().any(|u| u == LOGIN_URL));
}

#[tokio::test]
async fn rejected_session_falls_back_to_manual_login_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    saved(&store, "expired-token");

    let mut surface = FakeSurface::new();
    surface.valid_token = Some("good-token".to_string());
    surface.authenticate_on_check = Some(3);

    let state = establish_session(&mut surface, &store, &options(true, false))
        .await
        .unwrap();

    assert_eq!(state, LoginState::ManualLogin);
    assert!(surface.navigations.iter().any(|u| u == LOGIN_URL));
    let blob = store.load("research").unwrap().unwrap();
    assert_eq!(blob.cookies[0].value, "fresh-token");
}

#[tokio::test]
async fn corrupt_session_file_forces_fresh_login() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    std::fs::write(store.path_for("research"), "not json at all").unwrap();

    let mut surface = FakeSurface::new();
    surface.authenticate_on_check = Some(1);

    let state = establish_session(&mut surface, &store, &options(true, false))
        .await
        .unwrap();

    assert_eq!(state, LoginState::ManualLogin);
    assert!(surface.imported.is_empty());
}

#[tokio::test]
async fn manual_login_timeout_is_an_error_without_anonymous() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    let mut surface = FakeSurface::new();

    let err = establish_session(&mut surface, &store, &options(true, false))
        .await
        .unwrap_err();

    match err {
        ScraperError::LoginTimedOut { account, .. } => assert_eq!(account, "research"),
        other => panic!("expected LoginTimedOut, got {other:?}"),
    }
    assert!(store.load("research").unwrap().is_none());
    assert!(surface.auth_checks > 1);
}

#[tokio::test]
async fn manual_login_timeout_falls_back_to_anonymous() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    let mut surface = FakeSurface::new();

    let state = establish_session(&mut surface, &store, &options(true, true))
        .await
        .unwrap();

    assert_eq!(state, LoginState::Anonymous);
}

#[tokio::test]
async fn anonymous_without_manual_login() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    let mut surface = FakeSurface::new();

    let state = establish_session(&mut surface, &store, &options(false, true))
        .await
        .unwrap();

    assert_eq!(state, LoginState::Anonymous);
    assert!(surface.navigations.is_empty());
}

#[tokio::test]
async fn no_login_path_is_not_authenticated() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    let mut surface = FakeSurface::new();

    let err = establish_session(&mut surface, &store, &options(false, false))
        .await
        .unwrap_err();

    assert!(matches!(err, ScraperError::NotAuthenticated { account } if account == "research"));
}
