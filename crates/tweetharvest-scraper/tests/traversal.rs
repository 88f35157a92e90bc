//! Integration tests for reply/quote fan-out and page restoration.

mod common;

use std::time::Duration;

use common::{permalink, post, FakeSurface, BASE, LOGIN_URL};
use tweetharvest_core::Record;
use tweetharvest_scraper::{
    extract_record, harvest_engagement, harvest_thread, CollectionOutcome, Pacer, RenderSurface,
    ScraperError, TraversalOptions,
};

fn profile_url() -> String {
    format!("{BASE}/barengwarga")
}

fn quotes_url(id: u64) -> String {
    format!("{}/retweets/with_comments", permalink("barengwarga", id))
}

fn options() -> TraversalOptions {
    TraversalOptions {
        base_url: BASE.to_string(),
        replies_per_record: 10,
        quotes_per_record: 10,
        max_passes: 5,
        stall_limit: 1,
        settle: Duration::ZERO,
        scroll_pacer: Pacer::none(),
        record_pacer: Pacer::none(),
    }
}

fn parent(id: u64) -> Record {
    extract_record(&post("barengwarga", id), None).unwrap()
}

/// Profile with posts 1 and 2; each has its own replies and quotes.
fn scripted_surface() -> FakeSurface {
    FakeSurface::new()
        .with_page(
            &profile_url(),
            vec![vec![post("barengwarga", 1), post("barengwarga", 2)]],
        )
        .with_page(
            &permalink("barengwarga", 1),
            vec![vec![post("barengwarga", 1), post("fan", 101), post("ana", 102)]],
        )
        .with_page(&quotes_url(1), vec![vec![post("budi", 151)]])
        .with_page(
            &permalink("barengwarga", 2),
            vec![vec![post("barengwarga", 2), post("citra", 201)]],
        )
        .with_page(&quotes_url(2), vec![vec![]])
        .at(&profile_url())
}

#[tokio::test]
async fn thread_harvest_annotates_and_excludes_parent() {
    let mut surface = scripted_surface();
    let parent = parent(1);

    let thread = harvest_thread(&mut surface, &parent, &options())
        .await
        .unwrap();

    let replies = thread.replies.unwrap().records;
    assert_eq!(replies.len(), 2);
    assert!(replies.iter().all(|r| r.permalink != parent.permalink));
    assert!(replies
        .iter()
        .all(|r| r.reply_to() == Some(parent.permalink.as_str())));

    let quotes = thread.quotes.unwrap().records;
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].author, "budi");
    assert_eq!(quotes[0].quote_of(), Some(parent.permalink.as_str()));
}

#[tokio::test]
async fn surface_is_restored_after_each_sub_page() {
    let mut surface = scripted_surface();
    surface.request_more_content().await.unwrap();
    surface.request_more_content().await.unwrap();
    let scroll_before = surface.scroll();

    harvest_thread(&mut surface, &parent(1), &options())
        .await
        .unwrap();

    assert_eq!(surface.location(), profile_url());
    assert_eq!(surface.restored_scrolls, vec![scroll_before, scroll_before]);
    assert_eq!(
        surface.navigations,
        vec![permalink("barengwarga", 1), quotes_url(1)]
    );
}

#[tokio::test]
async fn missed_history_back_falls_back_to_direct_navigation() {
    let mut surface = scripted_surface();
    surface.back_misses = true;

    harvest_thread(&mut surface, &parent(1), &options())
        .await
        .unwrap();

    assert_eq!(surface.location(), profile_url());
    assert_eq!(
        surface.navigations,
        vec![
            permalink("barengwarga", 1),
            profile_url(),
            quotes_url(1),
            profile_url()
        ]
    );
}

#[tokio::test]
async fn zero_quote_target_skips_quote_view() {
    let mut surface = scripted_surface();
    let opts = TraversalOptions {
        quotes_per_record: 0,
        ..options()
    };

    let thread = harvest_thread(&mut surface, &parent(1), &opts)
        .await
        .unwrap();

    assert!(thread.quotes.is_none());
    assert!(!surface.navigations.contains(&quotes_url(1)));
}

#[tokio::test]
async fn engagement_aggregates_all_parents() {
    let mut surface = scripted_surface();
    let parents = vec![parent(1), parent(2)];

    let harvest = harvest_engagement(&mut surface, &parents, &options())
        .await
        .unwrap();

    assert_eq!(harvest.parents_visited, 2);
    let reply_authors: Vec<&str> = harvest.replies.iter().map(|r| r.author.as_str()).collect();
    assert_eq!(reply_authors, vec!["fan", "ana", "citra"]);
    assert_eq!(harvest.quotes.len(), 1);
    assert_eq!(surface.location(), profile_url());
}

#[tokio::test]
async fn unavailable_sub_page_aborts_engagement() {
    let mut surface = scripted_surface();
    surface.unreachable.insert(quotes_url(1));
    let parents = vec![parent(1), parent(2)];

    let err = harvest_engagement(&mut surface, &parents, &options())
        .await
        .unwrap_err();

    match err {
        ScraperError::SurfaceUnavailable { location, step, .. } => {
            assert_eq!(location, quotes_url(1));
            assert_eq!(step, "navigate");
        }
        other => panic!("expected SurfaceUnavailable, got {other:?}"),
    }
    assert!(!surface.navigations.contains(&permalink("barengwarga", 2)));
}

#[tokio::test]
async fn transient_navigation_skips_only_that_sub_page() {
    let mut surface = scripted_surface();
    surface.flaky.insert(quotes_url(1));
    let parents = vec![parent(1), parent(2)];

    let harvest = harvest_engagement(&mut surface, &parents, &options())
        .await
        .unwrap();

    assert_eq!(harvest.parents_visited, 2);
    assert!(harvest.quotes.is_empty());
    let reply_authors: Vec<&str> = harvest.replies.iter().map(|r| r.author.as_str()).collect();
    assert_eq!(reply_authors, vec!["fan", "ana", "citra"]);
    assert!(surface.navigations.contains(&permalink("barengwarga", 2)));
    assert_eq!(surface.location(), profile_url());
}

#[tokio::test]
async fn transient_navigation_yields_empty_quote_collection() {
    let mut surface = scripted_surface();
    surface.flaky.insert(quotes_url(1));

    let thread = harvest_thread(&mut surface, &parent(1), &options())
        .await
        .unwrap();

    let quotes = thread.quotes.unwrap();
    assert!(quotes.records.is_empty());
    assert_eq!(quotes.outcome, CollectionOutcome::ExhaustedFeed);
    assert_eq!(quotes.passes, 0);
    assert_eq!(thread.replies.unwrap().records.len(), 2);
}

#[tokio::test]
async fn failed_restore_does_not_fail_the_thread() {
    let mut surface = scripted_surface();
    surface.back_misses = true;
    surface.unreachable.insert(profile_url());

    let thread = harvest_thread(&mut surface, &parent(1), &options())
        .await
        .unwrap();

    assert_eq!(thread.replies.unwrap().records.len(), 2);
    assert_eq!(thread.quotes.unwrap().records.len(), 1);
    assert!(surface.navigations.contains(&profile_url()));
    assert_ne!(surface.location(), profile_url());
}

#[tokio::test]
async fn login_wall_is_retried_once() {
    let mut surface = scripted_surface();
    surface.walls.insert(permalink("barengwarga", 1), 1);

    let thread = harvest_thread(&mut surface, &parent(1), &options())
        .await
        .unwrap();

    assert_eq!(thread.replies.unwrap().records.len(), 2);
    assert_eq!(surface.location(), profile_url());
}

#[tokio::test]
async fn persistent_login_wall_is_fatal() {
    let mut surface = scripted_surface();
    surface.walls.insert(permalink("barengwarga", 1), 2);

    let err = harvest_thread(&mut surface, &parent(1), &options())
        .await
        .unwrap_err();

    match err {
        ScraperError::SurfaceUnavailable { location, step, .. } => {
            assert_eq!(location, LOGIN_URL);
            assert_eq!(step, "login wall");
        }
        other => panic!("expected SurfaceUnavailable, got {other:?}"),
    }
}
