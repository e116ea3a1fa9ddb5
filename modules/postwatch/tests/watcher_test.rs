//! End-to-end runs of the watcher against a real state file, with mocked
//! HTTP and webhook boundaries.

use std::path::Path;
use std::sync::atomic::Ordering;

use postwatch::extractor::IdentifierExtractor;
use postwatch::fetcher::{default_sources, PageResponse, ProfileFetcher};
use postwatch::jitter::Jitter;
use postwatch::notify::noop::NoopBackend;
use postwatch::notify::Notifier;
use postwatch::state::JsonFileStateStore;
use postwatch::testing::{MemoryStateStore, MockNotifier, MockTransport};
use postwatch::{ProfileWatcher, RunOutcome, Shortcode, WatchConfig};

const PROFILE: &str = "britneyspears";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn source_urls() -> Vec<String> {
    default_sources()
        .iter()
        .map(|s| s.url_for(PROFILE))
        .collect()
}

fn watch_config() -> WatchConfig {
    WatchConfig {
        profile_name: PROFILE.into(),
        jitter: Jitter::none(),
    }
}

fn file_watcher(
    transport: MockTransport,
    state_path: &Path,
    notifier: MockNotifier,
) -> ProfileWatcher {
    ProfileWatcher::new(
        watch_config(),
        ProfileFetcher::new(Box::new(transport), default_sources()),
        IdentifierExtractor::new(),
        Box::new(JsonFileStateStore::new(state_path)),
        Notifier::new(Box::new(notifier)),
    )
}

fn write_state(path: &Path, shortcode: &str) {
    std::fs::write(path, format!(r#"{{"last_shortcode":"{shortcode}"}}"#)).unwrap();
}

fn read_state(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn profile_page(shortcode: &str) -> PageResponse {
    let media = format!(r#"{{"edges":[{{"node":{{"shortcode":"{shortcode}"}}}}]}}"#);
    PageResponse::ok(&format!(
        r#"<script>{{"user":{{"edge_owner_to_timeline_media":{media}}}}}</script>"#
    ))
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_post_notifies_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("last_seen.json");
    write_state(&state_path, "ABC12");

    let transport = MockTransport::new().on(&source_urls()[0], profile_page("XYZ99"));
    let notifier = MockNotifier::new();
    let sent = notifier.sent();

    let outcome = file_watcher(transport, &state_path, notifier).run().await;

    assert_eq!(
        outcome,
        RunOutcome::NewPost {
            shortcode: Shortcode::parse("XYZ99").unwrap(),
            delivered: true,
        }
    );
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let values = sent[0].webhook_values();
    assert_eq!(values.value1, "XYZ99");
    assert_eq!(values.value3, "https://www.instagram.com/p/XYZ99/");
    assert!(values.value2.ends_with('Z'), "{}", values.value2);
    assert_eq!(read_state(&state_path), r#"{"last_shortcode":"XYZ99"}"#);
}

#[tokio::test]
async fn same_post_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("last_seen.json");
    write_state(&state_path, "ABC12");
    let before = read_state(&state_path);

    let transport = MockTransport::new().on(&source_urls()[0], profile_page("ABC12"));
    let notifier = MockNotifier::new();
    let sent = notifier.sent();

    let outcome = file_watcher(transport, &state_path, notifier).run().await;

    assert_eq!(outcome, RunOutcome::Unchanged(Shortcode::parse("ABC12").unwrap()));
    assert!(sent.lock().unwrap().is_empty());
    assert_eq!(read_state(&state_path), before);
}

#[tokio::test]
async fn every_source_down_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("last_seen.json");
    write_state(&state_path, "ABC12");
    let before = read_state(&state_path);

    let urls = source_urls();
    let transport = MockTransport::new()
        .on_error(&urls[0], "connection refused")
        .on(&urls[1], PageResponse::status(503))
        .on(&urls[2], PageResponse::status(429));
    let requests = transport.requests();
    let notifier = MockNotifier::new();
    let sent = notifier.sent();

    let outcome = file_watcher(transport, &state_path, notifier).run().await;

    assert_eq!(outcome, RunOutcome::Unavailable);
    assert_eq!(requests.lock().unwrap().as_slice(), urls.as_slice());
    assert!(sent.lock().unwrap().is_empty());
    assert_eq!(read_state(&state_path), before);
}

#[tokio::test]
async fn first_run_without_state_file_notifies() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("last_seen.json");

    let transport = MockTransport::new().on(&source_urls()[0], profile_page("FIRST1"));
    let notifier = MockNotifier::new();
    let sent = notifier.sent();

    let outcome = file_watcher(transport, &state_path, notifier).run().await;

    assert!(matches!(outcome, RunOutcome::NewPost { .. }), "{outcome:?}");
    assert_eq!(sent.lock().unwrap().len(), 1);
    assert_eq!(read_state(&state_path), r#"{"last_shortcode":"FIRST1"}"#);
}

#[tokio::test]
async fn failed_delivery_still_advances_state() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("last_seen.json");
    write_state(&state_path, "ABC12");

    let transport = MockTransport::new().on(&source_urls()[0], profile_page("XYZ99"));
    let notifier = MockNotifier::failing(500);
    let sent = notifier.sent();

    let outcome = file_watcher(transport, &state_path, notifier).run().await;

    assert_eq!(
        outcome,
        RunOutcome::NewPost {
            shortcode: Shortcode::parse("XYZ99").unwrap(),
            delivered: false,
        }
    );
    assert_eq!(sent.lock().unwrap().len(), 1);
    assert_eq!(read_state(&state_path), r#"{"last_shortcode":"XYZ99"}"#);
}

#[tokio::test]
async fn disabled_notifications_still_advance_state() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("last_seen.json");
    write_state(&state_path, "ABC12");

    let transport = MockTransport::new().on(&source_urls()[0], profile_page("XYZ99"));
    let watcher = ProfileWatcher::new(
        watch_config(),
        ProfileFetcher::new(Box::new(transport), default_sources()),
        IdentifierExtractor::new(),
        Box::new(JsonFileStateStore::new(&state_path)),
        Notifier::new(Box::new(NoopBackend)),
    );

    let outcome = watcher.run().await;

    assert_eq!(
        outcome,
        RunOutcome::NewPost {
            shortcode: Shortcode::parse("XYZ99").unwrap(),
            delivered: false,
        }
    );
    assert_eq!(read_state(&state_path), r#"{"last_shortcode":"XYZ99"}"#);
}

#[tokio::test]
async fn second_run_after_new_post_is_quiet() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("last_seen.json");
    let url = source_urls()[0].clone();

    let first = MockNotifier::new();
    let first_sent = first.sent();
    file_watcher(MockTransport::new().on(&url, profile_page("XYZ99")), &state_path, first)
        .run()
        .await;

    let second = MockNotifier::new();
    let second_sent = second.sent();
    let transport = MockTransport::new().on(&url, profile_page("XYZ99"));
    let outcome = file_watcher(transport, &state_path, second).run().await;

    assert_eq!(first_sent.lock().unwrap().len(), 1);
    assert!(second_sent.lock().unwrap().is_empty());
    assert!(matches!(outcome, RunOutcome::Unchanged(_)));
}

#[tokio::test]
async fn mirror_content_is_used_when_primary_is_rate_limited() {
    let urls = source_urls();
    let mirror_page = "Title: Britney\n\n[![Image](x.jpg)](https://www.instagram.com/p/MIRR01/)";
    let transport = MockTransport::new()
        .on(&urls[0], PageResponse::status(429))
        .on(&urls[1], PageResponse::ok(mirror_page));
    let store = MemoryStateStore::with_state("ABC12");
    let saved = store.handle();
    let saves = store.save_count();
    let notifier = MockNotifier::new();
    let sent = notifier.sent();

    let watcher = ProfileWatcher::new(
        watch_config(),
        ProfileFetcher::new(Box::new(transport), default_sources()),
        IdentifierExtractor::new(),
        Box::new(store),
        Notifier::new(Box::new(notifier)),
    );
    let outcome = watcher.run().await;

    assert!(matches!(outcome, RunOutcome::NewPost { delivered: true, .. }), "{outcome:?}");
    assert_eq!(sent.lock().unwrap()[0].shortcode.as_str(), "MIRR01");
    assert_eq!(saves.load(Ordering::SeqCst), 1);
    assert_eq!(saved.lock().unwrap().as_ref().unwrap().last_shortcode, "MIRR01");
}

#[tokio::test]
async fn malformed_state_file_aborts_without_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("last_seen.json");
    std::fs::write(&state_path, "{ truncated").unwrap();

    let transport = MockTransport::new().on(&source_urls()[0], profile_page("XYZ99"));
    let requests = transport.requests();
    let notifier = MockNotifier::new();
    let sent = notifier.sent();

    let outcome = file_watcher(transport, &state_path, notifier).run().await;

    assert!(matches!(outcome, RunOutcome::Aborted(_)), "{outcome:?}");
    assert!(requests.lock().unwrap().is_empty());
    assert!(sent.lock().unwrap().is_empty());
    assert_eq!(read_state(&state_path), "{ truncated");
}
