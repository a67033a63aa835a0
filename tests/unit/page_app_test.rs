//! Unit tests for the page logic of one tab: store operations tied to
//! reconciliation, the startup and navigation watchers, and the keyboard
//! feedback toast.

use sidemarks::app::PageApp;
use sidemarks::database::kv_store::{KeyValueStore, MemoryKvStore};
use sidemarks::dom::memory::{MemoryDocument, NodeId};
use sidemarks::dom::{PageDom, Selector};
use sidemarks::managers::bookmark_manager::{SetColorOutcome, ToggleOutcome};
use sidemarks::managers::bookmark_repository::{BookmarkRepository, KvBookmarkRepository};
use sidemarks::services::feedback::{FeedbackKind, FEEDBACK_CLASS};
use sidemarks::services::page_watcher::WatchTask;
use sidemarks::services::reconciler::{MARKER_CLASS, MARKER_COLOR_ATTR};
use sidemarks::types::bookmark::BookmarkColor;
use sidemarks::types::errors::{BookmarkError, StoreError};
use sidemarks::types::platform::Platform;
use sidemarks::types::settings::SideMarksSettings;

type Repo = KvBookmarkRepository<MemoryKvStore>;
type App = PageApp<MemoryDocument, Repo>;

fn repo() -> Repo {
    KvBookmarkRepository::new(MemoryKvStore::new(), SideMarksSettings::default().storage.key)
}

fn app_at(location: &str, repo: Repo) -> App {
    PageApp::new(MemoryDocument::new(location), repo, SideMarksSettings::default())
}

fn render_link(app: &mut App, href: &str, title: &str) -> NodeId {
    let platform = app.platform();
    let dom = app.dom_mut();
    let nav = dom.sidebar();
    dom.add_conversation_link(nav, platform, href, title)
}

fn markers(app: &App, scope: NodeId) -> Vec<NodeId> {
    app.dom().query_all(Some(&scope), &Selector::Class(MARKER_CLASS))
}

fn toasts(app: &App) -> Vec<NodeId> {
    app.dom().query_all(None, &Selector::Class(FEEDBACK_CLASS))
}

#[test]
fn test_chatgpt_reconciles_immediately_on_start() {
    let shared = repo();
    let mut seed = app_at("https://chatgpt.com/", shared.clone());
    render_link(&mut seed, "/c/abc", "Trip");
    seed.toggle("https://chatgpt.com/c/abc").unwrap();

    let mut app = app_at("https://chatgpt.com/", shared);
    let link = render_link(&mut app, "/c/abc", "Trip");
    app.start(0);
    assert!(app.is_started());
    assert_eq!(markers(&app, link).len(), 1);
}

#[test]
fn test_claude_waits_for_startup_burst() {
    let shared = repo();
    let mut seed = app_at("https://claude.ai/new", shared.clone());
    render_link(&mut seed, "/chat/ab-12", "Essay");
    seed.set_color("https://claude.ai/chat/ab-12", BookmarkColor::Green).unwrap();

    let mut app = app_at("https://claude.ai/new", shared);
    app.start(0);
    // The sidebar shows up after startup.
    let link = render_link(&mut app, "/chat/ab-12", "Essay");
    app.pump_mutations(10);
    assert!(markers(&app, link).is_empty());

    app.tick(100);
    let found = markers(&app, link);
    assert_eq!(found.len(), 1);
    assert_eq!(
        app.dom().attribute(&found[0], MARKER_COLOR_ATTR).as_deref(),
        Some("#34c759")
    );
}

#[test]
fn test_unknown_page_is_inert() {
    let store = MemoryKvStore::new();
    store.set_available(false);
    let mut app = app_at("https://example.com/c/abc", KvBookmarkRepository::new(store, "k"));

    app.start(0);
    assert!(!app.is_started());
    assert_eq!(app.platform(), Platform::Unknown);
    assert_eq!(app.next_deadline(), None);
    assert_eq!(app.reconcile().unwrap(), 0, "unknown pages never read the store");
    assert!(matches!(
        app.toggle("https://example.com/c/abc"),
        Err(BookmarkError::UnsupportedPlatform(_))
    ));
}

#[test]
fn test_toggle_adds_and_removes_marker() {
    let mut app = app_at("https://chatgpt.com/", repo());
    app.start(0);
    let link = render_link(&mut app, "/c/abc", "Trip");

    let (id, outcome) = app.toggle("https://chatgpt.com/c/abc").unwrap();
    assert_eq!(id.as_str(), "abc");
    let ToggleOutcome::Added(record) = outcome else {
        panic!("expected add");
    };
    assert_eq!(record.title, "Trip");
    assert_eq!(markers(&app, link).len(), 1);

    let (_, outcome) = app.toggle("https://chatgpt.com/c/abc").unwrap();
    assert_eq!(outcome, ToggleOutcome::Removed);
    assert!(markers(&app, link).is_empty());
    assert!(app.repo().load_all().unwrap().is_empty());
}

#[test]
fn test_same_color_twice_removes() {
    let mut app = app_at("https://grok.com/", repo());
    app.start(0);
    let link = render_link(&mut app, "/chat/k3", "Physics");

    let (_, first) = app.set_color("https://grok.com/chat/k3", BookmarkColor::Red).unwrap();
    assert!(matches!(first, SetColorOutcome::Created(_)));
    let (_, second) = app.set_color("https://grok.com/chat/k3", BookmarkColor::Blue).unwrap();
    assert!(matches!(second, SetColorOutcome::Updated(_)));
    let marker = markers(&app, link)[0];
    assert_eq!(app.dom().attribute(&marker, MARKER_COLOR_ATTR).as_deref(), Some("#007aff"));

    let (_, third) = app.set_color("https://grok.com/chat/k3", BookmarkColor::Blue).unwrap();
    assert_eq!(third, SetColorOutcome::Removed);
    assert!(markers(&app, link).is_empty());
}

#[test]
fn test_failed_write_leaves_page_untouched() {
    let store = MemoryKvStore::new();
    let mut app = app_at("https://chatgpt.com/", KvBookmarkRepository::new(store.clone(), "k"));
    app.start(0);
    let link = render_link(&mut app, "/c/abc", "Trip");

    store.set_available(false);
    let err = app.toggle("https://chatgpt.com/c/abc").unwrap_err();
    assert!(matches!(err, BookmarkError::Store(StoreError::Unavailable(_))));
    assert!(markers(&app, link).is_empty());
}

#[test]
fn test_navigation_burst_decorates_late_links() {
    let shared = repo();
    let mut app = app_at("https://chatgpt.com/", shared.clone());
    app.start(0);
    render_link(&mut app, "/c/abc", "Trip");
    app.toggle("https://chatgpt.com/c/abc").unwrap();

    // Client-side navigation re-renders the sidebar without markers.
    let stale: Vec<NodeId> = app.dom().query_all(None, &Selector::Tag("a"));
    for node in &stale {
        app.dom_mut().remove(node);
    }
    app.dom_mut().navigate("https://chatgpt.com/c/abc");
    let observation = app.pump_mutations(1000);
    assert!(observation.navigated);

    let fresh = render_link(&mut app, "/c/abc", "Trip");
    assert!(markers(&app, fresh).is_empty());
    app.tick(1100);
    assert_eq!(markers(&app, fresh).len(), 1);
}

#[test]
fn test_sweep_restores_dropped_marker() {
    let mut app = app_at("https://chatgpt.com/", repo());
    app.start(0);
    let link = render_link(&mut app, "/c/abc", "Trip");
    app.toggle("https://chatgpt.com/c/abc").unwrap();
    app.tick(600);

    let marker = markers(&app, link)[0];
    app.dom_mut().remove(&marker);
    assert_eq!(app.watcher().pending_of(WatchTask::Sweep), 1);

    app.tick(5000);
    assert_eq!(markers(&app, link).len(), 1);
}

#[test]
fn test_mutations_before_start_are_ignored() {
    let mut app = app_at("https://chatgpt.com/", repo());
    render_link(&mut app, "/c/abc", "Trip");
    let observation = app.pump_mutations(0);
    assert!(!observation.scheduled_anything());
    assert_eq!(app.next_deadline(), None);
}

#[test]
fn test_remove_clear_and_recolor() {
    let mut app = app_at("https://chatgpt.com/", repo());
    app.start(0);
    let a = render_link(&mut app, "/c/a1", "A");
    let b = render_link(&mut app, "/c/b2", "B");
    app.set_color("https://chatgpt.com/c/a1", BookmarkColor::Red).unwrap();
    app.set_color("https://chatgpt.com/c/b2", BookmarkColor::Green).unwrap();
    assert_eq!(app.marker_count(), 2);

    assert_eq!(app.recolor_all("#8e8e93"), 2);
    let marker = markers(&app, a)[0];
    assert_eq!(app.dom().attribute(&marker, MARKER_COLOR_ATTR).as_deref(), Some("#8e8e93"));
    let stored = app.repo().load_all().unwrap();
    assert_eq!(stored.get("a1").unwrap().color, "#ff3b30", "recolor never writes");

    assert!(app.remove("a1").unwrap());
    assert!(markers(&app, a).is_empty());
    assert_eq!(markers(&app, b).len(), 1);

    app.clear_all().unwrap();
    assert_eq!(app.marker_count(), 0);
    assert!(app.repo().load_all().unwrap().is_empty());
}

#[test]
fn test_keyboard_toggle_shows_feedback() {
    let mut app = app_at("https://chatgpt.com/c/abc", repo());
    app.start(0);

    assert_eq!(app.keyboard_toggle(0).unwrap(), FeedbackKind::Added);
    let shown = toasts(&app);
    assert_eq!(shown.len(), 1);
    assert_eq!(app.dom().text_content(&shown[0]), "Bookmark added!");
    assert_eq!(app.dom().style(&shown[0], "background"), "#007aff");
    assert!(app.repo().load_all().unwrap().get("abc").is_some());

    assert_eq!(app.keyboard_toggle(100).unwrap(), FeedbackKind::Removed);
    let shown = toasts(&app);
    assert_eq!(shown.len(), 1, "a new toast replaces the old one");
    assert_eq!(app.dom().text_content(&shown[0]), "Bookmark removed!");
}

#[test]
fn test_keyboard_toggle_without_conversation() {
    let mut app = app_at("https://claude.ai/new", repo());
    app.start(0);

    assert_eq!(app.keyboard_toggle(0).unwrap(), FeedbackKind::Error);
    let shown = toasts(&app);
    assert_eq!(app.dom().text_content(&shown[0]), "No conversation found");
    assert_eq!(app.dom().style(&shown[0], "background"), "#ff3b30");
    assert!(app.repo().load_all().unwrap().is_empty());
}

#[test]
fn test_keyboard_toggle_on_unknown_page_is_rejected() {
    let mut app = app_at("https://example.com/c/abc", repo());
    assert!(matches!(
        app.keyboard_toggle(0),
        Err(BookmarkError::UnsupportedPlatform(_))
    ));
    assert!(toasts(&app).is_empty());
}

#[test]
fn test_feedback_fades_then_detaches() {
    let mut app = app_at("https://grok.com/chat/k3", repo());
    app.start(0);
    app.keyboard_toggle(0).unwrap();
    let toast = toasts(&app)[0];

    app.tick(2999);
    assert_eq!(app.dom().style(&toast, "opacity"), "1");
    app.tick(3000);
    assert_eq!(app.dom().style(&toast, "opacity"), "0");
    assert_eq!(app.dom().style(&toast, "transform"), "translateX(100%)");
    assert!(app.dom().is_connected(&toast));
    app.tick(3300);
    assert!(!app.dom().is_connected(&toast));
    assert_eq!(app.feedback_token(), None);
}

#[test]
fn test_stale_dismissal_spares_newer_toast() {
    let mut app = app_at("https://grok.com/chat/k3", repo());
    app.start(0);
    app.keyboard_toggle(0).unwrap();
    app.keyboard_toggle(2000).unwrap();
    let newer = toasts(&app)[0];

    // The first toast's timers fire while the second one is showing.
    app.tick(3300);
    assert!(app.dom().is_connected(&newer));
    assert_eq!(app.dom().style(&newer, "opacity"), "1");

    app.tick(5300);
    assert!(!app.dom().is_connected(&newer));
}

#[test]
fn test_list_view_reads_store() {
    let mut app = app_at("https://claude.ai/new", repo());
    render_link(&mut app, "/chat/ab-12", "Essay");
    app.set_color("https://claude.ai/chat/ab-12", BookmarkColor::Purple).unwrap();

    let view = app.list_view().unwrap();
    assert_eq!(view.count(), 1);
    assert_eq!(view.url_for("ab-12"), Some("https://claude.ai/chat/ab-12"));
}

#[test]
fn test_shared_store_is_seen_by_other_tabs() {
    let store = MemoryKvStore::new();
    let key = SideMarksSettings::default().storage.key;
    let mut first = app_at("https://chatgpt.com/", KvBookmarkRepository::new(store.clone(), key.clone()));
    render_link(&mut first, "/c/abc", "Trip");
    first.toggle("https://chatgpt.com/c/abc").unwrap();

    assert!(store.get(&key).unwrap().is_some());
    let mut second = app_at("https://chatgpt.com/", KvBookmarkRepository::new(store, key));
    let link = render_link(&mut second, "/c/abc", "Trip");
    second.reconcile().unwrap();
    assert_eq!(markers(&second, link).len(), 1);
}
