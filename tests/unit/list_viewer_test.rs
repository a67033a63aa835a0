//! Unit tests for the popup list view.

use rstest::rstest;
use sidemarks::services::list_viewer::ListView;
use sidemarks::services::reconciler::marker_background;
use sidemarks::types::bookmark::{BookmarkMap, BookmarkRecord, ConversationId};
use sidemarks::types::platform::Platform;

fn record(title: &str, platform: Option<Platform>, timestamp: i64) -> BookmarkRecord {
    BookmarkRecord {
        color: "#ff3b30".to_string(),
        color_type: "chatgpt-red".to_string(),
        title: title.to_string(),
        platform,
        timestamp,
    }
}

fn sample() -> BookmarkMap {
    let mut map = BookmarkMap::new();
    let mut put = |id: &str, r: BookmarkRecord| map.insert(&ConversationId::new(id).unwrap(), r);
    put("g1", record("Physics puzzle", Some(Platform::Grok), 30));
    put("c2", record("Trip planning", Some(Platform::ChatGpt), 20));
    put("c1", record("Rust lifetimes", Some(Platform::ChatGpt), 10));
    put("ab-12", record("Essay outline", Some(Platform::Claude), 40));
    map
}

#[test]
fn test_groups_in_display_order_rows_by_timestamp() {
    let view = ListView::from_bookmarks(&sample());
    assert_eq!(view.count(), 4);

    let headers: Vec<&str> = view.groups().iter().map(|g| g.header()).collect();
    assert_eq!(headers, ["ChatGPT", "Claude", "Grok"]);

    let chatgpt: Vec<&str> = view.groups()[0].rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(chatgpt, ["Rust lifetimes", "Trip planning"]);
}

#[test]
fn test_empty_groups_are_hidden() {
    let mut map = BookmarkMap::new();
    map.insert(&ConversationId::new("g1").unwrap(), record("x", Some(Platform::Grok), 1));
    let view = ListView::from_bookmarks(&map);
    assert_eq!(view.groups().len(), 1);
    assert_eq!(view.groups()[0].platform, Platform::Grok);
}

#[test]
fn test_empty_mapping_hides_list_and_search() {
    let view = ListView::from_bookmarks(&BookmarkMap::new());
    assert_eq!(view.count(), 0);
    assert!(!view.shows_list());
    assert!(!view.shows_search());
    assert!(view.groups().is_empty());
    assert!(view.filter("x").no_results_message().is_some());
    assert_eq!(view.filter("").render(), "Bookmarks: 0\n");
}

#[test]
fn test_row_fields() {
    let view = ListView::from_bookmarks(&sample());
    let claude = &view.groups()[1].rows[0];
    assert_eq!(claude.conversation_id, "ab-12");
    assert_eq!(claude.url, "https://claude.ai/chat/ab-12");
    assert_eq!(claude.swatch, marker_background("#ff3b30"));
    assert_eq!(view.url_for("c1"), Some("https://chat.openai.com/c/c1"));
    assert_eq!(view.url_for("nope"), None);
}

#[test]
fn test_legacy_records_are_grouped_by_id_shape() {
    let mut map = BookmarkMap::new();
    map.insert(&ConversationId::new("9e0d-77aa").unwrap(), record("Old claude", None, 1));
    map.insert(&ConversationId::new("6650f1a2").unwrap(), record("Old chatgpt", None, 2));
    let view = ListView::from_bookmarks(&map);

    assert_eq!(view.groups()[0].platform, Platform::ChatGpt);
    assert_eq!(view.groups()[0].rows[0].title, "Old chatgpt");
    assert_eq!(view.groups()[1].platform, Platform::Claude);
    assert_eq!(view.url_for("9e0d-77aa"), Some("https://claude.ai/chat/9e0d-77aa"));
}

#[test]
fn test_unknown_platform_counts_but_is_not_listed() {
    let mut map = BookmarkMap::new();
    map.insert(&ConversationId::new("x1").unwrap(), record("Elsewhere", Some(Platform::Unknown), 1));
    let view = ListView::from_bookmarks(&map);
    assert_eq!(view.count(), 1);
    assert!(view.shows_list());
    assert!(view.groups().is_empty());
}

#[test]
fn test_empty_title_uses_fallback() {
    let mut map = BookmarkMap::new();
    map.insert(&ConversationId::new("abcdefghij").unwrap(), record("  ", Some(Platform::ChatGpt), 1));
    let view = ListView::from_bookmarks(&map);
    assert_eq!(view.groups()[0].rows[0].title, "Conversation abcdefgh...");
}

#[rstest]
#[case("trip", &["Trip planning"])]
#[case("  TRIP  ", &["Trip planning"])]
#[case("claude", &["Essay outline"])]
#[case("gpt", &["Rust lifetimes", "Trip planning"])]
#[case("", &["Rust lifetimes", "Trip planning", "Essay outline", "Physics puzzle"])]
#[case("zebra", &[])]
fn test_filter(#[case] query: &str, #[case] expected: &[&str]) {
    let view = ListView::from_bookmarks(&sample());
    let filtered = view.filter(query);
    let titles: Vec<&str> = filtered
        .groups()
        .iter()
        .flat_map(|g| g.rows.iter())
        .map(|r| r.title.as_str())
        .collect();
    assert_eq!(titles, expected);
    assert_eq!(filtered.visible_rows(), expected.len());
}

#[test]
fn test_no_results_message_and_render() {
    let view = ListView::from_bookmarks(&sample());
    let none = view.filter("Zebra");
    assert_eq!(none.term(), "zebra");
    assert_eq!(none.no_results_message().as_deref(), Some("No bookmarks found for \"zebra\""));
    assert!(none.render().ends_with("No bookmarks found for \"zebra\"\n"));
    assert!(none.render().starts_with("Bookmarks: 4\n"));

    let some = view.filter("essay");
    assert_eq!(some.no_results_message(), None);
    assert_eq!(
        some.render(),
        "Bookmarks: 4\nClaude\n  [#ff3b30] Essay outline  https://claude.ai/chat/ab-12\n"
    );
}

#[test]
fn test_clear_all_empties_the_view() {
    use sidemarks::database::kv_store::MemoryKvStore;
    use sidemarks::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
    use sidemarks::managers::bookmark_repository::{BookmarkRepository, KvBookmarkRepository};

    let repo = KvBookmarkRepository::new(MemoryKvStore::new(), "bookmarks");
    repo.save_all(&sample()).unwrap();
    assert_eq!(ListView::from_bookmarks(&repo.load_all().unwrap()).count(), 4);

    BookmarkManager::new(&repo).clear_all().unwrap();
    let view = ListView::from_bookmarks(&repo.load_all().unwrap());
    assert!(view.groups().is_empty());
    assert!(!view.shows_search());
}

#[test]
fn test_lenient_records_are_listed() {
    let map: BookmarkMap = serde_json::from_str(
        r##"{
            "abcdefghij": {"color": "#ff3b30", "type": "chatgpt-red", "title": null, "platform": "chatgpt", "timestamp": 5},
            "c9": {"color": "#007aff", "type": "default", "title": "Later", "platform": "chatgpt", "timestamp": 1.7e12}
        }"##,
    )
    .unwrap();
    let view = ListView::from_bookmarks(&map);

    assert_eq!(view.count(), 2);
    let titles: Vec<&str> = view.groups()[0].rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Conversation abcdefgh...", "Later"]);
}

#[test]
fn test_rows_follow_timestamp_not_key_order() {
    let mut map = BookmarkMap::new();
    map.insert(&ConversationId::new("a").unwrap(), record("Newer", Some(Platform::Grok), 50));
    map.insert(&ConversationId::new("z").unwrap(), record("Older", Some(Platform::Grok), 5));
    map.insert(&ConversationId::new("m").unwrap(), record("Tie m", Some(Platform::Grok), 50));
    let view = ListView::from_bookmarks(&map);

    let ids: Vec<&str> = view.groups()[0]
        .rows
        .iter()
        .map(|r| r.conversation_id.as_str())
        .collect();
    assert_eq!(ids, ["z", "a", "m"]);
}
