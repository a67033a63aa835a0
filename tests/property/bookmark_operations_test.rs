//! Property-based tests for Bookmark Manager operations.
//!
//! Arbitrary sequences of toggles, color picks, removals and clears are run
//! against a real repository and against a plain map model; the persisted
//! mapping must always agree with the model.

use std::collections::BTreeMap;

use proptest::prelude::*;
use sidemarks::database::kv_store::MemoryKvStore;
use sidemarks::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use sidemarks::managers::bookmark_repository::{BookmarkRepository, KvBookmarkRepository};
use sidemarks::types::bookmark::{BookmarkColor, ConversationId, DEFAULT_COLOR};
use sidemarks::types::platform::Platform;

#[derive(Debug, Clone)]
enum Op {
    Toggle(String),
    SetColor(String, BookmarkColor),
    Remove(String),
    Clear,
}

fn arb_id() -> impl Strategy<Value = String> {
    // A small id space so operations collide often.
    "[a-d][0-9]"
}

fn arb_color() -> impl Strategy<Value = BookmarkColor> {
    prop::sample::select(BookmarkColor::ALL.to_vec())
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => arb_id().prop_map(Op::Toggle),
        4 => (arb_id(), arb_color()).prop_map(|(id, c)| Op::SetColor(id, c)),
        2 => arb_id().prop_map(Op::Remove),
        1 => Just(Op::Clear),
    ]
}

fn url(id: &str) -> String {
    format!("https://chatgpt.com/c/{}", id)
}

fn no_title(_: &ConversationId) -> String {
    String::new()
}

fn stored_colors(repo: &KvBookmarkRepository<MemoryKvStore>) -> BTreeMap<String, String> {
    repo.load_all()
        .unwrap()
        .bookmarked()
        .map(|(id, r)| (id.to_string(), r.color.clone()))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn operations_match_map_model(ops in prop::collection::vec(arb_op(), 1..40)) {
        let repo = KvBookmarkRepository::new(MemoryKvStore::new(), "bookmarks");
        let mut manager = BookmarkManager::new(&repo);
        let mut model: BTreeMap<String, String> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Toggle(id) => {
                    manager.toggle(&url(&id), Platform::ChatGpt, DEFAULT_COLOR, &no_title).unwrap();
                    if model.remove(&id).is_none() {
                        model.insert(id, DEFAULT_COLOR.to_string());
                    }
                }
                Op::SetColor(id, color) => {
                    manager
                        .set_color(&url(&id), color.hex(), color.action_id(), Platform::ChatGpt, &no_title)
                        .unwrap();
                    if model.get(&id).map(String::as_str) == Some(color.hex()) {
                        model.remove(&id);
                    } else {
                        model.insert(id, color.hex().to_string());
                    }
                }
                Op::Remove(id) => {
                    let removed = manager.remove(&id).unwrap();
                    prop_assert_eq!(removed, model.remove(&id).is_some());
                }
                Op::Clear => {
                    manager.clear_all().unwrap();
                    model.clear();
                }
            }
            prop_assert_eq!(&stored_colors(&repo), &model);
        }
    }

    #[test]
    fn toggle_twice_restores_mapping(id in "[a-z0-9]{1,12}", seed in prop::collection::vec(arb_id(), 0..5)) {
        let repo = KvBookmarkRepository::new(MemoryKvStore::new(), "bookmarks");
        let mut manager = BookmarkManager::new(&repo);
        for other in &seed {
            manager.toggle(&url(other), Platform::ChatGpt, DEFAULT_COLOR, &no_title).unwrap();
        }
        let before = stored_colors(&repo);

        manager.toggle(&url(&id), Platform::ChatGpt, DEFAULT_COLOR, &no_title).unwrap();
        manager.toggle(&url(&id), Platform::ChatGpt, DEFAULT_COLOR, &no_title).unwrap();
        prop_assert_eq!(stored_colors(&repo), before);
    }

    #[test]
    fn last_distinct_color_wins(id in "[a-z0-9]{1,12}", colors in prop::collection::vec(arb_color(), 1..8)) {
        let repo = KvBookmarkRepository::new(MemoryKvStore::new(), "bookmarks");
        let mut manager = BookmarkManager::new(&repo);
        let mut expected: Option<BookmarkColor> = None;
        for color in colors {
            manager
                .set_color(&url(&id), color.hex(), color.action_id(), Platform::ChatGpt, &no_title)
                .unwrap();
            expected = if expected == Some(color) { None } else { Some(color) };
        }

        let stored = repo.get(&id).unwrap();
        match expected {
            Some(color) => {
                let record = stored.unwrap();
                prop_assert_eq!(record.color, color.hex());
                prop_assert_eq!(record.color_type, color.action_id());
                prop_assert_eq!(record.platform, Some(Platform::ChatGpt));
            }
            None => prop_assert!(stored.is_none()),
        }
    }

    #[test]
    fn unsupported_page_never_writes(id in "[a-z0-9]{1,12}") {
        let repo = KvBookmarkRepository::new(MemoryKvStore::new(), "bookmarks");
        let mut manager = BookmarkManager::new(&repo);
        prop_assert!(manager.toggle(&url(&id), Platform::Unknown, DEFAULT_COLOR, &no_title).is_err());
        prop_assert!(repo.load_all().unwrap().is_empty());
    }
}
