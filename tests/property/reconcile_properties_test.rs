//! Property-based tests for DOM reconciliation.
//!
//! For arbitrary sidebars and bookmark mappings, a reconcile leaves exactly
//! one marker on every rendered link of a bookmarked conversation and none
//! anywhere else, and running it again changes nothing.

use std::collections::BTreeMap;

use proptest::prelude::*;
use sidemarks::dom::memory::{MemoryDocument, NodeId};
use sidemarks::dom::{PageDom, Selector};
use sidemarks::services::reconciler::{Reconciler, MARKER_CLASS, MARKER_COLOR_ATTR};
use sidemarks::types::bookmark::{BookmarkColor, BookmarkMap, BookmarkRecord, ConversationId};
use sidemarks::types::platform::Platform;

fn arb_platform() -> impl Strategy<Value = Platform> {
    prop::sample::select(Platform::DISPLAY_ORDER.to_vec())
}

fn arb_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-f][0-9]", 0..12)
}

fn arb_bookmarks() -> impl Strategy<Value = BTreeMap<String, BookmarkColor>> {
    prop::collection::btree_map("[a-f][0-9]", prop::sample::select(BookmarkColor::ALL.to_vec()), 0..10)
}

fn build(
    platform: Platform,
    rendered: &[String],
    bookmarks: &BTreeMap<String, BookmarkColor>,
) -> (MemoryDocument, Reconciler, Vec<(String, NodeId)>, BookmarkMap) {
    let location = format!("https://{}/", platform.profile().unwrap().domain);
    let marker = platform.profile().unwrap().path_marker;
    let mut doc = MemoryDocument::new(&location);
    let nav = doc.sidebar();
    let links = rendered
        .iter()
        .map(|id| {
            let href = format!("{}{}", marker, id);
            (id.clone(), doc.add_conversation_link(nav, platform, &href, id))
        })
        .collect();

    let mut map = BookmarkMap::new();
    for (id, color) in bookmarks {
        map.insert(
            &ConversationId::new(id.as_str()).unwrap(),
            BookmarkRecord {
                color: color.hex().to_string(),
                color_type: color.action_id().to_string(),
                title: String::new(),
                platform: Some(platform),
                timestamp: 0,
            },
        );
    }
    (doc, Reconciler::new(platform, 12), links, map)
}

fn markers(doc: &MemoryDocument, scope: Option<&NodeId>) -> Vec<NodeId> {
    doc.query_all(scope, &Selector::Class(MARKER_CLASS))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_bookmarked_link_gets_one_marker(
        platform in arb_platform(),
        rendered in arb_ids(),
        bookmarks in arb_bookmarks(),
    ) {
        let (mut doc, rec, links, map) = build(platform, &rendered, &bookmarks);
        rec.reconcile(&mut doc, &map);

        for (id, link) in &links {
            let found = markers(&doc, Some(link));
            match bookmarks.get(id) {
                Some(color) => {
                    prop_assert_eq!(found.len(), 1);
                    prop_assert_eq!(doc.attribute(&found[0], MARKER_COLOR_ATTR), Some(color.hex().to_string()));
                }
                None => prop_assert!(found.is_empty()),
            }
        }

        let expected = links.iter().filter(|(id, _)| bookmarks.contains_key(id)).count();
        prop_assert_eq!(markers(&doc, None).len(), expected);
    }

    #[test]
    fn reconcile_is_idempotent(
        platform in arb_platform(),
        rendered in arb_ids(),
        bookmarks in arb_bookmarks(),
    ) {
        let (mut doc, rec, _, map) = build(platform, &rendered, &bookmarks);
        rec.reconcile(&mut doc, &map);
        let first = markers(&doc, None).len();
        rec.reconcile(&mut doc, &map);
        prop_assert_eq!(markers(&doc, None).len(), first);
        prop_assert!(rec.sweep(&mut doc, &map).is_empty());
    }

    #[test]
    fn clear_then_reconcile_restores(
        platform in arb_platform(),
        rendered in arb_ids(),
        bookmarks in arb_bookmarks(),
    ) {
        let (mut doc, rec, _, map) = build(platform, &rendered, &bookmarks);
        rec.reconcile(&mut doc, &map);
        let drawn = markers(&doc, None).len();

        prop_assert_eq!(rec.clear_markers(&mut doc), drawn);
        prop_assert!(markers(&doc, None).is_empty());
        rec.reconcile(&mut doc, &map);
        prop_assert_eq!(markers(&doc, None).len(), drawn);
    }
}
