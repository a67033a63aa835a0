//! Command dispatcher: the background side of the extension.
//!
//! Declares the link context menu, and turns menu clicks, keyboard commands
//! and popup actions into [`ExtensionMessage`]s for the page logic. Delivery
//! itself lives in [`super::control_surface`].

use serde::Serialize;
use url::Url;

use crate::managers::shortcut_manager::TOGGLE_BOOKMARK_COMMAND;
use crate::types::bookmark::BookmarkColor;
use crate::types::message::{
    ExtensionMessage, ACTION_CLEAR_ALL, ACTION_KEYBOARD_TOGGLE, ACTION_REFRESH, ACTION_REMOVE,
    ACTION_TOGGLE, ACTION_UPDATE_COLOR,
};

pub const MENU_ROOT_ID: &str = "chatgpt-context-menu";
pub const MENU_COLOR_SUBMENU_ID: &str = "chatgpt-color-bookmarks";

/// Pages the menu is offered on.
pub const DOCUMENT_URL_PATTERNS: [&str; 4] = [
    "*://chat.openai.com/*",
    "*://chatgpt.com/*",
    "*://claude.ai/*",
    "*://grok.com/*",
];

const LINK_CONTEXT: [&str; 1] = ["link"];

/// One context menu entry, shaped like a `contextMenus.create` argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<&'static str>,
    pub title: &'static str,
    pub contexts: &'static [&'static str],
    pub document_url_patterns: &'static [&'static str],
}

impl MenuItem {
    fn new(id: &'static str, parent_id: Option<&'static str>, title: &'static str) -> Self {
        Self {
            id,
            parent_id,
            title,
            contexts: &LINK_CONTEXT,
            document_url_patterns: &DOCUMENT_URL_PATTERNS,
        }
    }
}

/// The full menu tree, parents before children.
pub fn context_menu_items() -> Vec<MenuItem> {
    let mut items = vec![
        MenuItem::new(MENU_ROOT_ID, None, "SideMarks"),
        MenuItem::new(ACTION_TOGGLE, Some(MENU_ROOT_ID), "Toggle Bookmark"),
        MenuItem::new(MENU_COLOR_SUBMENU_ID, Some(MENU_ROOT_ID), "Color Bookmarks"),
    ];
    items.extend(
        BookmarkColor::ALL
            .iter()
            .map(|c| MenuItem::new(c.action_id(), Some(MENU_COLOR_SUBMENU_ID), c.label())),
    );
    items
}

/// Whether the menu is offered on the page at `url`.
pub fn document_url_matches(url: &str) -> bool {
    DOCUMENT_URL_PATTERNS
        .iter()
        .any(|pattern| url_matches_pattern(url, pattern))
}

/// Match-pattern check (`<scheme>://<host>/<path>`, `*` wildcards).
fn url_matches_pattern(url: &str, pattern: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some((scheme_pat, rest)) = pattern.split_once("://") else {
        return false;
    };

    let scheme = parsed.scheme();
    let scheme_ok = match scheme_pat {
        "*" => scheme == "http" || scheme == "https",
        other => other == scheme,
    };
    if !scheme_ok {
        return false;
    }

    let (host_pat, path_pat) = match rest.split_once('/') {
        Some((h, p)) => (h, format!("/{}", p)),
        None => (rest, "/".to_string()),
    };
    let host = parsed.host_str().unwrap_or_default();
    let host_ok = if host_pat == "*" {
        true
    } else if let Some(domain) = host_pat.strip_prefix("*.") {
        host == domain || host.ends_with(&format!(".{}", domain))
    } else {
        host_pat == host
    };

    host_ok && simple_glob_match(&path_pat, parsed.path())
}

fn simple_glob_match(pattern: &str, text: &str) -> bool {
    if pattern == "/*" || pattern == "*" {
        return true;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }
    let mut pos = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        match text[pos..].find(part) {
            Some(found) if i > 0 || found == 0 => pos += found + part.len(),
            _ => return false,
        }
    }
    parts.last().is_some_and(|last| last.is_empty()) || pos == text.len()
}

/// Message for a menu click on a link. Container entries and clicks without
/// a link produce nothing.
pub fn message_for_menu_click(menu_item_id: &str, link_url: Option<&str>) -> Option<ExtensionMessage> {
    let link_url = link_url.filter(|u| !u.is_empty())?;
    let actionable =
        menu_item_id == ACTION_TOGGLE || BookmarkColor::from_action_id(menu_item_id).is_some();
    actionable.then(|| ExtensionMessage::new(menu_item_id).with_link_url(link_url))
}

/// Message for a keyboard command.
pub fn message_for_command(command: &str) -> Option<ExtensionMessage> {
    (command == TOGGLE_BOOKMARK_COMMAND).then(|| ExtensionMessage::new(ACTION_KEYBOARD_TOGGLE))
}

// Popup actions.

pub fn recolor_message(color: &str) -> ExtensionMessage {
    ExtensionMessage::new(ACTION_UPDATE_COLOR).with_color(color)
}

pub fn clear_all_message() -> ExtensionMessage {
    ExtensionMessage::new(ACTION_CLEAR_ALL)
}

pub fn remove_message(conversation_id: &str) -> ExtensionMessage {
    ExtensionMessage::new(ACTION_REMOVE).with_conversation_id(conversation_id)
}

pub fn refresh_message() -> ExtensionMessage {
    ExtensionMessage::new(ACTION_REFRESH)
}
