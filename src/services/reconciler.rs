//! DOM reconciler.
//!
//! Keeps the decorative markers inside sidebar conversation links consistent
//! with the persisted bookmark mapping. Markers are derived state: any of them
//! can be thrown away by the host page at any moment, and every entry point
//! here can be re-run safely.

use tracing::{debug, warn};

use crate::dom::{ElementSpec, PageDom, Selector};
use crate::types::bookmark::{BookmarkMap, ConversationId};
use crate::types::errors::DomError;
use crate::types::platform::{Platform, PlatformProfile, TitleLocator};

/// Class carried by every marker element.
pub const MARKER_CLASS: &str = "sidemarks-bookmark";
/// Attribute holding the color a marker was painted with.
pub const MARKER_COLOR_ATTR: &str = "data-sidemarks-color";

/// `position` values that already establish a containing block.
const POSITIONED: [&str; 4] = ["relative", "absolute", "fixed", "sticky"];

/// Ring-shaped swatch: a filled dot, a transparent gap and an outer ring.
pub fn marker_background(color: &str) -> String {
    format!(
        "radial-gradient(circle, {c} 0 36%, transparent 36% 52%, {c} 52% 100%)",
        c = color
    )
}

/// Reconciler bound to the platform of one page.
#[derive(Debug, Clone)]
pub struct Reconciler {
    platform: Platform,
    marker_size_px: u32,
}

impl Reconciler {
    pub fn new(platform: Platform, marker_size_px: u32) -> Self {
        Self {
            platform,
            marker_size_px,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn profile(&self) -> Option<&'static PlatformProfile> {
        self.platform.profile()
    }

    /// All conversation links currently rendered, in document order.
    pub fn conversation_links<D: PageDom>(&self, dom: &D) -> Vec<D::Node> {
        match self.profile() {
            Some(profile) => dom.query_all(
                None,
                &Selector::LinkHrefContains(profile.path_marker.to_string()),
            ),
            None => Vec::new(),
        }
    }

    /// Conversation links whose URL contains `id`.
    fn links_for<D: PageDom>(&self, dom: &D, id: &str) -> Vec<D::Node> {
        self.conversation_links(dom)
            .into_iter()
            .filter(|link| dom.link_href(link).is_some_and(|href| href.contains(id)))
            .collect()
    }

    /// The element inside `link` that holds the visible title text.
    pub fn title_container<D: PageDom>(&self, dom: &D, link: &D::Node) -> Option<D::Node> {
        match self.profile()?.title_locator {
            TitleLocator::Link => Some(link.clone()),
            TitleLocator::FirstSpanOrLink => dom
                .query_first(Some(link), &Selector::Tag("span"))
                .or_else(|| Some(link.clone())),
            TitleLocator::TruncateOrLastSpan => dom
                .query_first(Some(link), &Selector::Class("truncate"))
                .or_else(|| dom.query_first(Some(link), &Selector::LastChildTag("span"))),
        }
    }

    /// Display text of the conversation as rendered in the sidebar, or the
    /// fallback title when no link with text is present.
    pub fn conversation_title<D: PageDom>(&self, dom: &D, id: &ConversationId) -> String {
        self.links_for(dom, id.as_str())
            .first()
            .and_then(|link| self.title_container(dom, link))
            .map(|container| dom.text_content(&container).trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| id.fallback_title())
    }

    /// Whether any rendered link for `id` currently carries a marker.
    pub fn has_marker<D: PageDom>(&self, dom: &D, id: &str) -> bool {
        self.links_for(dom, id)
            .iter()
            .any(|link| dom.query_first(Some(link), &Selector::Class(MARKER_CLASS)).is_some())
    }

    fn marker_spec(&self, profile: &PlatformProfile, color: &str) -> ElementSpec {
        let size = format!("{}px", self.marker_size_px);
        ElementSpec {
            tag: "span",
            class: MARKER_CLASS,
            styles: vec![
                ("position", "absolute".to_string()),
                ("left", profile.marker_left.to_string()),
                ("top", "50%".to_string()),
                ("width", size.clone()),
                ("height", size),
                ("border-radius", "50%".to_string()),
                ("background", marker_background(color)),
                ("transform", "translateY(-50%)".to_string()),
                ("display", "block".to_string()),
                ("pointer-events", "none".to_string()),
                ("z-index", "1000".to_string()),
            ],
            attributes: vec![(MARKER_COLOR_ATTR, color.to_string())],
            text: None,
        }
    }

    /// Removes every marker inside `link`; returns how many were removed.
    fn strip_markers<D: PageDom>(&self, dom: &mut D, link: &D::Node) -> usize {
        dom.query_all(Some(link), &Selector::Class(MARKER_CLASS))
            .iter()
            .filter(|marker| dom.remove(marker))
            .count()
    }

    /// Decorates every rendered link for `id` with a fresh marker of `color`.
    /// Returns the number of links decorated.
    pub fn apply<D: PageDom>(&self, dom: &mut D, id: &str, color: &str) -> usize {
        let Some(profile) = self.profile() else {
            return 0;
        };
        let mut decorated = 0;
        for link in self.links_for(&*dom, id) {
            self.strip_markers(dom, &link);
            let Some(container) = self.title_container(&*dom, &link) else {
                continue;
            };
            match self.decorate(dom, profile, &container, color) {
                Ok(()) => decorated += 1,
                Err(DomError::Detached) => debug!(conversation = id, "title container detached, skipped"),
                Err(e) => warn!(conversation = id, error = %e, "failed to add marker"),
            }
        }
        if decorated > 0 {
            debug!(conversation = id, decorated, "applied marker");
        }
        decorated
    }

    fn decorate<D: PageDom>(
        &self,
        dom: &mut D,
        profile: &PlatformProfile,
        container: &D::Node,
        color: &str,
    ) -> Result<(), DomError> {
        if !dom.is_connected(container) {
            return Err(DomError::Detached);
        }
        let marker = dom.create_element(&self.marker_spec(profile, color))?;
        let position = dom.style(container, "position");
        if !POSITIONED.contains(&position.as_str()) {
            dom.set_style(container, "position", "relative")?;
        }
        dom.set_style(container, "padding-left", profile.padding_left)?;
        dom.prepend_child(container, &marker)
    }

    /// Removes the markers of `id` from every rendered link. Padding is only
    /// cleared on containers left without any marker. Returns the number of
    /// markers removed.
    pub fn retract<D: PageDom>(&self, dom: &mut D, id: &str) -> usize {
        let mut removed = 0;
        for link in self.links_for(&*dom, id) {
            let stripped = self.strip_markers(dom, &link);
            if stripped == 0 {
                continue;
            }
            removed += stripped;
            if let Some(container) = self.title_container(&*dom, &link) {
                let remaining = dom.query_first(Some(&container), &Selector::Class(MARKER_CLASS));
                if remaining.is_none() {
                    if let Err(e) = dom.set_style(&container, "padding-left", "") {
                        debug!(conversation = id, error = %e, "could not reset padding");
                    }
                }
            }
        }
        removed
    }

    /// Applies every bookmarked record of the mapping.
    pub fn reconcile<D: PageDom>(&self, dom: &mut D, bookmarks: &BookmarkMap) -> usize {
        if !self.platform.is_supported() {
            return 0;
        }
        let applied = bookmarks
            .bookmarked()
            .map(|(id, record)| self.apply(dom, id, &record.color))
            .sum();
        debug!(
            platform = %self.platform,
            bookmarks = bookmarks.bookmarked_count(),
            applied,
            "reconciled page"
        );
        applied
    }

    /// Re-applies bookmarks whose links are rendered without a marker.
    /// Returns the ids that had to be restored.
    pub fn sweep<D: PageDom>(&self, dom: &mut D, bookmarks: &BookmarkMap) -> Vec<String> {
        if !self.platform.is_supported() {
            return Vec::new();
        }
        let mut restored = Vec::new();
        for (id, record) in bookmarks.bookmarked() {
            if self.has_marker(&*dom, id) {
                continue;
            }
            if self.apply(dom, id, &record.color) > 0 {
                restored.push(id.to_string());
            }
        }
        if !restored.is_empty() {
            debug!(platform = %self.platform, restored = restored.len(), "sweep restored missing markers");
        }
        restored
    }

    /// Repaints every marker on the page with `color`. Storage is not
    /// touched, so the next reconcile brings stored colors back.
    pub fn recolor_all<D: PageDom>(&self, dom: &mut D, color: &str) -> usize {
        let markers = dom.query_all(None, &Selector::Class(MARKER_CLASS));
        let mut repainted = 0;
        for marker in &markers {
            let painted = dom
                .set_style(marker, "background", &marker_background(color))
                .and_then(|_| dom.set_attribute(marker, MARKER_COLOR_ATTR, color));
            match painted {
                Ok(()) => repainted += 1,
                Err(e) => debug!(error = %e, "could not repaint marker"),
            }
        }
        repainted
    }

    /// Removes every marker on the page and resets the title containers the
    /// markers were padding.
    pub fn clear_markers<D: PageDom>(&self, dom: &mut D) -> usize {
        let removed = dom
            .query_all(None, &Selector::Class(MARKER_CLASS))
            .iter()
            .filter(|marker| dom.remove(marker))
            .count();

        let paddings: Vec<&str> = Platform::DISPLAY_ORDER
            .iter()
            .filter_map(|p| p.profile())
            .map(|p| p.padding_left)
            .collect();
        for link in self.conversation_links(&*dom) {
            let Some(container) = self.title_container(&*dom, &link) else {
                continue;
            };
            if paddings.contains(&dom.style(&container, "padding-left").as_str()) {
                let reset = dom
                    .set_style(&container, "padding-left", "")
                    .and_then(|_| dom.set_style(&container, "position", ""));
                if let Err(e) = reset {
                    debug!(error = %e, "could not reset title container");
                }
            }
        }
        removed
    }
}
