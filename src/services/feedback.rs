//! Transient toast shown after the keyboard toggle.

use crate::dom::{ElementSpec, PageDom, Selector};
use crate::types::errors::DomError;

pub const FEEDBACK_CLASS: &str = "sidemarks-keyboard-feedback";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Added,
    Removed,
    Error,
}

impl FeedbackKind {
    pub fn message(self) -> &'static str {
        match self {
            FeedbackKind::Added => "Bookmark added!",
            FeedbackKind::Removed => "Bookmark removed!",
            FeedbackKind::Error => "No conversation found",
        }
    }

    pub fn background(self) -> &'static str {
        match self {
            FeedbackKind::Added => "#007aff",
            FeedbackKind::Removed => "#8e8e93",
            FeedbackKind::Error => "#ff3b30",
        }
    }
}

/// Tracks the toast currently on the page.
///
/// Each toast gets a token. Dismissal steps carry the token they were
/// scheduled for and do nothing once a newer toast took over.
#[derive(Debug)]
pub struct FeedbackToast<N> {
    current: Option<(u64, N)>,
    last_token: u64,
}

impl<N> Default for FeedbackToast<N> {
    fn default() -> Self {
        Self {
            current: None,
            last_token: 0,
        }
    }
}

impl<N: Clone + PartialEq + std::fmt::Debug> FeedbackToast<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any toast on the page with a new one; returns its token.
    pub fn show<D: PageDom<Node = N>>(&mut self, dom: &mut D, kind: FeedbackKind) -> Result<u64, DomError> {
        for stale in dom.query_all(None, &Selector::Class(FEEDBACK_CLASS)) {
            dom.remove(&stale);
        }
        self.current = None;

        let spec = ElementSpec {
            tag: "div",
            class: FEEDBACK_CLASS,
            styles: vec![
                ("position", "fixed".to_string()),
                ("top", "20px".to_string()),
                ("right", "20px".to_string()),
                ("padding", "12px 20px".to_string()),
                ("border-radius", "8px".to_string()),
                ("color", "white".to_string()),
                ("font-size", "14px".to_string()),
                ("font-weight", "500".to_string()),
                ("z-index", "10000".to_string()),
                ("box-shadow", "0 4px 12px rgba(0, 0, 0, 0.15)".to_string()),
                ("transition", "all 0.3s ease".to_string()),
                ("background", kind.background().to_string()),
                ("opacity", "1".to_string()),
            ],
            attributes: Vec::new(),
            text: Some(kind.message().to_string()),
        };
        let node = dom.create_element(&spec)?;
        dom.append_to_body(&node)?;

        self.last_token += 1;
        self.current = Some((self.last_token, node));
        Ok(self.last_token)
    }

    /// Starts the fade-out of the toast shown under `token`.
    pub fn hide<D: PageDom<Node = N>>(&mut self, dom: &mut D, token: u64) -> bool {
        match &self.current {
            Some((current, node)) if *current == token && dom.is_connected(node) => {
                let node = node.clone();
                dom.set_style(&node, "transform", "translateX(100%)")
                    .and_then(|_| dom.set_style(&node, "opacity", "0"))
                    .is_ok()
            }
            _ => false,
        }
    }

    /// Detaches the toast shown under `token`.
    pub fn remove<D: PageDom<Node = N>>(&mut self, dom: &mut D, token: u64) -> bool {
        match self.current.take() {
            Some((current, node)) if current == token => dom.remove(&node),
            other => {
                self.current = other;
                false
            }
        }
    }

    pub fn current_token(&self) -> Option<u64> {
        self.current.as_ref().map(|(token, _)| *token)
    }
}
