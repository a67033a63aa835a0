//! Page DOM abstraction.
//!
//! The reconciler never touches a concrete DOM. It goes through [`PageDom`],
//! implemented by [`memory::MemoryDocument`] on native targets and by the
//! `web-sys` binding when compiled to `wasm32`.

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::types::errors::DomError;
use crate::types::platform::CONVERSATION_PATH_MARKERS;

/// The handful of selector shapes the extension needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `a[href*="<fragment>"]`
    LinkHrefContains(String),
    /// `<tag>`
    Tag(&'static str),
    /// `.<class>`
    Class(&'static str),
    /// `<tag>:last-child`
    LastChildTag(&'static str),
}

impl Selector {
    /// CSS form, for DOMs that take selector strings.
    pub fn to_css(&self) -> String {
        match self {
            Selector::LinkHrefContains(fragment) => format!("a[href*=\"{}\"]", fragment),
            Selector::Tag(tag) => (*tag).to_string(),
            Selector::Class(class) => format!(".{}", class),
            Selector::LastChildTag(tag) => format!("{}:last-child", tag),
        }
    }
}

/// Description of an element to create.
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    pub tag: &'static str,
    pub class: &'static str,
    /// CSS property name (hyphenated) and value pairs.
    pub styles: Vec<(&'static str, String)>,
    pub attributes: Vec<(&'static str, String)>,
    pub text: Option<String>,
}

/// Minimal DOM surface used by the reconciler, the feedback toast and the
/// title capture.
///
/// Style accessors use hyphenated CSS property names and return an empty
/// string for unset properties; setting an empty value removes the property.
pub trait PageDom {
    type Node: Clone + PartialEq + std::fmt::Debug;

    /// Full URL of the current page.
    fn location(&self) -> String;

    /// All matches below `scope` (or in the whole document), in document order.
    fn query_all(&self, scope: Option<&Self::Node>, selector: &Selector) -> Vec<Self::Node>;

    fn query_first(&self, scope: Option<&Self::Node>, selector: &Selector) -> Option<Self::Node> {
        self.query_all(scope, selector).into_iter().next()
    }

    /// Resolved URL of an anchor element.
    fn link_href(&self, node: &Self::Node) -> Option<String>;

    fn text_content(&self, node: &Self::Node) -> String;

    fn style(&self, node: &Self::Node, property: &str) -> String;

    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str) -> Result<(), DomError>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;

    /// Creates a detached element.
    fn create_element(&mut self, spec: &ElementSpec) -> Result<Self::Node, DomError>;

    /// Inserts `child` as the first child of `parent`.
    fn prepend_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    fn append_to_body(&mut self, child: &Self::Node) -> Result<(), DomError>;

    /// Detaches `node`; returns `false` if it was already detached.
    fn remove(&mut self, node: &Self::Node) -> bool;

    fn is_connected(&self, node: &Self::Node) -> bool;
}

/// DOMs that can report which nodes were added since the last call, the way a
/// `MutationObserver` batches `childList` records.
pub trait MutationSource {
    fn take_mutations(&mut self) -> Vec<AddedNode>;
}

/// Summary of one node from a mutation record's `addedNodes`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedNode {
    pub is_element: bool,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub href: Option<String>,
    /// Whether a conversation link exists somewhere below the node.
    #[serde(default)]
    pub contains_conversation_link: bool,
}

impl AddedNode {
    /// True when the node is, or contains, a conversation link of any
    /// supported platform.
    pub fn looks_like_conversation_link(&self) -> bool {
        if !self.is_element {
            return false;
        }
        if self.contains_conversation_link {
            return true;
        }
        self.tag.eq_ignore_ascii_case("a")
            && self
                .href
                .as_deref()
                .is_some_and(|href| CONVERSATION_PATH_MARKERS.iter().any(|m| href.contains(m)))
    }
}
