//! In-memory document used by tests, the demo and the JSON host.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Removed nodes stay
//! in the arena (so stale handles remain valid to ask about) but lose their
//! parent, which is how `is_connected` answers.

use std::collections::BTreeMap;

use url::Url;

use super::{AddedNode, ElementSpec, MutationSource, PageDom, Selector};
use crate::types::errors::DomError;
use crate::types::platform::{Platform, CONVERSATION_PATH_MARKERS};

/// Handle to a node in a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document with a `<html><body><nav/></body></html>` skeleton.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    location: String,
    nodes: Vec<NodeData>,
    root: NodeId,
    body: NodeId,
    sidebar: NodeId,
    mutations: Vec<AddedNode>,
}

impl MemoryDocument {
    pub fn new(location: &str) -> Self {
        let mut doc = Self {
            location: location.to_string(),
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            sidebar: NodeId(0),
            mutations: Vec::new(),
        };
        doc.root = doc.create("html");
        doc.body = doc.create("body");
        doc.sidebar = doc.create("nav");
        doc.attach(doc.root, doc.body);
        doc.attach(doc.body, doc.sidebar);
        doc
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// The `<nav>` element conversation links are usually rendered into.
    pub fn sidebar(&self) -> NodeId {
        self.sidebar
    }

    pub fn set_location(&mut self, location: &str) {
        self.location = location.to_string();
    }

    /// Client-side navigation: the address changes and the app re-renders
    /// its main pane, which is what lets a mutation watch notice.
    pub fn navigate(&mut self, location: &str) {
        self.set_location(location);
        let main = self.create("main");
        self.append_child(self.body, main);
    }

    /// Creates a detached element.
    pub fn create(&mut self, tag: &str) -> NodeId {
        self.nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            ..NodeData::default()
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Appends `child` to `parent`, recording a mutation when `parent` is
    /// attached to the document.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.attach(parent, child);
        if self.is_connected(&parent) {
            let added = self.summarize(child);
            self.mutations.push(added);
        }
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        let data = &mut self.nodes[node.0];
        if !data.classes.iter().any(|c| c == class) {
            data.classes.push(class.to_string());
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.nodes[node.0].text = text.to_string();
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        &self.nodes[node.0].classes
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Renders a sidebar link with the markup the given platform uses and
    /// appends it to `parent` in one mutation.
    ///
    /// - ChatGPT: `<a href><div class="truncate">title</div></a>`
    /// - Claude: `<a href class="inline-flex">title</a>`
    /// - Grok: `<a href><span>title</span></a>`
    pub fn add_conversation_link(
        &mut self,
        parent: NodeId,
        platform: Platform,
        href: &str,
        title: &str,
    ) -> NodeId {
        let link = self.create("a");
        self.nodes[link.0]
            .attributes
            .insert("href".to_string(), href.to_string());
        match platform {
            Platform::ChatGpt => {
                let text = self.create("div");
                self.add_class(text, "truncate");
                self.set_text(text, title);
                self.attach(link, text);
            }
            Platform::Grok => {
                let text = self.create("span");
                self.set_text(text, title);
                self.attach(link, text);
            }
            Platform::Claude => {
                self.add_class(link, "inline-flex");
                self.set_text(link, title);
            }
            Platform::Unknown => self.set_text(link, title),
        }
        self.append_child(parent, link);
        link
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.nodes[node.0].parent.take() else {
            return false;
        };
        self.nodes[parent.0].children.retain(|c| *c != node);
        true
    }

    fn summarize(&self, node: NodeId) -> AddedNode {
        let data = &self.nodes[node.0];
        let contains_conversation_link = self
            .descendants(node)
            .into_iter()
            .any(|d| self.is_conversation_anchor(d));
        AddedNode {
            is_element: true,
            tag: data.tag.clone(),
            href: data.attributes.get("href").cloned(),
            contains_conversation_link,
        }
    }

    fn is_conversation_anchor(&self, node: NodeId) -> bool {
        let data = &self.nodes[node.0];
        data.tag == "a"
            && data
                .attributes
                .get("href")
                .is_some_and(|h| CONVERSATION_PATH_MARKERS.iter().any(|m| h.contains(m)))
    }

    /// Pre-order descendants of `node`, excluding `node` itself.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node.0].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        out
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        let data = &self.nodes[node.0];
        match selector {
            Selector::LinkHrefContains(fragment) => {
                data.tag == "a"
                    && data
                        .attributes
                        .get("href")
                        .is_some_and(|h| h.contains(fragment.as_str()))
            }
            Selector::Tag(tag) => data.tag == *tag,
            Selector::Class(class) => data.classes.iter().any(|c| c == class),
            Selector::LastChildTag(tag) => {
                data.tag == *tag
                    && data
                        .parent
                        .and_then(|p| self.nodes[p.0].children.last().copied())
                        == Some(node)
            }
        }
    }

    fn check(&self, node: NodeId) -> Result<(), DomError> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(DomError::Operation(format!("no such node: {}", node.0)))
        }
    }
}

impl PageDom for MemoryDocument {
    type Node = NodeId;

    fn location(&self) -> String {
        self.location.clone()
    }

    fn query_all(&self, scope: Option<&NodeId>, selector: &Selector) -> Vec<NodeId> {
        let start = scope.copied().unwrap_or(self.root);
        if start.0 >= self.nodes.len() {
            return Vec::new();
        }
        self.descendants(start)
            .into_iter()
            .filter(|n| self.matches(*n, selector))
            .collect()
    }

    fn link_href(&self, node: &NodeId) -> Option<String> {
        let raw = self.nodes.get(node.0)?.attributes.get("href")?;
        let resolved = Url::parse(&self.location)
            .and_then(|base| base.join(raw))
            .map(|u| u.to_string());
        Some(resolved.unwrap_or_else(|_| raw.clone()))
    }

    fn text_content(&self, node: &NodeId) -> String {
        let Some(data) = self.nodes.get(node.0) else {
            return String::new();
        };
        let mut text = data.text.clone();
        for d in self.descendants(*node) {
            text.push_str(&self.nodes[d.0].text);
        }
        text
    }

    fn style(&self, node: &NodeId, property: &str) -> String {
        self.nodes
            .get(node.0)
            .and_then(|d| d.style.get(property).cloned())
            .unwrap_or_default()
    }

    fn set_style(&mut self, node: &NodeId, property: &str, value: &str) -> Result<(), DomError> {
        self.check(*node)?;
        let style = &mut self.nodes[node.0].style;
        if value.is_empty() {
            style.remove(property);
        } else {
            style.insert(property.to_string(), value.to_string());
        }
        Ok(())
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.nodes.get(node.0)?.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.check(*node)?;
        self.nodes[node.0]
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn create_element(&mut self, spec: &ElementSpec) -> Result<NodeId, DomError> {
        let node = self.create(spec.tag);
        if !spec.class.is_empty() {
            self.add_class(node, spec.class);
        }
        for (property, value) in &spec.styles {
            self.set_style(&node, property, value)?;
        }
        for (name, value) in &spec.attributes {
            self.set_attribute(&node, name, value)?;
        }
        if let Some(text) = &spec.text {
            self.set_text(node, text);
        }
        Ok(node)
    }

    fn prepend_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        self.check(*parent)?;
        self.check(*child)?;
        if !self.is_connected(parent) {
            return Err(DomError::Detached);
        }
        self.detach(*child);
        self.nodes[child.0].parent = Some(*parent);
        self.nodes[parent.0].children.insert(0, *child);
        let added = self.summarize(*child);
        self.mutations.push(added);
        Ok(())
    }

    fn append_to_body(&mut self, child: &NodeId) -> Result<(), DomError> {
        self.check(*child)?;
        self.append_child(self.body, *child);
        Ok(())
    }

    fn remove(&mut self, node: &NodeId) -> bool {
        node.0 < self.nodes.len() && self.detach(*node)
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        let mut current = Some(*node);
        while let Some(n) = current {
            if n == self.root {
                return true;
            }
            current = self.nodes.get(n.0).and_then(|d| d.parent);
        }
        false
    }
}

impl MutationSource for MemoryDocument {
    fn take_mutations(&mut self) -> Vec<AddedNode> {
        std::mem::take(&mut self.mutations)
    }
}
