//! Browser binding using wasm-bindgen.
//!
//! Provides [`PageDom`] over the live document, an [`AsyncKeyValueStore`]
//! over `chrome.storage.local`, and the JavaScript-facing content script
//! object. Once started, the content script drives itself: a
//! `MutationObserver` feeds the page watcher, one timeout is kept armed for
//! the watcher's next deadline, and runtime messages and storage changes are
//! received through the extension event listeners.
//!
//! ```javascript
//! const { default: init, SideMarksContent } =
//!   await import(chrome.runtime.getURL("pkg/sidemarks.js"));
//! await init();
//! const page = await SideMarksContent.create(null);
//! page.start();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Array, Function, Object, Promise, Reflect, JSON};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    console, Document, Element, HtmlAnchorElement, HtmlElement, MutationObserver,
    MutationObserverInit, MutationRecord, Node, Window,
};

use crate::app::PageApp;
use crate::database::mirrored_store::{AsyncKeyValueStore, MirroredStore};
use crate::dom::{AddedNode, ElementSpec, PageDom, Selector};
use crate::managers::bookmark_repository::KvBookmarkRepository;
use crate::message_handler::handle_raw_message;
use crate::types::errors::{DomError, StoreError};
use crate::types::platform::CONVERSATION_PATH_MARKERS;
use crate::types::settings::SideMarksSettings;

// ──────────────────────────────────────────────────────────────────────────────
// Initialization
// ──────────────────────────────────────────────────────────────────────────────

#[wasm_bindgen(start)]
pub fn wasm_init() {
    #[cfg(feature = "console-panic")]
    console_error_panic_hook::set_once();
}

fn js_error(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Walks `path` from the global object; `None` when any step is missing.
fn global_path(path: &[&str]) -> Option<JsValue> {
    path.iter()
        .try_fold(JsValue::from(js_sys::global()), |object, name| {
            Reflect::get(&object, &JsValue::from_str(name))
                .ok()
                .filter(|v| !v.is_undefined() && !v.is_null())
        })
}

/// Calls `addListener` on the extension event at `path`.
fn add_listener(path: &[&str], callback: &JsValue) {
    let Some(event) = global_path(path) else {
        console::warn_1(&format!("SideMarks: {} is not available", path.join(".")).into());
        return;
    };
    let added = Reflect::get(&event, &JsValue::from_str("addListener"))
        .and_then(|f| f.dyn_into::<Function>())
        .and_then(|f| f.call1(&event, callback));
    if let Err(e) = added {
        console::warn_1(&e);
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Document
// ──────────────────────────────────────────────────────────────────────────────

/// [`PageDom`] over the window's document.
pub struct WebDocument {
    document: Document,
}

impl WebDocument {
    pub fn from_window() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;
        Ok(Self { document })
    }

    fn style_of(node: &Element) -> Result<web_sys::CssStyleDeclaration, DomError> {
        node.dyn_ref::<HtmlElement>()
            .map(|e| e.style())
            .ok_or_else(|| DomError::Operation("element has no inline style".to_string()))
    }
}

impl PageDom for WebDocument {
    type Node = Element;

    fn location(&self) -> String {
        self.document
            .location()
            .and_then(|l| l.href().ok())
            .unwrap_or_default()
    }

    fn query_all(&self, scope: Option<&Element>, selector: &Selector) -> Vec<Element> {
        let css = selector.to_css();
        let found = match scope {
            Some(element) => element.query_selector_all(&css),
            None => self.document.query_selector_all(&css),
        };
        let Ok(list) = found else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn link_href(&self, node: &Element) -> Option<String> {
        node.dyn_ref::<HtmlAnchorElement>().map(|a| a.href())
    }

    fn text_content(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn style(&self, node: &Element, property: &str) -> String {
        Self::style_of(node)
            .ok()
            .and_then(|s| s.get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn set_style(&mut self, node: &Element, property: &str, value: &str) -> Result<(), DomError> {
        let style = Self::style_of(node)?;
        let result = if value.is_empty() {
            style.remove_property(property).map(|_| ())
        } else {
            style.set_property(property, value)
        };
        result.map_err(|e| DomError::Operation(js_error(e)))
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) -> Result<(), DomError> {
        node.set_attribute(name, value)
            .map_err(|e| DomError::Operation(js_error(e)))
    }

    fn create_element(&mut self, spec: &ElementSpec) -> Result<Element, DomError> {
        let element = self
            .document
            .create_element(spec.tag)
            .map_err(|e| DomError::Operation(js_error(e)))?;
        if !spec.class.is_empty() {
            element.set_class_name(spec.class);
        }
        for (property, value) in &spec.styles {
            self.set_style(&element, property, value)?;
        }
        for (name, value) in &spec.attributes {
            self.set_attribute(&element, name, value)?;
        }
        if let Some(text) = &spec.text {
            element.set_text_content(Some(text));
        }
        Ok(element)
    }

    fn prepend_child(&mut self, parent: &Element, child: &Element) -> Result<(), DomError> {
        if !parent.is_connected() {
            return Err(DomError::Detached);
        }
        let first = parent.first_child();
        parent
            .insert_before(child, first.as_ref())
            .map(|_| ())
            .map_err(|e| DomError::Operation(js_error(e)))
    }

    fn append_to_body(&mut self, child: &Element) -> Result<(), DomError> {
        let body = self.document.body().ok_or(DomError::NoBody)?;
        body.append_child(child)
            .map(|_| ())
            .map_err(|e| DomError::Operation(js_error(e)))
    }

    fn remove(&mut self, node: &Element) -> bool {
        if node.parent_node().is_none() {
            return false;
        }
        node.remove();
        true
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Storage
// ──────────────────────────────────────────────────────────────────────────────

/// [`AsyncKeyValueStore`] over `chrome.storage.local`, the area shared by
/// every tab and the popup. Values are kept there as JSON, not as strings.
pub struct ChromeStorageArea {
    area: Object,
}

impl ChromeStorageArea {
    pub fn local() -> Result<Self, StoreError> {
        global_path(&["chrome", "storage", "local"])
            .map(|area| Self {
                area: area.unchecked_into(),
            })
            .ok_or_else(|| {
                StoreError::Unavailable("chrome.storage.local is not available".to_string())
            })
    }

    async fn call(&self, method: &str, argument: &JsValue) -> Result<JsValue, StoreError> {
        let unavailable = |e: JsValue| StoreError::Unavailable(js_error(e));
        let promise: Promise = Reflect::get(&self.area, &JsValue::from_str(method))
            .and_then(|f| f.dyn_into::<Function>())
            .and_then(|f| f.call1(&self.area, argument))
            .and_then(|p| p.dyn_into::<Promise>())
            .map_err(unavailable)?;
        JsFuture::from(promise).await.map_err(unavailable)
    }
}

impl AsyncKeyValueStore for ChromeStorageArea {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let items = self.call("get", &JsValue::from_str(key)).await?;
        let value = Reflect::get(&items, &JsValue::from_str(key))
            .map_err(|e| StoreError::Unavailable(js_error(e)))?;
        if value.is_undefined() {
            return Ok(None);
        }
        JSON::stringify(&value)
            .map(|json| Some(String::from(json)))
            .map_err(|e| StoreError::Serialization(js_error(e)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let parsed = JSON::parse(value).map_err(|e| StoreError::Serialization(js_error(e)))?;
        let items = Object::new();
        Reflect::set(&items, &JsValue::from_str(key), &parsed)
            .map_err(|e| StoreError::Serialization(js_error(e)))?;
        self.call("set", &items).await.map(|_| ())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.call("remove", &JsValue::from_str(key)).await.map(|_| ())
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Content script
// ──────────────────────────────────────────────────────────────────────────────

type WebStore = MirroredStore<ChromeStorageArea>;
type WebApp = PageApp<WebDocument, KvBookmarkRepository<WebStore>>;

/// CSS matching a conversation link of any supported platform.
fn conversation_link_css() -> String {
    CONVERSATION_PATH_MARKERS
        .iter()
        .map(|marker| format!("a[href*=\"{}\"]", marker))
        .collect::<Vec<_>>()
        .join(", ")
}

fn summarize(node: &Node, link_css: &str) -> AddedNode {
    let Some(element) = node.dyn_ref::<Element>() else {
        return AddedNode::default();
    };
    AddedNode {
        is_element: true,
        tag: element.tag_name(),
        href: element.get_attribute("href"),
        contains_conversation_link: element.query_selector(link_css).ok().flatten().is_some(),
    }
}

/// State shared by the exported object and the browser callbacks. Callbacks
/// hold it weakly and do nothing once the content script is freed.
struct Driver {
    window: Window,
    app: RefCell<WebApp>,
    store: WebStore,
    storage_key: String,
    timer: Cell<Option<i32>>,
    on_timer: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Driver {
    fn now(&self) -> u64 {
        self.window
            .performance()
            .map(|p| p.now() as u64)
            .unwrap_or_default()
    }

    /// Keeps a single timeout armed for the watcher's next deadline.
    fn arm(&self) {
        if let Some(handle) = self.timer.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        let Some(deadline) = self.app.borrow().next_deadline() else {
            return;
        };
        let delay = deadline.saturating_sub(self.now()).min(i32::MAX as u64) as i32;
        let on_timer = self.on_timer.borrow();
        let Some(callback) = on_timer.as_ref() else {
            return;
        };
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                delay,
            ) {
            Ok(handle) => self.timer.set(Some(handle)),
            Err(e) => console::warn_1(&e),
        }
    }

    /// Hands queued writes to the storage area in the background.
    fn flush(&self) {
        if !self.store.has_pending() {
            return;
        }
        let store = self.store.clone();
        spawn_local(async move {
            if let Err(e) = store.flush().await {
                console::warn_1(&format!("SideMarks: {}", e).into());
            }
        });
    }

    fn settle(&self) {
        self.flush();
        self.arm();
    }

    fn fire(&self) {
        self.timer.set(None);
        let now = self.now();
        self.app.borrow_mut().tick(now);
        self.settle();
    }

    fn on_mutations(&self, records: &Array, link_css: &str) {
        let added: Vec<AddedNode> = records
            .iter()
            .filter_map(|r| r.dyn_into::<MutationRecord>().ok())
            .flat_map(|record| {
                let nodes = record.added_nodes();
                (0..nodes.length()).filter_map(move |i| nodes.get(i))
            })
            .map(|node| summarize(&node, link_css))
            .collect();
        let now = self.now();
        let observation = self.app.borrow_mut().on_dom_mutations(now, &added);
        if observation.scheduled_anything() {
            self.arm();
        }
    }

    /// Another tab or the popup changed the mapping.
    fn on_storage_changed(&self, changes: &JsValue, area_name: &JsValue) {
        if area_name.as_string().as_deref() != Some("local") {
            return;
        }
        let change = Reflect::get(changes, &JsValue::from_str(&self.storage_key))
            .unwrap_or(JsValue::UNDEFINED);
        if change.is_undefined() {
            return;
        }
        let new_value =
            Reflect::get(&change, &JsValue::from_str("newValue")).unwrap_or(JsValue::UNDEFINED);
        let value = if new_value.is_undefined() {
            None
        } else {
            JSON::stringify(&new_value).ok().map(String::from)
        };
        self.store.apply_external(&self.storage_key, value);
        if let Err(e) = self.app.borrow_mut().reconcile() {
            console::warn_1(&format!("SideMarks: {}", e).into());
        }
    }

    fn on_runtime_message(&self, message: &JsValue, respond: &JsValue) {
        let Some(raw) = JSON::stringify(message).ok().map(String::from) else {
            return;
        };
        let now = self.now();
        let reply = handle_raw_message(&mut *self.app.borrow_mut(), &raw, now);
        self.settle();

        let reply = match reply {
            Ok(Some(reply)) => reply,
            Ok(None) => return,
            Err(e) => {
                console::warn_1(&format!("SideMarks: {}", e).into());
                return;
            }
        };
        let Some(respond) = respond.dyn_ref::<Function>() else {
            return;
        };
        let sent = serde_json::to_string(&reply)
            .map_err(to_js)
            .and_then(|json| JSON::parse(&json))
            .and_then(|value| respond.call1(&JsValue::NULL, &value));
        if let Err(e) = sent {
            console::warn_1(&e);
        }
    }
}

/// Page logic of one tab.
#[wasm_bindgen]
pub struct SideMarksContent {
    driver: Rc<Driver>,
    observer: Option<MutationObserver>,
    on_mutations: Option<Closure<dyn FnMut(Array, MutationObserver)>>,
    listening: bool,
}

#[wasm_bindgen]
impl SideMarksContent {
    /// Binds to the current document and reads the bookmark mapping from
    /// the extension storage area. `settings_json` overrides the defaults.
    pub async fn create(settings_json: Option<String>) -> Result<SideMarksContent, JsValue> {
        let settings: SideMarksSettings = match settings_json {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| JsValue::from_str(&format!("Invalid settings: {e}")))?,
            None => SideMarksSettings::default(),
        };
        let storage_key = settings.storage.key.clone();
        let area = ChromeStorageArea::local().map_err(to_js)?;
        let store = MirroredStore::hydrate(area, &[storage_key.as_str()])
            .await
            .map_err(to_js)?;

        let window = web_sys::window().ok_or("No window")?;
        let repo = KvBookmarkRepository::new(store.clone(), storage_key.clone());
        let app = PageApp::new(WebDocument::from_window()?, repo, settings);
        let driver = Rc::new(Driver {
            window,
            app: RefCell::new(app),
            store,
            storage_key,
            timer: Cell::new(None),
            on_timer: RefCell::new(None),
        });

        let weak = Rc::downgrade(&driver);
        *driver.on_timer.borrow_mut() = Some(Closure::<dyn FnMut()>::new(move || {
            if let Some(driver) = weak.upgrade() {
                driver.fire();
            }
        }));

        Ok(Self {
            driver,
            observer: None,
            on_mutations: None,
            listening: false,
        })
    }

    /// Answers runtime messages on every page. On supported pages it also
    /// arms the startup reconciles and the sweep, and starts watching the
    /// document and the storage area.
    pub fn start(&mut self) -> Result<(), JsValue> {
        self.listen_for_messages();
        let now = self.driver.now();
        self.driver.app.borrow_mut().start(now);
        if !self.driver.app.borrow().is_started() {
            return Ok(());
        }
        self.observe_document()?;
        self.driver.settle();
        console::log_1(
            &format!(
                "SideMarks active on {}",
                self.driver.app.borrow().platform().display_name()
            )
            .into(),
        );
        Ok(())
    }

    pub fn marker_count(&self) -> u32 {
        self.driver.app.borrow().marker_count() as u32
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.driver.app.borrow().next_deadline().map(|ms| ms as f64)
    }
}

impl SideMarksContent {
    fn listen_for_messages(&mut self) {
        if self.listening {
            return;
        }
        self.listening = true;

        let weak = Rc::downgrade(&self.driver);
        let on_message = Closure::<dyn FnMut(JsValue, JsValue, JsValue) -> bool>::new(
            move |message: JsValue, _sender: JsValue, respond: JsValue| {
                if let Some(driver) = weak.upgrade() {
                    driver.on_runtime_message(&message, &respond);
                }
                false
            },
        );
        add_listener(&["chrome", "runtime", "onMessage"], on_message.as_ref());
        on_message.forget();

        let weak = Rc::downgrade(&self.driver);
        let on_changed = Closure::<dyn FnMut(JsValue, JsValue)>::new(
            move |changes: JsValue, area_name: JsValue| {
                if let Some(driver) = weak.upgrade() {
                    driver.on_storage_changed(&changes, &area_name);
                }
            },
        );
        add_listener(&["chrome", "storage", "onChanged"], on_changed.as_ref());
        on_changed.forget();
    }

    /// Every added subtree feeds the watcher, which also notices client-side
    /// navigation through the location it reads on each batch.
    fn observe_document(&mut self) -> Result<(), JsValue> {
        if self.observer.is_some() {
            return Ok(());
        }
        let weak = Rc::downgrade(&self.driver);
        let link_css = conversation_link_css();
        let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
            move |records: Array, _observer: MutationObserver| {
                if let Some(driver) = weak.upgrade() {
                    driver.on_mutations(&records, &link_css);
                }
            },
        );
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        let document = self.driver.window.document().ok_or("No document")?;
        observer.observe_with_options(&document, &init)?;

        self.observer = Some(observer);
        self.on_mutations = Some(callback);
        Ok(())
    }
}

impl Drop for SideMarksContent {
    fn drop(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        self.on_mutations.take();
        if let Some(handle) = self.driver.timer.take() {
            self.driver.window.clear_timeout_with_handle(handle);
        }
    }
}
