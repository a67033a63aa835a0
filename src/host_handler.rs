//! Method handler for the SideMarks JSON host.
//!
//! Kept apart from `host_server.rs` so it can be unit-tested. The host drives
//! one page session over a [`MemoryDocument`]: the caller plays the chat
//! application (navigation, sidebar links, the clock) and the extension's
//! background (menu clicks, commands, popup messages).

use std::sync::Mutex;

use serde_json::{json, Value};
use tracing::info;

use crate::app::PageApp;
use crate::database::kv_store::SqliteKvStore;
use crate::database::Database;
use crate::dom::memory::MemoryDocument;
use crate::dom::{PageDom, Selector};
use crate::managers::bookmark_repository::{BookmarkRepository, KvBookmarkRepository};
use crate::message_handler::handle_message;
use crate::services::command_dispatcher::{
    context_menu_items, document_url_matches, message_for_command, message_for_menu_click,
};
use crate::services::reconciler::{MARKER_CLASS, MARKER_COLOR_ATTR};
use crate::types::message::ExtensionMessage;
use crate::types::platform::Platform;
use crate::types::settings::SideMarksSettings;

/// One page plus the clock driving it.
pub struct HostSession<R: BookmarkRepository> {
    app: Option<PageApp<MemoryDocument, R>>,
    settings: SideMarksSettings,
    now_ms: u64,
}

impl HostSession<KvBookmarkRepository<SqliteKvStore>> {
    /// Opens the bookmark database at `db_path` and loads `location`.
    pub fn open(
        db_path: &str,
        location: &str,
        settings: SideMarksSettings,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Database::open(db_path)?;
        let repo = KvBookmarkRepository::new(SqliteKvStore::new(db), settings.storage.key.clone());
        Ok(Self::new(repo, location, settings))
    }
}

impl<R: BookmarkRepository> HostSession<R> {
    pub fn new(repo: R, location: &str, settings: SideMarksSettings) -> Self {
        let mut session = Self {
            app: None,
            settings,
            now_ms: 0,
        };
        session.load_page(repo, location);
        session
    }

    /// Full page load: a fresh document with the page logic started on it.
    fn load_page(&mut self, repo: R, location: &str) {
        let mut app = PageApp::new(MemoryDocument::new(location), repo, self.settings.clone());
        app.start(self.now_ms);
        info!(location, platform = %app.platform(), "page loaded");
        self.app = Some(app);
    }

    fn app(&self) -> Result<&PageApp<MemoryDocument, R>, String> {
        self.app.as_ref().ok_or_else(|| "no page loaded".to_string())
    }

    fn app_mut(&mut self) -> Result<&mut PageApp<MemoryDocument, R>, String> {
        self.app.as_mut().ok_or_else(|| "no page loaded".to_string())
    }

    pub fn page(&self) -> Option<&PageApp<MemoryDocument, R>> {
        self.app.as_ref()
    }

    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Moves to `url`. Same-site moves are client-side navigations that the
    /// watcher has to notice; cross-site moves reload the page.
    fn navigate(&mut self, url: &str) -> Result<Value, String> {
        let now = self.now_ms;
        let current = self.app()?.platform();
        if Platform::from_location(url) == current {
            let app = self.app_mut()?;
            app.dom_mut().navigate(url);
            let observation = app.pump_mutations(now);
            return Ok(json!({"reloaded": false, "navigated": observation.navigated}));
        }

        let repo = self
            .app
            .take()
            .map(PageApp::into_repo)
            .ok_or_else(|| "no page loaded".to_string())?;
        self.load_page(repo, url);
        Ok(json!({"reloaded": true, "platform": Platform::from_location(url).as_str()}))
    }

    fn deliver(&mut self, message: &ExtensionMessage) -> Result<Value, String> {
        let now = self.now_ms;
        let app = self.app_mut()?;
        let reply = handle_message(app, message, now).map_err(|e| e.to_string())?;
        app.pump_mutations(now);
        Ok(json!({"reply": reply}))
    }

    fn add_link(&mut self, href: &str, title: &str) -> Result<Value, String> {
        let now = self.now_ms;
        let app = self.app_mut()?;
        let platform = app.platform();
        let dom = app.dom_mut();
        let sidebar = dom.sidebar();
        let link = dom.add_conversation_link(sidebar, platform, href, title);
        let observation = app.pump_mutations(now);
        Ok(json!({"node": link.index(), "scheduled": observation.scheduled_anything()}))
    }

    fn remove_link(&mut self, href: &str) -> Result<Value, String> {
        let now = self.now_ms;
        let app = self.app_mut()?;
        let dom = app.dom_mut();
        let links: Vec<_> = dom
            .query_all(None, &Selector::Tag("a"))
            .into_iter()
            .filter(|link| dom.attribute(link, "href").as_deref() == Some(href))
            .collect();
        let removed = links.iter().filter(|link| dom.remove(link)).count();
        app.pump_mutations(now);
        Ok(json!({"removed": removed}))
    }

    fn markers(&self) -> Result<Value, String> {
        let app = self.app()?;
        let dom = app.dom();
        let markers: Vec<Value> = app
            .reconciler()
            .conversation_links(dom)
            .iter()
            .flat_map(|link| {
                let href = dom.link_href(link);
                dom.query_all(Some(link), &Selector::Class(MARKER_CLASS))
                    .into_iter()
                    .map(move |marker| (href.clone(), marker))
            })
            .map(|(href, marker)| {
                json!({"href": href, "color": dom.attribute(&marker, MARKER_COLOR_ATTR)})
            })
            .collect();
        Ok(json!(markers))
    }

    fn tick(&mut self, advance_ms: u64) -> Result<Value, String> {
        self.now_ms += advance_ms;
        let now = self.now_ms;
        let app = self.app_mut()?;
        app.pump_mutations(now);
        let ran = app.tick(now);
        Ok(json!({"now": now, "ran": ran, "nextDeadline": app.next_deadline()}))
    }

    fn list(&self, query: &str) -> Result<Value, String> {
        let view = self.app()?.list_view().map_err(|e| e.to_string())?;
        let filtered = view.filter(query);
        let groups: Vec<Value> = filtered
            .groups()
            .iter()
            .map(|g| {
                let rows: Vec<Value> = g
                    .rows
                    .iter()
                    .map(|r| {
                        json!({
                            "conversationId": r.conversation_id,
                            "title": r.title,
                            "color": r.color,
                            "swatch": r.swatch,
                            "url": r.url,
                        })
                    })
                    .collect();
                json!({"platform": g.platform.as_str(), "header": g.header(), "rows": rows})
            })
            .collect();
        Ok(json!({
            "count": view.count(),
            "showSearch": view.shows_search(),
            "groups": groups,
            "noResults": filtered.no_results_message(),
            "text": filtered.render(),
        }))
    }
}

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

/// Dispatches one host method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method<R: BookmarkRepository>(
    session: &Mutex<HostSession<R>>,
    method: &str,
    params: &Value,
) -> Result<Value, String> {
    let mut s = session.lock().map_err(|e| e.to_string())?;
    match method {
        "ping" => Ok(json!({"status": "ready", "version": env!("CARGO_PKG_VERSION")})),

        // ─── Page ───
        "page.message" => {
            let message: ExtensionMessage =
                serde_json::from_value(params.clone()).map_err(|e| format!("invalid message: {}", e))?;
            s.deliver(&message)
        }
        "page.navigate" => {
            let url = str_param(params, "url")?;
            s.navigate(url)
        }
        "page.add_link" => {
            let href = str_param(params, "href")?;
            let title = params.get("title").and_then(|v| v.as_str()).unwrap_or("");
            s.add_link(href, title)
        }
        "page.remove_link" => {
            let href = str_param(params, "href")?;
            s.remove_link(href)
        }
        "page.markers" => s.markers(),
        "page.tick" => {
            let advance = params.get("advance_ms").and_then(|v| v.as_u64()).unwrap_or(0);
            s.tick(advance)
        }

        // ─── Background ───
        "menu.items" => {
            let location = s.app()?.dom().location();
            if !document_url_matches(&location) {
                return Ok(json!([]));
            }
            serde_json::to_value(context_menu_items()).map_err(|e| e.to_string())
        }
        "menu.click" => {
            let id = str_param(params, "menuItemId")?;
            let link = params.get("linkUrl").and_then(|v| v.as_str());
            match message_for_menu_click(id, link) {
                Some(message) => s.deliver(&message),
                None => Ok(json!({"ignored": true})),
            }
        }
        "command" => {
            let name = str_param(params, "name")?;
            match message_for_command(name) {
                Some(message) => s.deliver(&message),
                None => Err(format!("unknown command: {}", name)),
            }
        }

        // ─── Popup ───
        "list" => {
            let query = params.get("query").and_then(|v| v.as_str()).unwrap_or("");
            s.list(query)
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
